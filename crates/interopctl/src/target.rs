use std::fmt;
use std::str::FromStr;

/// Languages with an interop docker image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Language {
    Cxx,
    Go,
    Java,
    Node,
    Python,
    Ruby,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Cxx,
        Language::Go,
        Language::Java,
        Language::Node,
        Language::Python,
        Language::Ruby,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Cxx => "cxx",
            Language::Go => "go",
            Language::Java => "java",
            Language::Node => "node",
            Language::Python => "python",
            Language::Ruby => "ruby",
        }
    }

    /// The port this language's interop server listens on.
    pub fn port(self) -> u16 {
        match self {
            Language::Cxx => 8010,
            Language::Go => 8020,
            Language::Java => 8030,
            Language::Node => 8040,
            Language::Python => 8050,
            Language::Ruby => 8060,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Client => f.write_str("client"),
            Role::Server => f.write_str("server"),
        }
    }
}

/// What to launch or connect to: a language in a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDescriptor {
    pub language: Language,
    pub role: Role,
}

impl TargetDescriptor {
    pub fn client(language: Language) -> Self {
        Self {
            language,
            role: Role::Client,
        }
    }

    pub fn server(language: Language) -> Self {
        Self {
            language,
            role: Role::Server,
        }
    }

    /// Clients dial the port their server counterpart listens on, so the
    /// role never changes the answer.
    pub fn port(&self) -> u16 {
        self.language.port()
    }

    pub fn image(&self) -> String {
        format!("grpc/{}", self.language)
    }

    /// Container name used for long-running servers.
    pub fn container_name(&self) -> String {
        format!("grpc_interop_{}", self.language)
    }
}

impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.image(), self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("cxx", 8010)]
    #[case("go", 8020)]
    #[case("java", 8030)]
    #[case("node", 8040)]
    #[case("python", 8050)]
    #[case("ruby", 8060)]
    fn port_table(#[case] name: &str, #[case] port: u16) {
        let lang: Language = name.parse().unwrap();
        assert_eq!(TargetDescriptor::server(lang).port(), port);
        assert_eq!(TargetDescriptor::client(lang).port(), port);
        assert_eq!(TargetDescriptor::server(lang).image(), format!("grpc/{name}"));
        assert_eq!(
            TargetDescriptor::client(lang).to_string(),
            format!("grpc/{name} client")
        );
    }

    #[test]
    fn unknown_language_is_rejected() {
        assert_eq!("rust".parse::<Language>(), Err("rust".to_string()));
    }
}
