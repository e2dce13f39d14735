use crate::command::join_words;
use crate::target::Language;

/// How a program is started inside its container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launcher {
    /// Executed directly; flags become separate argv entries.
    Direct(&'static [&'static str]),
    /// Run through a shell; flags are appended to the script.
    Shell {
        shell: &'static [&'static str],
        script: &'static str,
    },
}

impl Launcher {
    pub fn argv<S: AsRef<str>>(&self, flags: &[S]) -> Vec<String> {
        match self {
            Launcher::Direct(program) => program
                .iter()
                .map(|s| s.to_string())
                .chain(flags.iter().map(|f| f.as_ref().to_string()))
                .collect(),
            Launcher::Shell { shell, script } => {
                let mut line = script.to_string();
                if !flags.is_empty() {
                    line.push(' ');
                    line.push_str(&join_words(flags));
                }
                shell
                    .iter()
                    .map(|s| s.to_string())
                    .chain(std::iter::once(line))
                    .collect()
            }
        }
    }
}

const BASH: &[&str] = &["/bin/bash", "-c"];
const LOGIN_BASH: &[&str] = &["/bin/bash", "-l", "-c"];

/// Where each language keeps its interop client and server, and how it
/// spells "use TLS".
#[derive(Debug, Clone)]
pub struct Profile {
    pub client: Launcher,
    pub server: Launcher,
    pub tls: &'static [&'static str],
    /// Makes the client trust the test CA the interop servers present.
    pub test_ca: &'static [&'static str],
    /// Makes the client trust the production roots instead.
    pub prod_roots: &'static [&'static str],
}

pub fn profile(lang: Language) -> Profile {
    match lang {
        Language::Cxx => Profile {
            client: Launcher::Direct(&["/var/local/git/grpc/bins/opt/interop_client"]),
            server: Launcher::Direct(&["/var/local/git/grpc/bins/opt/interop_server"]),
            tls: &["--enable_ssl"],
            test_ca: &[],
            prod_roots: &["--use_prod_roots"],
        },
        Language::Go => Profile {
            client: Launcher::Shell {
                shell: BASH,
                script: "cd /go/src/github.com/google/grpc-go/rpc/interop/client && go run client.go",
            },
            server: Launcher::Shell {
                shell: BASH,
                script: "cd /go/src/github.com/google/grpc-go/rpc/interop/server && go run server.go",
            },
            tls: &["--use_tls=true"],
            test_ca: &[],
            prod_roots: &[],
        },
        Language::Java => Profile {
            client: Launcher::Direct(&["/var/local/git/grpc-java/run-test-client.sh"]),
            server: Launcher::Direct(&["/var/local/git/grpc-java/run-test-server.sh"]),
            tls: &["--use_tls=true"],
            test_ca: &["--use_test_ca=true"],
            prod_roots: &["--use_test_ca=false"],
        },
        Language::Node => Profile {
            client: Launcher::Direct(&[
                "/usr/bin/nodejs",
                "/var/local/git/grpc/src/node/interop/interop_client.js",
            ]),
            server: Launcher::Direct(&[
                "/usr/bin/nodejs",
                "/var/local/git/grpc/src/node/interop/interop_server.js",
            ]),
            tls: &["--use_tls=true"],
            test_ca: &[],
            prod_roots: &[],
        },
        Language::Python => Profile {
            client: Launcher::Shell {
                shell: LOGIN_BASH,
                script: "python -B -m interop.client",
            },
            server: Launcher::Shell {
                shell: LOGIN_BASH,
                script: "python -B -m interop.server",
            },
            tls: &["--use_tls"],
            test_ca: &["--use_test_ca"],
            prod_roots: &[],
        },
        Language::Ruby => Profile {
            client: Launcher::Shell {
                shell: LOGIN_BASH,
                script: "ruby /var/local/git/grpc/src/ruby/bin/interop/interop_client.rb",
            },
            server: Launcher::Shell {
                shell: LOGIN_BASH,
                script: "ruby /var/local/git/grpc/src/ruby/bin/interop/interop_server.rb",
            },
            tls: &["--use_tls"],
            test_ca: &["--use_test_ca"],
            prod_roots: &[],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn shell_launcher_folds_flags_into_script() {
        let argv = profile(Language::Ruby).client.argv(&["--use_tls", "--test_case=ping_pong"]);
        assert_eq!(
            argv,
            [
                "/bin/bash",
                "-l",
                "-c",
                "ruby /var/local/git/grpc/src/ruby/bin/interop/interop_client.rb --use_tls --test_case=ping_pong",
            ]
        );
    }

    #[test]
    fn direct_launcher_appends_flags() {
        let argv = profile(Language::Node).server.argv(&["--port=8040"]);
        assert_eq!(
            argv,
            [
                "/usr/bin/nodejs",
                "/var/local/git/grpc/src/node/interop/interop_server.js",
                "--port=8040",
            ]
        );
    }
}
