//! Structured shell commands.
//!
//! Commands are kept as argument vectors until they cross into the remote
//! execution boundary, where [`CommandSpec::render`] turns them into a single
//! line for `gcloud compute ssh --command`.

use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    argv: Vec<String>,
    tolerate_failure: bool,
}

/// One or more argument vectors run in sequence, each gated on the previous
/// one succeeding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    segments: Vec<Segment>,
}

impl CommandSpec {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: vec![Segment {
                argv: argv.into_iter().map(Into::into).collect(),
                tolerate_failure: false,
            }],
        }
    }

    /// Appends a command that only runs if everything before it succeeded.
    pub fn and_then<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments.push(Segment {
            argv: argv.into_iter().map(Into::into).collect(),
            tolerate_failure: false,
        });
        self
    }

    /// Lets the most recently added command fail without stopping the chain.
    pub fn tolerate_failure(mut self) -> Self {
        if let Some(last) = self.segments.last_mut() {
            last.tolerate_failure = true;
        }
        self
    }

    pub fn render(&self) -> String {
        self.segments
            .iter()
            .map(|segment| {
                let line = join_words(&segment.argv);
                if segment.tolerate_failure {
                    format!("{line} || true")
                } else {
                    line
                }
            })
            .collect::<Vec<_>>()
            .join(" && ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Quotes a single word for a POSIX shell.
///
/// Flags and paths made only of shell-inert characters are left bare so the
/// rendered command reads like one typed by hand.
pub fn quote(word: &str) -> Cow<'_, str> {
    let inert = |c: char| c.is_ascii_alphanumeric() || "-_=+/.,:@%".contains(c);
    if !word.is_empty() && word.chars().all(inert) {
        return Cow::Borrowed(word);
    }
    match shlex::try_quote(word) {
        Ok(quoted) => quoted,
        // Only NUL bytes are unquotable; they cannot reach a shell anyway.
        Err(_) => Cow::Owned(quote(&word.replace('\0', "")).into_owned()),
    }
}

/// Joins words into one shell line, quoting each as needed.
pub fn join_words<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| quote(w.as_ref()).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `sudo docker run` invocation of one of the interop images.
#[derive(Debug, Clone, Default)]
pub struct DockerRun {
    pub image: String,
    pub name: Option<String>,
    pub publish: Option<u16>,
    pub detach: bool,
    pub args: Vec<String>,
}

impl DockerRun {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn argv(&self) -> Vec<String> {
        let mut argv: Vec<String> = vec!["sudo".into(), "docker".into(), "run".into()];
        if self.detach {
            argv.push("-d".into());
        }
        if let Some(name) = &self.name {
            argv.push("--name".into());
            argv.push(name.clone());
        }
        if let Some(port) = self.publish {
            argv.push("-p".into());
            argv.push(format!("{port}:{port}"));
        }
        argv.push(self.image.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

impl From<DockerRun> for CommandSpec {
    fn from(run: DockerRun) -> Self {
        CommandSpec::new(run.argv())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_flags_stay_bare() {
        let cmd = CommandSpec::new(["sudo", "docker", "run", "grpc/cxx", "--server_port=443"]);
        assert_eq!(cmd.render(), "sudo docker run grpc/cxx --server_port=443");
    }

    #[test]
    fn shell_scripts_are_single_quoted() {
        let cmd = CommandSpec::new(["/bin/bash", "-c", "cd /tmp && go run client.go"]);
        assert_eq!(cmd.render(), "/bin/bash -c 'cd /tmp && go run client.go'");
    }

    #[test]
    fn chained_commands() {
        let cmd = CommandSpec::new(["sudo", "docker", "rm", "-f", "grpc_interop_go"])
            .tolerate_failure()
            .and_then(["sudo", "docker", "run", "grpc/go"]);
        assert_eq!(
            cmd.render(),
            "sudo docker rm -f grpc_interop_go || true && sudo docker run grpc/go"
        );
    }

    #[test]
    fn empty_words_are_quoted() {
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn nul_bytes_are_dropped_and_quotes_still_escaped() {
        let quoted = quote("it's\0 here; rm -rf /");
        assert_eq!(
            shlex::split(&quoted),
            Some(vec!["it's here; rm -rf /".to_string()])
        );
    }

    #[test]
    fn docker_run_with_name_and_port() {
        let run = DockerRun {
            name: Some("grpc_interop_cxx".into()),
            publish: Some(8010),
            detach: true,
            args: vec!["/bin/server".into()],
            ..DockerRun::new("grpc/cxx")
        };
        assert_eq!(
            CommandSpec::from(run).render(),
            "sudo docker run -d --name grpc_interop_cxx -p 8010:8010 grpc/cxx /bin/server"
        );
    }
}
