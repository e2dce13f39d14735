use std::path::PathBuf;

/// Everything that can stop an entry point.
///
/// Variants fall into four groups which map onto process exit codes: bad
/// input (1), bad configuration (2), a broken environment (1) and a remote
/// command that exited non-zero (its own status).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A required positional argument was empty or absent.
    #[error("{func}: missing arg: {arg}")]
    MissingArg {
        func: &'static str,
        arg: &'static str,
    },

    /// A positional argument had the wrong shape or named an unknown identifier.
    #[error("{func}: bad {what}: {value}")]
    BadValue {
        func: &'static str,
        what: &'static str,
        value: String,
    },

    /// `-f` was given without a resolver name.
    #[error("-f: arg_func not provided")]
    ResolverNotProvided,

    /// `-f` named a resolver that does not exist.
    #[error("-f: arg_func value: {0} is not defined")]
    ResolverNotDefined(String),

    /// `-f` named a resolver that exists but belongs to another entry point.
    #[error("-f: arg_func value: {name} does not apply to {func}")]
    ResolverMismatch { func: &'static str, name: String },

    /// No command generator is registered under the derived name.
    #[error("{func}: {generator} not defined")]
    GeneratorNotDefined {
        func: &'static str,
        generator: String,
    },

    /// The generator registry is internally inconsistent.
    #[error("invalid generator registry; {0}")]
    Registry(String),

    /// The settings file could not be read or parsed.
    #[error("could not load config {}; {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("{func}: instance {host} not found in project {project}")]
    InstanceNotFound {
        func: &'static str,
        host: String,
        project: String,
    },

    #[error("{func}: instance {host} has no internal address")]
    NoInternalAddress { func: &'static str, host: String },

    #[error("{func}: directory not found: {}", path.display())]
    DirectoryNotFound { func: &'static str, path: PathBuf },

    #[error("could not create ssh key {}; {reason}", path.display())]
    SshKey { path: PathBuf, reason: String },

    /// An external tool could not be started at all.
    #[error("could not run {program}; {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A local tool (listing, copy, keygen) exited non-zero.
    #[error("{program} exited with status {status}; {stderr}")]
    Tool {
        program: &'static str,
        status: i32,
        stderr: String,
    },

    #[error("could not parse instance listing; {0}")]
    Listing(#[from] serde_json::Error),

    /// The command executed on the remote host exited non-zero.
    #[error("{func}: command on {host} exited with status {status}")]
    Remote {
        func: &'static str,
        host: String,
        status: i32,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The process exit status that reports this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::MissingArg { .. } | Error::BadValue { .. } => 1,
            Error::ResolverNotProvided
            | Error::ResolverNotDefined(_)
            | Error::ResolverMismatch { .. }
            | Error::GeneratorNotDefined { .. }
            | Error::Registry(_)
            | Error::Config { .. } => 2,
            Error::Remote { status, .. } => *status,
            Error::InstanceNotFound { .. }
            | Error::NoInternalAddress { .. }
            | Error::DirectoryNotFound { .. }
            | Error::SshKey { .. }
            | Error::Spawn { .. }
            | Error::Tool { .. }
            | Error::Listing(_)
            | Error::Io(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn argument_and_configuration_errors_have_distinct_codes() {
        let missing = Error::MissingArg {
            func: "launch_server",
            arg: "host",
        };
        let undefined = Error::GeneratorNotDefined {
            func: "interop_test",
            generator: "grpc_interop_gen_rust_cmd".to_string(),
        };

        assert_eq!(missing.exit_code(), 1);
        assert_eq!(undefined.exit_code(), 2);
        assert_eq!(missing.to_string(), "launch_server: missing arg: host");
    }

    #[test]
    fn remote_status_is_propagated() {
        let err = Error::Remote {
            func: "update_image",
            host: "grpc-docker-testclients".to_string(),
            status: 127,
        };
        assert_eq!(err.exit_code(), 127);
    }
}
