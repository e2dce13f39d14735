use super::{required, Extras, Positional};
use crate::conf::Settings;
use crate::error::Error;
use crate::target::Language;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

static INSTANCE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]([-a-z0-9]{0,61}[a-z0-9])?$").unwrap());

static IMAGE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+([._-][a-z0-9]+)*(/[a-z0-9]+([._-][a-z0-9]+)*)*(:[\w][\w.-]{0,127})?$")
        .unwrap()
});

fn host(args: &[String], idx: usize, func: &'static str, arg: &'static str) -> Result<String, Error> {
    let value = required(args, idx, func, arg)?;
    if !INSTANCE_NAME.is_match(&value) {
        return Err(Error::BadValue {
            func,
            what: arg,
            value,
        });
    }
    Ok(value)
}

fn server_type(args: &[String], idx: usize, func: &'static str) -> Result<Language, Error> {
    let value = required(args, idx, func, "server_type")?;
    value.parse().map_err(|value| Error::BadValue {
        func,
        what: "server_type",
        value,
    })
}

/// A nonzero TCP port in canonical decimal, so it prints back unchanged.
fn parse_port(value: &str) -> Option<u16> {
    if value.starts_with('0') || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// `push_dockerfiles [docker_dir] [storage_uri]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushDockerfilesArgs {
    pub docker_dir: PathBuf,
    pub storage_uri: String,
}

impl Positional for PushDockerfilesArgs {
    const RESOLVER: &'static str = "push_dockerfiles_args";
    const FUNC: &'static str = "push_dockerfiles";
    const EXTRA_FLAGS: &'static [char] = &['d', 'r'];

    fn from_args(args: &[String], extras: &Extras, settings: &Settings) -> Result<Self, Error> {
        let docker_dir = args
            .first()
            .filter(|a| !a.is_empty())
            .map(PathBuf::from)
            .or_else(|| extras.dockerfile_root.clone())
            .unwrap_or_else(|| settings.dockerfile_root.clone());
        if docker_dir.as_os_str().is_empty() {
            return Err(Error::MissingArg {
                func: Self::FUNC,
                arg: "docker_dir",
            });
        }

        let storage_uri = args
            .get(1)
            .filter(|a| !a.is_empty())
            .cloned()
            .or_else(|| extras.storage_root.clone())
            .unwrap_or_else(|| settings.storage_root.clone());
        if storage_uri.is_empty() {
            return Err(Error::MissingArg {
                func: Self::FUNC,
                arg: "storage_uri",
            });
        }

        Ok(Self {
            docker_dir,
            storage_uri,
        })
    }
}

/// `update_image image_label docker_dir host`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateImageArgs {
    pub image_label: String,
    /// Dockerfile directory on the remote host.
    pub docker_dir: String,
    pub host: String,
}

impl Positional for UpdateImageArgs {
    const RESOLVER: &'static str = "update_image_args";
    const FUNC: &'static str = "update_image";

    fn from_args(args: &[String], _: &Extras, _: &Settings) -> Result<Self, Error> {
        let image_label = required(args, 0, Self::FUNC, "image_label")?;
        if !IMAGE_LABEL.is_match(&image_label) {
            return Err(Error::BadValue {
                func: Self::FUNC,
                what: "image_label",
                value: image_label,
            });
        }
        let docker_dir = required(args, 1, Self::FUNC, "docker_dir")?;
        if !docker_dir.starts_with('/') {
            return Err(Error::BadValue {
                func: Self::FUNC,
                what: "docker_dir",
                value: docker_dir,
            });
        }
        let host = host(args, 2, Self::FUNC, "host")?;

        Ok(Self {
            image_label,
            docker_dir,
            host,
        })
    }
}

/// `update_docker_images [-s script_root] [-d dockerfile_root] [-h host]... host...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncImagesArgs {
    pub hosts: Vec<String>,
    pub script_root: PathBuf,
    /// Local Dockerfile tree to ship along, only when `-d` is given.
    pub dockerfile_root: Option<PathBuf>,
}

impl Positional for SyncImagesArgs {
    const RESOLVER: &'static str = "update_docker_images_args";
    const FUNC: &'static str = "update_docker_images";
    const EXTRA_FLAGS: &'static [char] = &['s', 'd', 'h'];

    fn from_args(args: &[String], extras: &Extras, settings: &Settings) -> Result<Self, Error> {
        let hosts: Vec<String> = extras.hosts.iter().chain(args).cloned().collect();
        if hosts.is_empty() {
            return Err(Error::MissingArg {
                func: Self::FUNC,
                arg: "host",
            });
        }
        for (idx, _) in hosts.iter().enumerate() {
            host(&hosts, idx, Self::FUNC, "host")?;
        }

        Ok(Self {
            hosts,
            script_root: extras
                .script_root
                .clone()
                .unwrap_or_else(|| settings.script_root.clone()),
            dockerfile_root: extras.dockerfile_root.clone(),
        })
    }
}

/// `launch_server host server_type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchServerArgs {
    pub host: String,
    pub server: Language,
}

impl Positional for LaunchServerArgs {
    const RESOLVER: &'static str = "launch_server_args";
    const FUNC: &'static str = "launch_server";

    fn from_args(args: &[String], _: &Extras, _: &Settings) -> Result<Self, Error> {
        Ok(Self {
            host: host(args, 0, Self::FUNC, "host")?,
            server: server_type(args, 1, Self::FUNC)?,
        })
    }
}

/// `interop_test test_case client_host client_type server_host server_type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteropTestArgs {
    pub test_case: String,
    pub client_host: String,
    /// Checked later by generator lookup.
    pub client_type: String,
    pub server_host: String,
    pub server: Language,
}

impl Positional for InteropTestArgs {
    const RESOLVER: &'static str = "interop_test_args";
    const FUNC: &'static str = "interop_test";

    fn from_args(args: &[String], _: &Extras, _: &Settings) -> Result<Self, Error> {
        Ok(Self {
            test_case: required(args, 0, Self::FUNC, "test_case")?,
            client_host: host(args, 1, Self::FUNC, "client_host")?,
            client_type: required(args, 2, Self::FUNC, "client_type")?,
            server_host: host(args, 3, Self::FUNC, "server_host")?,
            server: server_type(args, 4, Self::FUNC)?,
        })
    }
}

/// `test_case host client_type`, shared by both cloud-prod entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudProdArgs {
    pub test_case: String,
    pub host: String,
    pub client_type: String,
}

impl CloudProdArgs {
    fn parse(args: &[String], func: &'static str) -> Result<Self, Error> {
        Ok(Self {
            test_case: required(args, 0, func, "test_case")?,
            host: host(args, 1, func, "host")?,
            client_type: required(args, 2, func, "client_type")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudProdTestArgs(pub CloudProdArgs);

impl Positional for CloudProdTestArgs {
    const RESOLVER: &'static str = "cloud_prod_test_args";
    const FUNC: &'static str = "cloud_prod_test";

    fn from_args(args: &[String], _: &Extras, _: &Settings) -> Result<Self, Error> {
        CloudProdArgs::parse(args, Self::FUNC).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudProdAuthTestArgs(pub CloudProdArgs);

impl Positional for CloudProdAuthTestArgs {
    const RESOLVER: &'static str = "cloud_prod_auth_test_args";
    const FUNC: &'static str = "cloud_prod_auth_test";

    fn from_args(args: &[String], _: &Extras, _: &Settings) -> Result<Self, Error> {
        CloudProdArgs::parse(args, Self::FUNC).map(Self)
    }
}

/// `interop_test_flags server_ip server_port test_case`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteropTestFlagsArgs {
    pub server_ip: String,
    pub server_port: u16,
    pub test_case: String,
}

impl Positional for InteropTestFlagsArgs {
    const RESOLVER: &'static str = "interop_test_flags_args";
    const FUNC: &'static str = "interop_test_flags";

    fn from_args(args: &[String], _: &Extras, _: &Settings) -> Result<Self, Error> {
        let server_ip = required(args, 0, Self::FUNC, "server_ip")?;
        let port = required(args, 1, Self::FUNC, "server_port")?;
        let server_port = parse_port(&port).ok_or_else(|| Error::BadValue {
            func: Self::FUNC,
            what: "server_port",
            value: port.clone(),
        })?;
        let test_case = required(args, 2, Self::FUNC, "test_case")?;

        Ok(Self {
            server_ip,
            server_port,
            test_case,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case(&[], "test_case")]
    #[case(&["large_unary"], "client_host")]
    #[case(&["large_unary", "client"], "client_type")]
    #[case(&["large_unary", "client", "go"], "server_host")]
    #[case(&["large_unary", "client", "go", "server"], "server_type")]
    #[case(&["large_unary", "", "go", "server", "go"], "client_host")]
    fn interop_test_names_the_missing_arg(#[case] raw: &[&str], #[case] missing: &str) {
        let err =
            InteropTestArgs::from_args(&args(raw), &Extras::default(), &Settings::default())
                .unwrap_err();
        assert_eq!(err.to_string(), format!("interop_test: missing arg: {missing}"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn bad_server_type() {
        let err = InteropTestArgs::from_args(
            &args(&["large_unary", "client", "ruby", "svrhost", "rust"]),
            &Extras::default(),
            &Settings::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "interop_test: bad server_type: rust");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn client_type_is_not_checked_here() {
        let parsed = InteropTestArgs::from_args(
            &args(&["large_unary", "client", "rust", "svrhost", "go"]),
            &Extras::default(),
            &Settings::default(),
        )
        .unwrap();
        assert_eq!(parsed.client_type, "rust");
    }

    #[test]
    fn update_image_validates_shapes() {
        let ok = UpdateImageArgs::from_args(
            &args(&["grpc/cxx", "/var/local/dockerfile/grpc_cxx", "grpc-docker-builder"]),
            &Extras::default(),
            &Settings::default(),
        )
        .unwrap();
        assert_eq!(ok.image_label, "grpc/cxx");

        let err = UpdateImageArgs::from_args(
            &args(&["grpc/CXX!", "/var/local/dockerfile", "builder"]),
            &Extras::default(),
            &Settings::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "update_image: bad image_label: grpc/CXX!");

        let err = UpdateImageArgs::from_args(
            &args(&["grpc/cxx", "relative/dir", "builder"]),
            &Extras::default(),
            &Settings::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "update_image: bad docker_dir: relative/dir");
    }

    #[test]
    fn sync_hosts_merge_flag_and_positional() {
        let extras = Extras {
            hosts: vec!["first".to_string()],
            script_root: Some(PathBuf::from("/tmp/scripts")),
            ..Extras::default()
        };
        let parsed =
            SyncImagesArgs::from_args(&args(&["second", "third"]), &extras, &Settings::default())
                .unwrap();
        assert_eq!(parsed.hosts, ["first", "second", "third"]);
        assert_eq!(parsed.script_root, PathBuf::from("/tmp/scripts"));
        assert_eq!(parsed.dockerfile_root, None);
    }

    #[test]
    fn sync_needs_a_host() {
        let err = SyncImagesArgs::from_args(&[], &Extras::default(), &Settings::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "update_docker_images: missing arg: host");
    }

    #[test]
    fn push_dockerfiles_defaults() {
        let settings = Settings::default();
        let parsed = PushDockerfilesArgs::from_args(&[], &Extras::default(), &settings).unwrap();
        assert_eq!(parsed.docker_dir, settings.dockerfile_root);
        assert_eq!(parsed.storage_uri, "gs://tmp-grpc-dev/admin/");

        let extras = Extras {
            storage_root: Some("gs://elsewhere/".to_string()),
            ..Extras::default()
        };
        let parsed = PushDockerfilesArgs::from_args(&args(&["docker"]), &extras, &settings).unwrap();
        assert_eq!(parsed.docker_dir, PathBuf::from("docker"));
        assert_eq!(parsed.storage_uri, "gs://elsewhere/");
    }

    #[rstest]
    #[case("0")]
    #[case("+8020")]
    #[case("65536")]
    #[case(" 8020")]
    #[case("08020")]
    fn ports_must_be_plain_nonzero_digits(#[case] port: &str) {
        let err = InteropTestFlagsArgs::from_args(
            &args(&["10.0.0.5", port, "large_unary"]),
            &Extras::default(),
            &Settings::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("interop_test_flags: bad server_port: {port}")
        );
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn port_round_trips() {
        let parsed = InteropTestFlagsArgs::from_args(
            &args(&["10.0.0.5", "65535", "large_unary"]),
            &Extras::default(),
            &Settings::default(),
        )
        .unwrap();
        assert_eq!(parsed.server_port.to_string(), "65535");
    }

    #[test]
    fn bad_port() {
        let err = InteropTestFlagsArgs::from_args(
            &args(&["10.0.0.5", "eighty", "large_unary"]),
            &Extras::default(),
            &Settings::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "interop_test_flags: bad server_port: eighty");
    }
}
