//! Command generators for interop clients and servers.
//!
//! Every client generator is keyed by an endpoint [`Mode`] and a
//! [`Language`]. Coverage is deliberately partial: a key that is not
//! registered is a configuration error at lookup time.

mod profiles;

pub use profiles::{profile, Launcher, Profile};

use crate::command::{CommandSpec, DockerRun};
use crate::conf::ProdEndpoint;
use crate::error::Error;
use crate::target::{Language, TargetDescriptor};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Credential injected into authenticated cloud-prod clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuthStrategy {
    /// A service account key file baked into the client image.
    ServiceAccountCreds,
    /// The GCE default service account of the host.
    ComputeEngineCreds,
}

impl AuthStrategy {
    pub const ALL: [AuthStrategy; 2] = [
        AuthStrategy::ServiceAccountCreds,
        AuthStrategy::ComputeEngineCreds,
    ];

    /// Also the name of the test case exercising this strategy.
    pub fn as_str(self) -> &'static str {
        match self {
            AuthStrategy::ServiceAccountCreds => "service_account_creds",
            AuthStrategy::ComputeEngineCreds => "compute_engine_creds",
        }
    }
}

impl FromStr for AuthStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuthStrategy::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mode {
    /// Against an operator launched interop server.
    Interop,
    /// Against the production sandbox endpoint.
    CloudProd,
    /// As `CloudProd`, with credentials.
    CloudProdAuth(AuthStrategy),
}

impl Mode {
    fn prefix(&self) -> String {
        match self {
            Mode::Interop => "interop".to_string(),
            Mode::CloudProd => "cloud_prod".to_string(),
            Mode::CloudProdAuth(strategy) => format!("cloud_prod_auth_{}", strategy.as_str()),
        }
    }
}

fn generator_name(prefix: &str, client: &str) -> String {
    format!("grpc_{prefix}_gen_{client}_cmd")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GeneratorKey {
    pub mode: Mode,
    pub language: Language,
}

impl fmt::Display for GeneratorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&generator_name(&self.mode.prefix(), self.language.as_str()))
    }
}

/// Builds the docker command that runs one language's interop client.
#[derive(Debug, Clone)]
pub struct ClientGenerator {
    pub key: GeneratorKey,
    pub image: String,
    launcher: Launcher,
    baseline: Vec<String>,
}

impl ClientGenerator {
    /// The command for `flags`, appended after the fixed baseline flags.
    pub fn generate<S: AsRef<str>>(&self, flags: &[S]) -> CommandSpec {
        let all: Vec<&str> = self
            .baseline
            .iter()
            .map(String::as_str)
            .chain(flags.iter().map(AsRef::as_ref))
            .collect();

        DockerRun {
            args: self.launcher.argv(&all),
            ..DockerRun::new(self.image.clone())
        }
        .into()
    }
}

/// Builds the command that (re)starts one language's interop server.
#[derive(Debug, Clone)]
pub struct ServerGenerator {
    pub target: TargetDescriptor,
    pub port: u16,
    launcher: Launcher,
    baseline: Vec<String>,
}

impl ServerGenerator {
    pub fn command(&self) -> CommandSpec {
        let name = self.target.container_name();
        let run = DockerRun {
            name: Some(name.clone()),
            publish: Some(self.port),
            detach: true,
            args: self.launcher.argv(&self.baseline),
            ..DockerRun::new(self.target.image())
        };

        CommandSpec::new(["sudo", "docker", "rm", "-f", name.as_str()])
            .tolerate_failure()
            .and_then(run.argv())
    }
}

/// Modes each language has a client generator for.
fn coverage(lang: Language) -> &'static [Mode] {
    use AuthStrategy::*;
    use Mode::*;

    const FULL: &[Mode] = &[
        Interop,
        CloudProd,
        CloudProdAuth(ServiceAccountCreds),
        CloudProdAuth(ComputeEngineCreds),
    ];
    const PROD_ONLY: &[Mode] = &[
        CloudProd,
        CloudProdAuth(ServiceAccountCreds),
        CloudProdAuth(ComputeEngineCreds),
    ];

    match lang {
        Language::Cxx => PROD_ONLY,
        Language::Go | Language::Java => FULL,
        Language::Node => &[CloudProd],
        Language::Ruby => &[Interop, CloudProd],
        // TODO: add the python interop client once its image ships one.
        Language::Python => &[],
    }
}

#[derive(Debug, Clone)]
pub struct Registry {
    clients: BTreeMap<GeneratorKey, ClientGenerator>,
    servers: BTreeMap<Language, ServerGenerator>,
}

impl Registry {
    /// Every generator this tool knows about, aimed at `prod`.
    pub fn standard(prod: &ProdEndpoint) -> Self {
        let mut clients = BTreeMap::new();
        let mut servers = BTreeMap::new();

        for lang in Language::ALL {
            let p = profile(lang);

            for &mode in coverage(lang) {
                let key = GeneratorKey {
                    mode,
                    language: lang,
                };
                let generator = ClientGenerator {
                    key,
                    image: TargetDescriptor::client(lang).image(),
                    launcher: p.client.clone(),
                    baseline: client_baseline(&p, mode, prod),
                };
                clients.insert(key, generator);
            }

            let target = TargetDescriptor::server(lang);
            let mut baseline: Vec<String> = p.tls.iter().map(|s| s.to_string()).collect();
            baseline.push(format!("--port={}", target.port()));
            servers.insert(
                lang,
                ServerGenerator {
                    target,
                    port: target.port(),
                    launcher: p.server,
                    baseline,
                },
            );
        }

        Self { clients, servers }
    }

    /// Checks that every language has a server, that servers listen where
    /// clients dial, and that every image is `grpc/<language>`.
    pub fn validate(&self) -> Result<(), Error> {
        for lang in Language::ALL {
            let server = self
                .servers
                .get(&lang)
                .ok_or_else(|| Error::Registry(format!("no server registered for {lang}")))?;
            let client_port = TargetDescriptor::client(lang).port();
            if server.port != client_port {
                return Err(Error::Registry(format!(
                    "{lang} server listens on {} but clients dial {client_port}",
                    server.port
                )));
            }
            if !server.baseline.contains(&format!("--port={}", server.port)) {
                return Err(Error::Registry(format!(
                    "{lang} server is not told to listen on {}",
                    server.port
                )));
            }
        }

        for (key, generator) in &self.clients {
            let expected = TargetDescriptor::client(key.language).image();
            if generator.image != expected {
                return Err(Error::Registry(format!(
                    "{key} uses image {} instead of {expected}",
                    generator.image
                )));
            }
        }
        Ok(())
    }

    /// Looks up the client generator for `client_type` in `mode`.
    pub fn client(
        &self,
        func: &'static str,
        mode: Mode,
        client_type: &str,
    ) -> Result<&ClientGenerator, Error> {
        client_type
            .parse::<Language>()
            .ok()
            .and_then(|language| self.clients.get(&GeneratorKey { mode, language }))
            .ok_or_else(|| Error::GeneratorNotDefined {
                func,
                generator: generator_name(&mode.prefix(), client_type),
            })
    }

    /// Looks up the authenticated generator whose strategy `test_case` names.
    pub fn auth_client(
        &self,
        func: &'static str,
        test_case: &str,
        client_type: &str,
    ) -> Result<&ClientGenerator, Error> {
        match test_case.parse::<AuthStrategy>() {
            Ok(strategy) => self.client(func, Mode::CloudProdAuth(strategy), client_type),
            Err(_) => Err(Error::GeneratorNotDefined {
                func,
                generator: generator_name(&format!("cloud_prod_auth_{test_case}"), client_type),
            }),
        }
    }

    /// Looks up a generator by its legacy function name, `grpc_` optional.
    pub fn by_name(&self, func: &'static str, name: &str) -> Result<&ClientGenerator, Error> {
        let full = if name.starts_with("grpc_") {
            name.to_string()
        } else {
            format!("grpc_{name}")
        };
        self.clients
            .iter()
            .find(|(key, _)| key.to_string() == full)
            .map(|(_, generator)| generator)
            .ok_or(Error::GeneratorNotDefined {
                func,
                generator: full,
            })
    }

    pub fn server(&self, lang: Language) -> Result<&ServerGenerator, Error> {
        self.servers
            .get(&lang)
            .ok_or_else(|| Error::Registry(format!("no server registered for {lang}")))
    }

    pub fn clients(&self) -> impl Iterator<Item = &ClientGenerator> {
        self.clients.values()
    }

    pub fn servers(&self) -> impl Iterator<Item = &ServerGenerator> {
        self.servers.values()
    }
}

fn client_baseline(p: &Profile, mode: Mode, prod: &ProdEndpoint) -> Vec<String> {
    let mut flags: Vec<String> = p.tls.iter().map(|s| s.to_string()).collect();

    match mode {
        Mode::Interop => flags.extend(p.test_ca.iter().map(|s| s.to_string())),
        Mode::CloudProd | Mode::CloudProdAuth(_) => {
            flags.extend(p.prod_roots.iter().map(|s| s.to_string()));
            flags.push(format!("--server_port={}", prod.port));
            flags.push(format!("--server_host={}", prod.host));
            flags.push(format!("--server_host_override={}", prod.host));
        }
    }

    match mode {
        Mode::CloudProdAuth(AuthStrategy::ServiceAccountCreds) => {
            flags.push(format!(
                "--service_account_key_file={}",
                prod.service_account_key_file
            ));
            flags.push(format!("--oauth_scope={}", prod.oauth_scope));
        }
        Mode::CloudProdAuth(AuthStrategy::ComputeEngineCreds) => {
            flags.push(format!(
                "--default_service_account={}",
                prod.default_service_account
            ));
            flags.push(format!("--oauth_scope={}", prod.oauth_scope));
        }
        Mode::Interop | Mode::CloudProd => {}
    }
    flags
}
