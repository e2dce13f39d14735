//! Entry points that drive docker on the GCE interop hosts.
//!
//! Each entry point resolves its arguments, checks the hosts it touches
//! exist, and builds a list of [`Step`]s. A dry run returns the steps
//! untouched; otherwise they run one by one and the first failure stops
//! the rest.

mod archive;
mod image;
mod server;


use crate::cloud::{Cloud, Instance};
use crate::command::CommandSpec;
use crate::conf::{Defaults, Settings};
use crate::error::Error;
use crate::registry::Registry;
use crate::resolver::{self, InvocationContext, Positional, Resolved};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// One unit of remote (or local) work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Run a command on a host over ssh.
    Run { host: String, command: CommandSpec },
    /// Copy a single local file to a host.
    Copy {
        local: PathBuf,
        host: String,
        remote: String,
    },
    /// Ship a local directory to a host as a tarball and unpack it.
    CopyTree {
        local: PathBuf,
        host: String,
        remote_root: String,
    },
    /// Copy a local tree into cloud storage.
    Upload { local: PathBuf, uri: String },
    /// Delete editor backup files from a local tree.
    Clean { dir: PathBuf },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Run { host, command } => {
                write!(f, "Will run:\n  cmd={command}\n  on {host}")
            }
            Step::Copy {
                local,
                host,
                remote,
            } => write!(f, "Will copy:\n  {}\n  to {host}:{remote}", local.display()),
            Step::CopyTree {
                local,
                host,
                remote_root,
            } => write!(
                f,
                "Will ship:\n  {}\n  to {host}:{remote_root}",
                local.display()
            ),
            Step::Upload { local, uri } => {
                write!(f, "Will upload:\n  {}\n  to {uri}", local.display())
            }
            Step::Clean { dir } => {
                write!(f, "Will remove editor backups under:\n  {}", dir.display())
            }
        }
    }
}

/// What an entry point did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// Nothing ran; these steps would have.
    DryRun(Vec<Step>),
    /// Every step ran and succeeded.
    Done,
}

/// Holds the collaborators and configuration every entry point needs.
pub struct App<C> {
    cloud: C,
    settings: Settings,
    defaults: Defaults,
    registry: Registry,
}

impl<C: Cloud> App<C> {
    /// Builds the app, refusing to start with an inconsistent registry.
    pub fn new(cloud: C, settings: Settings, defaults: Defaults) -> Result<Self, Error> {
        let registry = Registry::standard(&settings.prod);
        registry.validate()?;

        Ok(Self {
            cloud,
            settings,
            defaults,
            registry,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[cfg(test)]
    pub(crate) fn cloud(&self) -> &C {
        &self.cloud
    }

    fn resolve<P: Positional>(&self, raw: &[String]) -> Result<Resolved<P>, Error> {
        resolver::resolve(raw, &self.defaults, &self.settings)
    }

    /// Creates the ssh key gcloud uses if it is not there yet.
    async fn ensure_ssh_key(&self) -> Result<(), Error> {
        let path = &self.settings.ssh_key_path;
        if path.exists() {
            return Ok(());
        }

        info!(path = %path.display(), "creating ssh key");
        let key_error = |reason: String| Error::SshKey {
            path: path.clone(),
            reason,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| key_error(e.to_string()))?;
        }
        self.cloud
            .generate_ssh_key(path)
            .await
            .map_err(|e| key_error(e.to_string()))?;

        if !path.exists() {
            return Err(key_error("ssh-keygen did not produce a key".to_string()));
        }
        Ok(())
    }

    async fn instances(&self, ctx: &InvocationContext) -> Result<Vec<Instance>, Error> {
        let instances = self.cloud.list_instances(&ctx.project).await?;
        debug!(project = %ctx.project, count = instances.len(), "listed instances");
        Ok(instances)
    }

    /// Lists the project's instances and returns `host`, or fails if absent.
    async fn find_instance(
        &self,
        func: &'static str,
        ctx: &InvocationContext,
        host: &str,
    ) -> Result<Instance, Error> {
        let instances = self.instances(ctx).await?;
        let instance = find(&instances, func, ctx, host)?;
        info!(
            func,
            host,
            zone = instance.zone_name(),
            status = %instance.status,
            "found instance"
        );
        Ok(instance.clone())
    }

    /// Dry runs hand the steps back; real runs execute them in order.
    async fn finish(
        &self,
        func: &'static str,
        ctx: &InvocationContext,
        steps: Vec<Step>,
    ) -> Result<Report, Error> {
        if ctx.dry_run {
            return Ok(Report::DryRun(steps));
        }
        self.execute(func, ctx, &steps).await?;
        Ok(Report::Done)
    }

    async fn execute(
        &self,
        func: &'static str,
        ctx: &InvocationContext,
        steps: &[Step],
    ) -> Result<(), Error> {
        for step in steps {
            match step {
                Step::Run { host, command } => self.run(func, ctx, host, command).await?,
                Step::Copy {
                    local,
                    host,
                    remote,
                } => {
                    info!(func, host = %host, remote = %remote, "copying {}", local.display());
                    self.cloud.copy_files(ctx, local, host, remote).await?;
                }
                Step::CopyTree {
                    local,
                    host,
                    remote_root,
                } => self.copy_tree(func, ctx, local, host, remote_root).await?,
                Step::Upload { local, uri } => {
                    info!(func, uri = %uri, "uploading {}", local.display());
                    self.cloud.storage_copy(local, uri).await?;
                }
                Step::Clean { dir } => {
                    for removed in archive::remove_backups(dir)? {
                        info!(func, "removed {}", removed.display());
                    }
                }
            }
        }
        Ok(())
    }

    async fn run(
        &self,
        func: &'static str,
        ctx: &InvocationContext,
        host: &str,
        command: &CommandSpec,
    ) -> Result<(), Error> {
        let rendered = command.render();
        info!(func, host, cmd = %rendered, "running");

        let status = self.cloud.ssh(ctx, host, &rendered).await?;
        if status != 0 {
            return Err(Error::Remote {
                func,
                host: host.to_string(),
                status,
            });
        }
        Ok(())
    }
}

fn find<'a>(
    instances: &'a [Instance],
    func: &'static str,
    ctx: &InvocationContext,
    host: &str,
) -> Result<&'a Instance, Error> {
    instances
        .iter()
        .find(|i| i.name == host)
        .ok_or_else(|| Error::InstanceNotFound {
            func,
            host: host.to_string(),
            project: ctx.project.clone(),
        })
}
