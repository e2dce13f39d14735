use super::{archive, App, Report, Step};
use crate::cloud::Cloud;
use crate::command::CommandSpec;
use crate::error::Error;
use crate::resolver::{
    InvocationContext, Positional, PushDockerfilesArgs, SyncImagesArgs, UpdateImageArgs,
};
use std::path::Path;
use tracing::info;

impl<C: Cloud> App<C> {
    /// Uploads the local Dockerfile tree to the cloud storage mirror.
    pub async fn push_dockerfiles(&self, raw: &[String]) -> Result<Report, Error> {
        let func = PushDockerfilesArgs::FUNC;
        let resolved = self.resolve::<PushDockerfilesArgs>(raw)?;
        let PushDockerfilesArgs {
            docker_dir,
            storage_uri,
        } = resolved.args;

        if !docker_dir.is_dir() {
            return Err(Error::DirectoryNotFound {
                func,
                path: docker_dir,
            });
        }

        let steps = vec![
            Step::Clean {
                dir: docker_dir.clone(),
            },
            Step::Upload {
                local: docker_dir,
                uri: storage_uri,
            },
        ];
        self.finish(func, &resolved.ctx, steps).await
    }

    /// Rebuilds one docker image on a host from a Dockerfile already there.
    pub async fn update_image(&self, raw: &[String]) -> Result<Report, Error> {
        let func = UpdateImageArgs::FUNC;
        let resolved = self.resolve::<UpdateImageArgs>(raw)?;
        self.ensure_ssh_key().await?;

        let args = resolved.args;
        self.find_instance(func, &resolved.ctx, &args.host).await?;

        let command = CommandSpec::new(["source", self.settings.remote_func_lib.as_str()])
            .and_then([
                "grpc_dockerfile_install",
                args.image_label.as_str(),
                args.docker_dir.as_str(),
            ]);
        let steps = vec![Step::Run {
            host: args.host,
            command,
        }];
        self.finish(func, &resolved.ctx, steps).await
    }

    /// Refreshes the shared function library, and optionally the Dockerfile
    /// tree, on each host in turn, then pulls the known images there.
    pub async fn sync_images(&self, raw: &[String]) -> Result<Report, Error> {
        let func = SyncImagesArgs::FUNC;
        let resolved = self.resolve::<SyncImagesArgs>(raw)?;
        self.ensure_ssh_key().await?;

        let ctx = &resolved.ctx;
        let args = &resolved.args;
        if !args.script_root.is_dir() {
            return Err(Error::DirectoryNotFound {
                func,
                path: args.script_root.clone(),
            });
        }
        if let Some(root) = &args.dockerfile_root {
            if !root.is_dir() {
                return Err(Error::DirectoryNotFound {
                    func,
                    path: root.clone(),
                });
            }
        }

        let remote_lib = &self.settings.remote_func_lib;
        let lib_name = Path::new(remote_lib)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        let local_lib = args.script_root.join(lib_name);

        let mut planned = Vec::new();
        for host in &args.hosts {
            self.find_instance(func, ctx, host).await?;
            info!(func, host = %host, "syncing");

            let mut steps = vec![Step::Copy {
                local: local_lib.clone(),
                host: host.clone(),
                remote: remote_lib.clone(),
            }];
            if let Some(root) = &args.dockerfile_root {
                steps.push(Step::CopyTree {
                    local: root.clone(),
                    host: host.clone(),
                    remote_root: self.settings.remote_dockerfile_root.clone(),
                });
            }
            steps.push(Step::Run {
                host: host.clone(),
                command: CommandSpec::new(["source", remote_lib.as_str()])
                    .and_then(["grpc_docker_pull_known"]),
            });

            if ctx.dry_run {
                planned.extend(steps);
            } else {
                self.execute(func, ctx, &steps).await?;
            }
        }

        if ctx.dry_run {
            Ok(Report::DryRun(planned))
        } else {
            Ok(Report::Done)
        }
    }

    pub(super) async fn copy_tree(
        &self,
        func: &'static str,
        ctx: &InvocationContext,
        local: &Path,
        host: &str,
        remote_root: &str,
    ) -> Result<(), Error> {
        let name = format!("interopctl-{}.tar.gz", uuid::Uuid::new_v4());
        let tarball = std::env::temp_dir().join(&name);
        archive::write_tarball(local, &tarball)?;

        let remote_tarball = format!("/tmp/{name}");
        let copied = self.cloud.copy_files(ctx, &tarball, host, &remote_tarball).await;
        // The local tarball is no longer needed whatever happened.
        let _ = std::fs::remove_file(&tarball);
        copied?;

        let unpack = CommandSpec::new(["sudo", "mkdir", "-p", remote_root])
            .and_then(["sudo", "tar", "-xzf", remote_tarball.as_str(), "-C", remote_root])
            .and_then(["rm", "-f", remote_tarball.as_str()]);
        self.run(func, ctx, host, &unpack).await
    }
}
