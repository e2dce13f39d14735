use super::{parse_instances, Cloud, Instance};
use crate::error::Error;
use crate::resolver::InvocationContext;
use async_trait::async_trait;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// Talks to GCE through the `gcloud`, `gsutil` and `ssh-keygen` binaries.
#[derive(Debug, Clone)]
pub struct GcloudCli {
    gcloud: String,
    gsutil: String,
}

impl Default for GcloudCli {
    fn default() -> Self {
        Self {
            gcloud: "gcloud".to_string(),
            gsutil: "gsutil".to_string(),
        }
    }
}

impl GcloudCli {
    async fn output(program: &'static str, binary: &str, args: &[&str]) -> Result<Output, Error> {
        debug!(program, ?args, "running");
        Command::new(binary)
            .args(args)
            .output()
            .await
            .map_err(|source| Error::Spawn { program, source })
    }

    /// Runs a tool to completion, turning a non-zero exit into an error.
    async fn checked(program: &'static str, binary: &str, args: &[&str]) -> Result<String, Error> {
        let output = Self::output(program, binary, args).await?;
        if !output.status.success() {
            return Err(Error::Tool {
                program,
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Cloud for GcloudCli {
    async fn config_value(&self, property: &str) -> Result<Option<String>, Error> {
        let stdout =
            Self::checked("gcloud", &self.gcloud, &["config", "get-value", property]).await?;
        let value = stdout.trim();
        Ok((!value.is_empty()).then(|| value.to_string()))
    }

    async fn list_instances(&self, project: &str) -> Result<Vec<Instance>, Error> {
        let stdout = Self::checked(
            "gcloud",
            &self.gcloud,
            &[
                "compute",
                "instances",
                "list",
                "--project",
                project,
                "--format=json",
            ],
        )
        .await?;
        parse_instances(&stdout)
    }

    async fn ssh(&self, ctx: &InvocationContext, host: &str, command: &str) -> Result<i32, Error> {
        let args = [
            "compute",
            "--project",
            ctx.project.as_str(),
            "ssh",
            "--zone",
            ctx.zone.as_str(),
            host,
            "--command",
            command,
        ];
        debug!(program = "gcloud", ?args, "running");

        // The remote command owns the terminal; its status is the result.
        let status = Command::new(&self.gcloud)
            .args(args)
            .status()
            .await
            .map_err(|source| Error::Spawn {
                program: "gcloud",
                source,
            })?;
        Ok(status.code().unwrap_or(-1))
    }

    async fn copy_files(
        &self,
        ctx: &InvocationContext,
        local: &Path,
        host: &str,
        remote: &str,
    ) -> Result<(), Error> {
        let local = local.to_string_lossy();
        let target = format!("{host}:{remote}");
        Self::checked(
            "gcloud",
            &self.gcloud,
            &[
                "compute",
                "copy-files",
                "--project",
                ctx.project.as_str(),
                "--zone",
                ctx.zone.as_str(),
                &*local,
                target.as_str(),
            ],
        )
        .await?;
        Ok(())
    }

    async fn storage_copy(&self, local: &Path, uri: &str) -> Result<(), Error> {
        let local = local.to_string_lossy();
        Self::checked("gsutil", &self.gsutil, &["cp", "-R", &*local, uri]).await?;
        Ok(())
    }

    async fn generate_ssh_key(&self, path: &Path) -> Result<(), Error> {
        let path = path.to_string_lossy();
        Self::checked(
            "ssh-keygen",
            "ssh-keygen",
            &["-t", "rsa", "-q", "-N", "", "-f", &*path],
        )
        .await?;
        Ok(())
    }
}
