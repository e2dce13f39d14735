mod gcloud;

#[cfg(test)]
pub mod fake;

pub use gcloud::GcloudCli;

use crate::error::Error;
use crate::resolver::InvocationContext;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    #[serde(default, rename = "networkIP")]
    pub network_ip: Option<String>,
}

/// One row of `gcloud compute instances list`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub name: String,
    /// Full zone URL as reported by the API.
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
}

impl Instance {
    /// Short zone name, e.g. `asia-east1-a`.
    pub fn zone_name(&self) -> &str {
        self.zone.rsplit('/').next().unwrap_or(&self.zone)
    }

    pub fn internal_ip(&self) -> Option<&str> {
        self.network_interfaces
            .iter()
            .find_map(|nic| nic.network_ip.as_deref())
    }
}

/// Parses the JSON form of an instance listing.
pub fn parse_instances(raw: &str) -> Result<Vec<Instance>, Error> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}

/// Everything this tool asks of the outside world.
///
/// Calls are made one at a time and each blocks until the underlying tool
/// finishes.
#[async_trait]
pub trait Cloud: Send + Sync {
    /// Reads an ambient gcloud property such as `project` or `compute/zone`.
    async fn config_value(&self, property: &str) -> Result<Option<String>, Error>;

    async fn list_instances(&self, project: &str) -> Result<Vec<Instance>, Error>;

    /// Runs `command` on `host` and returns the remote exit status.
    async fn ssh(&self, ctx: &InvocationContext, host: &str, command: &str) -> Result<i32, Error>;

    /// Copies a local file to `host:remote`.
    async fn copy_files(
        &self,
        ctx: &InvocationContext,
        local: &Path,
        host: &str,
        remote: &str,
    ) -> Result<(), Error>;

    /// Recursively copies a local tree into cloud storage.
    async fn storage_copy(&self, local: &Path, uri: &str) -> Result<(), Error>;

    async fn generate_ssh_key(&self, path: &Path) -> Result<(), Error>;
}
