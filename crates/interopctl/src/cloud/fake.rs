use super::{Cloud, Instance, NetworkInterface};
use crate::error::Error;
use crate::resolver::InvocationContext;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListInstances { project: String },
    Ssh { host: String, command: String },
    CopyFiles { local: PathBuf, host: String, remote: String },
    StorageCopy { local: PathBuf, uri: String },
    GenerateSshKey { path: PathBuf },
}

impl Call {
    /// True for calls that act on a remote machine or bucket.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Call::Ssh { .. } | Call::CopyFiles { .. } | Call::StorageCopy { .. }
        )
    }
}

/// Records every call and answers from canned data.
#[derive(Debug, Default)]
pub struct FakeCloud {
    config: HashMap<String, String>,
    instances: Vec<Instance>,
    ssh_status: HashMap<String, i32>,
    calls: Mutex<Vec<Call>>,
}

impl FakeCloud {
    pub fn with_config(mut self, property: &str, value: &str) -> Self {
        self.config.insert(property.to_string(), value.to_string());
        self
    }

    pub fn with_instance(mut self, name: &str, ip: &str) -> Self {
        self.instances.push(Instance {
            name: name.to_string(),
            zone: "https://www.googleapis.com/compute/v1/projects/p/zones/asia-east1-a"
                .to_string(),
            status: "RUNNING".to_string(),
            network_interfaces: vec![NetworkInterface {
                network_ip: Some(ip.to_string()),
            }],
        });
        self
    }

    pub fn with_ssh_status(mut self, host: &str, status: i32) -> Self {
        self.ssh_status.insert(host.to_string(), status);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn remote_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_remote).collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Cloud for FakeCloud {
    async fn config_value(&self, property: &str) -> Result<Option<String>, Error> {
        Ok(self.config.get(property).cloned())
    }

    async fn list_instances(&self, project: &str) -> Result<Vec<Instance>, Error> {
        self.record(Call::ListInstances {
            project: project.to_string(),
        });
        Ok(self.instances.clone())
    }

    async fn ssh(&self, _ctx: &InvocationContext, host: &str, command: &str) -> Result<i32, Error> {
        self.record(Call::Ssh {
            host: host.to_string(),
            command: command.to_string(),
        });
        Ok(self.ssh_status.get(host).copied().unwrap_or(0))
    }

    async fn copy_files(
        &self,
        _ctx: &InvocationContext,
        local: &Path,
        host: &str,
        remote: &str,
    ) -> Result<(), Error> {
        self.record(Call::CopyFiles {
            local: local.to_path_buf(),
            host: host.to_string(),
            remote: remote.to_string(),
        });
        Ok(())
    }

    async fn storage_copy(&self, local: &Path, uri: &str) -> Result<(), Error> {
        self.record(Call::StorageCopy {
            local: local.to_path_buf(),
            uri: uri.to_string(),
        });
        Ok(())
    }

    async fn generate_ssh_key(&self, path: &Path) -> Result<(), Error> {
        self.record(Call::GenerateSshKey {
            path: path.to_path_buf(),
        });
        std::fs::write(path, "fake key")?;
        Ok(())
    }
}
