use crate::cloud::Cloud;
use crate::error::Error;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Values gcloud prints for a property nobody has set.
const UNSET_SENTINELS: &[&str] = &["", "(unset)", "None"];

/// The production sandbox endpoint cloud-prod clients talk to.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ProdEndpoint {
    pub host: String,
    pub port: u16,
    pub oauth_scope: String,
    /// Path of the service account key inside the client container.
    pub service_account_key_file: String,
    pub default_service_account: String,
}

impl Default for ProdEndpoint {
    fn default() -> Self {
        Self {
            host: "grpc-test.sandbox.google.com".to_string(),
            port: 443,
            oauth_scope: "https://www.googleapis.com/auth/xapi.zoo".to_string(),
            service_account_key_file: "/service_account/interop-test-key.json".to_string(),
            default_service_account: "interop-test@developer.gserviceaccount.com".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub fallback_project: String,
    pub fallback_zone: String,
    pub ssh_key_path: PathBuf,
    pub storage_root: String,
    pub dockerfile_root: PathBuf,
    pub script_root: PathBuf,
    pub remote_func_lib: String,
    pub remote_dockerfile_root: String,
    pub prod: ProdEndpoint,
}

impl Default for Settings {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            fallback_project: "stoked-keyword-656".to_string(),
            fallback_zone: "asia-east1-a".to_string(),
            ssh_key_path: home.join(".ssh").join("google_compute_engine"),
            storage_root: "gs://tmp-grpc-dev/admin/".to_string(),
            dockerfile_root: PathBuf::from("tools/dockerfile"),
            script_root: PathBuf::from("tools/gce_setup"),
            remote_func_lib: "/var/local/startup_scripts/shared_startup_funcs.sh".to_string(),
            remote_dockerfile_root: "/var/local/dockerfile".to_string(),
            prod: ProdEndpoint::default(),
        }
    }
}

impl Settings {
    /// Default locations searched when no path is given, lowest priority first.
    fn config_paths() -> Vec<PathBuf> {
        let Some(home) = dirs::home_dir() else {
            return Vec::new();
        };
        vec![
            home.join(".config").join("interopctl.toml"),
            home.join(".interopctl.toml"),
        ]
    }

    /// Loads settings from compiled-in defaults overlaid with TOML files.
    ///
    /// An explicit `path_override` must exist; the default locations are
    /// optional. When several files are read, later ones win per key.
    pub fn load(path_override: Option<&Path>) -> Result<Self, Error> {
        match path_override {
            Some(path) => Self::load_files(&[path.to_path_buf()], true),
            None => Self::load_files(&Self::config_paths(), false),
        }
    }

    fn load_files(paths: &[PathBuf], required: bool) -> Result<Self, Error> {
        let mut files = Vec::new();
        for path in paths {
            if required || path.is_file() {
                files.push((path.clone(), read_table(path)?));
            }
        }

        let mut merged = toml::Table::new();
        for (_, table) in &files {
            merge_tables(&mut merged, table.clone());
        }

        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| Error::Config {
                path: blame(&files),
                reason: e.to_string(),
            })
    }
}

/// The last file that is invalid on its own, else the last file read.
fn blame(files: &[(PathBuf, toml::Table)]) -> PathBuf {
    files
        .iter()
        .rev()
        .find(|(_, table)| {
            let parsed: Result<Settings, _> = toml::Value::Table(table.clone()).try_into();
            parsed.is_err()
        })
        .or(files.last())
        .map(|(path, _)| path.clone())
        .unwrap_or_default()
}

fn read_table(path: &Path) -> Result<toml::Table, Error> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    raw.parse().map_err(|e: toml::de::Error| Error::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn merge_tables(into: &mut toml::Table, from: toml::Table) {
    for (key, value) in from {
        match (into.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming)
            }
            (_, value) => {
                into.insert(key, value);
            }
        }
    }
}

/// Project and zone used when no `-p`/`-z` flag is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub project: String,
    pub zone: String,
}

impl Defaults {
    /// Defaults that skip the ambient gcloud configuration entirely.
    pub fn fallback(settings: &Settings) -> Self {
        Self {
            project: settings.fallback_project.clone(),
            zone: settings.fallback_zone.clone(),
        }
    }

    /// Reads the current gcloud project and zone, falling back to the
    /// configured values for anything unset.
    pub async fn ambient<C: Cloud + ?Sized>(cloud: &C, settings: &Settings) -> Result<Self, Error> {
        let project = cloud.config_value("project").await?;
        let zone = cloud.config_value("compute/zone").await?;

        Ok(Self {
            project: or_fallback(project, &settings.fallback_project),
            zone: or_fallback(zone, &settings.fallback_zone),
        })
    }
}

fn or_fallback(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(v) if !UNSET_SENTINELS.contains(&v.trim()) => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}
