//! Configuration management for dvc

pub mod schema;

pub use schema::{CacheConfig, Config, CoreConfig, RemoteConfig};

use crate::error::{DvcError, DvcResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Repo config file, relative to the repo root
pub const REPO_CONFIG: &str = ".dvc/config.toml";

/// Untracked per-checkout config file, relative to the repo root
pub const LOCAL_CONFIG: &str = ".dvc/config.local.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom global config path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default global config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dvc")
            .join("config.toml")
    }

    /// Repo config file of the repository at `root`
    pub fn repo_config_path(root: &Path) -> PathBuf {
        root.join(REPO_CONFIG)
    }

    /// Local config file of the repository at `root`
    pub fn local_config_path(root: &Path) -> PathBuf {
        root.join(LOCAL_CONFIG)
    }

    /// Load the global configuration only
    pub async fn load(&self) -> DvcResult<Config> {
        self.load_merged(None).await
    }

    /// Load global, repo and local configuration, later files winning key by key
    pub async fn load_merged(&self, repo_root: Option<&Path>) -> DvcResult<Config> {
        let mut files = vec![self.config_path.clone()];
        if let Some(root) = repo_root {
            files.push(Self::repo_config_path(root));
            files.push(Self::local_config_path(root));
        }

        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut last = self.config_path.clone();
        for path in files {
            if let Some(value) = read_toml(&path).await? {
                debug!("Loaded config from {}", path.display());
                merge_toml(&mut merged, value);
                last = path;
            }
        }

        merged.try_into().map_err(|e: toml::de::Error| DvcError::ConfigInvalid {
            path: last,
            reason: e.to_string(),
        })
    }

    /// Get the global config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a TOML file as a raw value tree, `None` if it does not exist
pub async fn read_toml(path: &Path) -> DvcResult<Option<toml::Value>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| DvcError::io(format!("reading config from {}", path.display()), e))?;

    let value: toml::Value = content
        .parse()
        .map_err(|e: toml::de::Error| DvcError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !value.is_table() {
        return Err(DvcError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: "expected a table".to_string(),
        });
    }
    Ok(Some(value))
}

/// Overlay `overlay` onto `base`, merging nested tables
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
