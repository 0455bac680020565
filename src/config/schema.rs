//! Configuration schema for dvc
//!
//! Configuration is read from, in increasing priority:
//! `~/.config/dvc/config.toml`, `<repo>/.dvc/config.toml` and
//! `<repo>/.dvc/config.local.toml`.
//!
//! ```toml
//! [core]
//! remote = "storage"
//!
//! [cache]
//! dir = "/mnt/shared/dvc-cache"
//!
//! [remote.storage]
//! url = "/mnt/backup/dvc"
//! ```

use crate::cache::Scheme;
use crate::error::{DvcError, DvcResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Core settings
    pub core: CoreConfig,

    /// Cache settings
    pub cache: CacheConfig,

    /// Named remotes
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub remote: BTreeMap<String, RemoteConfig>,
}

/// Core settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Remote used when none is named on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

/// Cache settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory; relative paths are resolved against the repo root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// A named remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Remote location (a directory path for local remotes)
    pub url: String,
}

impl RemoteConfig {
    /// Storage scheme of the remote
    pub fn scheme(&self) -> Scheme {
        Scheme::from_path(&self.url)
    }
}

impl Config {
    /// Cache directory for a repository rooted at `root`
    pub fn cache_dir(&self, root: &Path) -> PathBuf {
        match &self.cache.dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => root.join(dir),
            None => root.join(".dvc").join("cache"),
        }
    }

    /// Look up a remote by name, falling back to `core.remote`
    pub fn resolve_remote<'a>(
        &'a self,
        name: Option<&'a str>,
    ) -> DvcResult<(&'a str, &'a RemoteConfig)> {
        let name = name
            .or(self.core.remote.as_deref())
            .ok_or(DvcError::NoRemote)?;
        let remote = self
            .remote
            .get(name)
            .ok_or_else(|| DvcError::RemoteNotFound(name.to_string()))?;
        Ok((name, remote))
    }
}
