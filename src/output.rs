//! Stage outputs
//!
//! An [`Output`] is an artifact a stage produces (or imports). It knows its
//! checksum, whether it is cached at all, and which cache entries are needed
//! to restore it.

use crate::cache::{CacheStore, NamedCache, Scheme};
use crate::checksum::Checksum;
use crate::error::{DvcError, DvcResult};
use crate::report::LogSink;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Command suggested when an output has no recorded checksum
pub const REPRO_COMMAND: &str = "dvc repro";

/// Command suggested to record the checksum of an existing output
pub const COMMIT_COMMAND: &str = "dvc commit";

/// Existence checks against the working tree
pub trait WorkingTree: Send + Sync {
    /// Whether `path` (as written in the pointer file) exists
    fn exists(&self, path: &str) -> bool;
}

/// Working tree rooted at a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalTree {
    root: PathBuf,
}

impl LocalTree {
    /// Create a tree rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a pointer-file path against the root
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl WorkingTree for LocalTree {
    fn exists(&self, path: &str) -> bool {
        Scheme::from_path(path).is_local() && self.resolve(path).exists()
    }
}

/// Origin of an output imported from another repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSource {
    /// Repository URL
    pub url: String,
    /// Requested revision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Resolved revision at import time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_lock: Option<String>,
}

/// What an output is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputKind {
    /// A single file
    File,
    /// A directory tracked through a manifest
    Directory,
    /// An artifact imported from another repository, never cached locally
    Import(RepoSource),
}

/// Everything `get_used_cache` needs from its surroundings
pub struct UsedCacheContext<'a> {
    /// Object store holding directory manifests
    pub store: &'a CacheStore,
    /// Working tree for existence checks
    pub tree: &'a dyn WorkingTree,
    /// Where warnings go
    pub sink: &'a dyn LogSink,
}

/// An artifact produced by a stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    path: String,
    stage: String,
    use_cache: bool,
    checksum: Option<Checksum>,
    kind: OutputKind,
    scheme: Scheme,
}

impl Output {
    /// Create a cached output of `stage`; the kind follows the checksum
    pub fn new(
        stage: impl Into<String>,
        path: impl Into<String>,
        checksum: Option<Checksum>,
    ) -> Self {
        let path = path.into();
        let kind = kind_of(checksum.as_ref());
        Self {
            scheme: Scheme::from_path(&path),
            path,
            stage: stage.into(),
            use_cache: true,
            checksum,
            kind,
        }
    }

    /// Create an output imported from another repository
    pub fn import(
        stage: impl Into<String>,
        path: impl Into<String>,
        checksum: Option<Checksum>,
        source: RepoSource,
    ) -> Self {
        Self {
            kind: OutputKind::Import(source),
            ..Self::new(stage, path, checksum)
        }
    }

    /// Enable or disable caching
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Path as written in the pointer file
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Addressing of the owning stage
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Whether the output is stored in the cache
    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    /// Recorded checksum, `None` if unknown
    pub fn checksum(&self) -> Option<&Checksum> {
        self.checksum.as_ref()
    }

    /// File, directory or import
    pub fn kind(&self) -> &OutputKind {
        &self.kind
    }

    /// Storage scheme of the output
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Whether the output comes from another repository
    pub fn is_import(&self) -> bool {
        matches!(self.kind, OutputKind::Import(_))
    }

    /// Whether the output is a tracked directory
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, OutputKind::Directory)
    }

    /// Replace the recorded checksum
    ///
    /// Imports stay imports; everything else becomes a file or directory
    /// according to the new checksum.
    pub fn set_checksum(&mut self, checksum: Option<Checksum>) {
        if !self.is_import() {
            self.kind = kind_of(checksum.as_ref());
        }
        self.checksum = checksum;
    }

    /// Whether the output is present in the working tree
    pub fn exists(&self, tree: &dyn WorkingTree) -> bool {
        tree.exists(&self.path)
    }

    /// Absolute location of a local output below `root`
    pub fn local_path(&self, root: &Path) -> PathBuf {
        root.join(&self.path)
    }

    /// Cache entries needed to restore this output
    ///
    /// Outputs without a recorded checksum contribute nothing and produce a
    /// warning instead of an error, so a pipeline-wide collection can carry
    /// on past them.
    pub fn get_used_cache(&self, ctx: &UsedCacheContext<'_>) -> DvcResult<NamedCache> {
        let mut cache = NamedCache::new();

        if !self.use_cache || self.is_import() {
            return Ok(cache);
        }

        let checksum = match &self.checksum {
            Some(checksum) => checksum,
            None => {
                let exists = self.exists(ctx.tree);
                ctx.sink.warn(&self.missing_version_message(exists));
                return Ok(cache);
            }
        };

        cache.add(self.scheme, checksum.clone(), self.path.clone());
        if !checksum.is_dir() {
            return Ok(cache);
        }

        let manifest = match ctx.store.load_manifest(checksum) {
            Ok(manifest) => manifest,
            Err(DvcError::MissingCache(_)) => {
                ctx.sink.warn(&format!(
                    "Missing cache for directory '{}'. Cache for files inside will be lost.",
                    self.path
                ));
                return Ok(cache);
            }
            Err(e) => return Err(e),
        };

        debug!(
            "Collecting {} files of directory output '{}'",
            manifest.len(),
            self.path
        );
        for entry in manifest.entries() {
            cache.add_child(
                self.scheme,
                checksum,
                entry.md5.clone(),
                format!("{}/{}", self.path, entry.relpath),
            );
        }

        Ok(cache)
    }

    fn missing_version_message(&self, exists: bool) -> String {
        let mut msg = format!(
            "Output '{}'(stage: '{}') is missing version info. \
             Cache for it will not be collected. \
             Use `{}` to get your pipeline up to date.",
            self.path, self.stage, REPRO_COMMAND
        );
        if exists {
            msg.push_str(&format!(
                "\nYou can also use `{} {}` to associate existing '{}' with stage: '{}'.",
                COMMIT_COMMAND, self.stage, self.path, self.stage
            ));
        }
        msg
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

fn kind_of(checksum: Option<&Checksum>) -> OutputKind {
    match checksum {
        Some(c) if c.is_dir() => OutputKind::Directory,
        _ => OutputKind::File,
    }
}
