//! Stages and their pointer files
//!
//! A stage is described by a small YAML file committed to git in place of
//! the data itself:
//!
//! ```yaml
//! outs:
//! - md5: 5ea40360f5b4ec688df672a4db9c17d1.dir
//!   path: data
//! ```
//!
//! Paths inside a pointer file are relative to the directory holding it,
//! or to its `wdir` when one is given. Keys not modelled here are kept
//! as-is so rewriting a pointer never loses them.

use crate::cache::NamedCache;
use crate::checksum::{self, Checksum};
use crate::error::{DvcError, DvcResult};
use crate::output::{Output, RepoSource, UsedCacheContext};
use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// File extension of pointer files
pub const POINTER_EXT: &str = "dvc";

fn is_false(value: &bool) -> bool {
    !*value
}

/// Dependency entry of a pointer file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepEntry {
    /// Recorded checksum
    #[serde(
        default,
        deserialize_with = "checksum::deserialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub md5: Option<Checksum>,
    /// Dependency path
    pub path: String,
    /// Source repository for imports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<RepoSource>,
    /// Unmodelled keys
    #[serde(flatten)]
    pub extra: Mapping,
}

/// Output entry of a pointer file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutEntry {
    /// Recorded checksum
    #[serde(
        default,
        deserialize_with = "checksum::deserialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub md5: Option<Checksum>,
    /// Output path
    pub path: String,
    /// Set to `false` for outputs kept out of the cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,
    /// Unmodelled keys (`persist`, `metric`, ...)
    #[serde(flatten)]
    pub extra: Mapping,
}

impl OutEntry {
    /// Entry for a freshly added output
    pub fn new(path: impl Into<String>, md5: Option<Checksum>) -> Self {
        Self {
            md5,
            path: path.into(),
            cache: None,
            extra: Mapping::new(),
        }
    }
}

/// On-disk form of a stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerFile {
    /// Checksum of the stage definition
    #[serde(
        default,
        deserialize_with = "checksum::deserialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub md5: Option<Checksum>,
    /// Command producing the outputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    /// Directory output paths are relative to, from the pointer's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wdir: Option<String>,
    /// Inputs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<DepEntry>,
    /// Outputs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outs: Vec<OutEntry>,
    /// Frozen stages are never re-run
    #[serde(default, skip_serializing_if = "is_false")]
    pub frozen: bool,
    /// Unmodelled keys (`meta`, `desc`, `locked`, ...)
    #[serde(flatten)]
    pub extra: Mapping,
}

impl PointerFile {
    /// Parse pointer file text; blank text is an empty stage
    pub fn parse(text: &str, path: &Path) -> DvcResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| DvcError::PointerInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Read and parse a pointer file
    pub fn load(path: &Path) -> DvcResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| DvcError::io(format!("reading {}", path.display()), e))?;
        Self::parse(&text, path)
    }

    /// Serialize to YAML
    pub fn dump(&self) -> DvcResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write to `path`
    pub fn save(&self, path: &Path) -> DvcResult<()> {
        let text = self.dump()?;
        fs::write(path, text).map_err(|e| DvcError::io(format!("writing {}", path.display()), e))
    }
}

/// A stage loaded from a pointer file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    addressing: String,
    wdir: PathBuf,
    pointer: PointerFile,
    outs: Vec<Output>,
}

impl Stage {
    /// Build a stage from a parsed pointer file
    ///
    /// `addressing` is how users name the stage (its pointer file path
    /// relative to the repo root); `wdir` is the directory output paths are
    /// relative to.
    pub fn from_pointer(
        addressing: impl Into<String>,
        wdir: impl Into<PathBuf>,
        pointer: PointerFile,
    ) -> Self {
        let addressing = addressing.into();
        let import_source = pointer.deps.first().and_then(|d| d.repo.clone());

        let outs = pointer
            .outs
            .iter()
            .map(|entry| match &import_source {
                Some(source) => Output::import(
                    addressing.clone(),
                    entry.path.clone(),
                    entry.md5.clone(),
                    source.clone(),
                ),
                None => Output::new(addressing.clone(), entry.path.clone(), entry.md5.clone())
                    .with_cache(entry.cache.unwrap_or(true)),
            })
            .collect();

        Self {
            addressing,
            wdir: wdir.into(),
            pointer,
            outs,
        }
    }

    /// Load the pointer file at `root/relpath`
    pub fn load(root: &Path, relpath: &Path) -> DvcResult<Self> {
        let path = root.join(relpath);
        if !path.is_file() {
            return Err(DvcError::StageNotFound(relpath.to_path_buf()));
        }
        let pointer = PointerFile::load(&path)?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.to_path_buf());
        let wdir = match &pointer.wdir {
            Some(wdir) => clean_path(&dir.join(wdir)),
            None => dir,
        };
        Ok(Self::from_pointer(addressing_of(relpath), wdir, pointer))
    }

    /// Stage for a single freshly added output
    pub fn for_output(root: &Path, relpath: &Path, out_path: &str, checksum: Checksum) -> Self {
        let pointer = PointerFile {
            outs: vec![OutEntry::new(out_path, Some(checksum))],
            ..PointerFile::default()
        };
        let path = root.join(relpath);
        let wdir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.to_path_buf());
        Self::from_pointer(addressing_of(relpath), wdir, pointer)
    }

    /// How users refer to this stage
    pub fn addressing(&self) -> &str {
        &self.addressing
    }

    /// Directory output paths are relative to
    pub fn wdir(&self) -> &Path {
        &self.wdir
    }

    /// Outputs in pointer-file order
    pub fn outs(&self) -> &[Output] {
        &self.outs
    }

    /// Mutable outputs, for checksum refreshes
    pub fn outs_mut(&mut self) -> &mut [Output] {
        &mut self.outs
    }

    /// Whether the stage imports its outputs from another repository
    pub fn is_repo_import(&self) -> bool {
        self.pointer.deps.first().is_some_and(|d| d.repo.is_some())
    }

    /// Cache entries needed by every output of this stage
    pub fn get_used_cache(&self, ctx: &UsedCacheContext<'_>) -> DvcResult<NamedCache> {
        let mut cache = NamedCache::new();
        for out in &self.outs {
            cache.update(out.get_used_cache(ctx)?);
        }
        Ok(cache)
    }

    /// Pointer file reflecting the current output checksums
    ///
    /// The stage checksum covers the outputs, so it is dropped once any of
    /// them changed.
    pub fn to_pointer(&self) -> PointerFile {
        let mut pointer = self.pointer.clone();
        let mut changed = false;
        for (entry, out) in pointer.outs.iter_mut().zip(&self.outs) {
            let current = out.checksum().cloned();
            if entry.md5 != current {
                entry.md5 = current;
                changed = true;
            }
        }
        if changed {
            pointer.md5 = None;
        }
        pointer
    }

    /// Write the pointer file back to `root/<addressing>`
    pub fn save(&self, root: &Path) -> DvcResult<()> {
        self.to_pointer().save(&root.join(&self.addressing))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage: '{}'", self.addressing)
    }
}

/// `/`-separated addressing for a pointer file path
fn addressing_of(relpath: &Path) -> String {
    relpath
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolve `.` and `..` components without touching the filesystem
fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    cleaned.push(component);
                }
            }
            other => cleaned.push(other),
        }
    }
    cleaned
}

/// Pointer file path for an output path (`data` → `data.dvc`)
pub fn pointer_path_for(out: &Path) -> PathBuf {
    let mut name = out.as_os_str().to_os_string();
    name.push(".");
    name.push(POINTER_EXT);
    PathBuf::from(name)
}
