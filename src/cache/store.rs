//! Content-addressed object store
//!
//! Objects live at `<root>/<first two chars>/<rest of checksum>`, so a cache
//! with millions of files never puts more than a few thousand entries in one
//! directory. File objects hold the file bytes; directory objects hold the
//! canonical manifest JSON.

use crate::checksum::Checksum;
use crate::error::{DvcError, DvcResult};
use crate::manifest::DirManifest;
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Read buffer size for streaming hashes
const HASH_CHUNK: usize = 64 * 1024;

/// Directory names never treated as data inside a tracked directory
const SKIP_DIRS: &[&str] = &[".dvc", ".git"];

/// Hash a file's contents with md5
pub fn hash_file(path: &Path) -> DvcResult<Checksum> {
    let mut file = fs::File::open(path)
        .map_err(|e| DvcError::io(format!("opening {}", path.display()), e))?;

    let mut context = md5::Context::new();
    let mut buf = vec![0u8; HASH_CHUNK];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| DvcError::io(format!("reading {}", path.display()), e))?;
        if n == 0 {
            break;
        }
        context.consume(&buf[..n]);
    }

    Ok(Checksum::from_digest(context.compute()))
}

/// Build the manifest of a directory on disk without touching any cache
pub fn scan_dir(dir: &Path) -> DvcResult<DirManifest> {
    let mut pairs = Vec::new();
    for (relpath, path) in walk_files(dir)? {
        pairs.push((relpath, hash_file(&path)?));
    }
    Ok(DirManifest::new(pairs))
}

/// Every file below `dir` as `(relpath, absolute path)`
///
/// Symlinks to files count as files. Symlinked directories are listed by
/// the walk but never descended into.
fn walk_files(dir: &Path) -> DvcResult<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir()
                && SKIP_DIRS.iter().any(|s| e.file_name() == *s))
        });

    for entry in walker {
        let entry = entry.map_err(|e| DvcError::User(format!("walking {}: {}", dir.display(), e)))?;
        if !entry.path().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(dir)
            .map_err(|_| DvcError::User(format!("{} escapes {}", entry.path().display(), dir.display())))?;
        files.push((to_relpath(rel), entry.path().to_path_buf()));
    }
    Ok(files)
}

/// Convert a relative path to the `/`-separated manifest form
fn to_relpath(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Local content-addressed cache directory
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Open a store rooted at `root` (created lazily on first write)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the object for `checksum`
    pub fn object_path(&self, checksum: &Checksum) -> PathBuf {
        let (prefix, rest) = checksum.shard();
        self.root.join(prefix).join(rest)
    }

    /// Whether the object for `checksum` is present
    pub fn contains(&self, checksum: &Checksum) -> bool {
        self.object_path(checksum).is_file()
    }

    /// Hash a file and copy it into the store
    pub fn save_file(&self, path: &Path) -> DvcResult<Checksum> {
        let checksum = hash_file(path)?;
        if self.contains(&checksum) {
            debug!("Cache hit for {} ({})", path.display(), checksum);
            return Ok(checksum);
        }

        let dest = self.object_path(&checksum);
        ensure_parent(&dest)?;
        fs::copy(path, &dest).map_err(|e| {
            DvcError::io(format!("copying {} into cache", path.display()), e)
        })?;
        debug!("Cached {} as {}", path.display(), checksum);
        Ok(checksum)
    }

    /// Store every file of a directory plus its manifest
    pub fn save_dir(&self, dir: &Path) -> DvcResult<(Checksum, DirManifest)> {
        let mut pairs = Vec::new();
        for (relpath, path) in walk_files(dir)? {
            pairs.push((relpath, self.save_file(&path)?));
        }
        let manifest = DirManifest::new(pairs);
        let checksum = self.save_manifest(&manifest)?;
        debug!(
            "Cached directory {} ({} files) as {}",
            dir.display(),
            manifest.len(),
            checksum
        );
        Ok((checksum, manifest))
    }

    /// Store a manifest object, returning its directory checksum
    pub fn save_manifest(&self, manifest: &DirManifest) -> DvcResult<Checksum> {
        let bytes = manifest.to_json()?;
        let checksum = Checksum::from_digest(md5::compute(&bytes)).to_dir();
        let dest = self.object_path(&checksum);
        if !dest.is_file() {
            ensure_parent(&dest)?;
            fs::write(&dest, &bytes)
                .map_err(|e| DvcError::io(format!("writing {}", dest.display()), e))?;
        }
        Ok(checksum)
    }

    /// Load a manifest object
    pub fn load_manifest(&self, checksum: &Checksum) -> DvcResult<DirManifest> {
        let path = self.object_path(checksum);
        if !path.is_file() {
            return Err(DvcError::MissingCache(checksum.clone()));
        }
        let bytes =
            fs::read(&path).map_err(|e| DvcError::io(format!("reading {}", path.display()), e))?;
        DirManifest::from_json(&bytes)
    }

    /// Restore `checksum` at `dest`
    ///
    /// Directories are restored entry by entry; files in `dest` that the
    /// manifest does not list are removed. Returns the number of files
    /// written.
    pub fn checkout(&self, checksum: &Checksum, dest: &Path) -> DvcResult<usize> {
        if !checksum.is_dir() {
            self.checkout_file(checksum, dest)?;
            return Ok(1);
        }

        let manifest = self.load_manifest(checksum)?;
        // Check every object up front so a partial restore never happens.
        if let Some(missing) = manifest.entries().iter().find(|e| !self.contains(&e.md5)) {
            return Err(DvcError::MissingCache(missing.md5.clone()));
        }

        if dest.is_file() {
            fs::remove_file(dest)
                .map_err(|e| DvcError::io(format!("removing {}", dest.display()), e))?;
        }

        let mut written = 0;
        for entry in manifest.entries() {
            let target = dest.join(&entry.relpath);
            if target.is_file() && hash_file(&target)? == entry.md5 {
                continue;
            }
            self.checkout_file(&entry.md5, &target)?;
            written += 1;
        }

        if dest.is_dir() {
            let wanted: BTreeSet<&str> =
                manifest.entries().iter().map(|e| e.relpath.as_str()).collect();
            for (relpath, path) in walk_files(dest)? {
                if !wanted.contains(relpath.as_str()) {
                    debug!("Removing untracked {}", path.display());
                    fs::remove_file(&path)
                        .map_err(|e| DvcError::io(format!("removing {}", path.display()), e))?;
                }
            }
        }

        Ok(written)
    }

    fn checkout_file(&self, checksum: &Checksum, dest: &Path) -> DvcResult<()> {
        let src = self.object_path(checksum);
        if !src.is_file() {
            return Err(DvcError::MissingCache(checksum.clone()));
        }
        if dest.is_symlink() {
            fs::remove_file(dest)
                .map_err(|e| DvcError::io(format!("removing {}", dest.display()), e))?;
        } else if dest.is_dir() {
            fs::remove_dir_all(dest)
                .map_err(|e| DvcError::io(format!("removing {}", dest.display()), e))?;
        }
        ensure_parent(dest)?;
        fs::copy(&src, dest)
            .map_err(|e| DvcError::io(format!("restoring {}", dest.display()), e))?;
        Ok(())
    }

    /// Copy objects missing from `other`, returning how many were copied
    pub fn transfer_to<'a, I>(&self, other: &CacheStore, checksums: I) -> DvcResult<usize>
    where
        I: IntoIterator<Item = &'a Checksum>,
    {
        let mut copied = 0;
        for checksum in checksums {
            if other.contains(checksum) {
                continue;
            }
            let src = self.object_path(checksum);
            if !src.is_file() {
                return Err(DvcError::MissingCache(checksum.clone()));
            }
            let dest = other.object_path(checksum);
            ensure_parent(&dest)?;
            fs::copy(&src, &dest)
                .map_err(|e| DvcError::io(format!("copying {}", checksum), e))?;
            copied += 1;
        }
        Ok(copied)
    }
}

fn ensure_parent(path: &Path) -> DvcResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| DvcError::io(format!("creating directory {}", parent.display()), e))?;
    }
    Ok(())
}
