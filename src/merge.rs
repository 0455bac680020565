//! Three-way merge of directory outputs
//!
//! Git cannot merge two pointer files that both changed the checksum of a
//! tracked directory: the lines simply conflict. Registered as a merge
//! driver, this module merges the directory manifests behind those
//! checksums instead and writes a pointer to the merged manifest.
//!
//! Only the pointer and the cached manifest are updated. The merged
//! directory is not checked out; `dvc checkout` does that when asked.
//!
//! A path changed differently on both sides is a conflict. It is reported
//! with every offending path and nothing is written.

use crate::cache::CacheStore;
use crate::checksum::Checksum;
use crate::error::{DvcError, DvcResult};
use crate::manifest::DirManifest;
use crate::output::Output;
use crate::stage::{PointerFile, Stage};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

/// Merge two manifests against their common ancestor
///
/// `output` names the directory in conflict errors. An ancestor with no
/// entries stands for "no common history".
pub fn merge_manifests(
    output: &str,
    ancestor: &DirManifest,
    ours: &DirManifest,
    theirs: &DirManifest,
) -> DvcResult<DirManifest> {
    let ancestor = ancestor.to_map();
    let ours = ours.to_map();
    let theirs = theirs.to_map();

    let paths: BTreeSet<&String> = ancestor
        .keys()
        .chain(ours.keys())
        .chain(theirs.keys())
        .collect();

    let mut merged: BTreeMap<String, Checksum> = BTreeMap::new();
    let mut conflicts = Vec::new();

    for path in paths {
        let base = ancestor.get(path);
        let our = ours.get(path);
        let their = theirs.get(path);

        let resolved = if our == their {
            our
        } else if our == base {
            their
        } else if their == base {
            our
        } else {
            conflicts.push(path.clone());
            continue;
        };

        if let Some(checksum) = resolved {
            merged.insert(path.clone(), checksum.clone());
        }
    }

    if !conflicts.is_empty() {
        return Err(DvcError::MergeConflict {
            output: output.to_string(),
            paths: conflicts,
        });
    }

    Ok(DirManifest::from_map(merged))
}

/// Merge driver over pointer files
pub struct MergeDriver<'a> {
    store: &'a CacheStore,
}

impl<'a> MergeDriver<'a> {
    /// Create a driver reading and writing manifests in `store`
    pub fn new(store: &'a CacheStore) -> Self {
        Self { store }
    }

    /// Merge pointer files the way git invokes a merge driver
    ///
    /// `ancestor` may be empty when the branches share no history. The
    /// result is written over `ours`, as git expects.
    pub fn merge_files(&self, ancestor: &Path, ours: &Path, theirs: &Path) -> DvcResult<()> {
        let ancestor_ptr = PointerFile::load(ancestor)?;
        let our_ptr = PointerFile::load(ours)?;
        let their_ptr = PointerFile::load(theirs)?;

        let merged = self.merge_pointers(&ancestor_ptr, &our_ptr, &their_ptr)?;
        merged.save(ours)?;
        info!("Merged {}", ours.display());
        Ok(())
    }

    /// Merge three parsed pointer files, returning the new "ours"
    pub fn merge_pointers(
        &self,
        ancestor: &PointerFile,
        ours: &PointerFile,
        theirs: &PointerFile,
    ) -> DvcResult<PointerFile> {
        let ancestor = Stage::from_pointer("ancestor", ".", ancestor.clone());
        let mut our_stage = Stage::from_pointer("ours", ".", ours.clone());
        let their_stage = Stage::from_pointer("theirs", ".", theirs.clone());

        let our_paths: Vec<&str> = our_stage.outs().iter().map(Output::path).collect();
        let their_paths: Vec<&str> = their_stage.outs().iter().map(Output::path).collect();
        if our_paths != their_paths {
            return Err(DvcError::Merge(format!(
                "outputs differ between branches ({} vs {})",
                our_paths.join(", "),
                their_paths.join(", ")
            )));
        }

        for (out, their) in our_stage.outs_mut().iter_mut().zip(their_stage.outs()) {
            let base = ancestor.outs().iter().find(|o| o.path() == out.path());
            let merged = self.merge_output(base, out, their)?;
            out.set_checksum(Some(merged));
        }

        Ok(our_stage.to_pointer())
    }

    fn merge_output(
        &self,
        ancestor: Option<&Output>,
        ours: &Output,
        theirs: &Output,
    ) -> DvcResult<Checksum> {
        let our_sum = mergeable_checksum(ours)?;
        let their_sum = mergeable_checksum(theirs)?;

        if our_sum == their_sum {
            return Ok(our_sum.clone());
        }

        // An ancestor that never recorded this output as a directory shares
        // no paths with either side.
        let base = match ancestor.and_then(|out| mergeable_checksum(out).ok()) {
            Some(checksum) => self.store.load_manifest(checksum)?,
            None => DirManifest::default(),
        };
        let our_manifest = self.store.load_manifest(our_sum)?;
        let their_manifest = self.store.load_manifest(their_sum)?;

        let merged = merge_manifests(ours.path(), &base, &our_manifest, &their_manifest)?;
        let checksum = self.store.save_manifest(&merged)?;
        debug!(
            "Merged '{}': {} + {} -> {} ({} files)",
            ours.path(),
            our_sum,
            their_sum,
            checksum,
            merged.len()
        );
        Ok(checksum)
    }
}

/// Checksum of an output that may take part in a merge
fn mergeable_checksum(out: &Output) -> DvcResult<&Checksum> {
    if !out.use_cache() {
        return Err(DvcError::Merge(format!(
            "'{}' is not cached",
            out.path()
        )));
    }
    if out.is_import() {
        return Err(DvcError::Merge(format!(
            "'{}' is imported from another repository",
            out.path()
        )));
    }
    match out.checksum() {
        Some(checksum) if checksum.is_dir() => Ok(checksum),
        Some(_) => Err(DvcError::Merge(format!(
            "'{}' is not a directory",
            out.path()
        ))),
        None => Err(DvcError::Merge(format!(
            "'{}' has no recorded checksum",
            out.path()
        ))),
    }
}
