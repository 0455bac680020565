//! Directory manifests
//!
//! A directory is tracked as a sorted list of `(relpath, md5)` entries. The
//! list is serialized to a canonical JSON document, which is both the object
//! stored in the cache and the input of the directory checksum:
//!
//! ```text
//! [{"md5": "37b51d194a7513e45b56f6524f2d51f2", "relpath": "bar"}, ...]
//! ```
//!
//! The byte layout (`", "` and `": "` separators, sorted keys, non-ASCII
//! escaped as `\uXXXX`) is fixed: pointer files committed elsewhere carry
//! checksums of exactly this document.

use crate::checksum::Checksum;
use crate::error::{DvcError, DvcResult};
use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use std::collections::BTreeMap;
use std::io;

/// A single file inside a directory manifest
///
/// Field order matters: it is the sorted key order of the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Checksum of the file contents
    pub md5: Checksum,
    /// Path relative to the directory root, `/`-separated
    pub relpath: String,
}

/// Sorted, path-unique listing of a directory's files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirManifest {
    entries: Vec<DirEntry>,
}

impl DirManifest {
    /// Build a manifest from `(relpath, checksum)` pairs in any order
    ///
    /// If a path appears more than once the last pair wins.
    pub fn new<I, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, Checksum)>,
        P: Into<String>,
    {
        let map: BTreeMap<String, Checksum> = pairs
            .into_iter()
            .map(|(path, checksum)| (path.into(), checksum))
            .collect();
        Self::from_map(map)
    }

    /// Build a manifest from a path → checksum map
    pub fn from_map(map: BTreeMap<String, Checksum>) -> Self {
        let entries = map
            .into_iter()
            .map(|(relpath, md5)| DirEntry { md5, relpath })
            .collect();
        Self { entries }
    }

    /// Path → checksum view of this manifest
    pub fn to_map(&self) -> BTreeMap<String, Checksum> {
        self.entries
            .iter()
            .map(|e| (e.relpath.clone(), e.md5.clone()))
            .collect()
    }

    /// Parse a stored manifest
    pub fn from_json(bytes: &[u8]) -> DvcResult<Self> {
        let entries: Vec<DirEntry> = serde_json::from_slice(bytes)?;
        Ok(Self::new(entries.into_iter().map(|e| (e.relpath, e.md5))))
    }

    /// Canonical serialized form
    pub fn to_json(&self) -> DvcResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.entries.len() * 64 + 2);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, CanonicalFormatter);
        self.entries.serialize(&mut ser).map_err(DvcError::Json)?;
        Ok(buf)
    }

    /// Directory checksum: md5 of the canonical form plus the `.dir` suffix
    pub fn checksum(&self) -> DvcResult<Checksum> {
        let bytes = self.to_json()?;
        Ok(Checksum::from_digest(md5::compute(&bytes)).to_dir())
    }

    /// Entries sorted by path
    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    /// Look up the checksum recorded for a path
    pub fn get(&self, relpath: &str) -> Option<&Checksum> {
        self.entries
            .binary_search_by(|e| e.relpath.as_str().cmp(relpath))
            .ok()
            .map(|i| &self.entries[i].md5)
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest lists no files
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// JSON formatter matching the separators and escaping of the canonical form
struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        // Printable ASCII passes through; everything else becomes UTF-16 escapes.
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if (' '..='~').contains(&c) {
                let mut byte = [0u8; 1];
                writer.write_all(c.encode_utf8(&mut byte).as_bytes())?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}
