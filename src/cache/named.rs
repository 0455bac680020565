//! Named caches
//!
//! A [`NamedCache`] is the set of cache entries a group of outputs needs,
//! partitioned by storage scheme. Each entry remembers which outputs asked
//! for it and, for directories, which file entries it contains.
//!
//! Merging is a set union, so it is commutative, associative and idempotent.
//! Stages build their caches independently and hand them upward by value;
//! the order in which they are folded together never matters.

use crate::cache::Scheme;
use crate::checksum::Checksum;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Metadata attached to one cache entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheEntry {
    /// Outputs (or files inside directory outputs) that need this entry
    pub names: BTreeSet<String>,
    /// File entries contained in a directory entry
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub children: BTreeSet<Checksum>,
}

/// Scheme-partitioned set of cache entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NamedCache {
    schemes: BTreeMap<Scheme, BTreeMap<Checksum, CacheEntry>>,
}

impl NamedCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `name` needs `checksum` from `scheme`
    ///
    /// Adding the same checksum twice only extends its metadata.
    pub fn add(&mut self, scheme: Scheme, checksum: Checksum, name: impl Into<String>) {
        self.entry_mut(scheme, checksum).names.insert(name.into());
    }

    /// Record a file inside the directory entry `dir`
    ///
    /// The child becomes an entry of its own and is linked from `dir`.
    pub fn add_child(
        &mut self,
        scheme: Scheme,
        dir: &Checksum,
        child: Checksum,
        name: impl Into<String>,
    ) {
        self.entry_mut(scheme, dir.clone())
            .children
            .insert(child.clone());
        self.add(scheme, child, name);
    }

    fn entry_mut(&mut self, scheme: Scheme, checksum: Checksum) -> &mut CacheEntry {
        self.schemes
            .entry(scheme)
            .or_default()
            .entry(checksum)
            .or_default()
    }

    /// Union of `self` and `other`
    pub fn merge(&self, other: &NamedCache) -> NamedCache {
        let mut merged = self.clone();
        merged.update(other.clone());
        merged
    }

    /// Fold `other` into `self`
    pub fn update(&mut self, other: NamedCache) {
        for (scheme, entries) in other.schemes {
            let ours = self.schemes.entry(scheme).or_default();
            for (checksum, entry) in entries {
                let target = ours.entry(checksum).or_default();
                target.names.extend(entry.names);
                target.children.extend(entry.children);
            }
        }
    }

    /// Schemes with at least one entry
    pub fn schemes(&self) -> impl Iterator<Item = Scheme> + '_ {
        self.schemes
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(scheme, _)| *scheme)
    }

    /// Entries stored under `scheme`, sorted by checksum
    pub fn entries(&self, scheme: Scheme) -> impl Iterator<Item = (&Checksum, &CacheEntry)> + '_ {
        self.schemes
            .get(&scheme)
            .into_iter()
            .flat_map(|entries| entries.iter())
    }

    /// Checksums stored under `scheme`, sorted
    pub fn scheme_keys(&self, scheme: Scheme) -> impl Iterator<Item = &Checksum> + '_ {
        self.entries(scheme).map(|(checksum, _)| checksum)
    }

    /// Directory checksums stored under `scheme`
    pub fn dir_keys(&self, scheme: Scheme) -> impl Iterator<Item = &Checksum> + '_ {
        self.scheme_keys(scheme).filter(|c| c.is_dir())
    }

    /// Metadata for one entry
    pub fn get(&self, scheme: Scheme, checksum: &Checksum) -> Option<&CacheEntry> {
        self.schemes.get(&scheme)?.get(checksum)
    }

    /// Number of distinct checksums under `scheme`
    pub fn scheme_len(&self, scheme: Scheme) -> usize {
        self.schemes.get(&scheme).map_or(0, BTreeMap::len)
    }

    /// Number of entries across all schemes
    pub fn len(&self) -> usize {
        self.schemes.values().map(BTreeMap::len).sum()
    }

    /// Whether no entries are recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<NamedCache> for NamedCache {
    fn from_iter<I: IntoIterator<Item = NamedCache>>(iter: I) -> Self {
        let mut merged = NamedCache::new();
        for cache in iter {
            merged.update(cache);
        }
        merged
    }
}
