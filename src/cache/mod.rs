//! Content-addressable cache
//!
//! - `store`: on-disk object store with prefix-sharded layout
//! - `named`: scheme-partitioned sets of entries an output set needs
//! - `scheme`: storage backend identifiers
//!
//! # Layout
//!
//! | Object | Path | Content |
//! |--------|------|---------|
//! | file | `<cache>/ac/bd18db4cc2f85cedef654fccc4a4d8` | file bytes |
//! | directory | `<cache>/5e/a40360f5b4ec688df672a4db9c17d1.dir` | manifest JSON |

pub mod named;
pub mod scheme;
pub mod store;

pub use named::{CacheEntry, NamedCache};
pub use scheme::Scheme;
pub use store::{hash_file, scan_dir, CacheStore};
