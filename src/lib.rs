//! dvc - data version control
//!
//! Tracks large files and directories through small pointer files committed
//! to git. Content lives in a local content-addressed cache; directories are
//! stored as hashed manifests of their files, and a git merge driver merges
//! those manifests when two branches change the same directory.

pub mod cache;
pub mod checksum;
pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod merge;
pub mod output;
pub mod repo;
pub mod report;
pub mod scm;
pub mod stage;
pub mod ui;

pub use error::{DvcError, DvcResult};
