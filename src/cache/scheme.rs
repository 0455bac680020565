//! Storage backend schemes
//!
//! Cache entries are partitioned by the backend that stores them. The scheme
//! of an output is derived from its path: `s3://bucket/key` lives in S3, a
//! plain relative path lives in the local cache.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Local filesystem cache
    Local,
    /// Amazon S3 (s3://)
    S3,
    /// Google Cloud Storage (gs://)
    Gs,
    /// Azure Blob Storage (azure://)
    Azure,
    /// Hadoop filesystem (hdfs://)
    Hdfs,
    /// SSH/SFTP (ssh://)
    Ssh,
    /// Plain HTTP (http://)
    Http,
    /// HTTPS (https://)
    Https,
}

impl Scheme {
    /// URL prefix for this scheme, `None` for local paths
    fn prefix(&self) -> Option<&'static str> {
        match self {
            Self::Local => None,
            Self::S3 => Some("s3://"),
            Self::Gs => Some("gs://"),
            Self::Azure => Some("azure://"),
            Self::Hdfs => Some("hdfs://"),
            Self::Ssh => Some("ssh://"),
            Self::Http => Some("http://"),
            Self::Https => Some("https://"),
        }
    }

    /// All remote schemes in detection order
    fn remotes() -> &'static [Self] {
        &[
            Self::S3,
            Self::Gs,
            Self::Azure,
            Self::Hdfs,
            Self::Ssh,
            Self::Http,
            Self::Https,
        ]
    }

    /// Detect the scheme of a path or URL
    pub fn from_path(path: &str) -> Self {
        Self::remotes()
            .iter()
            .copied()
            .find(|s| s.prefix().is_some_and(|p| path.starts_with(p)))
            .unwrap_or(Self::Local)
    }

    /// Whether objects of this scheme live on the local filesystem
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Local => "local",
            Self::S3 => "s3",
            Self::Gs => "gs",
            Self::Azure => "azure",
            Self::Hdfs => "hdfs",
            Self::Ssh => "ssh",
            Self::Http => "http",
            Self::Https => "https",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_remote_schemes() {
        assert_eq!(Scheme::from_path("s3://bucket/data"), Scheme::S3);
        assert_eq!(Scheme::from_path("gs://bucket/data"), Scheme::Gs);
        assert_eq!(Scheme::from_path("hdfs://namenode/x"), Scheme::Hdfs);
        assert_eq!(Scheme::from_path("https://example.com/x"), Scheme::Https);
        assert_eq!(Scheme::from_path("http://example.com/x"), Scheme::Http);
    }

    #[test]
    fn plain_paths_are_local() {
        assert_eq!(Scheme::from_path("data/train.csv"), Scheme::Local);
        assert_eq!(Scheme::from_path("/abs/path"), Scheme::Local);
        assert!(Scheme::from_path("data").is_local());
    }

    #[test]
    fn scheme_display() {
        assert_eq!(Scheme::Local.to_string(), "local");
        assert_eq!(Scheme::Azure.to_string(), "azure");
    }
}
