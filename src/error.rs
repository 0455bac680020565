//! Error types for dvc
//!
//! All modules use `DvcResult<T>` as their return type.

use crate::checksum::{Checksum, InvalidChecksum};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dvc operations
pub type DvcResult<T> = Result<T, DvcError>;

/// All errors that can occur in dvc
#[derive(Error, Debug)]
pub enum DvcError {
    // Repository errors
    #[error("Not a dvc repository (or any of the parent directories): {0}")]
    NotARepo(PathBuf),

    #[error("Not a git repository: {0}")]
    NotAGitRepo(PathBuf),

    #[error("Stage not found: {0}")]
    StageNotFound(PathBuf),

    #[error("Invalid pointer file {path}: {reason}")]
    PointerInvalid { path: PathBuf, reason: String },

    #[error("Output not found: {0}")]
    OutputNotFound(PathBuf),

    // Checksum errors
    #[error(transparent)]
    InvalidChecksum(#[from] InvalidChecksum),

    // Cache errors
    #[error("Missing cache for {0}")]
    MissingCache(Checksum),

    #[error("Unsupported remote '{name}': {url}. Only local directory remotes can be pushed to.")]
    UnsupportedRemote { name: String, url: String },

    #[error("No remote configured")]
    NoRemote,

    #[error("Remote not found: {0}")]
    RemoteNotFound(String),

    // Git integration errors
    #[error("Hook '{}' already exists", .0.display())]
    HookAlreadyExists(PathBuf),

    #[error("Unable to auto-merge: {0}")]
    Merge(String),

    #[error("Merge conflict in '{output}': {} changed on both sides", .paths.join(", "))]
    MergeConflict { output: String, paths: Vec<String> },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl DvcError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NotARepo(_) => Some("Run: dvc init"),
            Self::NotAGitRepo(_) => Some("Run: git init"),
            Self::HookAlreadyExists(_) => {
                Some("Remove or rename the existing hook, then run: dvc install")
            }
            Self::MergeConflict { .. } => {
                Some("Resolve the pointer file by hand, then run: dvc checkout")
            }
            Self::NoRemote => Some("Run: dvc config set core.remote <name>"),
            Self::MissingCache(_) => Some("Run: dvc checkout after fetching the missing data"),
            _ => None,
        }
    }
}
