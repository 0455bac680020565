//! Git integration
//!
//! `dvc install` wires a repository into git:
//! - hooks that keep the working tree in sync on checkout, report status on
//!   commit and push data on push
//! - a merge driver for pointer files, registered in `.git/config` and
//!   enabled for `*.dvc` in `.gitattributes`

pub mod hooks;

pub use hooks::{hook_script, write_hooks, HOOKS};

use crate::error::{DvcError, DvcResult};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

/// Name of the merge driver in `.git/config`
pub const MERGE_DRIVER: &str = "dvc";

/// Human-readable merge driver name
pub const MERGE_DRIVER_NAME: &str = "DVC merge driver";

/// Command git runs to merge pointer files
pub const MERGE_DRIVER_COMMAND: &str =
    "dvc git-hook merge-driver --ancestor %O --our %A --their %B";

/// `.gitattributes` rule routing pointer files through the merge driver
pub const GITATTRIBUTES_RULE: &str = "*.dvc merge=dvc";

/// A git working copy
#[derive(Debug, Clone)]
pub struct Git {
    root: PathBuf,
    git_dir: PathBuf,
    common_dir: PathBuf,
}

impl Git {
    /// Open the git repository at `root`
    ///
    /// `.git` may be a directory or, for worktrees and submodules, a file
    /// holding a `gitdir:` line.
    pub fn open(root: &Path) -> DvcResult<Self> {
        let dot_git = root.join(".git");
        let git_dir = if dot_git.is_dir() {
            dot_git
        } else if dot_git.is_file() {
            read_link_file(&dot_git, root)?
                .ok_or_else(|| DvcError::NotAGitRepo(root.to_path_buf()))?
        } else {
            return Err(DvcError::NotAGitRepo(root.to_path_buf()));
        };

        // Linked worktrees share hooks and config with the main repository
        let common_dir = read_link_file(&git_dir.join("commondir"), &git_dir)?
            .unwrap_or_else(|| git_dir.clone());

        Ok(Self {
            root: root.to_path_buf(),
            git_dir,
            common_dir,
        })
    }

    /// Working copy root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Git directory of this working copy
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Hook directory
    pub fn hooks_dir(&self) -> PathBuf {
        self.common_dir.join("hooks")
    }

    /// Whether a rebase is in progress
    pub fn is_rebasing(&self) -> bool {
        self.git_dir.join("rebase-merge").exists() || self.git_dir.join("rebase-apply").exists()
    }

    /// Set a key in the repository's git config
    pub async fn set_config(&self, key: &str, value: &str) -> DvcResult<()> {
        let command = format!("git config {}", key);
        let output = Command::new("git")
            .args(["config", key, value])
            .current_dir(&self.root)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| DvcError::command_failed(command.clone(), e))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(DvcError::command_exec(command, stderr))
        }
    }

    /// Register the pointer-file merge driver
    pub async fn register_merge_driver(&self) -> DvcResult<()> {
        self.set_config(&format!("merge.{}.name", MERGE_DRIVER), MERGE_DRIVER_NAME)
            .await?;
        self.set_config(&format!("merge.{}.driver", MERGE_DRIVER), MERGE_DRIVER_COMMAND)
            .await?;
        debug!("Registered merge driver '{}'", MERGE_DRIVER);
        Ok(())
    }
}

/// Follow a `.git` or `commondir` file to the directory it names
///
/// Relative targets resolve against `base`. Returns `None` when `path` is
/// absent or names nothing.
fn read_link_file(path: &Path, base: &Path) -> DvcResult<Option<PathBuf>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| DvcError::io(format!("reading {}", path.display()), e))?;
    let target = content.trim();
    let target = target.strip_prefix("gitdir:").unwrap_or(target).trim();
    if target.is_empty() {
        return Ok(None);
    }
    Ok(Some(base.join(target)))
}

/// Install hooks, the merge driver and the attributes rule into `root`
///
/// Fails without side effects if any hook already exists.
pub async fn install(root: &Path) -> DvcResult<Vec<PathBuf>> {
    let git = Git::open(root)?;
    let hooks = write_hooks(&git.hooks_dir()).await?;
    git.register_merge_driver().await?;
    ensure_gitattributes(git.root()).await?;
    info!("Installed git hooks into {}", git.hooks_dir().display());
    Ok(hooks)
}

/// Append the merge-driver rule to `.gitattributes` unless present
///
/// Returns whether the file changed.
pub async fn ensure_gitattributes(root: &Path) -> DvcResult<bool> {
    let path = root.join(".gitattributes");
    let content = if path.exists() {
        fs::read_to_string(&path)
            .await
            .map_err(|e| DvcError::io(format!("reading {}", path.display()), e))?
    } else {
        String::new()
    };

    if content.lines().any(|l| l.trim() == GITATTRIBUTES_RULE) {
        return Ok(false);
    }

    fs::write(&path, append_line(&content, GITATTRIBUTES_RULE))
        .await
        .map_err(|e| DvcError::io(format!("writing {}", path.display()), e))?;
    Ok(true)
}

/// Add `/<name>` to `dir/.gitignore` unless already listed
pub fn ignore(dir: &Path, name: &str) -> DvcResult<bool> {
    let path = dir.join(".gitignore");
    let entry = format!("/{}", name);
    let content = if path.exists() {
        std::fs::read_to_string(&path)
            .map_err(|e| DvcError::io(format!("reading {}", path.display()), e))?
    } else {
        String::new()
    };

    if content.lines().any(|l| l.trim() == entry) {
        return Ok(false);
    }

    std::fs::write(&path, append_line(&content, &entry))
        .map_err(|e| DvcError::io(format!("writing {}", path.display()), e))?;
    debug!("Added {} to {}", entry, path.display());
    Ok(true)
}

/// Whether a post-checkout hook invocation should restore data
///
/// File checkouts (`flag == "0"`) and rebases leave data alone.
pub fn post_checkout_applies(git: &Git, flag: &str) -> bool {
    flag != "0" && !git.is_rebasing()
}

fn append_line(content: &str, line: &str) -> String {
    let mut out = content.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(line);
    out.push('\n');
    out
}
