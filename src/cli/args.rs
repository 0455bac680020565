//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// dvc - version large data files and directories alongside git
///
/// Tracks data through small pointer files committed to git while the
/// content lives in a local content-addressed cache.
#[derive(Parser, Debug)]
#[command(name = "dvc")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Global configuration file path
    #[arg(short, long, global = true, env = "DVC_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a repository in the current directory
    Init(InitArgs),

    /// Start tracking files or directories
    Add(TargetsArgs),

    /// Record the current content of tracked outputs
    Commit(TargetsArgs),

    /// Restore tracked outputs from the cache
    Checkout(TargetsArgs),

    /// Show outputs that differ from their pointer files
    Status(StatusArgs),

    /// Upload cached data to a local remote
    Push(PushArgs),

    /// Install git hooks and the pointer-file merge driver
    Install,

    /// Entry points invoked by git
    #[command(name = "git-hook")]
    GitHook(GitHookArgs),

    /// Inspect the cache
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Target directory (defaults to current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

/// Pointer files or output paths to operate on
#[derive(Parser, Debug)]
pub struct TargetsArgs {
    /// Targets (all stages when omitted)
    pub targets: Vec<PathBuf>,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Pointer files or output paths (all stages when omitted)
    pub targets: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the push command
#[derive(Parser, Debug)]
pub struct PushArgs {
    /// Remote name (defaults to core.remote)
    #[arg(short, long)]
    pub remote: Option<String>,
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the git-hook command
#[derive(Parser, Debug)]
pub struct GitHookArgs {
    /// Hook to run
    #[command(subcommand)]
    pub hook: GitHookAction,
}

/// Git hook entry points
#[derive(Subcommand, Debug)]
pub enum GitHookAction {
    /// Restore data after a branch checkout
    PostCheckout {
        /// Previous HEAD
        previous: Option<String>,
        /// New HEAD
        new: Option<String>,
        /// 1 for branch checkouts, 0 for file checkouts
        flag: Option<String>,
    },

    /// Report data status before a commit
    PreCommit {
        /// Arguments passed by git (ignored)
        #[arg(num_args = 0.., allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Push data to the default remote before a git push
    PrePush {
        /// Git remote name and URL (ignored)
        #[arg(num_args = 0.., allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Merge pointer files of tracked directories
    MergeDriver {
        /// Common ancestor version (%O)
        #[arg(long)]
        ancestor: PathBuf,
        /// Current branch version, overwritten with the result (%A)
        #[arg(long)]
        our: PathBuf,
        /// Other branch version (%B)
        #[arg(long)]
        their: PathBuf,
    },
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cache entries needed by tracked outputs
    Used {
        /// Pointer files or output paths (all stages when omitted)
        targets: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the cache directory
    Dir,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,

    /// Show configuration file paths
    Path,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., core.remote, remote.backup.url)
        key: String,
        /// Value to set
        value: String,
        /// Write to the untracked .dvc/config.local.toml
        #[arg(long, conflicts_with = "global")]
        local: bool,
        /// Write to the global config file
        #[arg(long)]
        global: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn about_comes_from_doc_comment() {
        let about = Cli::command().get_about().map(|a| a.to_string());
        assert_eq!(
            about.as_deref(),
            Some("dvc - version large data files and directories alongside git")
        );
    }

    #[test]
    fn parses_merge_driver_invocation() {
        let cli = Cli::try_parse_from([
            "dvc",
            "git-hook",
            "merge-driver",
            "--ancestor",
            "a",
            "--our",
            "b",
            "--their",
            "c",
        ])
        .unwrap();

        match cli.command {
            Commands::GitHook(GitHookArgs {
                hook: GitHookAction::MergeDriver { ancestor, our, their },
            }) => {
                assert_eq!(ancestor, PathBuf::from("a"));
                assert_eq!(our, PathBuf::from("b"));
                assert_eq!(their, PathBuf::from("c"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_post_checkout_arguments() {
        let cli =
            Cli::try_parse_from(["dvc", "git-hook", "post-checkout", "abc", "def", "0"]).unwrap();
        match cli.command {
            Commands::GitHook(GitHookArgs {
                hook: GitHookAction::PostCheckout { flag, .. },
            }) => assert_eq!(flag.as_deref(), Some("0")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["dvc", "-vv", "status"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
