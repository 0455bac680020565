//! Git hook command - entry points invoked by git
//!
//! Hooks installed by `dvc install` call back into these. They must never
//! prompt and print nothing when there is nothing to report.

use super::{checkout, push, status};
use crate::cli::args::{GitHookAction, GitHookArgs, OutputFormat};
use crate::error::DvcResult;
use crate::merge::MergeDriver;
use crate::report::TracingSink;
use crate::repo::Repo;
use crate::scm::{self, Git};
use crate::ui::UiContext;
use tracing::debug;

/// Execute a git hook
pub async fn execute(args: GitHookArgs, repo: &Repo) -> DvcResult<()> {
    match args.hook {
        GitHookAction::PostCheckout { flag, .. } => post_checkout(repo, flag.as_deref()),
        GitHookAction::PreCommit { .. } => pre_commit(repo),
        GitHookAction::PrePush { .. } => pre_push(repo),
        GitHookAction::MergeDriver {
            ancestor,
            our,
            their,
        } => MergeDriver::new(repo.store()).merge_files(&ancestor, &our, &their),
    }
}

fn post_checkout(repo: &Repo, flag: Option<&str>) -> DvcResult<()> {
    let git = Git::open(repo.root())?;
    if !scm::post_checkout_applies(&git, flag.unwrap_or("1")) {
        debug!("Skipping post-checkout (file checkout or rebase)");
        return Ok(());
    }

    let summary = repo.checkout(&[], &TracingSink)?;
    checkout::report(&UiContext::non_interactive(), &summary);
    Ok(())
}

fn pre_commit(repo: &Repo) -> DvcResult<()> {
    let entries = repo.status(&[])?;
    if !entries.is_empty() {
        status::print_status(&entries, OutputFormat::Table)?;
    }
    Ok(())
}

fn pre_push(repo: &Repo) -> DvcResult<()> {
    if repo.config().core.remote.is_none() {
        debug!("No default remote configured, skipping data push");
        return Ok(());
    }
    push::push(repo, None)
}
