//! Push command - copy cached data to a local remote

use crate::cli::args::PushArgs;
use crate::error::DvcResult;
use crate::report::TracingSink;
use crate::repo::Repo;
use crate::ui::{self, UiContext};

/// Execute the push command
pub async fn execute(args: PushArgs, repo: &Repo) -> DvcResult<()> {
    push(repo, args.remote.as_deref())
}

/// Push to `remote` (or the default remote) and report the result
pub fn push(repo: &Repo, remote: Option<&str>) -> DvcResult<()> {
    let ctx = UiContext::detect();
    let summary = repo.push(remote, &TracingSink)?;

    ui::step_ok_detail(
        &ctx,
        &format!("{} objects pushed to '{}'", summary.copied, summary.remote),
        &format!("{} already present", summary.skipped),
    );
    if summary.missing > 0 {
        ui::step_warn_hint(
            &ctx,
            &format!("{} objects missing from the local cache", summary.missing),
            "they were not pushed",
        );
    }
    Ok(())
}
