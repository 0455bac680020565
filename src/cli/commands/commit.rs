//! Commit command - record current output content in pointer files

use super::resolve_targets;
use crate::cli::args::TargetsArgs;
use crate::error::DvcResult;
use crate::repo::Repo;
use crate::ui::{self, UiContext};

/// Execute the commit command
pub async fn execute(args: TargetsArgs, repo: &Repo) -> DvcResult<()> {
    let ctx = UiContext::detect();
    let targets = resolve_targets(&args.targets)?;

    let committed = repo.commit(&targets)?;
    if committed.is_empty() {
        ui::step_info(&ctx, "Nothing to commit");
        return Ok(());
    }

    for stage in &committed {
        ui::step_ok(&ctx, &format!("Committed {}", stage));
    }
    Ok(())
}
