//! Add command - start tracking files and directories

use super::resolve_targets;
use crate::cli::args::TargetsArgs;
use crate::error::{DvcError, DvcResult};
use crate::repo::Repo;
use crate::ui::{self, UiContext};

/// Execute the add command
pub async fn execute(args: TargetsArgs, repo: &Repo) -> DvcResult<()> {
    let ctx = UiContext::detect();

    if args.targets.is_empty() {
        return Err(DvcError::User("Nothing specified, nothing added".to_string()));
    }

    let mut pointers = Vec::new();
    for target in resolve_targets(&args.targets)? {
        let stage = repo.add(&target)?;
        let out = stage
            .outs()
            .first()
            .map(|o| o.to_string())
            .unwrap_or_default();
        ui::step_ok_detail(&ctx, &format!("Added {}", out), stage.addressing());
        pointers.push(stage.addressing().to_string());
    }

    ui::remark(
        &ctx,
        &format!("To track the changes with git, run: git add {} .gitignore", pointers.join(" ")),
    );
    Ok(())
}
