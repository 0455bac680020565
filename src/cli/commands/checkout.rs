//! Checkout command - restore outputs from the cache

use super::resolve_targets;
use crate::cli::args::TargetsArgs;
use crate::error::DvcResult;
use crate::report::TracingSink;
use crate::repo::{CheckoutSummary, Repo};
use crate::ui::{self, UiContext};

/// Execute the checkout command
pub async fn execute(args: TargetsArgs, repo: &Repo) -> DvcResult<()> {
    let targets = resolve_targets(&args.targets)?;
    let summary = repo.checkout(&targets, &TracingSink)?;
    let ctx = UiContext::detect();
    report(&ctx, &summary);
    if summary.restored.is_empty() && summary.failed.is_empty() {
        ui::step_info(&ctx, "Everything is up to date");
    }
    Ok(())
}

/// Print restored and failed outputs; silent when there are none
pub fn report(ctx: &UiContext, summary: &CheckoutSummary) {
    for name in &summary.restored {
        ui::step_ok(ctx, &format!("Restored {}", name));
    }
    for name in &summary.failed {
        ui::step_warn_hint(ctx, &format!("Could not restore {}", name), "missing from cache");
    }
}
