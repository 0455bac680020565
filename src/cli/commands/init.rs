//! Init command - create the .dvc/ layout

use crate::cli::args::InitArgs;
use crate::error::{DvcError, DvcResult};
use crate::repo::{Repo, DVC_DIR};
use crate::ui::{self, UiContext};
use std::path::Path;
use tokio::fs;

/// Execute the init command
pub async fn execute(args: InitArgs) -> DvcResult<()> {
    let ctx = UiContext::detect();

    let target_dir = match args.path {
        Some(ref p) => p.clone(),
        None => {
            std::env::current_dir().map_err(|e| DvcError::io("getting current directory", e))?
        }
    };

    ensure_dir(&target_dir).await?;

    if Repo::init(&target_dir)? {
        ui::step_ok_detail(
            &ctx,
            "Initialized dvc repository",
            &target_dir.join(DVC_DIR).display().to_string(),
        );
        ui::remark(&ctx, "Track data with: dvc add <path>");
    } else {
        ui::step_warn_hint(
            &ctx,
            &format!("{} is already a dvc repository", target_dir.display()),
            "Nothing to do",
        );
    }

    Ok(())
}

async fn ensure_dir(dir: &Path) -> DvcResult<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| DvcError::io(format!("creating directory {}", dir.display()), e))?;
    }
    Ok(())
}
