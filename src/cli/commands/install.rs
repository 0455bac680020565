//! Install command - wire the repository into git

use crate::error::DvcResult;
use crate::repo::Repo;
use crate::scm;
use crate::ui::{self, UiContext};

/// Execute the install command
pub async fn execute(repo: &Repo) -> DvcResult<()> {
    let ctx = UiContext::detect();

    let hooks = scm::install(repo.root()).await?;
    for hook in &hooks {
        ui::step_ok_detail(&ctx, "Installed hook", &hook.display().to_string());
    }
    ui::step_ok_detail(&ctx, "Registered merge driver", scm::GITATTRIBUTES_RULE);
    Ok(())
}
