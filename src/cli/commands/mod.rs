//! CLI command implementations

pub mod add;
pub mod cache;
pub mod checkout;
pub mod commit;
pub mod config;
pub mod git_hook;
pub mod init;
pub mod install;
pub mod push;
pub mod status;

pub use add::execute as add;
pub use cache::execute as cache;
pub use checkout::execute as checkout;
pub use commit::execute as commit;
pub use config::execute as config;
pub use git_hook::execute as git_hook;
pub use init::execute as init;
pub use install::execute as install;
pub use push::execute as push;
pub use status::execute as status;

use crate::error::{DvcError, DvcResult};
use std::path::PathBuf;

/// Resolve command-line targets against the current directory
fn resolve_targets(targets: &[PathBuf]) -> DvcResult<Vec<PathBuf>> {
    if targets.is_empty() {
        return Ok(Vec::new());
    }
    let cwd = std::env::current_dir().map_err(|e| DvcError::io("getting current directory", e))?;
    Ok(targets.iter().map(|t| cwd.join(t)).collect())
}
