//! Git hook installation
//!
//! Each hook is a two-line shell script delegating to `dvc git-hook`:
//!
//! ```sh
//! #!/bin/sh
//! exec dvc git-hook post-checkout $@
//! ```

use crate::error::{DvcError, DvcResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Hooks written by `dvc install`
pub const HOOKS: [&str; 3] = ["post-checkout", "pre-commit", "pre-push"];

/// Script body for `name`
pub fn hook_script(name: &str) -> String {
    format!("#!/bin/sh\nexec dvc git-hook {} $@\n", name)
}

/// Write every hook into `hooks_dir`
///
/// All hook paths are checked before anything is written, so a collision
/// leaves the directory exactly as it was.
pub async fn write_hooks(hooks_dir: &Path) -> DvcResult<Vec<PathBuf>> {
    let paths: Vec<PathBuf> = HOOKS.iter().map(|name| hooks_dir.join(name)).collect();

    if let Some(existing) = paths.iter().find(|p| p.exists()) {
        return Err(DvcError::HookAlreadyExists(existing.clone()));
    }

    fs::create_dir_all(hooks_dir)
        .await
        .map_err(|e| DvcError::io(format!("creating directory {}", hooks_dir.display()), e))?;

    for (name, path) in HOOKS.iter().zip(&paths) {
        fs::write(path, hook_script(name))
            .await
            .map_err(|e| DvcError::io(format!("writing {}", path.display()), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o755);
            fs::set_permissions(path, perms)
                .await
                .map_err(|e| DvcError::io(format!("setting permissions on {}", path.display()), e))?;
        }

        debug!("Installed hook {}", path.display());
    }

    Ok(paths)
}
