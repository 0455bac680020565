//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{self, Config, ConfigManager};
use crate::error::{DvcError, DvcResult};
use crate::ui::{self, UiContext};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Which file `config set` writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Global,
    Repo,
    Local,
}

/// Execute the config command
///
/// `root` is the repository root when run inside one.
pub async fn execute(
    args: ConfigArgs,
    manager: &ConfigManager,
    config: &Config,
    root: Option<&Path>,
) -> DvcResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config),
        Some(ConfigAction::Path) => show_paths(manager, root),
        Some(ConfigAction::Set {
            key,
            value,
            local,
            global,
        }) => {
            let level = match (global, local) {
                (true, _) => Level::Global,
                (_, true) => Level::Local,
                _ => Level::Repo,
            };
            let path = level_path(level, manager, root)?;
            set_value(&path, &key, &value).await?;
            ui::step_ok(
                &UiContext::detect(),
                &format!("Set {} = {} in {}", key, value, path.display()),
            );
        }
    }

    Ok(())
}

fn show_config(config: &Config) {
    let toml =
        toml::to_string_pretty(config).unwrap_or_else(|_| "Error serializing config".to_string());
    println!("{}", toml);
}

fn show_paths(manager: &ConfigManager, root: Option<&Path>) {
    let ctx = UiContext::detect();
    ui::key_value(&ctx, "global", &manager.path().display().to_string());
    if let Some(root) = root {
        ui::key_value(
            &ctx,
            "repo",
            &ConfigManager::repo_config_path(root).display().to_string(),
        );
        ui::key_value(
            &ctx,
            "local",
            &ConfigManager::local_config_path(root).display().to_string(),
        );
    }
}

fn level_path(level: Level, manager: &ConfigManager, root: Option<&Path>) -> DvcResult<PathBuf> {
    if level == Level::Global {
        return Ok(manager.path().to_path_buf());
    }

    let root = match root {
        Some(root) => root,
        None => {
            let cwd = std::env::current_dir()
                .map_err(|e| DvcError::io("getting current directory", e))?;
            return Err(DvcError::NotARepo(cwd));
        }
    };

    Ok(match level {
        Level::Local => ConfigManager::local_config_path(root),
        _ => ConfigManager::repo_config_path(root),
    })
}

/// Set `key` in the TOML file at `path`, keeping every other key
async fn set_value(path: &Path, key: &str, value: &str) -> DvcResult<()> {
    validate_config_key(key)?;

    let mut doc = config::read_toml(path)
        .await?
        .unwrap_or_else(|| toml::Value::Table(toml::map::Map::new()));

    set_toml_value(&mut doc, key, value)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DvcError::io(format!("creating directory {}", parent.display()), e))?;
    }

    let content = toml::to_string_pretty(&doc)?;
    fs::write(path, content)
        .await
        .map_err(|e| DvcError::io(format!("writing {}", path.display()), e))?;
    Ok(())
}

/// Validate that a config key is one we recognise.
fn validate_config_key(key: &str) -> DvcResult<()> {
    let parts: Vec<&str> = key.split('.').collect();
    match parts.as_slice() {
        ["core", "remote"] | ["cache", "dir"] => Ok(()),
        ["remote", name, "url"] if !name.is_empty() => Ok(()),
        _ => Err(DvcError::User(format!(
            "Unknown config key: {}. Valid keys: core.remote, cache.dir, remote.<name>.url",
            key
        ))),
    }
}

/// Set a dot-separated key in a TOML value tree, creating intermediate tables as needed.
fn set_toml_value(doc: &mut toml::Value, key: &str, value: &str) -> DvcResult<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let (leaf, tables) = parts
        .split_last()
        .ok_or_else(|| DvcError::User("Empty config key".to_string()))?;

    let mut current = doc;
    for &part in tables {
        current = current
            .as_table_mut()
            .ok_or_else(|| DvcError::User(format!("Expected table at key: {}", part)))?
            .entry(part)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    let table = current
        .as_table_mut()
        .ok_or_else(|| DvcError::User(format!("Expected table for key: {}", key)))?;

    // Every recognised key holds a string
    table.insert((*leaf).to_string(), toml::Value::String(value.to_string()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn validates_known_keys() {
        assert!(validate_config_key("core.remote").is_ok());
        assert!(validate_config_key("cache.dir").is_ok());
        assert!(validate_config_key("remote.backup.url").is_ok());
        assert!(validate_config_key("remote..url").is_err());
        assert!(validate_config_key("core.editor").is_err());
    }

    #[test]
    fn set_creates_nested_tables() {
        let mut doc = toml::Value::Table(toml::map::Map::new());
        set_toml_value(&mut doc, "remote.backup.url", "/mnt/backup").unwrap();
        assert_eq!(doc["remote"]["backup"]["url"].as_str(), Some("/mnt/backup"));
    }

    #[test]
    fn numeric_looking_values_stay_strings() {
        let mut doc = toml::Value::Table(toml::map::Map::new());
        set_toml_value(&mut doc, "core.remote", "1").unwrap();
        assert_eq!(doc["core"]["remote"].as_str(), Some("1"));
    }

    #[tokio::test]
    async fn set_keeps_other_keys_and_loads_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".dvc").join("config.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[cache]\ndir = \"/cache\"\n").unwrap();

        set_value(&path, "remote.backup.url", "/mnt/backup").await.unwrap();
        set_value(&path, "core.remote", "backup").await.unwrap();

        let config = ConfigManager::with_path(temp.path().join("none.toml"))
            .load_merged(Some(temp.path()))
            .await
            .unwrap();
        assert_eq!(config.cache.dir, Some(PathBuf::from("/cache")));
        assert_eq!(config.resolve_remote(None).unwrap().1.url, "/mnt/backup");
    }

    #[tokio::test]
    async fn unknown_key_leaves_file_alone() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        assert!(set_value(&path, "vm.name", "x").await.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn repo_levels_need_a_repo() {
        let manager = ConfigManager::with_path(PathBuf::from("/g.toml"));
        assert_eq!(
            level_path(Level::Global, &manager, None).unwrap(),
            PathBuf::from("/g.toml")
        );
        assert!(matches!(
            level_path(Level::Repo, &manager, None),
            Err(DvcError::NotARepo(_))
        ));
        assert_eq!(
            level_path(Level::Local, &manager, Some(Path::new("/r"))).unwrap(),
            PathBuf::from("/r/.dvc/config.local.toml")
        );
    }
}
