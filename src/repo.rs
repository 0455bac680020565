//! Repository-level operations
//!
//! A repository is a directory containing `.dvc/`. Tracked data is described
//! by `*.dvc` pointer files anywhere below the root; their objects live in
//! the cache store.

use crate::cache::{hash_file, scan_dir, CacheStore, NamedCache, Scheme};
use crate::checksum::Checksum;
use crate::config::{Config, REPO_CONFIG};
use crate::error::{DvcError, DvcResult};
use crate::output::{LocalTree, Output, UsedCacheContext};
use crate::report::LogSink;
use crate::scm;
use crate::stage::{pointer_path_for, Stage, POINTER_EXT};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Metadata directory marking a repository root
pub const DVC_DIR: &str = ".dvc";

const CONFIG_TEMPLATE: &str = r#"# dvc repository configuration
# Settings here override your global config (~/.config/dvc/config.toml)
# and are overridden by the untracked .dvc/config.local.toml

[core]
# remote = "storage"

# [cache]
# dir = "/mnt/shared/dvc-cache"

# [remote.storage]
# url = "/mnt/backup/dvc"
"#;

const DVC_GITIGNORE: &str = "/cache\n/config.local.toml\n";

/// State of an output that differs from its pointer file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputState {
    /// Working-tree content differs from the recorded checksum
    Modified,
    /// Output missing from the working tree
    Deleted,
    /// Recorded object missing from the cache
    NotInCache,
}

impl fmt::Display for OutputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::NotInCache => "not in cache",
        };
        f.write_str(s)
    }
}

/// One line of `dvc status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    /// Stage addressing
    pub stage: String,
    /// Output path relative to the repo root
    pub path: String,
    /// What differs
    pub state: OutputState,
}

/// Result of restoring outputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutSummary {
    /// Outputs that had files written
    pub restored: Vec<String>,
    /// Outputs already up to date
    pub unchanged: Vec<String>,
    /// Outputs whose objects are missing from the cache
    pub failed: Vec<String>,
}

/// Result of copying objects to a remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSummary {
    /// Remote name
    pub remote: String,
    /// Objects copied
    pub copied: usize,
    /// Objects the remote already had
    pub skipped: usize,
    /// Objects missing from the local cache
    pub missing: usize,
}

/// An opened repository
#[derive(Debug, Clone)]
pub struct Repo {
    root: PathBuf,
    config: Config,
    store: CacheStore,
}

impl Repo {
    /// Walk up from `start` to the directory containing `.dvc/`
    pub fn find(start: &Path) -> DvcResult<PathBuf> {
        let start = start
            .canonicalize()
            .map_err(|e| DvcError::io(format!("resolving {}", start.display()), e))?;

        let root = start
            .ancestors()
            .find(|dir| dir.join(DVC_DIR).is_dir())
            .map(Path::to_path_buf);
        root.ok_or(DvcError::NotARepo(start))
    }

    /// Create the `.dvc/` layout in `root`
    ///
    /// Returns `false` if the repository already existed.
    pub fn init(root: &Path) -> DvcResult<bool> {
        let dvc_dir = root.join(DVC_DIR);
        if dvc_dir.is_dir() {
            return Ok(false);
        }

        let cache_dir = dvc_dir.join("cache");
        fs::create_dir_all(&cache_dir)
            .map_err(|e| DvcError::io(format!("creating directory {}", cache_dir.display()), e))?;

        let config_path = root.join(REPO_CONFIG);
        fs::write(&config_path, CONFIG_TEMPLATE)
            .map_err(|e| DvcError::io(format!("writing {}", config_path.display()), e))?;

        let ignore_path = dvc_dir.join(".gitignore");
        fs::write(&ignore_path, DVC_GITIGNORE)
            .map_err(|e| DvcError::io(format!("writing {}", ignore_path.display()), e))?;

        info!("Initialized repository at {}", root.display());
        Ok(true)
    }

    /// Open the repository at `root` with an already merged config
    pub fn open(root: impl Into<PathBuf>, config: Config) -> Self {
        let root = root.into();
        let store = CacheStore::new(config.cache_dir(&root));
        Self {
            root,
            config,
            store,
        }
    }

    /// Repository root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Effective configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Local cache
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Path relative to the root for a user-supplied path
    ///
    /// Relative paths are taken as already relative to the root.
    pub fn relative(&self, path: &Path) -> DvcResult<PathBuf> {
        if !path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        resolved
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .map_err(|_| {
                DvcError::User(format!(
                    "{} is outside the repository {}",
                    path.display(),
                    self.root.display()
                ))
            })
    }

    /// Load every pointer file below the root, sorted by path
    pub fn collect_stages(&self) -> DvcResult<Vec<Stage>> {
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                !(e.file_type().is_dir() && (e.file_name() == DVC_DIR || e.file_name() == ".git"))
            });

        let mut stages = Vec::new();
        for entry in walker {
            let entry = entry
                .map_err(|e| DvcError::User(format!("walking {}: {}", self.root.display(), e)))?;
            let is_pointer = entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == POINTER_EXT);
            if !is_pointer {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&self.root) {
                stages.push(Stage::load(&self.root, rel)?);
            }
        }

        debug!("Collected {} stages", stages.len());
        Ok(stages)
    }

    /// Stages named by `targets`, or every stage when empty
    ///
    /// A target is a pointer file or the output path it tracks.
    pub fn select_stages(&self, targets: &[PathBuf]) -> DvcResult<Vec<Stage>> {
        if targets.is_empty() {
            return self.collect_stages();
        }

        targets
            .iter()
            .map(|target| {
                let rel = self.relative(target)?;
                let pointer = if rel.extension().is_some_and(|ext| ext == POINTER_EXT) {
                    rel
                } else {
                    pointer_path_for(&rel)
                };
                Stage::load(&self.root, &pointer)
            })
            .collect()
    }

    /// Cache entries needed by the outputs of the selected stages
    pub fn used_cache(&self, targets: &[PathBuf], sink: &dyn LogSink) -> DvcResult<NamedCache> {
        let mut used = NamedCache::new();
        for stage in self.select_stages(targets)? {
            let tree = LocalTree::new(stage.wdir());
            let ctx = UsedCacheContext {
                store: &self.store,
                tree: &tree,
                sink,
            };
            used.update(stage.get_used_cache(&ctx)?);
        }
        debug!("Used cache: {} entries", used.len());
        Ok(used)
    }

    /// Start tracking `path`: cache its content and write `<path>.dvc`
    pub fn add(&self, path: &Path) -> DvcResult<Stage> {
        let rel = self.relative(path)?;
        if rel.extension().is_some_and(|ext| ext == POINTER_EXT) {
            return Err(DvcError::User(format!(
                "{} is a pointer file and cannot be tracked",
                rel.display()
            )));
        }
        if rel.starts_with(DVC_DIR) {
            return Err(DvcError::User(format!(
                "{} is inside the {} directory",
                rel.display(),
                DVC_DIR
            )));
        }

        let abs = self.root.join(&rel);
        let name = rel
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| DvcError::User(format!("cannot track {}", rel.display())))?;
        if !abs.exists() {
            return Err(DvcError::OutputNotFound(rel));
        }

        let checksum = self.save(&abs)?;
        let stage = Stage::for_output(&self.root, &pointer_path_for(&rel), &name, checksum);
        stage.save(&self.root)?;

        let parent = abs.parent().unwrap_or(&self.root);
        scm::ignore(parent, &name)?;

        info!("Added {} ({})", rel.display(), stage.addressing());
        Ok(stage)
    }

    /// Record the current content of existing outputs
    ///
    /// Returns the stages whose pointer files changed.
    pub fn commit(&self, targets: &[PathBuf]) -> DvcResult<Vec<Stage>> {
        let mut committed = Vec::new();

        for mut stage in self.select_stages(targets)? {
            let wdir = stage.wdir().to_path_buf();
            let mut changed = false;

            for out in stage.outs_mut() {
                if !is_local_cached(out) {
                    continue;
                }
                let abs = out.local_path(&wdir);
                if !abs.exists() {
                    return Err(DvcError::OutputNotFound(abs));
                }
                let checksum = self.save(&abs)?;
                if out.checksum() != Some(&checksum) {
                    debug!("Output '{}' is now {}", out.path(), checksum);
                    out.set_checksum(Some(checksum));
                    changed = true;
                }
            }

            if changed {
                stage.save(&self.root)?;
                committed.push(stage);
            }
        }

        Ok(committed)
    }

    /// Restore outputs of the selected stages from the cache
    ///
    /// Outputs whose objects are missing are reported through `sink` and
    /// listed as failed; the remaining outputs are still restored.
    pub fn checkout(&self, targets: &[PathBuf], sink: &dyn LogSink) -> DvcResult<CheckoutSummary> {
        let mut summary = CheckoutSummary::default();

        for stage in self.select_stages(targets)? {
            for out in stage.outs() {
                let Some(checksum) = out.checksum().filter(|_| is_local_cached(out)) else {
                    continue;
                };
                let name = self.display_path(&stage, out);
                let dest = out.local_path(stage.wdir());

                if !checksum.is_dir() && dest.is_file() && hash_file(&dest)? == *checksum {
                    summary.unchanged.push(name);
                    continue;
                }

                match self.store.checkout(checksum, &dest) {
                    Ok(0) => summary.unchanged.push(name),
                    Ok(n) => {
                        debug!("Restored {} files of '{}'", n, name);
                        summary.restored.push(name);
                    }
                    Err(DvcError::MissingCache(missing)) => {
                        sink.warn(&format!(
                            "Missing cache for '{}' ({}). It will not be checked out.",
                            name, missing
                        ));
                        summary.failed.push(name);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(summary)
    }

    /// Outputs that differ from their pointer files
    pub fn status(&self, targets: &[PathBuf]) -> DvcResult<Vec<StatusEntry>> {
        let mut entries = Vec::new();

        for stage in self.select_stages(targets)? {
            for out in stage.outs() {
                if !is_local_cached(out) {
                    continue;
                }
                if let Some(state) = self.output_state(&stage, out)? {
                    entries.push(StatusEntry {
                        stage: stage.addressing().to_string(),
                        path: self.display_path(&stage, out),
                        state,
                    });
                }
            }
        }

        Ok(entries)
    }

    /// Copy every object the repository uses to a local remote
    pub fn push(&self, remote: Option<&str>, sink: &dyn LogSink) -> DvcResult<PushSummary> {
        let (name, remote) = self.config.resolve_remote(remote)?;
        if !remote.scheme().is_local() {
            return Err(DvcError::UnsupportedRemote {
                name: name.to_string(),
                url: remote.url.clone(),
            });
        }

        let url = PathBuf::from(&remote.url);
        let target = CacheStore::new(if url.is_absolute() {
            url
        } else {
            self.root.join(url)
        });

        let used = self.used_cache(&[], sink)?;
        let (present, missing): (Vec<&Checksum>, Vec<&Checksum>) = used
            .scheme_keys(Scheme::Local)
            .partition(|c| self.store.contains(c));

        for checksum in &missing {
            sink.warn(&format!("Missing cache for {}. It will not be pushed.", checksum));
        }

        let copied = self.store.transfer_to(&target, present.iter().copied())?;
        info!("Pushed {} objects to '{}'", copied, name);

        Ok(PushSummary {
            remote: name.to_string(),
            copied,
            skipped: present.len() - copied,
            missing: missing.len(),
        })
    }

    fn save(&self, abs: &Path) -> DvcResult<Checksum> {
        if abs.is_dir() {
            Ok(self.store.save_dir(abs)?.0)
        } else {
            self.store.save_file(abs)
        }
    }

    fn output_state(&self, stage: &Stage, out: &Output) -> DvcResult<Option<OutputState>> {
        let abs = out.local_path(stage.wdir());
        if !abs.exists() {
            return Ok(Some(OutputState::Deleted));
        }

        let Some(recorded) = out.checksum() else {
            return Ok(Some(OutputState::Modified));
        };

        let current = if abs.is_dir() {
            scan_dir(&abs)?.checksum()?
        } else {
            hash_file(&abs)?
        };
        if &current != recorded {
            return Ok(Some(OutputState::Modified));
        }

        if !self.store.contains(recorded) {
            return Ok(Some(OutputState::NotInCache));
        }
        Ok(None)
    }

    /// Output path relative to the repo root, `/`-separated
    fn display_path(&self, stage: &Stage, out: &Output) -> String {
        let abs = out.local_path(stage.wdir());
        abs.strip_prefix(&self.root)
            .unwrap_or(&abs)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn is_local_cached(out: &Output) -> bool {
    out.use_cache() && !out.is_import() && out.scheme().is_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteConfig;
    use crate::report::RecordingSink;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn repo(dir: &TempDir) -> Repo {
        let root = dir.path().canonicalize().unwrap();
        Repo::init(&root).unwrap();
        Repo::open(root, Config::default())
    }

    #[test]
    fn init_creates_layout_once() {
        let dir = TempDir::new().unwrap();
        assert!(Repo::init(dir.path()).unwrap());
        assert!(dir.path().join(".dvc/cache").is_dir());
        assert!(dir.path().join(".dvc/config.toml").is_file());
        assert!(!Repo::init(dir.path()).unwrap());

        let template = fs::read_to_string(dir.path().join(".dvc/config.toml")).unwrap();
        let _: Config = toml::from_str(&template).unwrap();
    }

    #[test]
    fn find_walks_up() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        let nested = repo.root().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(Repo::find(&nested).unwrap(), repo.root());
    }

    #[test]
    fn find_outside_repo_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Repo::find(dir.path()),
            Err(DvcError::NotARepo(_))
        ));
    }

    #[test]
    fn add_directory_writes_pointer_and_gitignore() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        write(&repo.root().join("data/bar"), "bar");
        write(&repo.root().join("data/foo"), "foo");

        repo.add(Path::new("data")).unwrap();

        assert_eq!(
            fs::read_to_string(repo.root().join("data.dvc")).unwrap(),
            "outs:\n- md5: 5ea40360f5b4ec688df672a4db9c17d1.dir\n  path: data\n"
        );
        assert_eq!(
            fs::read_to_string(repo.root().join(".gitignore")).unwrap(),
            "/data\n"
        );
    }

    #[test]
    fn add_nested_file_is_relative_to_pointer() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        write(&repo.root().join("models/model.pkl"), "weights");

        let stage = repo.add(&repo.root().join("models/model.pkl")).unwrap();
        assert_eq!(stage.addressing(), "models/model.pkl.dvc");
        assert_eq!(stage.outs()[0].path(), "model.pkl");
        assert_eq!(
            fs::read_to_string(repo.root().join("models/.gitignore")).unwrap(),
            "/model.pkl\n"
        );
    }

    #[test]
    fn add_missing_path_fails() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        assert!(matches!(
            repo.add(Path::new("nope")),
            Err(DvcError::OutputNotFound(_))
        ));
    }

    #[test]
    fn collect_skips_metadata_dirs() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        write(&repo.root().join("b"), "b");
        write(&repo.root().join("a"), "a");
        repo.add(Path::new("b")).unwrap();
        repo.add(Path::new("a")).unwrap();
        write(&repo.root().join(".git/stray.dvc"), "not: [valid");

        let stages = repo.collect_stages().unwrap();
        let names: Vec<_> = stages.iter().map(Stage::addressing).collect();
        assert_eq!(names, vec!["a.dvc", "b.dvc"]);
    }

    #[test]
    fn used_cache_covers_directory_files() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        write(&repo.root().join("data/bar"), "bar");
        write(&repo.root().join("data/foo"), "foo");
        write(&repo.root().join("single"), "single");
        repo.add(Path::new("data")).unwrap();
        repo.add(Path::new("single")).unwrap();

        let sink = RecordingSink::new();
        let used = repo.used_cache(&[], &sink).unwrap();
        assert_eq!(used.scheme_len(Scheme::Local), 4);
        assert!(sink.messages().is_empty());

        let only_single = repo.used_cache(&[PathBuf::from("single")], &sink).unwrap();
        assert_eq!(only_single.len(), 1);
    }

    #[test]
    fn used_cache_warns_for_uncommitted_outputs() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        write(&repo.root().join("out.dvc"), "outs:\n- path: out\n");
        write(&repo.root().join("out"), "content");

        let sink = RecordingSink::new();
        let used = repo.used_cache(&[], &sink).unwrap();
        assert!(used.is_empty());
        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("You can also use `dvc commit out.dvc`"));
    }

    #[test]
    fn status_reports_each_state() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        for name in ["kept", "edited", "removed", "evicted"] {
            write(&repo.root().join(name), name);
            repo.add(Path::new(name)).unwrap();
        }

        write(&repo.root().join("edited"), "changed");
        fs::remove_file(repo.root().join("removed")).unwrap();
        let evicted = hash_file(&repo.root().join("evicted")).unwrap();
        fs::remove_file(repo.store().object_path(&evicted)).unwrap();

        let status = repo.status(&[]).unwrap();
        let states: Vec<_> = status.iter().map(|e| (e.path.as_str(), e.state)).collect();
        assert_eq!(
            states,
            vec![
                ("edited", OutputState::Modified),
                ("evicted", OutputState::NotInCache),
                ("removed", OutputState::Deleted),
            ]
        );
    }

    #[test]
    fn commit_records_new_content() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        write(&repo.root().join("file"), "one");
        repo.add(Path::new("file")).unwrap();
        assert!(repo.commit(&[]).unwrap().is_empty());

        write(&repo.root().join("file"), "two");
        let committed = repo.commit(&[PathBuf::from("file.dvc")]).unwrap();
        assert_eq!(committed.len(), 1);
        assert!(repo.status(&[]).unwrap().is_empty());
    }

    #[test]
    fn checkout_restores_and_reports_missing() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        write(&repo.root().join("data/a"), "a");
        write(&repo.root().join("lost"), "lost");
        repo.add(Path::new("data")).unwrap();
        repo.add(Path::new("lost")).unwrap();

        fs::remove_dir_all(repo.root().join("data")).unwrap();
        let lost = hash_file(&repo.root().join("lost")).unwrap();
        fs::remove_file(repo.root().join("lost")).unwrap();
        fs::remove_file(repo.store().object_path(&lost)).unwrap();

        let sink = RecordingSink::new();
        let summary = repo.checkout(&[], &sink).unwrap();
        assert_eq!(summary.restored, vec!["data"]);
        assert_eq!(summary.failed, vec!["lost"]);
        assert_eq!(sink.messages().len(), 1);
        assert_eq!(fs::read_to_string(repo.root().join("data/a")).unwrap(), "a");

        let again = repo.checkout(&[PathBuf::from("data")], &sink).unwrap();
        assert_eq!(again.unchanged, vec!["data"]);
    }

    #[test]
    fn push_copies_to_local_remote() {
        let dir = TempDir::new().unwrap();
        let remote = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        Repo::init(&root).unwrap();

        let mut config = Config::default();
        config.core.remote = Some("backup".to_string());
        config.remote.insert(
            "backup".to_string(),
            RemoteConfig {
                url: remote.path().display().to_string(),
            },
        );
        let repo = Repo::open(root, config);
        write(&repo.root().join("data/a"), "a");
        repo.add(Path::new("data")).unwrap();

        let sink = RecordingSink::new();
        let summary = repo.push(None, &sink).unwrap();
        assert_eq!(summary.remote, "backup");
        assert_eq!(summary.copied, 2);
        assert_eq!(repo.push(None, &sink).unwrap().skipped, 2);
    }

    #[test]
    fn push_refuses_cloud_remotes() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        Repo::init(&root).unwrap();

        let mut config = Config::default();
        config.remote.insert(
            "s3".to_string(),
            RemoteConfig {
                url: "s3://bucket/dvc".to_string(),
            },
        );
        let repo = Repo::open(root, config);

        let sink = RecordingSink::new();
        assert!(matches!(
            repo.push(Some("s3"), &sink),
            Err(DvcError::UnsupportedRemote { .. })
        ));
        assert!(matches!(repo.push(None, &sink), Err(DvcError::NoRemote)));
    }
}
