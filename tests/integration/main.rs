//! Integration tests for dvc

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const SCENARIO_A: &str = "outs:\n- md5: 5ea40360f5b4ec688df672a4db9c17d1.dir\n  path: data\n";
    const SCENARIO_B: &str = "outs:\n- md5: 839ef9371606817569c1ee0e5f4ed233.dir\n  path: data\n";

    /// dvc running in `dir` with no global config
    fn dvc(dir: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("dvc");
        cmd.current_dir(dir)
            .env("DVC_CONFIG", dir.join("no-global-config.toml"));
        cmd
    }

    fn repo() -> TempDir {
        let temp = TempDir::new().unwrap();
        dvc(temp.path()).arg("init").assert().success();
        temp
    }

    /// Replace `data/` with files whose content is their own name
    fn write_data(dir: &Path, names: &[&str]) {
        let data = dir.join("data");
        if data.exists() {
            fs::remove_dir_all(&data).unwrap();
        }
        fs::create_dir_all(&data).unwrap();
        for name in names {
            fs::write(data.join(name), name).unwrap();
        }
    }

    /// Track `data/` with the given files and return the pointer text
    fn add_data(dir: &Path, names: &[&str]) -> String {
        write_data(dir, names);
        dvc(dir).args(["add", "data"]).assert().success();
        fs::read_to_string(dir.join("data.dvc")).unwrap()
    }

    fn merge(dir: &Path, ancestor: &str, ours: &str, theirs: &str) -> assert_cmd::assert::Assert {
        fs::write(dir.join("ancestor"), ancestor).unwrap();
        fs::write(dir.join("data.dvc"), ours).unwrap();
        fs::write(dir.join("theirs"), theirs).unwrap();
        dvc(dir)
            .args([
                "git-hook",
                "merge-driver",
                "--ancestor",
                "ancestor",
                "--our",
                "data.dvc",
                "--their",
                "theirs",
            ])
            .assert()
    }

    fn data_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir.join("data"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        dvc(temp.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("version large data files"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        dvc(temp.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("dvc"));
    }

    #[test]
    fn outside_repo_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        dvc(temp.path())
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not a dvc repository"))
            .stderr(predicate::str::contains("dvc init"));
    }

    #[test]
    fn add_writes_minimal_pointer() {
        let temp = repo();
        let pointer = add_data(temp.path(), &["bar", "foo"]);
        assert_eq!(pointer, SCENARIO_A);
        assert_eq!(
            fs::read_to_string(temp.path().join(".gitignore")).unwrap(),
            "/data\n"
        );
    }

    #[test]
    fn merge_without_common_ancestor() {
        let temp = repo();
        let ours = add_data(temp.path(), &["bar"]);
        let theirs = add_data(temp.path(), &["foo"]);

        merge(temp.path(), "", &ours, &theirs).success();

        assert_eq!(
            fs::read_to_string(temp.path().join("data.dvc")).unwrap(),
            SCENARIO_A
        );
        // The working tree is not touched by the merge
        assert_eq!(data_files(temp.path()), vec!["foo"]);

        dvc(temp.path()).arg("checkout").assert().success();
        assert_eq!(data_files(temp.path()), vec!["bar", "foo"]);
    }

    #[test]
    fn merge_keeps_additions_from_both_branches() {
        let temp = repo();
        let ancestor = add_data(temp.path(), &["master"]);
        let ours = add_data(temp.path(), &["master", "two"]);
        let theirs = add_data(temp.path(), &["master", "one"]);

        merge(temp.path(), &ancestor, &ours, &theirs).success();

        assert_eq!(
            fs::read_to_string(temp.path().join("data.dvc")).unwrap(),
            SCENARIO_B
        );

        dvc(temp.path()).arg("checkout").assert().success();
        assert_eq!(data_files(temp.path()), vec!["master", "one", "two"]);
    }

    #[test]
    fn merge_conflict_leaves_pointer_alone() {
        let temp = repo();
        let ancestor = add_data(temp.path(), &["a"]);

        write_data(temp.path(), &[]);
        fs::write(temp.path().join("data/a"), "ours").unwrap();
        dvc(temp.path()).args(["add", "data"]).assert().success();
        let ours = fs::read_to_string(temp.path().join("data.dvc")).unwrap();

        fs::write(temp.path().join("data/a"), "theirs").unwrap();
        dvc(temp.path()).args(["add", "data"]).assert().success();
        let theirs = fs::read_to_string(temp.path().join("data.dvc")).unwrap();

        merge(temp.path(), &ancestor, &ours, &theirs)
            .failure()
            .stderr(predicate::str::contains("Merge conflict in 'data'"));

        assert_eq!(fs::read_to_string(temp.path().join("data.dvc")).unwrap(), ours);
    }

    #[test]
    fn merge_refuses_file_outputs() {
        let temp = repo();
        let file = "outs:\n- md5: acbd18db4cc2f85cedef654fccc4a4d8\n  path: data\n";
        let other = "outs:\n- md5: 37b51d194a7513e45b56f6524f2d51f2\n  path: data\n";

        merge(temp.path(), "", file, other)
            .failure()
            .stderr(predicate::str::contains("Unable to auto-merge"));
    }

    #[test]
    fn install_requires_git() {
        let temp = repo();
        dvc(temp.path())
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not a git repository"));
    }

    #[test]
    fn install_refuses_existing_hook() {
        let temp = repo();
        let hooks = temp.path().join(".git").join("hooks");
        fs::create_dir_all(&hooks).unwrap();
        fs::write(hooks.join("pre-commit"), "#!/bin/sh\n").unwrap();

        dvc(temp.path())
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"))
            .stderr(predicate::str::contains("pre-commit"));

        assert!(!hooks.join("post-checkout").exists());
        assert!(!hooks.join("pre-push").exists());
        assert!(!temp.path().join(".gitattributes").exists());
    }

    #[test]
    fn cache_used_lists_directory_files() {
        let temp = repo();
        add_data(temp.path(), &["bar", "foo"]);

        let output = dvc(temp.path())
            .args(["cache", "used", "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let used: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let local = used["local"].as_object().unwrap();
        assert_eq!(local.len(), 3);
        let dir = &local["5ea40360f5b4ec688df672a4db9c17d1.dir"];
        assert_eq!(dir["names"], serde_json::json!(["data"]));
        assert_eq!(dir["children"].as_array().unwrap().len(), 2);
        assert_eq!(
            local["acbd18db4cc2f85cedef654fccc4a4d8"]["names"],
            serde_json::json!(["data/foo"])
        );
    }

    #[test]
    fn cache_used_warns_about_missing_version_info() {
        let temp = repo();
        fs::write(temp.path().join("out.dvc"), "outs:\n- path: out\n").unwrap();

        dvc(temp.path())
            .args(["cache", "used"])
            .assert()
            .success()
            .stderr(predicate::str::contains(
                "Output 'out'(stage: 'out.dvc') is missing version info.",
            ))
            .stderr(predicate::str::contains("dvc commit").not());
    }

    #[test]
    fn status_and_commit() {
        let temp = repo();
        fs::write(temp.path().join("file"), "one").unwrap();
        dvc(temp.path()).args(["add", "file"]).assert().success();

        dvc(temp.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("up to date"));

        fs::write(temp.path().join("file"), "two").unwrap();
        dvc(temp.path())
            .args(["status", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("modified: file"));

        dvc(temp.path()).args(["commit", "file.dvc"]).assert().success();
        dvc(temp.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("up to date"));
    }

    #[test]
    fn push_to_configured_local_remote() {
        let temp = repo();
        let remote = TempDir::new().unwrap();
        add_data(temp.path(), &["bar", "foo"]);

        dvc(temp.path())
            .arg("push")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No remote configured"));

        let url = remote.path().display().to_string();
        dvc(temp.path())
            .args(["config", "set", "remote.backup.url", url.as_str()])
            .assert()
            .success();
        dvc(temp.path())
            .args(["config", "set", "core.remote", "backup"])
            .assert()
            .success();

        dvc(temp.path())
            .arg("push")
            .assert()
            .success()
            .stdout(predicate::str::contains("3 objects pushed to 'backup'"));

        assert!(remote
            .path()
            .join("5e")
            .join("a40360f5b4ec688df672a4db9c17d1.dir")
            .is_file());
    }

    #[test]
    fn config_show_and_path() {
        let temp = repo();
        dvc(temp.path())
            .args(["config", "set", "--local", "cache.dir", "/tmp/shared-cache"])
            .assert()
            .success();

        dvc(temp.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("/tmp/shared-cache"));

        dvc(temp.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.local.toml"));
    }

    #[test]
    fn unknown_config_key_fails() {
        let temp = repo();
        dvc(temp.path())
            .args(["config", "set", "core.editor", "vim"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn post_checkout_hook_is_quiet_when_nothing_changes() {
        let temp = repo();
        fs::create_dir(temp.path().join(".git")).unwrap();
        add_data(temp.path(), &["bar", "foo"]);

        dvc(temp.path())
            .args(["git-hook", "post-checkout", "HEAD~1", "HEAD", "1"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());

        dvc(temp.path())
            .arg("checkout")
            .assert()
            .success()
            .stdout(predicate::str::contains("Everything is up to date"));
    }

    #[test]
    fn commit_keeps_unmodelled_pointer_fields() {
        let temp = repo();
        fs::write(temp.path().join("file"), "one").unwrap();
        dvc(temp.path()).args(["add", "file"]).assert().success();

        let pointer = temp.path().join("file.dvc");
        let text = fs::read_to_string(&pointer).unwrap();
        let text = text.replace("  path: file\n", "  path: file\n  persist: true\n");
        fs::write(&pointer, format!("{}meta:\n  owner: data-team\n", text)).unwrap();

        fs::write(temp.path().join("file"), "two").unwrap();
        dvc(temp.path()).args(["commit", "file.dvc"]).assert().success();

        assert_eq!(
            fs::read_to_string(&pointer).unwrap(),
            "outs:\n- md5: b8a9f715dbb64fd5c56e7783c6820a61\n  path: file\n  persist: true\nmeta:\n  owner: data-team\n"
        );
    }
}
