//! Integration tests for Boss

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// boss isolated from the user's config, running in `dir`
    fn boss(dir: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("boss");
        cmd.env("BOSS_CONFIG", dir.join("config.toml"))
            .env("CI", "1")
            .current_dir(dir);
        cmd
    }

    fn write_config(dir: &Path, content: &str) {
        fs::write(dir.join("config.toml"), content).unwrap();
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        boss(temp.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("build orchestrator for Delphi"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        boss(temp.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("boss"));
    }

    #[test]
    fn init_creates_manifest() {
        let temp = TempDir::new().unwrap();
        boss(temp.path())
            .args(["init", "--name", "my-api"])
            .assert()
            .success();

        let manifest = fs::read_to_string(temp.path().join("boss.json")).unwrap();
        assert!(manifest.contains("\"name\": \"my-api\""));
        assert!(manifest.contains("\"dependencies\": {}"));
    }

    #[test]
    fn init_twice_fails() {
        let temp = TempDir::new().unwrap();
        boss(temp.path()).arg("init").assert().success();
        boss(temp.path())
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn project_flag_selects_directory() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("nested");
        boss(temp.path())
            .args(["-C", project.to_str().unwrap(), "init"])
            .assert()
            .success();
        assert!(project.join("boss.json").exists());
    }

    #[test]
    fn dependencies_of_empty_project() {
        let temp = TempDir::new().unwrap();
        boss(temp.path()).args(["init", "--name", "app"]).assert().success();
        boss(temp.path())
            .arg("dependencies")
            .assert()
            .success()
            .stdout(predicate::str::contains("No dependencies"));
    }

    #[test]
    fn install_without_manifest_hints_init() {
        let temp = TempDir::new().unwrap();
        boss(temp.path())
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Manifest not found"))
            .stderr(predicate::str::contains("boss init"));
    }

    #[test]
    fn install_without_git_fails() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "[git]\nbinary = \"boss-test-missing-git\"\n");
        boss(temp.path()).arg("init").assert().success();
        boss(temp.path())
            .args(["install", "horse"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("git not found"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn invalid_dependency_spec_fails() {
        let temp = TempDir::new().unwrap();
        boss(temp.path()).arg("init").assert().success();
        boss(temp.path())
            .args(["install", "github.com//horse"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid dependency"));
    }

    #[cfg(unix)]
    #[test]
    fn install_with_no_dependencies_succeeds() {
        let temp = TempDir::new().unwrap();
        // `true --version` stands in for a working git
        write_config(temp.path(), "[git]\nbinary = \"true\"\n");
        boss(temp.path()).arg("init").assert().success();
        boss(temp.path())
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("Dependencies up to date"));
        assert!(temp.path().join("boss-lock.json").exists());
    }

    #[test]
    fn uninstall_requires_argument() {
        let temp = TempDir::new().unwrap();
        boss(temp.path()).arg("uninstall").assert().failure();
    }

    #[test]
    fn run_missing_script() {
        let temp = TempDir::new().unwrap();
        boss(temp.path()).arg("init").assert().success();
        boss(temp.path())
            .args(["run", "test"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Script not found"));
    }

    #[cfg(unix)]
    #[test]
    fn run_script() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("boss.json"),
            r#"{"name": "app", "scripts": {"hello": "echo hello from boss"}}"#,
        )
        .unwrap();
        boss(temp.path())
            .args(["run", "hello"])
            .assert()
            .success()
            .stdout(predicate::str::contains("hello from boss"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        boss(temp.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        boss(temp.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[compiler]"));
    }

    #[test]
    fn invalid_config_fails() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "[compiler\n");
        boss(temp.path())
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}
