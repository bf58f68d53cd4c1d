//! Integration tests for Cachet

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn cachet() -> Command {
        let mut cmd = cargo_bin_cmd!("cachet");
        cmd.env_remove("CACHET_CONFIG");
        cmd
    }

    /// Write a config selecting the in-process backend
    fn memory_config(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend]\nkind = \"memory\"\n").unwrap();
        path
    }

    #[test]
    fn help_displays() {
        cachet()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Vary-aware HTTP response cache store"));
    }

    #[test]
    fn version_displays() {
        cachet()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("cachet"));
    }

    #[test]
    fn config_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        cachet()
            .arg("--config")
            .arg(&path)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let dir = TempDir::new().unwrap();
        cachet()
            .arg("--config")
            .arg(dir.path().join("missing.toml"))
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[backend]"))
            .stdout(predicate::str::contains("MetaData"));
    }

    #[test]
    fn config_init_writes_file_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        cachet()
            .arg("--config")
            .arg(&path)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));
        assert!(path.exists());

        cachet()
            .arg("--config")
            .arg(&path)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn config_invalid_reports_hint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend\n").unwrap();

        cachet()
            .arg("--config")
            .arg(&path)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn lookup_rejects_invalid_url() {
        let dir = TempDir::new().unwrap();
        cachet()
            .arg("--config")
            .arg(memory_config(&dir))
            .args(["lookup", "not-a-url"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid URL"));
    }

    #[test]
    fn lookup_miss_on_empty_backend() {
        let dir = TempDir::new().unwrap();
        cachet()
            .arg("--config")
            .arg(memory_config(&dir))
            .args(["lookup", "http://example.com/a", "-H", "Cookie: a=1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached response"));
    }

    #[test]
    fn purge_reports_nothing_cached() {
        let dir = TempDir::new().unwrap();
        cachet()
            .arg("--config")
            .arg(memory_config(&dir))
            .args(["purge", "http://example.com/a"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Nothing cached"));
    }

    #[test]
    fn lock_commands_run() {
        let dir = TempDir::new().unwrap();
        let config = memory_config(&dir);

        cachet()
            .arg("--config")
            .arg(&config)
            .args(["lock", "http://example.com/a"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Locked"));

        // Each invocation starts with an empty in-process backend
        cachet()
            .arg("--config")
            .arg(&config)
            .args(["lock-status", "http://example.com/a"])
            .assert()
            .success()
            .stdout(predicate::str::contains("unlocked"));

        cachet()
            .arg("--config")
            .arg(&config)
            .arg("cleanup")
            .assert()
            .success()
            .stdout(predicate::str::contains("Lock"));
    }

    #[test]
    fn header_argument_requires_colon() {
        cachet()
            .args(["lookup", "http://example.com/a", "-H", "Cookie"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid header format"));
    }
}
