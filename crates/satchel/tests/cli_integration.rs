//! CLI integration tests for the Satchel command-line interface.
//!
//! These tests do not start a server; they cover argument parsing and the
//! config command only.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a command for the satchel binary.
fn satchel() -> Command {
    let mut cmd = Command::cargo_bin("satchel").unwrap();
    cmd.env_remove("SATCHEL_CONFIG");
    cmd
}

#[test]
fn test_help_displays() {
    satchel()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_displays() {
    satchel()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("satchel"));
}

#[test]
fn test_config_defaults() {
    satchel()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("cookie_name = \"sessionid\""))
        .stdout(predicate::str::contains("cleaner_interval_secs = 60"));
}

#[test]
fn test_config_from_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("session.toml");
    std::fs::write(&path, "cookie_name = \"sid\"\nenable_http_header = true\n").unwrap();

    satchel()
        .args(["config", "--json", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cookie_name\": \"sid\""))
        .stdout(predicate::str::contains("\"enable_http_header\": true"));
}

#[test]
fn test_config_rejects_invalid_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("session.toml");
    std::fs::write(&path, "cleaner_interval_secs = 0\n").unwrap();

    satchel()
        .arg("config")
        .arg("--config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cleaner_interval_secs"));
}

#[test]
fn test_serve_rejects_bad_bind_address() {
    satchel()
        .args(["serve", "--bind", "not-an-address"])
        .assert()
        .failure();
}
