//! CLI argument handling tests

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_missing_hook_argument_fails() {
    Command::cargo_bin("warden")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--hook"));
}

#[test]
fn test_unrecognised_hook_kind_fails() {
    Command::cargo_bin("warden")
        .unwrap()
        .args(["--hook", "tool_use"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognised hook kind"));
}

#[test]
fn test_version_flag() {
    Command::cargo_bin("warden")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("warden"));
}

#[test]
fn test_help_lists_hook_flag() {
    Command::cargo_bin("warden")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--hook"))
        .stdout(predicate::str::contains("--config-dir"));
}
