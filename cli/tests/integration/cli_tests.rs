//! Integration tests for argument parsing, help, and version output.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn ssm_ssh() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ssm-ssh"));
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    ssm_ssh().assert().code(2).stderr(predicate::str::contains(
        "Ephemeral SSH access to instances through AWS Systems Manager",
    ));
}

#[test]
fn test_cli_help_flag_shows_usage_and_options() {
    ssm_ssh()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("<INSTANCE_ID>"))
        .stdout(predicate::str::contains("--grace-period"))
        .stdout(predicate::str::contains("--raw"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    ssm_ssh()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ssm-ssh 0.1.0"));
}

#[test]
fn test_cli_rejects_unknown_flag() {
    ssm_ssh()
        .args(["--no-such-flag", "i-1234"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--no-such-flag"));
}

#[test]
fn test_cli_rejects_non_numeric_port() {
    ssm_ssh()
        .args(["--port", "ssh", "i-1234"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--port"));
}
