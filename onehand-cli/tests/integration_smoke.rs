//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

fn onehand() -> Command {
    let mut cmd = Command::cargo_bin("onehand").unwrap();
    // Keep the developer's real config and .env out of the picture
    cmd.env_remove("DATABASE_URL")
        .env_remove("ONEHAND_JWT_SECRET")
        .env_remove("ONEHAND_BIND")
        .env_remove("ONEHAND_RESERVATION_POLICY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    onehand()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("audit"));
}

#[test]
fn test_serve_help() {
    onehand()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Who may unreserve an item"));
}

#[test]
fn test_audit_help() {
    onehand()
        .args(["audit", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Print findings as JSON"));
}

#[test]
fn test_completions_bash() {
    onehand()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("onehand"));
}

#[test]
fn test_config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    onehand()
        .env("ONEHAND_CONFIG", &path)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(path.exists());

    onehand()
        .env("ONEHAND_CONFIG", &path)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    onehand()
        .env("ONEHAND_CONFIG", &path)
        .env("ONEHAND_JWT_SECRET", "super-secret-value-that-must-not-leak")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[reservations]"))
        .stdout(predicate::str::contains("super-secret-value").not());
}

#[test]
fn test_serve_without_secret_fails() {
    let dir = tempfile::tempdir().unwrap();
    onehand()
        .env("ONEHAND_CONFIG", dir.path().join("missing.toml"))
        .current_dir(dir.path())
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("jwt secret not set"));
}

#[test]
fn test_invalid_policy_rejected() {
    onehand()
        .args(["serve", "--policy", "anyone"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid reservation policy value"));
}

#[test]
fn test_dotenv_rust_log_applies() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".env"), "RUST_LOG=debug\n").unwrap();

    onehand()
        .env("ONEHAND_CONFIG", dir.path().join("missing.toml"))
        .current_dir(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"));
}
