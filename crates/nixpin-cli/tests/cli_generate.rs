use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn nixpin_cmd() -> Command {
    Command::cargo_bin("nixpin").unwrap()
}

#[test]
fn test_help_lists_commands() {
    nixpin_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("tree"));
}

#[test]
fn test_generate_requires_python_target() {
    nixpin_cmd()
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--python-target"));
}

#[test]
fn test_generate_missing_requirements_file_fails() {
    let tmp = TempDir::new().unwrap();

    nixpin_cmd()
        .current_dir(tmp.path())
        .args(["generate", "-V", "3.11"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("requirements.txt"));
}

#[test]
fn test_generate_rejects_malformed_requirement() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("requirements.txt"), ">=1.0\n").unwrap();

    nixpin_cmd()
        .current_dir(tmp.path())
        .args(["generate", "-V", "3.11"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid requirement"));
}

#[test]
fn test_resolve_rejects_malformed_requirement() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("reqs.txt"), "pkga[unclosed\n").unwrap();

    nixpin_cmd()
        .current_dir(tmp.path())
        .args(["resolve", "-V", "3.11", "--requirements", "reqs.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid requirement"));
}

#[test]
fn test_version_flag() {
    nixpin_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nixpin"));
}
