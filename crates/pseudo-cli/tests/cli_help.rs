use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("pseudo")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("exec"))
        .stdout(predicate::str::contains("chats"))
        .stdout(predicate::str::contains("models"))
        .stdout(predicate::str::contains("--chat"));
}

#[test]
fn test_chats_help_shows_subcommands() {
    cargo_bin_cmd!("pseudo")
        .args(["chats", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("new"));
}

#[test]
fn test_exec_requires_prompt() {
    cargo_bin_cmd!("pseudo")
        .arg("exec")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--prompt"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("pseudo")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));
}
