//! Tests for error handling and CLI flags.

use crate::support::*;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    let t = Test::new();

    t.cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("init")
            .and(predicate::str::contains("encrypt-file"))
            .and(predicate::str::contains("decrypt-file"))
            .and(predicate::str::contains("credential"))
            .and(predicate::str::contains("key-file")),
    );
}

#[test]
fn test_unknown_command_fails() {
    let t = Test::new();

    t.cmd()
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown-command"));
}

#[test]
fn test_verbose_flag_accepted() {
    let t = Test::new();

    let output = t.run(&["--verbose", "init"]);
    assert_success(&output);
}

#[test]
fn test_version_flag() {
    let t = Test::new();

    t.cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("strongbox "));
}

#[test]
fn test_completions_bash_outputs_script() {
    let t = Test::new();

    let output = t.run(&["completions", "bash"]);
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.contains("_strongbox") || out.contains("complete"));
}

#[test]
fn test_completions_ignore_broken_settings() {
    let t = Test::new();
    t.write("strongbox.toml", "not toml at all [");

    t.cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_invalid_settings_rejected() {
    let t = Test::new();
    t.write("strongbox.toml", "[keys]\nunknown = 1\n");

    let output = t.run(&["list"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "failed to parse settings");
}

#[test]
fn test_explicit_settings_must_exist() {
    let t = Test::new();

    let output = t.run(&["--config", "missing.toml", "list"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "failed to read settings");
}

#[test]
fn test_keychain_unsupported_off_macos() {
    if cfg!(target_os = "macos") {
        return;
    }
    let t = Test::new();

    let output = t.init_cmd(&["--protection", "keychain"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "not available on this platform");
}

#[test]
fn test_errors_are_prefixed() {
    let t = Test::new();

    let output = t.get("Core:Password");
    assert_failure(&output);
    assert_stderr_contains(&output, "✗");
}
