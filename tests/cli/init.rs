//! Tests for `strongbox init` command.

use crate::support::*;
use std::fs;

#[test]
fn test_init_creates_master_key() {
    let t = Test::new();

    let output = t.init_cmd(&[]);
    assert_success(&output);
    assert_stdout_contains(&output, "created master key (none)");

    let key_path = t.key_dir().join("master.key");
    assert!(key_path.exists(), "master.key should exist");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&key_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}

#[test]
fn test_init_twice_fails_without_force() {
    let t = Test::init();
    let before = fs::read_to_string(t.key_dir().join("master.key")).unwrap();

    let output = t.init_cmd(&[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "already exists");

    let after = fs::read_to_string(t.key_dir().join("master.key")).unwrap();
    assert_eq!(before, after, "existing key must not be replaced");
}

#[test]
fn test_init_force_replaces_key() {
    let t = Test::init();
    let envelope = t.seal("hunter2");

    let output = t.init_cmd(&["--force"]);
    assert_success(&output);

    // Old envelopes no longer open under the new key
    let output = t.decrypt(&envelope);
    assert_failure(&output);
    assert_stderr_excludes(&output, "hunter2");
}

#[test]
fn test_init_with_generated_identity() {
    let t = Test::new();
    let identity = t.home.path().join("identity.txt");

    let output = t.init_cmd(&["--identity", identity.to_str().unwrap()]);
    assert_success(&output);
    assert_stdout_contains(&output, "generated identity");
    assert_stdout_contains(&output, "created master key (identity)");

    let contents = fs::read_to_string(&identity).unwrap();
    assert!(contents.contains("AGE-SECRET-KEY-1"));
    let key = fs::read_to_string(t.key_dir().join("master.key")).unwrap();
    assert!(key.starts_with("-----BEGIN AGE ENCRYPTED FILE-----"));

    // Settings must name the identity for later commands
    t.write(
        "strongbox.toml",
        &format!(
            "[keys]\nprotection = \"identity\"\nidentity = {:?}\n",
            identity.to_str().unwrap()
        ),
    );
    let envelope = t.seal("hunter2");
    let output = t.decrypt(&envelope);
    assert_success(&output);
    assert_stdout_contains(&output, "hunter2");
}

#[test]
fn test_init_passphrase_requires_variable() {
    let t = Test::new();

    let output = t.init_cmd(&["--protection", "passphrase"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "STRONGBOX_KEY_PASSPHRASE");
    assert!(!t.key_dir().join("master.key").exists());
}

#[test]
fn test_init_passphrase_roundtrip() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["init", "--protection", "passphrase"])
        .env("STRONGBOX_KEY_PASSPHRASE", "correct horse")
        .output()
        .unwrap();
    assert_success(&output);

    t.write("strongbox.toml", "[keys]\nprotection = \"passphrase\"\n");
    let output = t
        .cmd()
        .args(["encrypt", "hunter2"])
        .env("STRONGBOX_KEY_PASSPHRASE", "correct horse")
        .output()
        .unwrap();
    assert_success(&output);
    let envelope = stdout(&output).trim().to_string();

    let output = t
        .cmd()
        .args(["decrypt", &envelope])
        .env("STRONGBOX_KEY_PASSPHRASE", "battery staple")
        .output()
        .unwrap();
    assert_failure(&output);

    let output = t
        .cmd()
        .args(["decrypt", &envelope])
        .env("STRONGBOX_KEY_PASSPHRASE", "correct horse")
        .output()
        .unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "hunter2");
}

#[test]
fn test_wrap_mismatch_is_reported() {
    let t = Test::init();
    t.write("strongbox.toml", "[keys]\nprotection = \"passphrase\"\n");

    let output = t
        .cmd()
        .args(["encrypt", "hunter2"])
        .env("STRONGBOX_KEY_PASSPHRASE", "correct horse")
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "wrapped with 'none'");
}
