//! Tests for `strongbox encrypt` and `strongbox decrypt`.

use crate::support::*;

#[test]
fn test_encrypt_decrypt_roundtrip() {
    let t = Test::init();

    let envelope = t.seal("p@ss w0rd! ünïcode");
    assert!(envelope.starts_with("ENCRYPTED:"));
    assert!(!envelope.contains("p@ss"));

    let output = t.decrypt(&envelope);
    assert_success(&output);
    assert_eq!(stdout(&output).trim_end(), "p@ss w0rd! ünïcode");
}

#[test]
fn test_encrypt_is_randomised() {
    let t = Test::init();
    assert_ne!(t.seal("same"), t.seal("same"));
}

#[test]
fn test_encrypt_creates_missing_key() {
    let t = Test::new();

    let output = t.encrypt("hunter2");
    assert_success(&output);
    assert!(t.key_dir().join("master.key").exists());
}

#[test]
fn test_encrypt_reads_stdin() {
    let t = Test::init();

    let output = t
        .cmd()
        .arg("encrypt")
        .write_stdin("from-stdin\n")
        .output()
        .unwrap();
    assert_success(&output);
    let envelope = stdout(&output).trim().to_string();

    let output = t.decrypt(&envelope);
    assert_success(&output);
    assert_eq!(stdout(&output).trim_end(), "from-stdin");
}

#[test]
fn test_decrypt_without_key_suggests_init() {
    let t = Test::new();

    let output = t.decrypt("ENCRYPTED:abc");
    assert_failure(&output);
    assert_stderr_contains(&output, "no master key");
    assert_stderr_contains(&output, "strongbox init");
}

#[test]
fn test_decrypt_plaintext_fails() {
    let t = Test::init();

    let output = t.decrypt("hunter2");
    assert_failure(&output);
    assert_stderr_contains(&output, "missing ENCRYPTED: prefix");
    assert_stderr_excludes(&output, "hunter2");
}

#[test]
fn test_decrypt_tampered_fails_without_echo() {
    let t = Test::init();
    let mut envelope = t.seal("hunter2");
    envelope.push('A');

    let output = t.decrypt(&envelope);
    assert_failure(&output);
    assert_stderr_contains(&output, "decryption failed");
    assert_stderr_excludes(&output, &envelope);
}

#[test]
fn test_json_responses() {
    let t = Test::init();

    let output = t
        .run(&["--json", "encrypt", "hunter2", "--key", "Core:Password"]);
    assert_success(&output);
    let json = stdout_json(&output);
    assert_eq!(json["key"], "Core:Password");
    let envelope = json["encrypted"].as_str().unwrap().to_string();
    assert!(json["message"].is_string());

    let output = t.run(&["--json", "decrypt", &envelope]);
    assert_success(&output);
    let json = stdout_json(&output);
    assert_eq!(json["decrypted"], "hunter2");
    assert_eq!(json["warning"], "This is sensitive information!");
}

#[test]
fn test_application_name_isolates_keys() {
    let t = Test::init();
    let envelope = t.seal("hunter2");

    t.write("strongbox.toml", "[keys]\napplication = \"other\"\n");
    let output = t.decrypt(&envelope);
    assert_failure(&output);
}
