//! Tests for `strongbox credential` and `strongbox key-file`.

use crate::support::*;
use std::fs;

#[test]
fn test_credential_from_environment() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["credential", "private-key"])
        .env("SIGNING_PRIVATE_KEY", SAMPLE_PEM)
        .output()
        .unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "environment variable SIGNING_PRIVATE_KEY");
    assert_stdout_excludes(&output, "BEGIN PRIVATE KEY");
}

#[test]
fn test_credential_not_found_lists_probes() {
    let t = Test::new();

    let output = t.run(&["--json", "credential", "certificate"]);
    assert_failure(&output);
    let json = stdout_json(&output);
    let report = &json[0];
    assert_eq!(report["kind"], "certificate");
    assert_eq!(report["configured"], false);
    assert_eq!(report["loadable"], false);
    let error = report["error"].as_str().unwrap();
    assert!(error.contains("env SIGNING_CERTIFICATE"));
    assert!(error.contains("Signing:CertificatePath (unset)"));
}

#[test]
fn test_credential_plain_key_file() {
    let t = Test::new();
    let pem = t.write("signing.pem", SAMPLE_PEM);
    t.write(
        "appsettings.json",
        &format!(r#"{{"Signing":{{"PrivateKeyPath":{:?}}}}}"#, pem.to_str().unwrap()),
    );

    let output = t.run(&["credential", "private-key"]);
    assert_success(&output);
    assert_stdout_contains(&output, "plain file");
}

#[test]
fn test_key_file_roundtrip_and_resolution() {
    let t = Test::init();
    let pem = t.write("signing.pem", SAMPLE_PEM);
    let sealed = t.path("signing.pem.enc");
    let restored = t.path("restored.pem");

    let output = t.run(&[
        "key-file",
        "encrypt",
        pem.to_str().unwrap(),
        sealed.to_str().unwrap(),
    ]);
    assert_success(&output);
    let content = fs::read_to_string(&sealed).unwrap();
    assert!(content.starts_with("ENCRYPTED:"));
    assert!(!content.contains("BEGIN PRIVATE KEY"));

    t.write(
        "appsettings.json",
        &format!(
            r#"{{"Signing":{{"PrivateKeyPath":{:?}}}}}"#,
            sealed.to_str().unwrap()
        ),
    );
    t.write("strongbox.toml", "[credentials]\nencrypt_key_files = true\n");

    let output = t.run(&["credential", "private-key"]);
    assert_success(&output);
    assert_stdout_contains(&output, "encrypted file");

    let output = t.run(&[
        "key-file",
        "decrypt",
        sealed.to_str().unwrap(),
        restored.to_str().unwrap(),
    ]);
    assert_success(&output);
    assert_eq!(fs::read_to_string(&restored).unwrap(), SAMPLE_PEM);
}

#[test]
fn test_encrypted_key_file_with_wrong_key_is_hard_error() {
    let t = Test::init();
    let pem = t.write("signing.pem", SAMPLE_PEM);
    let sealed = t.path("signing.pem.enc");
    assert_success(&t.run(&[
        "key-file",
        "encrypt",
        pem.to_str().unwrap(),
        sealed.to_str().unwrap(),
    ]));

    assert_success(&t.init_cmd(&["--force"]));
    t.write(
        "appsettings.json",
        &format!(
            r#"{{"Signing":{{"PrivateKeyPath":{:?}}}}}"#,
            sealed.to_str().unwrap()
        ),
    );
    t.write("strongbox.toml", "[credentials]\nencrypt_key_files = true\n");

    let output = t.run(&["credential", "private-key"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "failed to decrypt private key");
}

#[test]
fn test_inline_passphrase_envelope() {
    let t = Test::init();
    let envelope = t.seal("correct horse");
    t.write(
        "appsettings.json",
        &format!(r#"{{"Signing":{{"PrivateKeyPassphrase":"{}"}}}}"#, envelope),
    );

    let output = t.run(&["--json", "credential", "passphrase"]);
    assert_success(&output);
    let json = stdout_json(&output);
    assert_eq!(json[0]["source"], "configuration key Signing:PrivateKeyPassphrase");
    assert!(!stdout(&output).contains("correct horse"));
}

#[test]
fn test_unknown_kind_fails() {
    let t = Test::new();

    let output = t.run(&["credential", "token"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "unknown credential kind");
}
