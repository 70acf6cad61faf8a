//! Tests for bulk file commands: encrypt-file, decrypt-file, list, get, check.

use crate::support::*;
use std::fs;

#[test]
fn test_encrypt_file_simple_document() {
    let t = Test::with_document(SIMPLE_DOCUMENT);

    let output = t.encrypt_file();
    assert_success(&output);
    assert_stdout_contains(&output, "Encrypted 1 secret");
    assert_stdout_contains(&output, "Password");

    let doc: serde_json::Value = serde_json::from_str(&t.read("appsettings.json")).unwrap();
    assert_eq!(doc["Username"], "ok");
    assert!(doc["Password"].as_str().unwrap().starts_with("ENCRYPTED:"));

    // Backup is the exact original
    let backups = t.backups();
    assert_eq!(backups.len(), 1);
    assert_eq!(fs::read_to_string(&backups[0]).unwrap(), SIMPLE_DOCUMENT);
}

#[test]
fn test_encrypt_file_preserves_layout() {
    let t = Test::with_document(APPSETTINGS);

    assert_success(&t.encrypt_file());
    let rewritten = t.read("appsettings.json");

    // Untouched lines survive byte for byte
    for line in [
        "    \"LogLevel\": { \"Default\": \"Information\" }",
        "    \"BaseUrl\": \"https://core.example.com\",",
        "    \"PrivateKeyPath\": \"\",",
        "  \"AllowedHosts\": \"*\"",
    ] {
        assert!(rewritten.contains(line), "missing line: {}", line);
    }
    assert!(!rewritten.contains("hunter2"));
    assert!(!rewritten.contains("Host=db"));
    assert!(!rewritten.contains("correct horse"));
}

#[test]
fn test_encrypt_file_twice_is_noop() {
    let t = Test::with_document(SIMPLE_DOCUMENT);
    assert_success(&t.encrypt_file());
    let after_first = t.read("appsettings.json");

    let output = t.encrypt_file();
    assert_success(&output);
    assert_stdout_contains(&output, "No plain text secrets found");
    assert_eq!(t.read("appsettings.json"), after_first);
    assert_eq!(t.backups().len(), 1, "no-op must not write a backup");
}

#[test]
fn test_decrypt_file_requires_confirmation() {
    let t = Test::with_document(SIMPLE_DOCUMENT);
    assert_success(&t.encrypt_file());
    let encrypted = t.read("appsettings.json");

    let output = t.run(&["decrypt-file"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "must be confirmed");
    assert_stderr_contains(&output, "--yes");
    assert_eq!(t.read("appsettings.json"), encrypted);
}

#[test]
fn test_decrypt_file_restores_document() {
    let t = Test::with_document(SIMPLE_DOCUMENT);
    assert_success(&t.encrypt_file());

    let output = t.decrypt_file_yes();
    assert_success(&output);
    assert_stdout_contains(&output, "Decrypted 1 secret");
    assert_stderr_contains(&output, "plain text");

    assert_eq!(t.read("appsettings.json"), SIMPLE_DOCUMENT);
}

#[test]
fn test_decrypt_file_nothing_to_do_needs_no_confirmation() {
    let t = Test::with_document(SIMPLE_DOCUMENT);

    let output = t.run(&["decrypt-file"]);
    assert_success(&output);
    assert_stdout_contains(&output, "No encrypted secrets found");
    assert!(t.backups().is_empty());
}

#[test]
fn test_encrypt_file_missing_document() {
    let t = Test::init();

    let output = t.encrypt_file();
    assert_failure(&output);
    assert_stderr_contains(&output, "configuration file not found");
}

#[test]
fn test_encrypt_file_invalid_json_untouched() {
    let t = Test::with_document("{\"Password\": \"hunter2\",");

    let output = t.encrypt_file();
    assert_failure(&output);
    assert_eq!(t.read("appsettings.json"), "{\"Password\": \"hunter2\",");
    assert!(t.backups().is_empty());
}

#[test]
fn test_explicit_path_and_settings_document() {
    let t = Test::init();
    t.write("custom.json", SIMPLE_DOCUMENT);

    assert_success(&t.run(&["encrypt-file", "custom.json"]));
    assert!(t.read("custom.json").contains("ENCRYPTED:"));

    t.write("other.json", SIMPLE_DOCUMENT);
    t.write("strongbox.toml", "[document]\npath = \"other.json\"\n");
    assert_success(&t.encrypt_file());
    assert!(t.read("other.json").contains("ENCRYPTED:"));
}

#[test]
fn test_list_reports_status() {
    let t = Test::with_document(APPSETTINGS);

    let output = t.list();
    assert_success(&output);
    for key in APPSETTINGS_SECRETS {
        assert_stdout_contains(&output, key);
    }
    assert_stdout_contains(&output, "plain");
    assert_stdout_excludes(&output, "hunter2");

    assert_success(&t.encrypt_file());
    let output = t.run(&["--json", "list"]);
    assert_success(&output);
    let json = stdout_json(&output);
    let fields = json.as_array().unwrap();
    assert_eq!(fields.len(), APPSETTINGS_SECRETS.len());
    assert!(fields.iter().all(|f| f["encrypted"] == true));
}

#[test]
fn test_list_needs_no_key() {
    let t = Test::new();
    t.write("appsettings.json", SIMPLE_DOCUMENT);

    let output = t.list();
    assert_success(&output);
    assert_stdout_contains(&output, "Password");
    assert!(!t.key_dir().join("master.key").exists());
}

#[test]
fn test_get_decrypts_single_secret() {
    let t = Test::with_document(APPSETTINGS);
    assert_success(&t.encrypt_file());

    let output = t.get("Core:Password");
    assert_success(&output);
    assert_eq!(stdout(&output).trim_end(), "hunter2");

    // Slash separator and case-insensitive keys
    let output = t.get("database/connectionstring");
    assert_success(&output);
    assert_eq!(stdout(&output).trim_end(), "Host=db;Password=pw");
}

#[test]
fn test_get_plain_value_warns() {
    let t = Test::with_document(APPSETTINGS);

    let output = t.get("Core:Username");
    assert_success(&output);
    assert_stdout_contains(&output, "svc-account");
    assert_stderr_contains(&output, "not encrypted");

    let output = t.run(&["--json", "get", "Core:Username"]);
    let json = stdout_json(&output);
    assert_eq!(json["wasEncrypted"], false);
}

#[test]
fn test_get_missing_key() {
    let t = Test::with_document(APPSETTINGS);

    let output = t.get("Core:Missing");
    assert_failure(&output);
    assert_stderr_contains(&output, "no string value at Core:Missing");
}

#[test]
fn test_check_reports_broken_values() {
    let t = Test::with_document(APPSETTINGS);
    assert_success(&t.encrypt_file());

    let output = t.run(&["check"]);
    assert_success(&output);
    assert_stdout_contains(&output, "all encrypted values decrypt");

    let broken = t
        .read("appsettings.json")
        .replacen("ENCRYPTED:", "ENCRYPTED:x", 1);
    t.write("appsettings.json", &broken);

    let output = t.run(&["check"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "Core:Password does not decrypt");
    assert_stderr_contains(&output, "1 encrypted value failed to decrypt");
}

#[test]
fn test_json_bulk_response() {
    let t = Test::with_document(APPSETTINGS);

    let output = t.run(&["--json", "encrypt-file"]);
    assert_success(&output);
    let json = stdout_json(&output);
    assert_eq!(json["success"], true);
    assert_eq!(json["keys"].as_array().unwrap().len(), 3);
    assert!(json["backupPath"].is_string());
    assert!(json["warning"].is_string());
}
