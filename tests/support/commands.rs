//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

/// Variables that would leak host configuration into a test run.
const HOST_VARS: &[&str] = &[
    "STRONGBOX_CONFIG",
    "STRONGBOX_LOG",
    "STRONGBOX_KEY_PASSPHRASE",
    "SIGNING_PRIVATE_KEY",
    "SIGNING_CERTIFICATE",
    "SIGNING_PRIVATE_KEY_PASSPHRASE",
    "SIGNING_PRIVATE_KEY_FILE",
    "SIGNING_CERTIFICATE_FILE",
    "SIGNING_PASSPHRASE_FILE",
];

impl Test {
    /// Create a strongbox command with correct environment variables.
    ///
    /// Returns a Command configured with:
    /// - HOME set to the temporary home directory
    /// - STRONGBOX_KEY_DIR pointing inside it
    /// - Current directory set to the test project directory
    /// - NO_COLOR so output can be matched literally
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("strongbox").expect("failed to find strongbox binary");
        for var in HOST_VARS {
            cmd.env_remove(var);
        }
        cmd.env("HOME", self.home.path());
        // Windows uses USERPROFILE instead of HOME for home directory
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("STRONGBOX_KEY_DIR", self.key_dir());
        cmd.env("NO_COLOR", "1");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Run strongbox with arguments.
    pub fn run(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .output()
            .expect("failed to run strongbox")
    }

    /// Shortcut for `strongbox init` command.
    pub fn init_cmd(&self, extra: &[&str]) -> Output {
        let mut args = vec!["init"];
        args.extend_from_slice(extra);
        self.run(&args)
    }

    /// Shortcut for `strongbox encrypt` command.
    pub fn encrypt(&self, value: &str) -> Output {
        self.run(&["encrypt", value])
    }

    /// Encrypt a value and return the envelope.
    pub fn seal(&self, value: &str) -> String {
        let output = self.encrypt(value);
        super::assert_success(&output);
        super::stdout(&output).trim().to_string()
    }

    /// Shortcut for `strongbox decrypt` command.
    pub fn decrypt(&self, value: &str) -> Output {
        self.run(&["decrypt", value])
    }

    /// Shortcut for `strongbox encrypt-file` command.
    pub fn encrypt_file(&self) -> Output {
        self.run(&["encrypt-file"])
    }

    /// Shortcut for `strongbox decrypt-file --yes` command.
    pub fn decrypt_file_yes(&self) -> Output {
        self.run(&["decrypt-file", "--yes"])
    }

    /// Shortcut for `strongbox list` command.
    pub fn list(&self) -> Output {
        self.run(&["list"])
    }

    /// Shortcut for `strongbox get` command.
    pub fn get(&self, key: &str) -> Output {
        self.run(&["get", key])
    }
}
