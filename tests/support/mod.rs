//! Test support utilities for strongbox integration tests.
//!
//! Provides reusable test environment setup and helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// Test environment with isolated temp directories.
///
/// Each test gets its own project dir and home dir. No process-global
/// state is mutated; child processes use `.current_dir()` and explicit
/// environment so tests can safely run in parallel.
pub struct Test {
    /// Temporary directory holding the configuration document
    pub dir: TempDir,
    /// Temporary home directory, master keys live under `keys/`
    pub home: TempDir,
}

impl Test {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");

        Self { dir, home }
    }

    /// Create a test environment with a master key.
    pub fn init() -> Self {
        let t = Self::new();
        let output = t.init_cmd(&[]);
        assert!(
            output.status.success(),
            "Failed to create master key: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        t
    }

    /// Create a test environment with a master key and `appsettings.json`.
    pub fn with_document(contents: &str) -> Self {
        let t = Self::init();
        t.write("appsettings.json", contents);
        t
    }

    /// Directory holding master keys.
    pub fn key_dir(&self) -> PathBuf {
        self.home.path().join("keys")
    }

    /// Path inside the project directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a file in the project directory.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).expect("failed to write test file");
        path
    }

    /// Read a file from the project directory.
    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).expect("failed to read test file")
    }

    /// Backups written next to `appsettings.json`.
    pub fn backups(&self) -> Vec<PathBuf> {
        let mut backups: Vec<PathBuf> = fs::read_dir(self.dir.path())
            .expect("failed to read test dir")
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("appsettings.json.backup."))
            })
            .collect();
        backups.sort();
        backups
    }
}
