//! Bulk encryption and decryption of configuration documents.
//!
//! A rewrite is one critical section per target file:
//!
//! 1. exclusive lock on `<file>.lock`
//! 2. parse and scan; nothing to do means no backup and no write
//! 3. copy the original to `<file>.backup.<timestamp>` (never overwriting)
//! 4. seal or open each field, checking for cancellation in between
//! 5. replace the affected string literals in the raw text
//! 6. write a temp file beside the target and rename it into place
//!
//! Any failure before step 6 leaves the target untouched.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use fs2::FileExt;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::core::cipher::Protect;
use crate::core::constants;
use crate::core::document::{ConfigDocument, ConfigPath};
use crate::core::envelope;
use crate::core::scan::{Scan, SecretField};
use crate::error::{Result, RewriteError};

/// Cooperative cancellation flag, checked between fields.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Explicit consent to write plaintext secrets to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Unconfirmed,
}

impl From<bool> for Confirmation {
    fn from(yes: bool) -> Self {
        if yes {
            Self::Confirmed
        } else {
            Self::Unconfirmed
        }
    }
}

/// Direction of a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Encrypt,
    Decrypt,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Encrypt => "encrypt",
            Self::Decrypt => "decrypt",
        }
    }

    fn transform(&self, protector: &dyn Protect, value: &str) -> Result<String> {
        match self {
            Self::Encrypt => envelope::seal(protector, value),
            Self::Decrypt => envelope::open(protector, value),
        }
    }
}

/// Outcome of a bulk rewrite.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteReport {
    pub operation: Operation,
    /// Rewritten field paths, `:` separated
    pub fields: Vec<String>,
    /// Backup of the original, absent for a no-op
    pub backup_path: Option<PathBuf>,
}

impl RewriteReport {
    fn noop(operation: Operation) -> Self {
        Self {
            operation,
            fields: Vec::new(),
            backup_path: None,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.fields.is_empty()
    }

    /// One-line summary.
    pub fn message(&self) -> String {
        match (self.operation, self.fields.len()) {
            (Operation::Encrypt, 0) => "No plain text secrets found".to_string(),
            (Operation::Decrypt, 0) => "No encrypted secrets found".to_string(),
            (Operation::Encrypt, n) => format!("Encrypted {} secret{}", n, plural(n)),
            (Operation::Decrypt, n) => format!("Decrypted {} secret{}", n, plural(n)),
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Rewrites secret fields of configuration files in place.
pub struct Rewriter<'a> {
    protector: &'a dyn Protect,
    cancel: CancelToken,
    stamp: fn() -> String,
}

impl<'a> Rewriter<'a> {
    pub fn new(protector: &'a dyn Protect) -> Self {
        Self {
            protector,
            cancel: CancelToken::new(),
            stamp: now_stamp,
        }
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[cfg(test)]
    fn with_stamp(mut self, stamp: fn() -> String) -> Self {
        self.stamp = stamp;
        self
    }

    /// Encrypt every plain secret-shaped field.
    ///
    /// # Errors
    ///
    /// Returns `RewriteError::BackupFailed` if the backup cannot be written,
    /// `RewriteError::Field` if a value cannot be sealed, or
    /// `RewriteError::Cancelled`. The target is unchanged in every case.
    pub fn encrypt_all(&self, path: &Path) -> Result<RewriteReport> {
        self.rewrite(path, Operation::Encrypt, Confirmation::Confirmed)
    }

    /// Decrypt every enveloped field.
    ///
    /// # Errors
    ///
    /// As [`Rewriter::encrypt_all`], plus `RewriteError::NotConfirmed` when
    /// there is something to decrypt and `confirmation` is not given.
    pub fn decrypt_all(&self, path: &Path, confirmation: Confirmation) -> Result<RewriteReport> {
        self.rewrite(path, Operation::Decrypt, confirmation)
    }

    fn rewrite(
        &self,
        path: &Path,
        operation: Operation,
        confirmation: Confirmation,
    ) -> Result<RewriteReport> {
        let _lock = FileLock::acquire(path)?;

        let mut doc = ConfigDocument::load(path)?;
        let scan = Scan::document(&doc);
        let targets: Vec<&SecretField> = match operation {
            Operation::Encrypt => scan.plain().collect(),
            Operation::Decrypt => scan.encrypted().collect(),
        };

        if targets.is_empty() {
            debug!(path = %path.display(), operation = operation.as_str(), "nothing to rewrite");
            return Ok(RewriteReport::noop(operation));
        }

        if operation == Operation::Decrypt && confirmation != Confirmation::Confirmed {
            return Err(RewriteError::NotConfirmed(targets.len()).into());
        }

        let backup_path = backup(path, &(self.stamp)())?;
        info!(path = %path.display(), backup = %backup_path.display(), "created backup");

        let total = targets.len();
        let mut edits: Vec<(ConfigPath, String)> = Vec::with_capacity(total);
        for (done, field) in targets.iter().enumerate() {
            self.check_cancelled(path, done, total)?;

            let value = operation
                .transform(self.protector, &field.value)
                .map_err(|e| RewriteError::Field {
                    operation: operation.as_str(),
                    field: field.path.to_string(),
                    source: Box::new(e),
                })?;
            debug!(field = %field.path, operation = operation.as_str(), "field rewritten");
            edits.push((field.path.clone(), value));
        }
        self.check_cancelled(path, total, total)?;

        doc.replace_strings(&edits)?;
        write_atomic(path, doc.raw())?;

        if operation == Operation::Decrypt {
            warn!(path = %path.display(), count = total, "secrets written to disk in plain text");
        } else {
            info!(path = %path.display(), count = total, "secrets encrypted");
        }

        Ok(RewriteReport {
            operation,
            fields: edits.iter().map(|(p, _)| p.to_string()).collect(),
            backup_path: Some(backup_path),
        })
    }

    fn check_cancelled(&self, path: &Path, done: usize, total: usize) -> Result<()> {
        if self.cancel.is_cancelled() {
            warn!(path = %path.display(), done, total, "rewrite cancelled");
            return Err(RewriteError::Cancelled {
                path: path.to_path_buf(),
                done,
                total,
            }
            .into());
        }
        Ok(())
    }
}

/// Scan a document and report every secret field with its status.
pub fn list(path: &Path) -> Result<Scan> {
    let doc = ConfigDocument::load(path)?;
    Ok(Scan::document(&doc))
}

/// Exclusive advisory lock on `<file>.lock`, released on drop.
struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    fn acquire(target: &Path) -> Result<Self> {
        let path = sidecar(target, ".lock");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| RewriteError::Locked {
                path: path.clone(),
                source,
            })?;
        file.lock_exclusive()
            .map_err(|source| RewriteError::Locked {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "lock acquired");
        Ok(Self { file, path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        debug!(path = %self.path.display(), "lock released");
    }
}

fn sidecar(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn now_stamp() -> String {
    Local::now().format(constants::BACKUP_TIMESTAMP).to_string()
}

/// Copy the original to a fresh timestamped backup.
///
/// Never overwrites: a second backup within the same second gets a numeric
/// suffix.
fn backup(path: &Path, stamp: &str) -> Result<PathBuf> {
    let base = sidecar(path, &format!(".backup.{}", stamp));

    let failed = |source: io::Error| RewriteError::BackupFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut source = File::open(path).map_err(failed)?;
    let permissions = source.metadata().map_err(failed)?.permissions();

    for attempt in 0..100u32 {
        let candidate = if attempt == 0 {
            base.clone()
        } else {
            sidecar(&base, &format!(".{}", attempt))
        };

        let mut dest = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(failed(e).into()),
        };

        io::copy(&mut source, &mut dest).map_err(failed)?;
        dest.sync_all().map_err(failed)?;
        fs::set_permissions(&candidate, permissions).map_err(failed)?;
        return Ok(candidate);
    }

    Err(failed(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "too many backups with the same timestamp",
    ))
    .into())
}

/// Replace a file's contents via temp file and rename.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let failed = |source: io::Error| RewriteError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(path).map_err(failed)?.permissions();

    let mut tmp = NamedTempFile::new_in(dir).map_err(failed)?;
    tmp.write_all(contents.as_bytes()).map_err(failed)?;
    tmp.as_file().sync_all().map_err(failed)?;
    fs::set_permissions(tmp.path(), permissions).map_err(failed)?;
    tmp.persist(path).map_err(|e| failed(e.error))?;

    debug!(path = %path.display(), bytes = contents.len(), "document written");
    Ok(())
}
