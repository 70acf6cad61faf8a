//! Error types.
//!
//! Each concern gets its own enum; [`Error`] unifies them for callers that
//! only need to propagate. Messages carry paths, field names and operation
//! names only, never plaintext or ciphertext.

use std::path::PathBuf;

use thiserror::Error;

/// Malformed or missing envelope marker.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("value is not encrypted (missing ENCRYPTED: prefix)")]
    NotEncrypted,
}

/// Cryptographic failures.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("decryption failed for purpose '{purpose}': {reason}")]
    DecryptionFailed { purpose: String, reason: String },

    #[error("encryption failed for purpose '{purpose}': {reason}")]
    EncryptionFailed { purpose: String, reason: String },

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("master key wrap failed: {0}")]
    Wrap(String),

    #[error("master key unwrap failed: {0}")]
    Unwrap(String),
}

/// Master key storage failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no master key found in {0}")]
    NoMasterKey(String),

    #[error("master key already exists in {0} (use --force to replace)")]
    AlreadyExists(String),

    #[error("invalid master key format: {0}")]
    InvalidFormat(String),

    #[error("master key in {path} is wrapped with '{found}', but '{expected}' is configured")]
    WrapMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("passphrase variable {0} is not set")]
    MissingPassphrase(String),

    #[error("invalid age identity in {0}")]
    InvalidIdentity(String),

    #[error("failed to read master key: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("failed to write master key: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("unable to determine home directory")]
    NoHomeDir,

    #[error("keychain error: {0}")]
    KeychainError(String),

    #[error("keychain access denied")]
    KeychainAccessDenied,

    #[error("key protection '{0}' is not available on this platform")]
    Unsupported(String),
}

/// Configuration document failures.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed JSON at byte {offset}: {reason}")]
    Syntax { offset: usize, reason: String },

    #[error("no string value at {0}")]
    PathNotFound(String),
}

/// Bulk rewrite failures.
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("backup of {path} failed, nothing was changed: {source}")]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decrypting {0} secrets writes plaintext to disk and must be confirmed")]
    NotConfirmed(usize),

    #[error("rewrite cancelled after {done} of {total} fields, {path} was not modified")]
    Cancelled {
        path: PathBuf,
        done: usize,
        total: usize,
    },

    #[error("failed to {operation} secret at {field}: {source}")]
    Field {
        operation: &'static str,
        field: String,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to lock {path}: {source}")]
    Locked {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Credential resolution failures.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("{kind} not found (tried: {})", tried.join(", "))]
    NotFound { kind: String, tried: Vec<String> },

    #[error("failed to read {kind} from {path}: {source}")]
    ReadFailed {
        kind: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decrypt {kind} from {location}: {source}")]
    DecryptFailed {
        kind: String,
        location: String,
        #[source]
        source: Box<Error>,
    },

    #[error("unknown credential kind: {0} (expected private-key, certificate or passphrase)")]
    UnknownKind(String),
}

/// Fatal failure while decrypting a field of a structured option object.
#[derive(Error, Debug)]
#[error("failed to decrypt {type_name}.{field}: {source}")]
pub struct BindingError {
    pub type_name: &'static str,
    pub field: &'static str,
    #[source]
    pub source: Box<Error>,
}

/// Tool settings failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read settings: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// Carries only the shape of a serde failure. serde_json messages echo
    /// the offending value, which may be a secret.
    #[error("section {section} could not be bound as {expected}: {category:?} error")]
    Section {
        section: String,
        expected: &'static str,
        category: serde_json::error::Category,
    },
}

impl ConfigError {
    pub fn section(section: &str, expected: &'static str, source: &serde_json::Error) -> Self {
        ConfigError::Section {
            section: section.to_string(),
            expected,
            category: source.classify(),
        }
    }
}

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
