//! Cryptographic operations.
//!
//! Two layers:
//!
//! - **Protector**: purpose-scoped authenticated encryption of individual
//!   values (AES-256-GCM, per-purpose key derived with HKDF-SHA256).
//! - **age**: wraps the master key at rest, either with a passphrase
//!   (scrypt) or for an x25519 recipient identity.
//!
//! ## Purposes
//!
//! Every protector is bound to a purpose string. Keys are derived per
//! purpose and the purpose is authenticated as associated data, so a
//! ciphertext produced for one purpose never unprotects under another.

pub mod age;
mod protector;

use crate::error::Result;

pub use protector::{MasterKey, Protector, Provider};

/// Well-known purpose strings.
pub mod purpose {
    /// Values embedded in configuration documents.
    pub const CONFIG_SECRETS: &str = "config.secrets";

    /// Private key and certificate files.
    pub const KEY_FILES: &str = "credentials.key-files";
}

/// Purpose-bound protect/unprotect capability.
///
/// Implementations must be safe to share across threads and must never
/// substitute a fallback value when unprotecting fails.
pub trait Protect: Send + Sync {
    /// Purpose this protector is bound to.
    fn purpose(&self) -> &str;

    /// Encrypt plaintext into JSON-safe ciphertext text.
    ///
    /// Empty input is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::EncryptionFailed` if the AEAD rejects the input.
    fn protect(&self, plaintext: &str) -> Result<String>;

    /// Decrypt ciphertext text produced by a protector with the same
    /// purpose and master key.
    ///
    /// Empty input is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::DecryptionFailed` if the ciphertext is
    /// malformed, truncated, corrupted, or from another purpose or key.
    fn unprotect(&self, ciphertext: &str) -> Result<String>;
}
