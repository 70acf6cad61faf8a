//! `ENCRYPTED:` envelope codec.
//!
//! A configuration value is encrypted iff it is non-empty and begins with
//! the exact marker. Nothing else is interpreted: a lower-case or
//! whitespace-padded marker is plaintext.

use crate::core::cipher::Protect;
use crate::core::constants::ENCRYPTED_PREFIX;
use crate::error::{EnvelopeError, Result};

/// Check whether a value carries the envelope marker.
pub fn is_encrypted(value: &str) -> bool {
    !value.is_empty() && value.starts_with(ENCRYPTED_PREFIX)
}

/// Prefix ciphertext with the envelope marker.
pub fn wrap(ciphertext: &str) -> String {
    format!("{}{}", ENCRYPTED_PREFIX, ciphertext)
}

/// Strip the envelope marker.
///
/// # Errors
///
/// Returns `EnvelopeError::NotEncrypted` if the value is not marked.
pub fn unwrap(value: &str) -> std::result::Result<&str, EnvelopeError> {
    if !is_encrypted(value) {
        return Err(EnvelopeError::NotEncrypted);
    }
    Ok(&value[ENCRYPTED_PREFIX.len()..])
}

/// Protect a plaintext value and wrap it in an envelope.
///
/// Empty input is passed through unchanged and unmarked.
pub fn seal(protector: &dyn Protect, plaintext: &str) -> Result<String> {
    if plaintext.is_empty() {
        return Ok(String::new());
    }
    let ciphertext = protector.protect(plaintext)?;
    Ok(wrap(&ciphertext))
}

/// Unwrap an envelope and unprotect its ciphertext.
///
/// Empty input is passed through unchanged.
///
/// # Errors
///
/// Returns `EnvelopeError::NotEncrypted` for unmarked values and
/// `CipherError::DecryptionFailed` if the ciphertext does not verify.
pub fn open(protector: &dyn Protect, value: &str) -> Result<String> {
    if value.is_empty() {
        return Ok(String::new());
    }
    let ciphertext = unwrap(value)?;
    protector.unprotect(ciphertext)
}
