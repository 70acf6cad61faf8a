//! AES-256-GCM protector with HKDF purpose derivation.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use tracing::{info, trace};
use zeroize::Zeroizing;

use super::Protect;
use crate::core::store::Store;
use crate::error::{CipherError, Result, StoreError};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// 256-bit master key. Zeroized on drop.
#[derive(Clone)]
pub struct MasterKey(Zeroizing<[u8; KEY_LEN]>);

impl MasterKey {
    /// Generate a fresh random master key.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        rand::rngs::OsRng.fill_bytes(bytes.as_mut());
        Self(bytes)
    }

    /// Build a master key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidFormat` unless exactly 32 bytes are given.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_LEN {
            return Err(StoreError::InvalidFormat(format!(
                "expected {} key bytes, got {}",
                KEY_LEN,
                bytes.len()
            ))
            .into());
        }
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Parse the base64 text form written by [`MasterKey::to_base64`].
    pub fn from_base64(text: &str) -> Result<Self> {
        let bytes = Zeroizing::new(
            STANDARD
                .decode(text.trim())
                .map_err(|e| StoreError::InvalidFormat(format!("invalid base64: {}", e)))?,
        );
        Self::from_bytes(&bytes)
    }

    /// Base64 text form, for key stores.
    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(STANDARD.encode(self.0.as_ref()))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}

/// Hands out purpose-bound protectors derived from one master key.
#[derive(Debug, Clone)]
pub struct Provider {
    master: MasterKey,
    application: String,
}

impl Provider {
    /// Create a provider for an application.
    ///
    /// The application name is mixed into every derivation, so two
    /// applications sharing a master key still get disjoint keys.
    pub fn new(master: MasterKey, application: impl Into<String>) -> Self {
        Self {
            master,
            application: application.into(),
        }
    }

    /// Load the master key from a store.
    ///
    /// Used by read paths; a missing key is an error rather than a reason
    /// to mint a new one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoMasterKey` if the store is empty.
    pub fn open(store: &dyn Store, application: impl Into<String>) -> Result<Self> {
        Ok(Self::new(store.load_master()?, application))
    }

    /// Load the master key from a store, generating one if absent.
    pub fn open_or_create(store: &dyn Store, application: impl Into<String>) -> Result<Self> {
        let master = if store.has_master() {
            store.load_master()?
        } else {
            info!(store = store.name(), location = %store.location(), "generating master key");
            store.create_master(false)?
        };
        Ok(Self::new(master, application))
    }

    /// Application name.
    pub fn application(&self) -> &str {
        &self.application
    }

    /// Derive the protector for a purpose.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::KeyDerivation` if HKDF expansion fails.
    pub fn protector(&self, purpose: &str) -> Result<Protector> {
        let hk = Hkdf::<Sha256>::new(Some(self.application.as_bytes()), self.master.as_bytes());
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        hk.expand(purpose.as_bytes(), key.as_mut())
            .map_err(|e| CipherError::KeyDerivation(e.to_string()))?;

        trace!(purpose = %purpose, "derived protector");

        Ok(Protector {
            purpose: purpose.to_string(),
            key,
        })
    }
}

/// Authenticated encryption bound to one purpose.
///
/// Output text is `base64url(nonce || ciphertext || tag)` without padding,
/// which embeds safely in a JSON string.
#[derive(Clone)]
pub struct Protector {
    purpose: String,
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl Protector {
    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.key.as_slice()))
    }

    fn decryption_failed(&self, reason: &str) -> CipherError {
        CipherError::DecryptionFailed {
            purpose: self.purpose.clone(),
            reason: reason.to_string(),
        }
    }
}

impl Protect for Protector {
    fn purpose(&self) -> &str {
        &self.purpose
    }

    fn protect(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher()
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: self.purpose.as_bytes(),
                },
            )
            .map_err(|e| CipherError::EncryptionFailed {
                purpose: self.purpose.clone(),
                reason: e.to_string(),
            })?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(nonce.as_slice());
        out.extend_from_slice(&sealed);

        trace!(purpose = %self.purpose, ciphertext_len = out.len(), "protected");

        Ok(URL_SAFE_NO_PAD.encode(out))
    }

    fn unprotect(&self, ciphertext: &str) -> Result<String> {
        if ciphertext.is_empty() {
            return Ok(String::new());
        }

        let raw = URL_SAFE_NO_PAD
            .decode(ciphertext.trim())
            .map_err(|_| self.decryption_failed("ciphertext is not valid base64"))?;

        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(self.decryption_failed("ciphertext is truncated").into());
        }

        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let plaintext = Zeroizing::new(
            self.cipher()
                .decrypt(
                    Nonce::from_slice(nonce),
                    Payload {
                        msg: sealed,
                        aad: self.purpose.as_bytes(),
                    },
                )
                .map_err(|_| {
                    self.decryption_failed(
                        "authentication failed (wrong key or purpose, or corrupted data)",
                    )
                })?,
        );

        trace!(purpose = %self.purpose, plaintext_len = plaintext.len(), "unprotected");

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| self.decryption_failed("plaintext is not UTF-8").into())
    }
}

impl std::fmt::Debug for Protector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Protector")
            .field("purpose", &self.purpose)
            .finish_non_exhaustive()
    }
}
