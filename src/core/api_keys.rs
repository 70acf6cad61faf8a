//! API key principals.
//!
//! Keys live in the `ApiKeys` array of the configuration document. Secrets
//! may be enveloped. A secret that fails to decrypt is kept as-is and the
//! key simply never authenticates; one bad record does not take down the
//! rest.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::core::cipher::Protect;
use crate::core::constants::API_KEYS_SECTION;
use crate::core::document::{ConfigDocument, ConfigPath};
use crate::core::envelope;
use crate::error::{ConfigError, Result};

/// One API key principal.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ApiKey {
    pub name: String,
    /// Public identifier presented by clients
    pub key: String,
    /// Credential, plaintext after a successful load
    pub secret: String,
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("name", &self.name)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Decrypt enveloped secrets in place, keeping any that fail.
pub fn decrypt_secrets(keys: &mut [ApiKey], protector: &dyn Protect) {
    for key in keys.iter_mut() {
        if !envelope::is_encrypted(&key.secret) {
            continue;
        }
        match envelope::open(protector, &key.secret) {
            Ok(plain) => key.secret = plain,
            Err(_) => warn!(name = %key.name, "API key secret could not be decrypted, key disabled"),
        }
    }
}

/// Parse the `ApiKeys` array out of a document.
///
/// # Errors
///
/// Returns `ConfigError::Section` if the array is malformed. A missing
/// section is an empty list.
pub fn from_document(doc: &ConfigDocument) -> Result<Vec<ApiKey>> {
    match doc.get(&ConfigPath::parse(API_KEYS_SECTION)) {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            ConfigError::section(API_KEYS_SECTION, "a list of API keys", &e).into()
        }),
    }
}

/// Reads API keys from a configuration file on every call.
pub struct ApiKeyProvider<P> {
    path: PathBuf,
    protector: P,
}

impl<P: Protect> ApiKeyProvider<P> {
    pub fn new(path: impl Into<PathBuf>, protector: P) -> Self {
        Self {
            path: path.into(),
            protector,
        }
    }

    /// Current key set, re-read from disk so edits apply without restart.
    ///
    /// # Errors
    ///
    /// Fails only if the document cannot be read or the array is malformed,
    /// never because a secret does not decrypt.
    pub fn keys(&self) -> Result<Vec<ApiKey>> {
        let doc = ConfigDocument::load(&self.path)?;
        let mut keys = from_document(&doc)?;
        decrypt_secrets(&mut keys, &self.protector);
        debug!(count = keys.len(), "API keys loaded");
        Ok(keys)
    }
}

fn digest(value: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(value.as_bytes()));
    out
}

/// Find the principal matching a presented key and secret.
///
/// Secrets are compared by SHA-256 digest so the comparison does not
/// depend on where the strings first differ. Entries whose secret is still
/// enveloped never match.
pub fn authenticate<'a>(keys: &'a [ApiKey], key: &str, secret: &str) -> Option<&'a ApiKey> {
    let presented = digest(secret);
    keys.iter().find(|k| {
        k.key == key
            && !k.secret.is_empty()
            && !envelope::is_encrypted(&k.secret)
            && digest(&k.secret) == presented
    })
}
