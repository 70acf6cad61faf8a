//! Admin operations.
//!
//! Request/response shapes for an administrative surface: single value
//! encrypt and decrypt, bulk rewrite of the configuration document, and
//! fetching one named secret. Errors map to HTTP-style status codes and
//! carry only the redacted error display.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::cipher::Protect;
use crate::core::document::{ConfigDocument, ConfigPath};
use crate::core::envelope;
use crate::core::rewrite::{CancelToken, Confirmation, RewriteReport, Rewriter};
use crate::error::{DocumentError, Error, Result, RewriteError};

/// Single value request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecretRequest {
    /// Label for logs, not interpreted
    pub key: String,
    pub value: String,
}

const SENSITIVE: &str = "This is sensitive information!";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptResponse {
    pub key: String,
    pub encrypted: String,
    pub message: &'static str,
}

impl EncryptResponse {
    pub fn new(key: impl Into<String>, encrypted: String) -> Self {
        Self {
            key: key.into(),
            encrypted,
            message: "Copy this encrypted value to your configuration file",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptResponse {
    pub key: String,
    pub decrypted: String,
    pub warning: &'static str,
}

impl DecryptResponse {
    pub fn new(key: impl Into<String>, decrypted: String) -> Self {
        Self {
            key: key.into(),
            decrypted,
            warning: SENSITIVE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResponse {
    pub success: bool,
    pub message: String,
    pub keys: Vec<String>,
    pub backup_path: Option<PathBuf>,
    pub warning: Option<&'static str>,
}

impl BulkResponse {
    /// Response for a finished encrypt-all.
    pub fn encrypted(report: RewriteReport) -> Self {
        Self::from_report(report, "Application restart required for changes to take effect")
    }

    /// Response for a finished decrypt-all.
    pub fn decrypted(report: RewriteReport) -> Self {
        Self::from_report(report, "Secrets are now in plain text! Re-encrypt before committing.")
    }

    fn from_report(report: RewriteReport, warning: &'static str) -> Self {
        let warning = (!report.is_noop()).then_some(warning);
        Self {
            success: true,
            message: report.message(),
            keys: report.fields,
            backup_path: report.backup_path,
            warning,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretResponse {
    pub key: String,
    pub value: String,
    /// Whether the stored value was enveloped
    pub was_encrypted: bool,
    pub warning: &'static str,
}

/// Failed admin operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminError {
    #[serde(skip)]
    pub status: u16,
    pub error: String,
}

impl AdminError {
    fn from_error(err: &Error) -> Self {
        let status = match err {
            Error::Envelope(_) | Error::Cipher(_) | Error::Binding(_) => 400,
            Error::Document(DocumentError::NotFound(_) | DocumentError::PathNotFound(_)) => 404,
            Error::Document(_) => 400,
            Error::Rewrite(RewriteError::NotConfirmed(_)) => 409,
            Error::Rewrite(RewriteError::Field { .. }) => 400,
            _ => 500,
        };
        Self {
            status,
            error: err.to_string(),
        }
    }
}

impl std::fmt::Display for AdminError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.error)
    }
}

impl std::error::Error for AdminError {}

pub type AdminResult<T> = std::result::Result<T, AdminError>;

fn fail(operation: &str, err: Error) -> AdminError {
    let admin = AdminError::from_error(&err);
    warn!(operation, status = admin.status, error = %err, "admin operation failed");
    admin
}

/// Admin operations over one configuration document.
pub struct Admin<'a> {
    protector: &'a dyn Protect,
    document: PathBuf,
    cancel: CancelToken,
}

impl<'a> Admin<'a> {
    pub fn new(protector: &'a dyn Protect, document: impl Into<PathBuf>) -> Self {
        Self {
            protector,
            document: document.into(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn document(&self) -> &Path {
        &self.document
    }

    /// Encrypt one value.
    pub fn encrypt(&self, request: &SecretRequest) -> AdminResult<EncryptResponse> {
        let encrypted =
            envelope::seal(self.protector, &request.value).map_err(|e| fail("encrypt", e))?;
        info!(key = %request.key, "encrypted value");
        Ok(EncryptResponse::new(&request.key, encrypted))
    }

    /// Decrypt one value.
    pub fn decrypt(&self, request: &SecretRequest) -> AdminResult<DecryptResponse> {
        let decrypted =
            envelope::open(self.protector, &request.value).map_err(|e| fail("decrypt", e))?;
        warn!(key = %request.key, "decrypted value");
        Ok(DecryptResponse::new(&request.key, decrypted))
    }

    /// Encrypt every plain secret in the document.
    pub fn encrypt_all(&self) -> AdminResult<BulkResponse> {
        let report = Rewriter::new(self.protector)
            .with_cancel(self.cancel.clone())
            .encrypt_all(&self.document)
            .map_err(|e| fail("encrypt-all", e))?;
        info!(message = %report.message(), "encrypt-all finished");
        Ok(BulkResponse::encrypted(report))
    }

    /// Decrypt every enveloped secret in the document.
    pub fn decrypt_all(&self, confirmation: Confirmation) -> AdminResult<BulkResponse> {
        let report = Rewriter::new(self.protector)
            .with_cancel(self.cancel.clone())
            .decrypt_all(&self.document, confirmation)
            .map_err(|e| fail("decrypt-all", e))?;
        warn!(message = %report.message(), "decrypt-all finished");
        Ok(BulkResponse::decrypted(report))
    }

    /// Fetch one named secret, decrypting it if enveloped.
    ///
    /// The key accepts `/` in place of `:` for use in URLs. Plain values are
    /// returned as stored.
    pub fn get_secret(&self, key: &str) -> AdminResult<SecretResponse> {
        read_secret(self.protector, &self.document, key).map_err(|e| fail("get-secret", e))
    }
}

/// Read one named secret from a document, decrypting it if enveloped.
///
/// # Errors
///
/// Returns `DocumentError::PathNotFound` if the key has no non-empty string
/// value, or the envelope error if the stored value does not open.
pub fn read_secret(protector: &dyn Protect, document: &Path, key: &str) -> Result<SecretResponse> {
    let path = ConfigPath::parse(key);
    let doc = ConfigDocument::load(document)?;
    let stored = doc
        .get_str(&path)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DocumentError::PathNotFound(path.to_string()))?;

    let was_encrypted = envelope::is_encrypted(stored);
    let value = if was_encrypted {
        envelope::open(protector, stored)?
    } else {
        warn!(key = %path, "secret is not encrypted");
        stored.to_string()
    };

    warn!(key = %path, "retrieved secret");
    Ok(SecretResponse {
        key: path.to_string(),
        value,
        was_encrypted,
        warning: SENSITIVE,
    })
}
