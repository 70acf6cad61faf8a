//! Signing credential resolution.
//!
//! A credential (private key, certificate, passphrase) is resolved by
//! probing, first hit wins:
//!
//! 1. environment variable (`SIGNING_PRIVATE_KEY`)
//! 2. mounted secret file named by a configuration key
//!    (`SIGNING_PRIVATE_KEY_FILE`)
//! 3. path-configured file holding encrypted content, when key-file
//!    encryption is enabled (`Signing:PrivateKeyPath`)
//! 4. the same file read as plain text
//! 5. passphrases only: an inline configuration value, possibly enveloped
//!    (`Signing:PrivateKeyPassphrase`)
//!
//! A decryption failure is an error, never a reason to try the next probe.

mod cache;
mod key_file;
mod lookup;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::core::cipher::{purpose, Provider};
use crate::core::config::{CredentialSettings, ProbeOverrides};
use crate::core::envelope;
use crate::error::{CredentialError, Error, Result};

pub use cache::CredentialCache;
pub use key_file::{decrypt_content, decrypt_key_file, encrypt_key_file, looks_encrypted};
pub use lookup::{HostLookup, Lookup, MapLookup};

/// Kind of signing material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    PrivateKey,
    Certificate,
    Passphrase,
}

impl CredentialKind {
    pub const ALL: [Self; 3] = [Self::PrivateKey, Self::Certificate, Self::Passphrase];

    /// Command-line name.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::PrivateKey => "private-key",
            Self::Certificate => "certificate",
            Self::Passphrase => "passphrase",
        }
    }

    /// Default probe names.
    pub fn default_probes(&self) -> Probes {
        let probes = |env: &str, secret_file: &str, path: Option<&str>, inline: Option<&str>| Probes {
            env: Some(env.to_string()),
            secret_file_key: Some(secret_file.to_string()),
            path_key: path.map(str::to_string),
            inline_key: inline.map(str::to_string),
        };
        match self {
            Self::PrivateKey => probes(
                "SIGNING_PRIVATE_KEY",
                "SIGNING_PRIVATE_KEY_FILE",
                Some("Signing:PrivateKeyPath"),
                None,
            ),
            Self::Certificate => probes(
                "SIGNING_CERTIFICATE",
                "SIGNING_CERTIFICATE_FILE",
                Some("Signing:CertificatePath"),
                None,
            ),
            Self::Passphrase => probes(
                "SIGNING_PRIVATE_KEY_PASSPHRASE",
                "SIGNING_PASSPHRASE_FILE",
                None,
                Some("Signing:PrivateKeyPassphrase"),
            ),
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PrivateKey => "private key",
            Self::Certificate => "certificate",
            Self::Passphrase => "passphrase",
        })
    }
}

impl std::str::FromStr for CredentialKind {
    type Err = CredentialError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "private-key" | "key" => Ok(Self::PrivateKey),
            "certificate" | "cert" => Ok(Self::Certificate),
            "passphrase" => Ok(Self::Passphrase),
            _ => Err(CredentialError::UnknownKind(s.to_string())),
        }
    }
}

/// Names probed for one credential kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Probes {
    /// Environment variable carrying the material
    pub env: Option<String>,
    /// Configuration key naming a mounted secret file
    pub secret_file_key: Option<String>,
    /// Configuration key naming a key file
    pub path_key: Option<String>,
    /// Configuration key holding the value inline
    pub inline_key: Option<String>,
}

impl Probes {
    /// Defaults for a kind with settings overrides applied.
    pub fn for_kind(kind: CredentialKind, overrides: &ProbeOverrides) -> Self {
        let defaults = kind.default_probes();
        Self {
            env: overrides.env.clone().or(defaults.env),
            secret_file_key: overrides.secret_file_key.clone().or(defaults.secret_file_key),
            path_key: overrides.path_key.clone().or(defaults.path_key),
            inline_key: overrides.inline_key.clone().or(defaults.inline_key),
        }
    }
}

/// Where a credential was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Environment(String),
    SecretFile(PathBuf),
    EncryptedFile(PathBuf),
    PlainFile(PathBuf),
    Inline(String),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment(name) => write!(f, "environment variable {}", name),
            Self::SecretFile(path) => write!(f, "secret file {}", path.display()),
            Self::EncryptedFile(path) => write!(f, "encrypted file {}", path.display()),
            Self::PlainFile(path) => write!(f, "plain file {}", path.display()),
            Self::Inline(key) => write!(f, "configuration key {}", key),
        }
    }
}

/// Resolved credential material.
#[derive(Clone)]
pub struct Credential {
    kind: CredentialKind,
    source: Source,
    value: Zeroizing<String>,
}

impl Credential {
    pub fn new(kind: CredentialKind, source: Source, value: String) -> Self {
        Self {
            kind,
            source,
            value: Zeroizing::new(value),
        }
    }

    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// The material itself.
    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("kind", &self.kind)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Credential status for health reporting. Never carries material.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub kind: String,
    /// A probe has a value or a configured path
    pub configured: bool,
    /// The configured material is present
    pub exists: bool,
    /// Resolution succeeded
    pub loadable: bool,
    pub source: Option<String>,
    pub error: Option<String>,
}

/// Resolves signing credentials through the probe chain.
pub struct Resolver {
    lookup: Box<dyn Lookup>,
    provider: Option<Provider>,
    settings: CredentialSettings,
    cache: CredentialCache,
}

impl Resolver {
    /// Create a resolver.
    ///
    /// Without a provider, encrypted key files are not considered and
    /// enveloped inline values fail to resolve.
    pub fn new(
        lookup: Box<dyn Lookup>,
        provider: Option<Provider>,
        settings: CredentialSettings,
    ) -> Self {
        let cache = CredentialCache::new(Duration::from_secs(settings.cache_ttl_secs));
        Self {
            lookup,
            provider,
            settings,
            cache,
        }
    }

    pub fn cache(&self) -> &CredentialCache {
        &self.cache
    }

    /// Probe names in effect for a kind.
    pub fn probes(&self, kind: CredentialKind) -> Probes {
        let overrides = match kind {
            CredentialKind::PrivateKey => &self.settings.private_key,
            CredentialKind::Certificate => &self.settings.certificate,
            CredentialKind::Passphrase => &self.settings.passphrase,
        };
        Probes::for_kind(kind, overrides)
    }

    /// Resolve a credential, using the cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::NotFound` listing every probe tried,
    /// `CredentialError::ReadFailed` if a found file cannot be read, or
    /// `CredentialError::DecryptFailed` if encrypted material does not
    /// decrypt.
    pub fn resolve(&self, kind: CredentialKind) -> Result<Credential> {
        if let Some(hit) = self.cache.get(kind) {
            return Ok(hit);
        }
        let credential = self.resolve_uncached(kind)?;
        self.cache.put(&credential);
        Ok(credential)
    }

    /// Resolve a credential, bypassing the cache.
    pub fn resolve_uncached(&self, kind: CredentialKind) -> Result<Credential> {
        let probes = self.probes(kind);
        let mut tried = Vec::new();

        if let Some(name) = &probes.env {
            tried.push(format!("env {}", name));
            if let Some(value) = self.lookup.env(name) {
                info!(kind = %kind, variable = %name, "loading credential from environment variable");
                return Ok(Credential::new(kind, Source::Environment(name.clone()), value));
            }
        }

        if let Some(key) = &probes.secret_file_key {
            tried.push(format!("secret file {}", key));
            if let Some(path) = self.lookup.config(key).map(PathBuf::from) {
                if path.is_file() {
                    info!(kind = %kind, path = %path.display(), "loading credential from secret file");
                    let content = self.read(kind, &path)?;
                    let value = if envelope::is_encrypted(content.trim()) {
                        self.decrypt_file(kind, &path, &content)?
                    } else {
                        content
                    };
                    return Ok(Credential::new(
                        kind,
                        Source::SecretFile(path),
                        trim_passphrase(kind, value),
                    ));
                }
                debug!(kind = %kind, path = %path.display(), "secret file missing");
            }
        }

        if let Some(key) = &probes.path_key {
            match self.lookup.config(key).map(PathBuf::from) {
                Some(path) => {
                    tried.push(path.display().to_string());
                    if path.is_file() {
                        return self.load_key_file(kind, path);
                    }
                    debug!(kind = %kind, path = %path.display(), "key file missing");
                }
                None => tried.push(format!("{} (unset)", key)),
            }
        }

        if let Some(key) = &probes.inline_key {
            tried.push(format!("config {}", key));
            if let Some(value) = self.lookup.config(key) {
                let value = if envelope::is_encrypted(&value) {
                    self.open_inline(kind, key, &value)?
                } else {
                    warn!(kind = %kind, key = %key, "loading credential from configuration in plain text");
                    value
                };
                return Ok(Credential::new(kind, Source::Inline(key.clone()), value));
            }
        }

        Err(CredentialError::NotFound {
            kind: kind.to_string(),
            tried,
        }
        .into())
    }

    /// Report whether a credential is configured and loadable.
    pub fn health(&self, kind: CredentialKind) -> Health {
        let probes = self.probes(kind);
        let env_set = probes
            .env
            .as_deref()
            .is_some_and(|n| self.lookup.env(n).is_some());
        let files: Vec<PathBuf> = [&probes.secret_file_key, &probes.path_key]
            .into_iter()
            .flatten()
            .filter_map(|k| self.lookup.config(k))
            .map(PathBuf::from)
            .collect();
        let inline_set = probes
            .inline_key
            .as_deref()
            .is_some_and(|k| self.lookup.config(k).is_some());

        let configured = env_set || inline_set || !files.is_empty();
        let exists = env_set || inline_set || files.iter().any(|p| p.is_file());

        let (loadable, source, error) = match self.resolve_uncached(kind) {
            Ok(credential) => (true, Some(credential.source().to_string()), None),
            Err(e) => (false, None, Some(e.to_string())),
        };

        Health {
            kind: kind.to_string(),
            configured,
            exists,
            loadable,
            source,
            error,
        }
    }

    fn read(&self, kind: CredentialKind, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|source| {
            CredentialError::ReadFailed {
                kind: kind.to_string(),
                path: path.to_path_buf(),
                source,
            }
            .into()
        })
    }

    fn load_key_file(&self, kind: CredentialKind, path: PathBuf) -> Result<Credential> {
        let content = self.read(kind, &path)?;

        if self.settings.encrypt_key_files && self.provider.is_some() && looks_encrypted(&content)
        {
            info!(kind = %kind, path = %path.display(), "decrypting key file");
            let value = self.decrypt_file(kind, &path, &content)?;
            return Ok(Credential::new(kind, Source::EncryptedFile(path), value));
        }

        warn!(kind = %kind, path = %path.display(), "loading unencrypted key file");
        Ok(Credential::new(kind, Source::PlainFile(path), content))
    }

    fn decrypt_file(&self, kind: CredentialKind, path: &Path, content: &str) -> Result<String> {
        let failed = |source: Error| CredentialError::DecryptFailed {
            kind: kind.to_string(),
            location: path.display().to_string(),
            source: Box::new(source),
        };
        let protector = self.protector(purpose::KEY_FILES).map_err(failed)?;
        decrypt_content(&protector, content).map_err(|e| failed(e).into())
    }

    fn open_inline(&self, kind: CredentialKind, key: &str, value: &str) -> Result<String> {
        let failed = |source: Error| CredentialError::DecryptFailed {
            kind: kind.to_string(),
            location: key.to_string(),
            source: Box::new(source),
        };
        let protector = self.protector(purpose::CONFIG_SECRETS).map_err(failed)?;
        envelope::open(&protector, value).map_err(|e| failed(e).into())
    }

    fn protector(&self, purpose: &str) -> Result<crate::core::cipher::Protector> {
        self.provider
            .as_ref()
            .ok_or_else(|| Error::Other("no master key available to decrypt".to_string()))?
            .protector(purpose)
    }
}

fn trim_passphrase(kind: CredentialKind, value: String) -> String {
    if kind == CredentialKind::Passphrase {
        value.trim().to_string()
    } else {
        value
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("encrypt_key_files", &self.settings.encrypt_key_files)
            .field("has_provider", &self.provider.is_some())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
