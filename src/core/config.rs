//! Tool settings.
//!
//! Handles reading `strongbox.toml`. Every section is optional; a missing
//! file yields defaults unless its path was given explicitly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants;
use crate::error::{ConfigError, Result, StoreError};

/// Settings loaded from `strongbox.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Master key storage
    pub keys: KeySettings,
    /// Configuration document location
    pub document: DocumentSettings,
    /// Credential resolution
    pub credentials: CredentialSettings,
}

/// How the master key is protected at rest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protection {
    /// Plain base64 key file (development only)
    #[default]
    None,
    /// age scrypt, passphrase from an environment variable
    Passphrase,
    /// age x25519 identity file
    Identity,
    /// macOS Keychain
    Keychain,
}

impl Protection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Passphrase => "passphrase",
            Self::Identity => "identity",
            Self::Keychain => "keychain",
        }
    }
}

impl std::str::FromStr for Protection {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "passphrase" => Ok(Self::Passphrase),
            "identity" => Ok(Self::Identity),
            "keychain" => Ok(Self::Keychain),
            other => Err(ConfigError::InvalidValue {
                field: "keys.protection",
                reason: format!(
                    "unknown protection '{}' (expected none, passphrase, identity or keychain)",
                    other
                ),
            }),
        }
    }
}

/// `[keys]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeySettings {
    /// Key directory, defaults to `~/.strongbox/keys`
    pub dir: Option<PathBuf>,
    /// Application name mixed into key derivation
    pub application: String,
    /// Master key protection strategy
    pub protection: Protection,
    /// age identity file, required for `identity` protection
    pub identity: Option<PathBuf>,
    /// Environment variable holding the passphrase for `passphrase` protection
    pub passphrase_env: String,
}

impl Default for KeySettings {
    fn default() -> Self {
        Self {
            dir: None,
            application: constants::DEFAULT_APPLICATION.to_string(),
            protection: Protection::None,
            identity: None,
            passphrase_env: constants::PASSPHRASE_ENV.to_string(),
        }
    }
}

impl KeySettings {
    /// Resolved key directory.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoHomeDir` if no directory is configured and the
    /// home directory cannot be determined.
    pub fn key_dir(&self) -> Result<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(constants::KEY_DIR))
                .ok_or_else(|| StoreError::NoHomeDir.into()),
        }
    }
}

/// `[document]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentSettings {
    /// Configuration document operated on when no path is given
    pub path: PathBuf,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(constants::DEFAULT_DOCUMENT),
        }
    }
}

/// `[credentials]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialSettings {
    /// Allow path-configured key files to hold encrypted content
    pub encrypt_key_files: bool,
    /// Lifetime of cached credentials, 0 disables caching
    pub cache_ttl_secs: u64,
    pub private_key: ProbeOverrides,
    pub certificate: ProbeOverrides,
    pub passphrase: ProbeOverrides,
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            encrypt_key_files: false,
            cache_ttl_secs: constants::CREDENTIAL_CACHE_TTL_SECS,
            private_key: ProbeOverrides::default(),
            certificate: ProbeOverrides::default(),
            passphrase: ProbeOverrides::default(),
        }
    }
}

/// Per-kind replacements for the default probe names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeOverrides {
    /// Environment variable carrying the material
    pub env: Option<String>,
    /// Configuration key naming a mounted secret file
    pub secret_file_key: Option<String>,
    /// Configuration key naming the key file path
    pub path_key: Option<String>,
    /// Configuration key holding an inline value (passphrase only)
    pub inline_key: Option<String>,
}

impl Settings {
    /// Path of the settings file in the current directory
    pub fn default_path() -> PathBuf {
        PathBuf::from(constants::SETTINGS_FILE)
    }

    /// Load settings.
    ///
    /// With an explicit path the file must exist. Without one,
    /// `./strongbox.toml` is read if present and defaults are used otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` or `ConfigError::Parse`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        if !required && !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        debug!(path = %path.display(), "loading settings");
        let contents = std::fs::read_to_string(&path).map_err(ConfigError::ReadFile)?;
        let settings = Self::parse(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e).into())
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` on the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.keys.application.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "keys.application",
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        if self.keys.protection == Protection::Identity && self.keys.identity.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "keys.identity",
                reason: "required when protection = \"identity\"".to_string(),
            }
            .into());
        }
        if self.keys.protection == Protection::Passphrase && self.keys.passphrase_env.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "keys.passphrase_env",
                reason: "must name an environment variable".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Override the key directory (from `--key-dir`).
    pub fn with_key_dir(mut self, dir: Option<PathBuf>) -> Self {
        if dir.is_some() {
            self.keys.dir = dir;
        }
        self
    }
}
