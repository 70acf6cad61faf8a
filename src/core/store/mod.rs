//! Master key storage.
//!
//! The master key backing every protector lives outside the configuration
//! document. Where and how it is protected at rest is a closed set of
//! strategies selected once at startup from `[keys]` settings:
//!
//! | protection   | store        | at rest                                  |
//! |--------------|--------------|------------------------------------------|
//! | `none`       | `Filesystem` | base64 text, 0600 (development only)     |
//! | `passphrase` | `Filesystem` | age scrypt, passphrase from env variable |
//! | `identity`   | `Filesystem` | age x25519, for an identity file         |
//! | `keychain`   | `Keychain`   | macOS login Keychain                     |

mod fs;

#[cfg(target_os = "macos")]
pub mod keychain;

use tracing::debug;

use crate::core::cipher::MasterKey;
use crate::core::config::{KeySettings, Protection};
use crate::error::{ConfigError, Result};

pub use fs::{Filesystem, KeyWrap};
pub(crate) use fs::write_private;

/// Master key storage backend.
pub trait Store: Send + Sync {
    /// Strategy name for display.
    fn name(&self) -> &'static str;

    /// Human-readable location (directory, keychain service).
    fn location(&self) -> String;

    /// Check whether a master key exists.
    fn has_master(&self) -> bool;

    /// Load and unwrap the master key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoMasterKey` if none exists, or a wrap error if
    /// it cannot be unwrapped with the configured strategy.
    fn load_master(&self) -> Result<MasterKey>;

    /// Generate, wrap and persist a new master key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if a key exists and `force` is
    /// false.
    fn create_master(&self, force: bool) -> Result<MasterKey>;
}

/// Select the key store configured in settings.
pub fn from_settings(settings: &KeySettings) -> Result<Box<dyn Store>> {
    let store: Box<dyn Store> = match settings.protection {
        Protection::None => Box::new(Filesystem::new(settings.key_dir()?, KeyWrap::None)),
        Protection::Passphrase => Box::new(Filesystem::new(
            settings.key_dir()?,
            KeyWrap::Passphrase {
                env: settings.passphrase_env.clone(),
            },
        )),
        Protection::Identity => {
            let path = settings.identity.clone().ok_or(ConfigError::InvalidValue {
                field: "keys.identity",
                reason: "required when protection = \"identity\"".to_string(),
            })?;
            Box::new(Filesystem::new(settings.key_dir()?, KeyWrap::Identity { path }))
        }
        Protection::Keychain => keychain_store(settings)?,
    };

    debug!(store = store.name(), location = %store.location(), "selected key store");
    Ok(store)
}

#[cfg(target_os = "macos")]
fn keychain_store(settings: &KeySettings) -> Result<Box<dyn Store>> {
    Ok(Box::new(keychain::Keychain::new(&settings.application)))
}

#[cfg(not(target_os = "macos"))]
fn keychain_store(_settings: &KeySettings) -> Result<Box<dyn Store>> {
    Err(crate::error::StoreError::Unsupported("keychain".to_string()).into())
}
