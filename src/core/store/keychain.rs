//! macOS Keychain master key storage.
//!
//! Keeps the base64 master key as a generic password under the
//! `com.strongbox` service, one account per application name.

#![cfg(target_os = "macos")]

use security_framework::passwords::{
    delete_generic_password, get_generic_password, set_generic_password,
};
use tracing::{debug, error, info};
use zeroize::Zeroizing;

use super::Store;
use crate::core::cipher::MasterKey;
use crate::error::{Result, StoreError};

/// errSecItemNotFound
const ITEM_NOT_FOUND: i32 = -25300;
/// errSecUserCanceled
const USER_CANCELED: i32 = -128;

/// Keychain-backed master key store
pub struct Keychain {
    service: String,
    account: String,
}

impl Keychain {
    /// Service name for all strongbox master keys in Keychain
    const SERVICE_NAME: &'static str = "com.strongbox";

    pub fn new(application: &str) -> Self {
        Self {
            service: Self::SERVICE_NAME.to_string(),
            account: application.to_string(),
        }
    }

    fn map_error(&self, e: security_framework::base::Error) -> StoreError {
        match e.code() {
            USER_CANCELED => StoreError::KeychainAccessDenied,
            ITEM_NOT_FOUND => StoreError::NoMasterKey(self.location()),
            _ => StoreError::KeychainError(format!("{}", e)),
        }
    }

    /// Delete the master key from the Keychain.
    pub fn delete(&self) -> Result<()> {
        match delete_generic_password(&self.service, &self.account) {
            Ok(()) => Ok(()),
            Err(e) if e.code() == ITEM_NOT_FOUND => Ok(()),
            Err(e) => Err(self.map_error(e).into()),
        }
    }
}

impl Store for Keychain {
    fn name(&self) -> &'static str {
        "keychain"
    }

    fn location(&self) -> String {
        format!("keychain:{}/{}", self.service, self.account)
    }

    fn has_master(&self) -> bool {
        match get_generic_password(&self.service, &self.account) {
            Ok(_) => true,
            Err(e) => {
                debug!(account = %self.account, error_code = e.code(), "master key not in Keychain");
                false
            }
        }
    }

    fn load_master(&self) -> Result<MasterKey> {
        debug!(account = %self.account, "loading master key from Keychain");

        let bytes = Zeroizing::new(
            get_generic_password(&self.service, &self.account).map_err(|e| {
                error!(account = %self.account, error_code = e.code(), "Keychain read failed");
                self.map_error(e)
            })?,
        );
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| StoreError::InvalidFormat("Keychain item is not UTF-8".to_string()))?;
        MasterKey::from_base64(text)
    }

    fn create_master(&self, force: bool) -> Result<MasterKey> {
        if self.has_master() {
            if !force {
                return Err(StoreError::AlreadyExists(self.location()).into());
            }
            self.delete()?;
        }

        let key = MasterKey::generate();
        set_generic_password(&self.service, &self.account, key.to_base64().as_bytes())
            .map_err(|e| self.map_error(e))?;

        info!(account = %self.account, "master key stored in Keychain");
        Ok(key)
    }
}
