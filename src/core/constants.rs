//! Constants used throughout strongbox.
//!
//! Centralizes magic strings and configuration values.

/// Marker prefix carried by every encrypted configuration value.
pub const ENCRYPTED_PREFIX: &str = "ENCRYPTED:";

/// Tool settings file name (strongbox.toml).
pub const SETTINGS_FILE: &str = "strongbox.toml";

/// Configuration document rewritten when no path is given.
pub const DEFAULT_DOCUMENT: &str = "appsettings.json";

/// Key storage directory relative to HOME (~/.strongbox/keys).
pub const KEY_DIR: &str = ".strongbox/keys";

/// Master key file name inside the key directory.
pub const MASTER_KEY_FILE: &str = "master.key";

/// Default application name mixed into every purpose derivation.
pub const DEFAULT_APPLICATION: &str = "strongbox";

/// Default variable holding the master key passphrase.
pub const PASSPHRASE_ENV: &str = "STRONGBOX_KEY_PASSPHRASE";

/// Backup suffix timestamp format (`<file>.backup.20240131120000`).
pub const BACKUP_TIMESTAMP: &str = "%Y%m%d%H%M%S";

/// Configuration section holding the API key list.
pub const API_KEYS_SECTION: &str = "ApiKeys";

/// Header that marks plaintext PEM material.
pub const PEM_HEADER: &str = "-----BEGIN";

/// Default lifetime of a cached credential, in seconds.
pub const CREDENTIAL_CACHE_TTL_SECS: u64 = 900;
