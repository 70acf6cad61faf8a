//! Strongbox - encrypted secrets inside plain JSON configuration files.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── init          # Create the master key
//! │   ├── value         # Encrypt/decrypt single values
//! │   ├── file          # Bulk encrypt/decrypt, list, get, check
//! │   ├── credential    # Credential health and key files
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── envelope      # ENCRYPTED: marker codec
//!     ├── cipher/       # Protectors
//!     │   ├── protector # AES-256-GCM with HKDF purpose keys
//!     │   └── age       # age wrapping of the master key
//!     ├── store/        # Master key storage
//!     │   ├── fs        # master.key with a key wrap
//!     │   └── keychain  # macOS Keychain
//!     ├── detect        # Secret-shaped field names
//!     ├── document      # Format-preserving JSON editing
//!     ├── scan          # Secret discovery
//!     ├── rewrite       # Bulk encrypt/decrypt with backup
//!     ├── credentials/  # Signing credential resolution
//!     ├── options       # Decrypting typed option sections
//!     ├── api_keys      # API key principals
//!     ├── admin         # Admin request/response operations
//!     └── config        # strongbox.toml settings
//! ```
//!
//! # Example
//!
//! ```no_run
//! use strongbox::core::cipher::{purpose, Provider};
//! use strongbox::core::config::Settings;
//! use strongbox::core::options::{bind_section, CoreOptions};
//! use strongbox::core::document::ConfigDocument;
//! use strongbox::core::store;
//!
//! # fn main() -> strongbox::error::Result<()> {
//! let settings = Settings::load(None)?;
//! let store = store::from_settings(&settings.keys)?;
//! let provider = Provider::open(store.as_ref(), &settings.keys.application)?;
//! let protector = provider.protector(purpose::CONFIG_SECRETS)?;
//!
//! let doc = ConfigDocument::load(&settings.document.path)?;
//! let core: CoreOptions = bind_section(&doc, CoreOptions::SECTION, &protector)?;
//! # let _ = core;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod core;
pub mod error;
