//! Filesystem master key storage.
//!
//! Stores the master key in `<dir>/master.key`, wrapped according to a
//! [`KeyWrap`] strategy.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::Store;
use crate::core::cipher::{age, MasterKey};
use crate::core::constants;
use crate::error::{Result, StoreError};

/// How the master key is protected inside `master.key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyWrap {
    /// Plain base64 text.
    None,
    /// age scrypt, passphrase read from the named environment variable.
    Passphrase { env: String },
    /// age x25519, for the identity stored at `path`.
    Identity { path: PathBuf },
}

impl KeyWrap {
    /// Strategy name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Passphrase { .. } => "passphrase",
            Self::Identity { .. } => "identity",
        }
    }

    fn passphrase(env: &str) -> Result<String> {
        std::env::var(env)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| StoreError::MissingPassphrase(env.to_string()).into())
    }

    fn identity(path: &Path) -> Result<::age::x25519::Identity> {
        let contents = fs::read_to_string(path).map_err(StoreError::ReadFailed)?;
        age::parse_identity(&contents)
            .ok_or_else(|| StoreError::InvalidIdentity(path.display().to_string()).into())
    }

    fn seal(&self, key: &MasterKey) -> Result<String> {
        let encoded = key.to_base64();
        match self {
            Self::None => Ok(format!("{}\n", encoded.as_str())),
            Self::Passphrase { env } => {
                age::encrypt_with_passphrase(encoded.as_bytes(), &Self::passphrase(env)?)
            }
            Self::Identity { path } => {
                let identity = Self::identity(path)?;
                age::encrypt_to_recipient(encoded.as_bytes(), &identity.to_public())
            }
        }
    }

    fn open(&self, contents: &str, key_path: &Path) -> Result<MasterKey> {
        let found = detect_wrap(contents)?;
        if found != self.name() {
            return Err(StoreError::WrapMismatch {
                path: key_path.display().to_string(),
                expected: self.name(),
                found,
            }
            .into());
        }

        match self {
            Self::None => MasterKey::from_base64(contents),
            Self::Passphrase { env } => {
                let plain = age::decrypt_with_passphrase(contents, &Self::passphrase(env)?)?;
                decode_unwrapped(&plain)
            }
            Self::Identity { path } => {
                let plain = age::decrypt_with_identity(contents, &Self::identity(path)?)?;
                decode_unwrapped(&plain)
            }
        }
    }
}

fn detect_wrap(contents: &str) -> Result<&'static str> {
    if !age::is_armored(contents) {
        return Ok("none");
    }
    if age::is_passphrase_wrapped(contents)? {
        Ok("passphrase")
    } else {
        Ok("identity")
    }
}

fn decode_unwrapped(plain: &[u8]) -> Result<MasterKey> {
    let text = std::str::from_utf8(plain)
        .map_err(|_| StoreError::InvalidFormat("unwrapped key is not UTF-8".to_string()))?;
    MasterKey::from_base64(text)
}

/// Write a file readable by the owner only.
pub(crate) fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;

    // mode() only applies on creation
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

/// Filesystem-backed master key store.
#[derive(Debug, Clone)]
pub struct Filesystem {
    dir: PathBuf,
    wrap: KeyWrap,
}

impl Filesystem {
    pub fn new(dir: impl Into<PathBuf>, wrap: KeyWrap) -> Self {
        Self {
            dir: dir.into(),
            wrap,
        }
    }

    /// Path of the master key file.
    pub fn key_path(&self) -> PathBuf {
        self.dir.join(constants::MASTER_KEY_FILE)
    }

    #[cfg(unix)]
    fn check_permissions(path: &Path) {
        use std::os::unix::fs::PermissionsExt;

        if let Ok(metadata) = fs::metadata(path) {
            let mode = metadata.permissions().mode() & 0o777;
            if mode != 0o600 {
                warn!(
                    path = %path.display(),
                    mode = %format!("{:o}", mode),
                    "insecure master key permissions"
                );
            }
        }
    }
}

impl Store for Filesystem {
    fn name(&self) -> &'static str {
        self.wrap.name()
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }

    fn has_master(&self) -> bool {
        self.key_path().exists()
    }

    fn load_master(&self) -> Result<MasterKey> {
        let path = self.key_path();
        debug!(path = %path.display(), wrap = self.wrap.name(), "loading master key");

        if !path.exists() {
            return Err(StoreError::NoMasterKey(self.location()).into());
        }

        #[cfg(unix)]
        Self::check_permissions(&path);

        let contents = fs::read_to_string(&path).map_err(StoreError::ReadFailed)?;
        let key = self.wrap.open(&contents, &path)?;

        debug!("master key loaded");
        Ok(key)
    }

    fn create_master(&self, force: bool) -> Result<MasterKey> {
        let path = self.key_path();
        if path.exists() && !force {
            return Err(StoreError::AlreadyExists(self.location()).into());
        }

        if self.wrap == KeyWrap::None {
            warn!(path = %path.display(), "master key stored without wrapping");
        }

        let key = MasterKey::generate();
        let sealed = self.wrap.seal(&key)?;

        fs::create_dir_all(&self.dir).map_err(StoreError::WriteFailed)?;
        write_private(&path, &sealed).map_err(StoreError::WriteFailed)?;

        debug!(path = %path.display(), wrap = self.wrap.name(), "master key saved");
        Ok(key)
    }
}
