//! Init command - create the master key.

use std::path::{Path, PathBuf};

use age::secrecy::ExposeSecret;
use tracing::info;

use crate::cli::{output, Context};
use crate::core::config::Protection;
use crate::core::store::write_private;
use crate::error::{Result, StoreError};

/// Create the master key in the configured store.
///
/// Passing `--identity` without `--protection` implies identity protection.
pub fn execute(
    mut ctx: Context,
    protection: Option<Protection>,
    identity: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let keys = &mut ctx.settings.keys;
    if let Some(path) = identity {
        keys.identity = Some(path);
        if protection.is_none() {
            keys.protection = Protection::Identity;
        }
    }
    if let Some(protection) = protection {
        keys.protection = protection;
    }
    ctx.settings.validate()?;

    let keys = &ctx.settings.keys;
    if keys.protection == Protection::Identity {
        if let Some(path) = &keys.identity {
            if !path.exists() {
                generate_identity(path)?;
                output::success(&format!("generated identity {}", output::path(path)));
            }
        }
    }

    let store = ctx.store()?;
    info!(store = store.name(), location = %store.location(), "creating master key");
    store.create_master(force)?;

    if ctx.json {
        return output::json(&serde_json::json!({
            "protection": keys.protection.as_str(),
            "location": store.location(),
        }));
    }

    output::success(&format!(
        "created master key ({}) in {}",
        keys.protection.as_str(),
        output::path(store.location())
    ));
    if keys.protection == Protection::None {
        output::warn("master key is stored unwrapped, use --protection for production");
    }
    Ok(())
}

/// Write a new x25519 identity in `age-keygen` format (mode 0600).
fn generate_identity(path: &Path) -> Result<()> {
    let identity = age::x25519::Identity::generate();
    let contents = format!(
        "# created: {}\n# public key: {}\n{}\n",
        chrono::Local::now().to_rfc3339(),
        identity.to_public(),
        identity.to_string().expose_secret()
    );

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(StoreError::WriteFailed)?;
    }
    write_private(path, &contents).map_err(StoreError::WriteFailed)?;
    info!(path = %path.display(), "generated age identity");
    Ok(())
}
