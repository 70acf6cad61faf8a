//! Credential health and key file commands.

use std::path::Path;

use tracing::debug;

use crate::cli::{output, Context};
use crate::core::cipher::purpose;
use crate::core::credentials::{self, CredentialKind, Health, HostLookup, Resolver};
use crate::core::document::ConfigDocument;
use crate::error::{Error, Result};

fn kinds(kind: &str) -> Result<Vec<CredentialKind>> {
    if kind.eq_ignore_ascii_case("all") {
        Ok(CredentialKind::ALL.to_vec())
    } else {
        Ok(vec![kind.parse::<CredentialKind>()?])
    }
}

fn resolver(ctx: &Context) -> Result<Resolver> {
    let path = &ctx.settings.document.path;
    let document = if path.exists() {
        Some(ConfigDocument::load(path)?)
    } else {
        debug!(path = %path.display(), "no configuration document, using environment only");
        None
    };

    // Without a master key only plain sources resolve
    let provider = match ctx.provider() {
        Ok(provider) => Some(provider),
        Err(e) => {
            debug!(error = %e, "no master key for credential decryption");
            None
        }
    };

    Ok(Resolver::new(
        Box::new(HostLookup::new(document)),
        provider,
        ctx.settings.credentials.clone(),
    ))
}

fn print_health(health: &Health) {
    output::section(&health.kind);
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    output::kv("configured", yes_no(health.configured));
    output::kv("exists", yes_no(health.exists));
    output::kv("loadable", yes_no(health.loadable));
    if let Some(source) = &health.source {
        output::kv("source", source);
    }
    if let Some(error) = &health.error {
        output::error(error);
    }
}

/// Report where each requested credential resolves from.
pub fn execute(ctx: &Context, kind: &str) -> Result<()> {
    let resolver = resolver(ctx)?;
    let reports: Vec<Health> = kinds(kind)?
        .into_iter()
        .map(|k| resolver.health(k))
        .collect();

    if ctx.json {
        output::json(&reports)?;
    } else {
        for health in &reports {
            print_health(health);
        }
    }

    let missing = reports.iter().filter(|h| !h.loadable).count();
    if missing == 0 {
        Ok(())
    } else {
        Err(Error::Other(format!(
            "{} of {} credentials could not be loaded",
            missing,
            reports.len()
        )))
    }
}

/// Encrypt a plain key file.
pub fn encrypt_key_file(ctx: &Context, input: &Path, output_path: &Path) -> Result<()> {
    let protector = ctx.protector(purpose::KEY_FILES, true)?;
    credentials::encrypt_key_file(&protector, input, output_path)?;
    output::success(&format!(
        "encrypted {} to {}",
        output::path(input),
        output::path(output_path)
    ));
    if !ctx.settings.credentials.encrypt_key_files {
        output::hint("set credentials.encrypt_key_files = true so it is read encrypted");
    }
    Ok(())
}

/// Decrypt an encrypted key file.
pub fn decrypt_key_file(ctx: &Context, input: &Path, output_path: &Path) -> Result<()> {
    let protector = ctx.protector(purpose::KEY_FILES, false)?;
    credentials::decrypt_key_file(&protector, input, output_path)?;
    output::success(&format!(
        "decrypted {} to {}",
        output::path(input),
        output::path(output_path)
    ));
    output::warn("the output holds plaintext key material");
    Ok(())
}
