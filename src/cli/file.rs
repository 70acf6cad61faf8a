//! Commands over a whole configuration file.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use dialoguer::Confirm;
use serde_json::json;
use tracing::debug;

use crate::cli::{output, Context};
use crate::core::admin::{self, BulkResponse};
use crate::core::cipher::purpose;
use crate::core::envelope;
use crate::core::rewrite::{self, Confirmation, RewriteReport, Rewriter};
use crate::error::{Error, Result};

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn print_report(report: &RewriteReport) {
    if report.is_noop() {
        output::dimmed(&report.message());
        return;
    }
    output::success(&report.message());
    for field in &report.fields {
        output::list_item(&output::key(field));
    }
    if let Some(backup) = &report.backup_path {
        output::kv("backup", output::path(backup));
    }
}

/// Encrypt every plain secret in the document.
pub fn encrypt(ctx: &Context, path: Option<PathBuf>) -> Result<()> {
    let path = ctx.document(path);
    let protector = ctx.protector(purpose::CONFIG_SECRETS, true)?;

    let report = Rewriter::new(&protector).encrypt_all(&path)?;

    if ctx.json {
        return output::json(&BulkResponse::encrypted(report));
    }
    print_report(&report);
    if !report.is_noop() {
        output::hint("restart the application for changes to take effect");
    }
    Ok(())
}

/// Ask before writing plaintext, unless there is nothing to decrypt or no
/// terminal to ask on.
fn confirm(path: &Path) -> Result<Confirmation> {
    let pending = rewrite::list(path)?.encrypted().count();
    if pending == 0 || !io::stdin().is_terminal() {
        return Ok(Confirmation::Unconfirmed);
    }

    output::warn(&format!(
        "this writes {} secret{} to {} in plain text",
        pending,
        plural(pending),
        output::path(path)
    ));
    let yes = Confirm::new()
        .with_prompt("Continue?")
        .default(false)
        .interact()?;
    Ok(yes.into())
}

/// Decrypt every encrypted secret in the document.
pub fn decrypt(ctx: &Context, path: Option<PathBuf>, yes: bool) -> Result<()> {
    let path = ctx.document(path);
    let confirmation = if yes {
        Confirmation::Confirmed
    } else {
        confirm(&path)?
    };
    let protector = ctx.protector(purpose::CONFIG_SECRETS, false)?;

    let report = Rewriter::new(&protector).decrypt_all(&path, confirmation)?;

    if ctx.json {
        return output::json(&BulkResponse::decrypted(report));
    }
    print_report(&report);
    if !report.is_noop() {
        output::warn("secrets are now in plain text, re-encrypt before committing");
    }
    Ok(())
}

/// List secret fields with their status. Needs no key.
pub fn list(ctx: &Context, path: Option<PathBuf>) -> Result<()> {
    let path = ctx.document(path);
    let scan = rewrite::list(&path)?;

    if ctx.json {
        let fields: Vec<_> = scan
            .fields()
            .iter()
            .map(|f| json!({ "key": f.path.to_string(), "encrypted": f.encrypted }))
            .collect();
        return output::json(&fields);
    }

    if scan.is_empty() {
        output::dimmed("no secrets found");
        return Ok(());
    }

    output::section(&path.display().to_string());
    for field in scan.fields() {
        let status = if field.encrypted {
            output::dim("encrypted")
        } else {
            output::caution("plain")
        };
        output::list_item(&format!("{}  {}", output::key(&field.path.to_string()), status));
    }

    let plain = scan.plain().count();
    if plain > 0 {
        println!();
        output::hint(&format!(
            "{} plain secret{}, run: strongbox encrypt-file",
            plain,
            plural(plain)
        ));
    }
    Ok(())
}

/// Print one secret.
pub fn get(ctx: &Context, key: &str, file: Option<PathBuf>) -> Result<()> {
    let path = ctx.document(file);
    let protector = ctx.protector(purpose::CONFIG_SECRETS, false)?;

    let secret = admin::read_secret(&protector, &path, key)?;

    if ctx.json {
        return output::json(&secret);
    }
    if !secret.was_encrypted {
        output::warn(&format!("{} is not encrypted", output::key(&secret.key)));
    }
    println!("{}", secret.value);
    Ok(())
}

/// Verify the master key loads and every encrypted value opens.
pub fn check(ctx: &Context, path: Option<PathBuf>) -> Result<()> {
    let path = ctx.document(path);
    let store = ctx.store()?;
    let protector = ctx.protector(purpose::CONFIG_SECRETS, false)?;
    let scan = rewrite::list(&path)?;

    let failed: Vec<String> = scan
        .encrypted()
        .filter(|f| envelope::open(&protector, &f.value).is_err())
        .map(|f| f.path.to_string())
        .collect();
    let plain: Vec<String> = scan.plain().map(|f| f.path.to_string()).collect();
    let encrypted = scan.encrypted().count();
    debug!(encrypted, plain = plain.len(), failed = failed.len(), "check finished");

    if ctx.json {
        output::json(&json!({
            "store": store.name(),
            "location": store.location(),
            "document": path,
            "encrypted": encrypted,
            "plain": plain,
            "failed": failed,
        }))?;
    } else {
        output::section("Strongbox Check");
        output::kv("store", format!("{} ({})", store.name(), store.location()));
        output::kv("document", output::path(&path));
        output::kv("encrypted", encrypted);
        for key in &plain {
            output::warn(&format!("{} is not encrypted", output::key(key)));
        }
        for key in &failed {
            output::error(&format!("{} does not decrypt", output::key(key)));
        }
        if failed.is_empty() {
            output::success("all encrypted values decrypt");
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(Error::Other(format!(
            "{} encrypted value{} failed to decrypt",
            failed.len(),
            plural(failed.len())
        )))
    }
}
