//! Encrypt and decrypt single values.

use std::io::{self, IsTerminal, Read};

use dialoguer::Password;
use tracing::info;

use crate::cli::{output, Context};
use crate::core::admin::{DecryptResponse, EncryptResponse};
use crate::core::cipher::purpose;
use crate::core::envelope;
use crate::error::Result;

/// Read the value from the argument, piped stdin, or a hidden prompt.
fn read_value(value: Option<String>, prompt: &str) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        return Ok(input.trim_end_matches(['\r', '\n']).to_string());
    }
    Ok(Password::new().with_prompt(prompt).interact()?)
}

/// Print the envelope for a value.
pub fn encrypt(ctx: &Context, value: Option<String>, key: &str) -> Result<()> {
    let value = read_value(value, "Value to encrypt")?;
    let protector = ctx.protector(purpose::CONFIG_SECRETS, true)?;

    let encrypted = envelope::seal(&protector, &value)?;
    info!(key = %key, "encrypted value");

    if ctx.json {
        return output::json(&EncryptResponse::new(key, encrypted));
    }
    println!("{}", encrypted);
    Ok(())
}

/// Print the plaintext of an envelope.
pub fn decrypt(ctx: &Context, value: Option<String>, key: &str) -> Result<()> {
    let value = read_value(value, "Value to decrypt")?;
    let protector = ctx.protector(purpose::CONFIG_SECRETS, false)?;

    let decrypted = envelope::open(&protector, value.trim())?;
    info!(key = %key, "decrypted value");

    if ctx.json {
        return output::json(&DecryptResponse::new(key, decrypted));
    }
    println!("{}", decrypted);
    Ok(())
}
