//! age wrapping of master key material.
//!
//! Provides encryption/decryption using the age format with ASCII armor,
//! either for an x25519 recipient or with a scrypt passphrase.

use std::io::{Read, Write};

use ::age::secrecy::SecretString;
use ::age::x25519;
use tracing::trace;
use zeroize::Zeroizing;

use crate::error::{CipherError, Result};

/// Armor header written by age.
pub const ARMOR_HEADER: &str = "-----BEGIN AGE ENCRYPTED FILE-----";

/// Check whether text is an armored age file.
pub fn is_armored(text: &str) -> bool {
    text.trim_start().starts_with(ARMOR_HEADER)
}

/// Encrypt bytes for a single x25519 recipient.
pub fn encrypt_to_recipient(plaintext: &[u8], recipient: &x25519::Recipient) -> Result<String> {
    trace!(plaintext_len = plaintext.len(), "wrapping for recipient");

    let encryptor = age::Encryptor::with_recipients(std::iter::once(
        recipient as &dyn age::Recipient,
    ))
    .map_err(|e| CipherError::Wrap(format!("{}", e)))?;

    armor(encryptor, plaintext)
}

/// Encrypt bytes with a passphrase (scrypt).
pub fn encrypt_with_passphrase(plaintext: &[u8], passphrase: &str) -> Result<String> {
    trace!(plaintext_len = plaintext.len(), "wrapping with passphrase");

    let encryptor =
        age::Encryptor::with_user_passphrase(SecretString::from(passphrase.to_owned()));
    armor(encryptor, plaintext)
}

/// Decrypt an armored file with an x25519 identity.
pub fn decrypt_with_identity(armored: &str, identity: &x25519::Identity) -> Result<Zeroizing<Vec<u8>>> {
    dearmor(armored, identity as &dyn age::Identity)
}

/// Decrypt an armored file with a passphrase.
pub fn decrypt_with_passphrase(armored: &str, passphrase: &str) -> Result<Zeroizing<Vec<u8>>> {
    let identity = age::scrypt::Identity::new(SecretString::from(passphrase.to_owned()));
    dearmor(armored, &identity as &dyn age::Identity)
}

/// Check whether an armored file is passphrase-encrypted rather than
/// encrypted for recipients.
pub fn is_passphrase_wrapped(armored: &str) -> Result<bool> {
    let reader = age::armor::ArmoredReader::new(armored.as_bytes());
    let decryptor =
        age::Decryptor::new(reader).map_err(|e| CipherError::Unwrap(format!("{}", e)))?;
    Ok(decryptor.is_scrypt())
}

/// Parse an x25519 identity from text (`AGE-SECRET-KEY-1...`).
///
/// Comment lines starting with `#` are ignored, as in files written by
/// `age-keygen`.
pub fn parse_identity(contents: &str) -> Option<x25519::Identity> {
    contents
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .and_then(|l| l.parse::<x25519::Identity>().ok())
}

fn armor(encryptor: age::Encryptor, plaintext: &[u8]) -> Result<String> {
    let mut encrypted = Vec::new();
    let mut writer = encryptor
        .wrap_output(age::armor::ArmoredWriter::wrap_output(
            &mut encrypted,
            age::armor::Format::AsciiArmor,
        )?)
        .map_err(|e| CipherError::Wrap(format!("{}", e)))?;

    writer.write_all(plaintext)?;
    let armored = writer
        .finish()
        .map_err(|e| CipherError::Wrap(format!("{}", e)))?;
    armored
        .finish()
        .map_err(|e| CipherError::Wrap(format!("armor: {}", e)))?;

    String::from_utf8(encrypted)
        .map_err(|e| CipherError::Wrap(format!("UTF-8 error: {}", e)).into())
}

fn dearmor(armored: &str, identity: &dyn age::Identity) -> Result<Zeroizing<Vec<u8>>> {
    let reader = age::armor::ArmoredReader::new(armored.as_bytes());
    let decryptor =
        age::Decryptor::new(reader).map_err(|e| CipherError::Unwrap(format!("{}", e)))?;

    let mut decrypted = Zeroizing::new(Vec::new());
    let mut reader = decryptor
        .decrypt(std::iter::once(identity))
        .map_err(|e| CipherError::Unwrap(format!("{}", e)))?;

    reader.read_to_end(&mut decrypted)?;

    trace!(plaintext_len = decrypted.len(), "unwrapped");

    Ok(decrypted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_roundtrip() {
        let identity = x25519::Identity::generate();
        let recipient = identity.to_public();

        let armored = encrypt_to_recipient(b"key material", &recipient).unwrap();
        assert!(is_armored(&armored));
        assert!(!is_passphrase_wrapped(&armored).unwrap());

        let plain = decrypt_with_identity(&armored, &identity).unwrap();
        assert_eq!(plain.as_slice(), b"key material");
    }

    #[test]
    fn test_wrong_identity_fails() {
        let identity = x25519::Identity::generate();
        let other = x25519::Identity::generate();

        let armored = encrypt_to_recipient(b"key material", &identity.to_public()).unwrap();
        assert!(decrypt_with_identity(&armored, &other).is_err());
    }

    #[test]
    fn test_passphrase_roundtrip() {
        let armored = encrypt_with_passphrase(b"key material", "correct horse").unwrap();
        assert!(is_passphrase_wrapped(&armored).unwrap());

        let plain = decrypt_with_passphrase(&armored, "correct horse").unwrap();
        assert_eq!(plain.as_slice(), b"key material");
        assert!(decrypt_with_passphrase(&armored, "battery staple").is_err());
    }

    #[test]
    fn test_parse_identity_skips_comments() {
        use ::age::secrecy::ExposeSecret;

        let identity = x25519::Identity::generate();
        let text = format!(
            "# created: today\n# public key: {}\n{}\n",
            identity.to_public(),
            identity.to_string().expose_secret()
        );
        let parsed = parse_identity(&text).unwrap();
        assert_eq!(parsed.to_public().to_string(), identity.to_public().to_string());
        assert!(parse_identity("# nothing here\n").is_none());
    }
}
