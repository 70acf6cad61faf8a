//! Secret-shaped field detection.
//!
//! Decides from a field name alone whether its value should be treated as a
//! secret by bulk tooling. Only convenience depends on this; the cipher
//! primitives never consult it.

/// Substrings that mark a field name as secret-shaped.
pub const SECRET_PATTERNS: &[&str] = &[
    "password",
    "passphrase",
    "secret",
    "key",
    "token",
    "clientsecret",
    "apikey",
    "connectionstring",
    "privatekey",
];

/// Substring that excludes a field regardless of the patterns above.
const PATH_MARKER: &str = "path";

/// Check whether a field name looks like it holds a secret.
///
/// Case-insensitive. Names containing `path` are never secret so that
/// `CertificatePath` or `PrivateKeyPath` stay readable.
pub fn is_secret_field(name: &str) -> bool {
    let lower = name.to_lowercase();
    if lower.contains(PATH_MARKER) {
        return false;
    }
    SECRET_PATTERNS.iter().any(|p| lower.contains(p))
}
