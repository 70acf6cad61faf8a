//! Decrypting structured option objects.
//!
//! Option types list their string fields explicitly through [`StringFields`],
//! usually via the [`string_fields!`](crate::string_fields) macro. After a
//! section is deserialised, every field carrying the envelope marker is
//! replaced by its plaintext. Any failure is fatal for the whole object.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::cipher::Protect;
use crate::core::document::{ConfigDocument, ConfigPath};
use crate::core::envelope;
use crate::error::{BindingError, ConfigError, Result};

/// A field that may hold text.
pub trait FieldValue {
    fn text_mut(&mut self) -> Option<&mut String>;
}

impl FieldValue for String {
    fn text_mut(&mut self) -> Option<&mut String> {
        Some(self)
    }
}

impl FieldValue for Option<String> {
    fn text_mut(&mut self) -> Option<&mut String> {
        self.as_mut()
    }
}

/// Types whose string fields can be enumerated for decryption.
pub trait StringFields {
    /// Type name used in errors.
    const TYPE_NAME: &'static str;

    /// Every present string field with its name.
    fn string_fields(&mut self) -> Vec<(&'static str, &mut String)>;
}

/// Implement [`StringFields`] for a struct by naming its text fields.
///
/// ```
/// use strongbox::string_fields;
///
/// #[derive(Default)]
/// struct Mail {
///     host: String,
///     password: Option<String>,
///     port: u16,
/// }
///
/// string_fields!(Mail { host, password });
/// ```
#[macro_export]
macro_rules! string_fields {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        impl $crate::core::options::StringFields for $ty {
            const TYPE_NAME: &'static str = stringify!($ty);

            fn string_fields(&mut self) -> Vec<(&'static str, &mut String)> {
                let mut fields = Vec::new();
                $(
                    if let Some(value) =
                        $crate::core::options::FieldValue::text_mut(&mut self.$field)
                    {
                        fields.push((stringify!($field), value));
                    }
                )*
                fields
            }
        }
    };
}

/// Replace every enveloped string field with its plaintext.
///
/// Values are never logged. On failure the object is dropped.
///
/// # Errors
///
/// Returns `BindingError` naming the type and field that failed.
pub fn decrypt_options<T: StringFields>(
    mut options: T,
    protector: &dyn Protect,
) -> std::result::Result<T, BindingError> {
    for (field, value) in options.string_fields() {
        if !envelope::is_encrypted(value) {
            continue;
        }
        *value = envelope::open(protector, value).map_err(|e| BindingError {
            type_name: T::TYPE_NAME,
            field,
            source: Box::new(e),
        })?;
        debug!(type_name = T::TYPE_NAME, field, "decrypted option field");
    }
    Ok(options)
}

/// Deserialise a document section and decrypt its fields.
///
/// A missing section binds as an empty object, so types with serde defaults
/// come back defaulted.
///
/// # Errors
///
/// Returns `ConfigError::Section` if the section does not match `T`, or
/// `BindingError` if a field fails to decrypt.
pub fn bind_section<T>(doc: &ConfigDocument, section: &str, protector: &dyn Protect) -> Result<T>
where
    T: DeserializeOwned + StringFields,
{
    let value = doc
        .get(&ConfigPath::parse(section))
        .cloned()
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

    let options: T = serde_json::from_value(value)
        .map_err(|e| ConfigError::section(section, T::TYPE_NAME, &e))?;

    Ok(decrypt_options(options, protector)?)
}

/// Upstream core service settings (`Core` section).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CoreOptions {
    pub base_url: String,
    pub login_endpoint: String,
    pub username: String,
    pub password: String,
}

string_fields!(CoreOptions {
    base_url,
    login_endpoint,
    username,
    password
});

impl CoreOptions {
    pub const SECTION: &'static str = "Core";
}

impl std::fmt::Debug for CoreOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreOptions")
            .field("base_url", &self.base_url)
            .field("login_endpoint", &self.login_endpoint)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Signing key locations (`Signing` section).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SigningOptions {
    pub private_key_path: String,
    pub certificate_path: String,
    pub private_key_passphrase: Option<String>,
}

string_fields!(SigningOptions {
    private_key_path,
    certificate_path,
    private_key_passphrase,
});

impl SigningOptions {
    pub const SECTION: &'static str = "Signing";
}

impl std::fmt::Debug for SigningOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningOptions")
            .field("private_key_path", &self.private_key_path)
            .field("certificate_path", &self.certificate_path)
            .finish_non_exhaustive()
    }
}

/// Database connection (`Database` section).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DatabaseOptions {
    pub connection_string: String,
}

string_fields!(DatabaseOptions { connection_string });

impl DatabaseOptions {
    pub const SECTION: &'static str = "Database";
}

impl std::fmt::Debug for DatabaseOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseOptions").finish_non_exhaustive()
    }
}
