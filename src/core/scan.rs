//! Secret discovery in configuration trees.

use serde_json::Value;

use crate::core::detect::is_secret_field;
use crate::core::document::{ConfigDocument, ConfigPath};
use crate::core::envelope::is_encrypted;

/// A secret-bearing string leaf.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretField {
    pub path: ConfigPath,
    pub value: String,
    pub encrypted: bool,
}

impl std::fmt::Debug for SecretField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretField")
            .field("path", &self.path.to_string())
            .field("encrypted", &self.encrypted)
            .finish_non_exhaustive()
    }
}

/// Result of scanning a tree, in document order.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    fields: Vec<SecretField>,
}

impl Scan {
    /// Scan a loaded document.
    pub fn document(doc: &ConfigDocument) -> Self {
        Self::tree(doc.value())
    }

    /// Scan a JSON tree.
    ///
    /// Records non-empty string leaves whose name is secret-shaped, plus any
    /// string leaf already carrying the envelope marker. Arrays are not
    /// descended.
    pub fn tree(root: &Value) -> Self {
        let mut fields = Vec::new();
        visit(root, &ConfigPath::root(), &mut fields);
        Self { fields }
    }

    pub fn fields(&self) -> &[SecretField] {
        &self.fields
    }

    /// Secrets still in plain text, candidates to encrypt.
    pub fn plain(&self) -> impl Iterator<Item = &SecretField> {
        self.fields.iter().filter(|f| !f.encrypted)
    }

    /// Secrets carrying the envelope marker, candidates to decrypt.
    pub fn encrypted(&self) -> impl Iterator<Item = &SecretField> {
        self.fields.iter().filter(|f| f.encrypted)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn visit(node: &Value, path: &ConfigPath, out: &mut Vec<SecretField>) {
    let Some(map) = node.as_object() else {
        return;
    };

    for (key, value) in map {
        let child = path.child(key);
        match value {
            Value::String(s) if !s.is_empty() => {
                let encrypted = is_encrypted(s);
                if encrypted || is_secret_field(key) {
                    out.push(SecretField {
                        path: child,
                        value: s.clone(),
                        encrypted,
                    });
                }
            }
            Value::Object(_) => visit(value, &child, out),
            _ => {}
        }
    }
}
