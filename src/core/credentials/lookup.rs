//! Where credential probes read names from.

use std::collections::HashMap;

use crate::core::document::{ConfigDocument, ConfigPath};

/// Source of environment variables and configuration keys.
pub trait Lookup: Send + Sync {
    /// Non-empty value of an environment variable.
    fn env(&self, name: &str) -> Option<String>;

    /// Non-empty string value of a configuration key (`Section:Key`).
    fn config(&self, key: &str) -> Option<String>;
}

/// Process environment layered over a configuration document.
///
/// Configuration keys are looked up first as environment variables with
/// `:` replaced by `__` (`Signing__PrivateKeyPath`), then in the document.
#[derive(Debug, Default)]
pub struct HostLookup {
    document: Option<ConfigDocument>,
}

impl HostLookup {
    pub fn new(document: Option<ConfigDocument>) -> Self {
        Self { document }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Lookup for HostLookup {
    fn env(&self, name: &str) -> Option<String> {
        non_empty(std::env::var(name).ok())
    }

    fn config(&self, key: &str) -> Option<String> {
        if let Some(value) = self.env(&key.replace(':', "__")) {
            return Some(value);
        }
        let doc = self.document.as_ref()?;
        non_empty(doc.get_str(&ConfigPath::parse(key)).map(str::to_string))
    }
}

/// Fixed values, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MapLookup {
    pub env: HashMap<String, String>,
    pub config: HashMap<String, String>,
}

impl MapLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env(mut self, name: &str, value: &str) -> Self {
        self.env.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_config(mut self, key: &str, value: &str) -> Self {
        self.config.insert(key.to_string(), value.to_string());
        self
    }
}

impl Lookup for MapLookup {
    fn env(&self, name: &str) -> Option<String> {
        non_empty(self.env.get(name).cloned())
    }

    fn config(&self, key: &str) -> Option<String> {
        non_empty(self.config.get(key).cloned())
    }
}
