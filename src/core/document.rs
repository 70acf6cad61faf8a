//! JSON configuration documents.
//!
//! A [`ConfigDocument`] keeps the raw file text next to its parsed tree.
//! Edits replace individual string literals in the raw text, located by
//! their object-key path, so everything not being edited (whitespace, key
//! order, number spelling) survives byte for byte.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{DocumentError, Result};

const BOM: char = '\u{feff}';

/// Path to a node as a sequence of object keys.
///
/// Displayed with `:` separators (`Core:Password`), the convention hosts use
/// for configuration lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigPath(Vec<String>);

impl ConfigPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a key path separated by `:` or `/`.
    ///
    /// Empty segments are dropped, so `/Core/Password` and `Core:Password`
    /// are the same path.
    pub fn parse(text: &str) -> Self {
        Self(
            text.split([':', '/'])
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Path of a child key.
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Final key, the field name.
    pub fn leaf(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(":"))
    }
}

impl From<&str> for ConfigPath {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

/// A parsed JSON configuration file.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    path: Option<PathBuf>,
    raw: String,
    value: Value,
}

impl ConfigDocument {
    /// Read and parse a document from disk.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::NotFound`, `DocumentError::Read` or
    /// `DocumentError::Parse`.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading document");

        if !path.exists() {
            return Err(DocumentError::NotFound(path.to_path_buf()).into());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value = parse(&raw).map_err(|source| DocumentError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: Some(path.to_path_buf()),
            raw,
            value,
        })
    }

    /// Parse a document from text.
    pub fn from_text(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let value = parse(&raw).map_err(|source| DocumentError::Parse {
            path: PathBuf::from("<memory>"),
            source,
        })?;
        Ok(Self {
            path: None,
            raw,
            value,
        })
    }

    /// File the document was loaded from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Raw text, including any edits.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parsed tree.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Node at a path.
    ///
    /// Keys match exactly first, then ASCII case-insensitively, in keeping
    /// with how configuration keys are looked up by hosts.
    pub fn get(&self, path: &ConfigPath) -> Option<&Value> {
        path.segments().iter().try_fold(&self.value, |node, key| {
            let map = node.as_object()?;
            map.get(key).or_else(|| {
                map.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            })
        })
    }

    /// String value at a path.
    pub fn get_str(&self, path: &ConfigPath) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Replace string values in place.
    ///
    /// Each target must be a string literal reachable through objects only.
    /// Nothing is changed unless every target is found.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::PathNotFound` for a target with no string
    /// literal, or `DocumentError::Syntax` if the raw text cannot be walked.
    pub fn replace_strings(&mut self, edits: &[(ConfigPath, String)]) -> Result<()> {
        if edits.is_empty() {
            return Ok(());
        }

        let spans = locate_strings(&self.raw)?;
        let mut targets = Vec::with_capacity(edits.len());
        for (path, replacement) in edits {
            let span = spans
                .get(path)
                .ok_or_else(|| DocumentError::PathNotFound(path.to_string()))?;
            targets.push((span.clone(), Value::String(replacement.clone()).to_string()));
        }

        // Splice from the end so earlier offsets stay valid.
        targets.sort_by(|a, b| b.0.start.cmp(&a.0.start));
        let mut raw = self.raw.clone();
        for (span, literal) in targets {
            raw.replace_range(span, &literal);
        }

        self.value = parse(&raw).map_err(|source| DocumentError::Parse {
            path: self.path.clone().unwrap_or_else(|| PathBuf::from("<memory>")),
            source,
        })?;
        self.raw = raw;

        debug!(edits = edits.len(), "document edited");
        Ok(())
    }
}

fn parse(raw: &str) -> std::result::Result<Value, serde_json::Error> {
    serde_json::from_str(raw.strip_prefix(BOM).unwrap_or(raw))
}

/// Find the byte span (quotes included) of every string value reachable
/// from the root through objects only.
///
/// Arrays are walked for syntax but nothing inside them is recorded. With
/// duplicate keys the last occurrence wins, matching the parsed tree.
pub fn locate_strings(raw: &str) -> Result<HashMap<ConfigPath, Range<usize>>> {
    let start = if raw.starts_with(BOM) { BOM.len_utf8() } else { 0 };
    let mut locator = Locator {
        raw,
        bytes: raw.as_bytes(),
        pos: start,
        spans: HashMap::new(),
    };
    locator.value(Some(&ConfigPath::root()))?;
    locator.skip_ws();
    if locator.pos != locator.bytes.len() {
        return Err(locator.error("trailing characters"));
    }
    Ok(locator.spans)
}

struct Locator<'a> {
    raw: &'a str,
    bytes: &'a [u8],
    pos: usize,
    spans: HashMap<ConfigPath, Range<usize>>,
}

impl Locator<'_> {
    fn error(&self, reason: &str) -> crate::error::Error {
        DocumentError::Syntax {
            offset: self.pos,
            reason: reason.to_string(),
        }
        .into()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        self.skip_ws();
        if self.peek() != Some(byte) {
            return Err(self.error(&format!("expected '{}'", byte as char)));
        }
        self.pos += 1;
        Ok(())
    }

    fn value(&mut self, path: Option<&ConfigPath>) -> Result<()> {
        self.skip_ws();
        match self.peek() {
            Some(b'{') => self.object(path),
            Some(b'[') => self.array(),
            Some(b'"') => {
                let span = self.string()?;
                if let Some(path) = path {
                    self.spans.insert(path.clone(), span);
                }
                Ok(())
            }
            Some(_) => self.scalar(),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn object(&mut self, path: Option<&ConfigPath>) -> Result<()> {
        self.pos += 1;
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(());
        }

        loop {
            self.skip_ws();
            if self.peek() != Some(b'"') {
                return Err(self.error("expected object key"));
            }
            let key_span = self.string()?;
            let key: String = serde_json::from_str(&self.raw[key_span])
                .map_err(|_| self.error("invalid object key"))?;
            self.expect(b':')?;

            let child = path.map(|p| p.child(&key));
            self.value(child.as_ref())?;

            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn array(&mut self) -> Result<()> {
        self.pos += 1;
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(());
        }

        loop {
            self.value(None)?;
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
    }

    fn string(&mut self) -> Result<Range<usize>> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek() {
                Some(b'\\') => self.pos += 2,
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(start..self.pos);
                }
                Some(_) => self.pos += 1,
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn scalar(&mut self) -> Result<()> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b',' | b'}' | b']' | b' ' | b'\t' | b'\n' | b'\r') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected value"));
        }
        Ok(())
    }
}
