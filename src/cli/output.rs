//! Shared CLI output helpers for consistent terminal output.
//!
//! Color scheme (respects NO_COLOR):
//! - Green: success, checkmarks
//! - Red: errors
//! - Yellow: warnings
//! - Cyan: paths, keys, hints
//! - Bold: headers, important values
//! - Dimmed: secondary info

use std::fmt::Display;

use console::{style, StyledObject};

const RULE_WIDTH: usize = 56;

/// Check if color output is disabled via NO_COLOR env var.
fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

fn paint<D: Display>(text: D, f: impl FnOnce(StyledObject<D>) -> StyledObject<D>) -> String {
    if colors_enabled() {
        f(style(text)).to_string()
    } else {
        text.to_string()
    }
}

/// Print a success message with checkmark (green).
///
/// Example: `✓ encrypted 2 secrets`
pub fn success(msg: &str) {
    println!("{} {}", paint("✓", |s| s.green()), msg);
}

/// Print an error message to stderr (red).
///
/// Example: `✗ configuration file not found`
pub fn error(msg: &str) {
    eprintln!("{} {}", paint("✗", |s| s.red()), msg);
}

/// Print a warning message to stderr (yellow).
///
/// Warnings go to stderr so piped values stay clean.
pub fn warn(msg: &str) {
    eprintln!("{} {}", paint("⚠", |s| s.yellow()), msg);
}

/// Print a hint message to stderr (cyan).
///
/// Example: `→ run: strongbox init`
pub fn hint(msg: &str) {
    eprintln!("{} {}", paint("→", |s| s.cyan()), paint(msg, |s| s.cyan()));
}

/// Print a bold section header.
pub fn header(title: &str) {
    println!("{}", paint(title, |s| s.bold()));
}

/// Print a key-value pair (label dimmed, value bold).
///
/// Example: `  store:  filesystem`
pub fn kv(label: &str, value: impl Display) {
    println!(
        "  {}  {}",
        paint(label, |s| s.dim()),
        paint(value.to_string(), |s| s.bold())
    );
}

/// Print a list item with bullet.
///
/// Example: `  • Database:ConnectionString`
pub fn list_item(item: &str) {
    println!("  • {}", item);
}

/// Print a horizontal rule separator.
pub fn rule() {
    println!("{}", paint("─".repeat(RULE_WIDTH), |s| s.dim()));
}

/// Format a path in cyan.
pub fn path(p: impl AsRef<std::path::Path>) -> String {
    paint(p.as_ref().display().to_string(), |s| s.cyan())
}

/// Format a configuration key in cyan.
pub fn key(k: &str) -> String {
    paint(k, |s| s.cyan())
}

/// Format a secondary annotation, dimmed.
pub fn dim(text: &str) -> String {
    paint(text, |s| s.dim())
}

/// Format text needing attention, in yellow.
pub fn caution(text: &str) -> String {
    paint(text, |s| s.yellow())
}

/// Print a dimmed/secondary message.
///
/// Example: `no secrets found`
pub fn dimmed(msg: &str) {
    println!("{}", dim(msg));
}

/// Print a section header with a separator line.
///
/// ```text
/// Secrets
/// ────────────────────────────────────────────────────────
/// ```
pub fn section(title: &str) {
    println!();
    header(title);
    rule();
}

/// Print a serialisable response as pretty JSON.
pub fn json<T: serde::Serialize>(value: &T) -> crate::error::Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| crate::error::Error::Other(format!("failed to render JSON: {}", e)))?;
    println!("{}", text);
    Ok(())
}
