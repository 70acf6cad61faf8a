//! Core library components.
//!
//! The secret-at-rest subsystem: envelope format, purpose-bound protectors,
//! master key storage, document scanning and rewriting, credential
//! resolution, and the consumers that decrypt configuration at load time.

pub mod admin;
pub mod api_keys;
pub mod cipher;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod detect;
pub mod document;
pub mod envelope;
pub mod options;
pub mod rewrite;
pub mod scan;
pub mod store;
