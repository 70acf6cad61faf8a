//! Time-boxed credential cache.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::trace;

use super::{Credential, CredentialKind};

struct Entry {
    credential: Credential,
    stored: Instant,
}

/// Resolved credentials kept for a fixed lifetime.
///
/// Owned by whoever owns the resolver. A zero TTL disables caching.
pub struct CredentialCache {
    ttl: Duration,
    entries: Mutex<HashMap<CredentialKind, Entry>>,
}

impl CredentialCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CredentialKind, Entry>> {
        // entries are plain values; a poisoned lock holds nothing half-written
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fresh cached credential, evicting it if expired.
    pub fn get(&self, kind: CredentialKind) -> Option<Credential> {
        let mut entries = self.entries();
        match entries.get(&kind) {
            Some(entry) if entry.stored.elapsed() < self.ttl => {
                trace!(kind = %kind, "credential cache hit");
                Some(entry.credential.clone())
            }
            Some(_) => {
                trace!(kind = %kind, "credential cache entry expired");
                entries.remove(&kind);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, credential: &Credential) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries().insert(
            credential.kind(),
            Entry {
                credential: credential.clone(),
                stored: Instant::now(),
            },
        );
    }

    /// Drop one kind.
    pub fn invalidate(&self, kind: CredentialKind) {
        self.entries().remove(&kind);
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}
