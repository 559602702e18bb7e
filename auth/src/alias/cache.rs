use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use uuid::Uuid;

use crate::clock::Clock;

struct AliasEntry {
    subject_id: Uuid,
    expires_at_millis: i64,
}

/// Short-lived map from opaque aliases to subject identifiers.
///
/// An alias is minted for a subject, handed out over a low-trust channel
/// (typically embedded in a link), and later exchanged once for a freshly
/// issued token. Entries live in memory only: expiry is purely TTL-based and
/// nothing survives a process restart.
///
/// Resolution removes the entry under the lock, so no two concurrent
/// resolutions of the same alias can both succeed.
pub struct AliasCache<C: Clock> {
    entries: Mutex<HashMap<Uuid, AliasEntry>>,
    clock: Arc<C>,
    ttl_millis: i64,
    capacity: usize,
}

impl<C: Clock> AliasCache<C> {
    /// Create a cache with the given entry TTL and capacity bound.
    ///
    /// A `capacity` of zero is treated as unbounded.
    pub fn new(clock: Arc<C>, ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            ttl_millis: ttl.as_millis() as i64,
            capacity,
        }
    }

    /// Mint a fresh alias for a subject.
    ///
    /// When the cache is at capacity after dropping expired entries, the
    /// entry closest to expiry is evicted to make room.
    pub fn mint(&self, subject_id: Uuid) -> Uuid {
        let now = self.clock.now_millis();
        let alias = Uuid::new_v4();

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, entry| entry.expires_at_millis >= now);

        if self.capacity > 0 && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at_millis)
                .map(|(alias, _)| *alias);
            if let Some(evicted) = oldest {
                entries.remove(&evicted);
                tracing::debug!(alias = %evicted, "evicted alias under capacity pressure");
            }
        }

        entries.insert(
            alias,
            AliasEntry {
                subject_id,
                expires_at_millis: now.saturating_add(self.ttl_millis),
            },
        );

        alias
    }

    /// Resolve an alias to its subject, consuming the entry.
    ///
    /// Returns `None` for an unknown alias and for one whose TTL has lapsed;
    /// in both cases the caller is expected to degrade to unauthenticated
    /// rather than fail.
    pub fn resolve(&self, alias: Uuid) -> Option<Uuid> {
        let now = self.clock.now_millis();

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.remove(&alias) {
            Some(entry) if entry.expires_at_millis >= now => Some(entry.subject_id),
            Some(_) => {
                tracing::debug!(alias = %alias, "alias expired before resolution");
                None
            }
            None => None,
        }
    }

    /// Drop all expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at_millis >= now);
        before - entries.len()
    }

    /// Number of live (possibly expired but not yet purged) entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
