// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Revocation markers for invalidated tokens.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::task::JoinHandle;

// =============================================================================
// RevocationEntry
// =============================================================================

/// Marker recorded when a token is invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevocationEntry {
    /// When the token was invalidated.
    pub revoked_at: i64,
    /// From this instant on the token is rejected (revoked_at + grace).
    pub effective_at: i64,
    /// After this instant the marker can be dropped: the token is past its
    /// expiry and leeway and would be rejected anyway.
    pub retain_until: i64,
}

impl RevocationEntry {
    /// Returns `true` if the revocation is in force at `now`.
    pub fn is_effective_at(&self, now: i64) -> bool {
        now >= self.effective_at
    }
}

// =============================================================================
// RevocationStore
// =============================================================================

/// Storage for revocation markers keyed by token id (`jti`).
///
/// Implementations must be safe under concurrent access.
pub trait RevocationStore: Send + Sync {
    /// Records a revocation. An existing marker for `jti` is kept unchanged.
    fn revoke(&self, jti: &str, entry: RevocationEntry);

    /// Returns the marker for `jti`, if any.
    fn lookup(&self, jti: &str) -> Option<RevocationEntry>;

    /// Drops markers whose `retain_until` has passed. Returns how many.
    fn purge_expired(&self, now: i64) -> usize;

    /// Returns the number of stored markers.
    fn len(&self) -> usize;

    /// Returns `true` if no markers are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `jti` is revoked and past its grace period at `now`.
    fn is_revoked(&self, jti: &str, now: i64) -> bool {
        self.lookup(jti)
            .map(|entry| entry.is_effective_at(now))
            .unwrap_or(false)
    }
}

/// In-memory revocation store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRevocationStore {
    entries: Arc<DashMap<String, RevocationEntry>>,
}

impl InMemoryRevocationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RevocationStore for InMemoryRevocationStore {
    fn revoke(&self, jti: &str, entry: RevocationEntry) {
        self.entries.entry(jti.to_string()).or_insert(entry);
    }

    fn lookup(&self, jti: &str) -> Option<RevocationEntry> {
        self.entries.get(jti).map(|e| *e)
    }

    fn purge_expired(&self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.retain_until > now);
        before.saturating_sub(self.entries.len())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Spawns a task that purges expired markers every `interval`.
///
/// The task runs until aborted.
pub fn spawn_purge_task(store: Arc<dyn RevocationStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick fires immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let purged = store.purge_expired(Utc::now().timestamp());
            if purged > 0 {
                tracing::debug!(purged, remaining = store.len(), "Purged revocation markers");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(revoked_at: i64, grace: i64, retain_until: i64) -> RevocationEntry {
        RevocationEntry {
            revoked_at,
            effective_at: revoked_at + grace,
            retain_until,
        }
    }

    #[test]
    fn test_revoke_and_lookup() {
        let store = InMemoryRevocationStore::new();
        assert!(!store.is_revoked("a", 100));

        store.revoke("a", entry(100, 0, 1_000));
        assert!(store.is_revoked("a", 100));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_grace_period() {
        let store = InMemoryRevocationStore::new();
        store.revoke("a", entry(100, 30, 1_000));

        assert!(!store.is_revoked("a", 110));
        assert!(store.is_revoked("a", 130));
    }

    #[test]
    fn test_existing_marker_kept() {
        let store = InMemoryRevocationStore::new();
        store.revoke("a", entry(100, 30, 1_000));
        store.revoke("a", entry(120, 30, 1_000));

        assert_eq!(store.lookup("a").unwrap().revoked_at, 100);
    }

    #[test]
    fn test_purge_expired() {
        let store = InMemoryRevocationStore::new();
        store.revoke("old", entry(0, 0, 50));
        store.revoke("new", entry(0, 0, 500));

        assert_eq!(store.purge_expired(100), 1);
        assert!(store.lookup("old").is_none());
        assert!(store.lookup("new").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_task() {
        let store = Arc::new(InMemoryRevocationStore::new());
        store.revoke("stale", entry(0, 0, 1));

        let handle = spawn_purge_task(store.clone(), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(15)).await;

        assert!(store.is_empty());
        handle.abort();
    }
}
