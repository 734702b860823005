// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session correlation.
//!
//! A session id ties audit events from the same client together without
//! depending on the bearer token, which changes on every refresh.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::context::RequestContext;

/// Header a caller may use to supply its own correlation id.
pub const SESSION_HEADER: &str = "X-Session-ID";

/// Session key under which a generated correlation id is cached.
pub const SESSION_KEY: &str = "audit_session_id";

// =============================================================================
// SessionId
// =============================================================================

/// Correlation string for one client session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps an existing id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

// =============================================================================
// SessionContext
// =============================================================================

/// Key/value storage scoped to one client session.
pub trait SessionContext: Send + Sync {
    /// Reads a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Writes a value, replacing any previous one.
    fn put(&self, key: &str, value: String);
}

/// Values of one session and the last time they were read or written.
#[derive(Debug, Default)]
struct SessionEntry {
    values: HashMap<String, String>,
    touched_at: i64,
}

/// In-memory session storage keyed by the session cookie value.
///
/// Sessions untouched for longer than the idle timeout are dropped by
/// [`purge_idle`](Self::purge_idle), usually from
/// [`spawn_session_purge_task`].
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<DashMap<String, SessionEntry>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens (lazily) the session identified by `session_key`.
    pub fn open(&self, session_key: impl Into<String>) -> SessionHandle {
        SessionHandle {
            key: session_key.into(),
            sessions: Arc::clone(&self.sessions),
        }
    }

    /// Drops a session and all its values.
    pub fn remove(&self, session_key: &str) -> bool {
        self.sessions.remove(session_key).is_some()
    }

    /// Drops sessions last touched more than `idle_timeout_secs` before
    /// `now`. Returns how many were dropped.
    pub fn purge_idle(&self, now: i64, idle_timeout_secs: i64) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| entry.touched_at.saturating_add(idle_timeout_secs) >= now);
        before.saturating_sub(self.sessions.len())
    }

    /// Returns the number of sessions holding at least one value.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no session holds a value.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Handle onto one session in an [`InMemorySessionStore`].
#[derive(Clone)]
pub struct SessionHandle {
    key: String,
    sessions: Arc<DashMap<String, SessionEntry>>,
}

impl SessionHandle {
    /// Returns the session key this handle is bound to.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl SessionContext for SessionHandle {
    fn get(&self, key: &str) -> Option<String> {
        let mut entry = self.sessions.get_mut(&self.key)?;
        entry.touched_at = Utc::now().timestamp();
        entry.values.get(key).cloned()
    }

    fn put(&self, key: &str, value: String) {
        let mut entry = self.sessions.entry(self.key.clone()).or_default();
        entry.touched_at = Utc::now().timestamp();
        entry.values.insert(key.to_string(), value);
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle").field("key", &self.key).finish()
    }
}

/// Spawns a task that drops sessions idle for longer than `idle_timeout`,
/// checking every `interval`.
///
/// The task runs until aborted.
pub fn spawn_session_purge_task(
    store: InMemorySessionStore,
    idle_timeout: Duration,
    interval: Duration,
) -> JoinHandle<()> {
    let idle_secs = i64::try_from(idle_timeout.as_secs()).unwrap_or(i64::MAX);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick fires immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let purged = store.purge_idle(Utc::now().timestamp(), idle_secs);
            if purged > 0 {
                tracing::debug!(purged, remaining = store.len(), "Purged idle sessions");
            }
        }
    })
}

// =============================================================================
// SessionCorrelator
// =============================================================================

/// Resolves the correlation id for a request.
///
/// Resolution order, first match wins:
///
/// 1. the caller-supplied [`SESSION_HEADER`] value, verbatim;
/// 2. the value cached under [`SESSION_KEY`] in the bound session;
/// 3. a fresh UUID v4, cached in the session when one is bound.
///
/// Empty header or session values count as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionCorrelator;

impl SessionCorrelator {
    /// Creates a correlator.
    pub fn new() -> Self {
        Self
    }

    /// Resolves the session id for `ctx`. Never fails.
    pub fn resolve(&self, ctx: &RequestContext) -> SessionId {
        if let Some(header) = ctx.session_header.as_deref().filter(|v| !v.is_empty()) {
            return SessionId::new(header);
        }

        if let Some(session) = ctx.session.as_ref() {
            if let Some(cached) = session.get(SESSION_KEY).filter(|v| !v.is_empty()) {
                return SessionId::new(cached);
            }

            let generated = SessionId::generate();
            session.put(SESSION_KEY, generated.as_str().to_string());
            return generated;
        }

        SessionId::generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_wins() {
        let store = InMemorySessionStore::new();
        let session = store.open("cookie-1");
        session.put(SESSION_KEY, "cached".to_string());

        let ctx = RequestContext::new()
            .with_session_header("from-header")
            .with_session(Arc::new(session.clone()));

        let id = SessionCorrelator::new().resolve(&ctx);
        assert_eq!(id.as_str(), "from-header");
        // The header value is not written back.
        assert_eq!(session.get(SESSION_KEY).as_deref(), Some("cached"));
    }

    #[test]
    fn test_cached_session_value_reused() {
        let store = InMemorySessionStore::new();
        let ctx = RequestContext::new().with_session(Arc::new(store.open("cookie-1")));
        let correlator = SessionCorrelator::new();

        let first = correlator.resolve(&ctx);
        let second = correlator.resolve(&ctx);
        assert_eq!(first, second);
        assert!(Uuid::parse_str(first.as_str()).is_ok());

        // A new handle onto the same session sees the same id.
        let again = RequestContext::new().with_session(Arc::new(store.open("cookie-1")));
        assert_eq!(correlator.resolve(&again), first);
    }

    #[test]
    fn test_distinct_sessions_get_distinct_ids() {
        let store = InMemorySessionStore::new();
        let correlator = SessionCorrelator::new();

        let a = correlator.resolve(&RequestContext::new().with_session(Arc::new(store.open("a"))));
        let b = correlator.resolve(&RequestContext::new().with_session(Arc::new(store.open("b"))));
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_no_session_is_ephemeral() {
        let correlator = SessionCorrelator::new();
        let ctx = RequestContext::new();

        let first = correlator.resolve(&ctx);
        let second = correlator.resolve(&ctx);
        assert_ne!(first, second);
    }

    #[test]
    fn test_empty_header_ignored() {
        let ctx = RequestContext::new().with_session_header("");
        let id = SessionCorrelator::new().resolve(&ctx);
        assert!(!id.as_str().is_empty());
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_purge_idle_drops_untouched_sessions() {
        let store = InMemorySessionStore::new();
        store.open("stale").put(SESSION_KEY, "a".to_string());
        store.open("fresh").put(SESSION_KEY, "b".to_string());
        let now = Utc::now().timestamp();

        assert_eq!(store.purge_idle(now, 60), 0);
        assert_eq!(store.len(), 2);

        store
            .sessions
            .get_mut("stale")
            .expect("stale session")
            .touched_at = now - 120;
        assert_eq!(store.purge_idle(now, 60), 1);
        assert!(store.open("stale").get(SESSION_KEY).is_none());
        assert_eq!(store.open("fresh").get(SESSION_KEY).as_deref(), Some("b"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_refreshes_touch_time() {
        let store = InMemorySessionStore::new();
        let session = store.open("s");
        session.put(SESSION_KEY, "id".to_string());
        store.sessions.get_mut("s").expect("session").touched_at = 0;

        assert_eq!(session.get(SESSION_KEY).as_deref(), Some("id"));
        assert!(store.sessions.get("s").expect("session").touched_at > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_task_evicts_idle_sessions() {
        let store = InMemorySessionStore::new();
        store.open("s").put(SESSION_KEY, "id".to_string());
        store.sessions.get_mut("s").expect("session").touched_at = 0;

        let task = spawn_session_purge_task(
            store.clone(),
            Duration::from_secs(60),
            Duration::from_secs(10),
        );
        tokio::time::sleep(Duration::from_secs(15)).await;

        assert!(store.is_empty());
        task.abort();
    }

    #[test]
    fn test_store_remove() {
        let store = InMemorySessionStore::new();
        store.open("x").put("k", "v".to_string());
        assert!(store.remove("x"));
        assert!(store.is_empty());
        assert!(store.open("x").get("k").is_none());
    }
}
