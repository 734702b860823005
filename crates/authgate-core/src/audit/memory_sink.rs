// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory audit sink for tests and local development.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::AuditResult;
use super::types::{AuditAction, AuditEvent};
use super::AuditSink;
use crate::user::UserId;

/// Records every delivered event in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded events in delivery order.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().clone()
    }

    /// Returns events for one action.
    pub fn events_for_action(&self, action: AuditAction) -> Vec<AuditEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }

    /// Returns events for one user.
    pub fn events_for_user(&self, user_id: UserId) -> Vec<AuditEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Returns the most recent event.
    pub fn last(&self) -> Option<AuditEvent> {
        self.events.read().last().cloned()
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears recorded events.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn deliver(&self, event: &AuditEvent) -> AuditResult<()> {
        self.events.write().push(event.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_events() {
        let sink = InMemoryAuditSink::new();
        sink.deliver(&AuditEvent::new(AuditAction::Login, 1, "a@x.com", "s1"))
            .await
            .unwrap();
        sink.deliver(&AuditEvent::new(AuditAction::Logout, 1, "a@x.com", "s1"))
            .await
            .unwrap();
        sink.deliver(&AuditEvent::new(AuditAction::Login, 2, "b@x.com", "s2"))
            .await
            .unwrap();

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.events_for_action(AuditAction::Login).len(), 2);
        assert_eq!(sink.events_for_user(1).len(), 2);
        assert_eq!(sink.last().unwrap().user_id, 2);

        sink.clear();
        assert!(sink.is_empty());
    }
}
