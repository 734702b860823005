// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Best-effort audit reporting.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::error::AuditError;
use super::http_sink::DEFAULT_AUDIT_TIMEOUT;
use super::metrics::{AuditStats, AuditStatsSnapshot};
use super::types::{AuditAction, AuditEvent};
use super::{AuditSink, NoOpAuditSink};
use crate::context::RequestContext;
use crate::session::SessionCorrelator;
use crate::user::User;

// =============================================================================
// AuditReporter
// =============================================================================

/// Builds audit events and hands them to a sink without ever failing the
/// caller.
///
/// Every delivery error is counted, logged at `warn` and discarded. The
/// boolean results are informational only.
#[derive(Clone)]
pub struct AuditReporter {
    sink: Arc<dyn AuditSink>,
    correlator: SessionCorrelator,
    stats: Arc<AuditStats>,
    timeout: Duration,
    enabled: bool,
}

impl AuditReporter {
    /// Creates an enabled reporter delivering to `sink`.
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            correlator: SessionCorrelator::new(),
            stats: Arc::new(AuditStats::new()),
            timeout: DEFAULT_AUDIT_TIMEOUT,
            enabled: true,
        }
    }

    /// Creates a reporter that drops every event.
    pub fn disabled() -> Self {
        let mut reporter = Self::new(Arc::new(NoOpAuditSink::new()));
        reporter.enabled = false;
        reporter
    }

    /// Sets the hard ceiling on a single delivery, independent of the sink.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns `true` if events are delivered.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the sink name.
    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    /// Returns the delivery counters.
    pub fn stats(&self) -> AuditStatsSnapshot {
        self.stats.snapshot()
    }

    /// Builds the event for `action` by `user`.
    ///
    /// Resolves the session id, which may cache a new id in the request's
    /// session context.
    pub fn build_event(&self, action: AuditAction, user: &User, ctx: &RequestContext) -> AuditEvent {
        let session_id = self.correlator.resolve(ctx);
        let mut event = AuditEvent::for_user(action, user, session_id);

        if let Some(ip) = ctx.client_ip {
            event = event.with_ip_address(ip.to_string());
        }
        if let Some(user_agent) = ctx.user_agent.as_deref() {
            event = event.with_user_agent(user_agent);
        }
        event
    }

    /// Reports an event and waits for delivery.
    ///
    /// Returns `true` if the sink accepted it. Never fails.
    pub async fn report(&self, action: AuditAction, user: &User, ctx: &RequestContext) -> bool {
        if !self.enabled {
            self.stats.record_skipped();
            return false;
        }
        let event = self.build_event(action, user, ctx);
        self.deliver(event).await
    }

    /// Reports an event on a background task and returns immediately.
    ///
    /// The session id is resolved before spawning so a freshly generated id
    /// is already cached when the caller's response goes out. Dropping the
    /// handle detaches the task.
    pub fn dispatch(&self, action: AuditAction, user: &User, ctx: &RequestContext) -> JoinHandle<bool> {
        if !self.enabled {
            self.stats.record_skipped();
            return tokio::spawn(async { false });
        }

        let event = self.build_event(action, user, ctx);
        let reporter = self.clone();
        tokio::spawn(async move { reporter.deliver(event).await })
    }

    async fn deliver(&self, event: AuditEvent) -> bool {
        let outcome = match tokio::time::timeout(self.timeout, self.sink.deliver(&event)).await {
            Ok(result) => result,
            Err(_) => Err(AuditError::timeout(self.timeout)),
        };

        match outcome {
            Ok(()) => {
                self.stats.record_delivered();
                tracing::debug!(
                    action = %event.action,
                    user_id = event.user_id,
                    session_id = %event.session_id,
                    sink = self.sink.name(),
                    "Audit event delivered"
                );
                true
            }
            Err(e) => {
                self.stats.record_failure(&e);
                tracing::warn!(
                    action = %event.action,
                    user_id = event.user_id,
                    error = %e,
                    status = ?e.status_code(),
                    sink = self.sink.name(),
                    "Failed to deliver audit event"
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for AuditReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditReporter")
            .field("sink", &self.sink.name())
            .field("timeout", &self.timeout)
            .field("enabled", &self.enabled)
            .finish()
    }
}
