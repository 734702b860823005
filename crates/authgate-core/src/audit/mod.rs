// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit reporting for authentication events.
//!
//! Login and logout events are posted to an external audit service. Delivery
//! is best-effort: the [`AuditReporter`] runs it off the request path and
//! swallows every failure after logging it.
//!
//! # Components
//!
//! - [`AuditSink`]: delivery trait
//! - [`HttpAuditSink`]: JSON POST to `{base}/api/internal/audit-log`
//! - [`InMemoryAuditSink`]: records events for tests
//! - [`AuditReporter`]: event construction, session correlation, dispatch
//!
//! # Example
//!
//! ```rust,ignore
//! use authgate_core::audit::{AuditAction, AuditReporter, HttpAuditSink};
//!
//! let sink = HttpAuditSink::new("http://ip:80")?;
//! let reporter = AuditReporter::new(Arc::new(sink));
//!
//! // Returns immediately; delivery happens on a background task.
//! reporter.dispatch(AuditAction::Login, &user, &ctx);
//! ```

mod error;
mod http_sink;
mod memory_sink;
mod metrics;
mod reporter;
mod types;

pub use error::{AuditError, AuditResult};
pub use http_sink::{HttpAuditSink, AUDIT_LOG_PATH, DEFAULT_AUDIT_TIMEOUT};
pub use memory_sink::InMemoryAuditSink;
pub use metrics::{AuditStats, AuditStatsSnapshot};
pub use reporter::AuditReporter;
pub use types::{AuditAction, AuditEvent};

use async_trait::async_trait;

// =============================================================================
// Core Trait
// =============================================================================

/// Destination for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Delivers one event. Called at most once per event; never retried.
    async fn deliver(&self, event: &AuditEvent) -> AuditResult<()>;

    /// Returns the sink name for logging.
    fn name(&self) -> &str {
        "audit_sink"
    }
}

// =============================================================================
// No-Op Sink
// =============================================================================

/// Sink that accepts and discards every event.
#[derive(Debug, Default, Clone)]
pub struct NoOpAuditSink;

impl NoOpAuditSink {
    /// Creates a no-op sink.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditSink for NoOpAuditSink {
    async fn deliver(&self, _event: &AuditEvent) -> AuditResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}
