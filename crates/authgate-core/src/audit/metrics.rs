// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit delivery counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use super::error::AuditError;

// =============================================================================
// AuditStats
// =============================================================================

/// Delivery counters shared by all clones of a reporter.
#[derive(Debug, Default)]
pub struct AuditStats {
    delivered: AtomicU64,
    failed: AtomicU64,
    timeouts: AtomicU64,
    rejected: AtomicU64,
    skipped: AtomicU64,
}

impl AuditStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful delivery.
    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed delivery.
    pub fn record_failure(&self, error: &AuditError) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        match error {
            AuditError::Timeout { .. } => {
                self.timeouts.fetch_add(1, Ordering::Relaxed);
            }
            AuditError::Status { .. } => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    /// Records an event dropped because auditing is disabled.
    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of the counters.
    pub fn snapshot(&self) -> AuditStatsSnapshot {
        AuditStatsSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`AuditStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditStatsSnapshot {
    /// Events accepted by the sink.
    pub delivered: u64,
    /// Events that failed for any reason.
    pub failed: u64,
    /// Failures caused by timeouts.
    pub timeouts: u64,
    /// Failures caused by non-2xx responses.
    pub rejected: u64,
    /// Events not sent because auditing is disabled.
    pub skipped: u64,
}

impl AuditStatsSnapshot {
    /// Total events the reporter was asked to send.
    pub fn attempted(&self) -> u64 {
        self.delivered + self.failed
    }
}
