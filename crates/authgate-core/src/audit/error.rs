// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit delivery error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while delivering an audit event.
///
/// These never leave the [`AuditReporter`](super::AuditReporter); they exist
/// so sinks can report what went wrong for the warning log.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Network-level failure (connect refused, DNS, reset).
    #[error("Audit transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The audit endpoint did not answer in time.
    #[error("Audit delivery timed out after {timeout:?}")]
    Timeout {
        /// Configured timeout.
        timeout: Duration,
    },

    /// The audit endpoint answered with a non-2xx status.
    #[error("Audit endpoint returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// Payload could not be serialized.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },

    /// Sink configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },
}

impl AuditError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    /// Creates a status error.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns the HTTP status for [`AuditError::Status`].
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AuditError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the error type for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            AuditError::Transport { .. } => "transport",
            AuditError::Timeout { .. } => "timeout",
            AuditError::Status { .. } => "status",
            AuditError::Serialization { .. } => "serialization",
            AuditError::Configuration { .. } => "configuration",
        }
    }
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
