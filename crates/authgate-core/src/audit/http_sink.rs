// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! HTTP delivery to the external audit service.

use std::time::Duration;

use async_trait::async_trait;

use super::error::{AuditError, AuditResult};
use super::types::AuditEvent;
use super::AuditSink;

/// Path appended to the audit service base URL.
pub const AUDIT_LOG_PATH: &str = "/api/internal/audit-log";

/// Default per-request timeout.
pub const DEFAULT_AUDIT_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_ERROR_BODY: usize = 256;

// =============================================================================
// HttpAuditSink
// =============================================================================

/// Posts audit events as JSON to `{base_url}/api/internal/audit-log`.
///
/// Any 2xx response counts as delivered.
#[derive(Debug, Clone)]
pub struct HttpAuditSink {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpAuditSink {
    /// Creates a sink with the default 5 second timeout.
    pub fn new(base_url: &str) -> AuditResult<Self> {
        Self::with_timeout(base_url, DEFAULT_AUDIT_TIMEOUT)
    }

    /// Creates a sink with a custom timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> AuditResult<Self> {
        let base = base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(AuditError::configuration("audit base URL is empty"));
        }
        if timeout.is_zero() {
            return Err(AuditError::configuration("audit timeout must be positive"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuditError::configuration(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base, AUDIT_LOG_PATH),
            timeout,
        })
    }

    /// Returns the full endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_error(&self, error: reqwest::Error) -> AuditError {
        if error.is_timeout() {
            AuditError::timeout(self.timeout)
        } else {
            AuditError::transport(error.to_string())
        }
    }
}

#[async_trait]
impl AuditSink for HttpAuditSink {
    async fn deliver(&self, event: &AuditEvent) -> AuditResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(event)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AuditError::status(
            status.as_u16(),
            body.chars().take(MAX_ERROR_BODY).collect::<String>(),
        ))
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        let sink = HttpAuditSink::new("http://ip:80").unwrap();
        assert_eq!(sink.endpoint(), "http://ip:80/api/internal/audit-log");

        let sink = HttpAuditSink::new("http://audit.local/").unwrap();
        assert_eq!(sink.endpoint(), "http://audit.local/api/internal/audit-log");
        assert_eq!(sink.timeout(), DEFAULT_AUDIT_TIMEOUT);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(HttpAuditSink::new("  ").is_err());
        assert!(HttpAuditSink::with_timeout("http://ip", Duration::ZERO).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Port 9 on localhost is reserved (discard) and normally closed.
        let sink =
            HttpAuditSink::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let event = AuditEvent::new(super::super::AuditAction::Login, 1, "a@x.com", "s");

        let err = sink.deliver(&event).await.unwrap_err();
        assert!(matches!(
            err,
            AuditError::Transport { .. } | AuditError::Timeout { .. }
        ));
    }
}
