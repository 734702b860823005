// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! Audit sinks and credential stores with injectable failures, plus a
//! local HTTP server standing in for the audit service.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::Router;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use authgate_core::{
    AuditError, AuditEvent, AuditResult, AuditSink, CoreError, CoreResult, CredentialStore,
    NewUser, RoleAssignment, User, UserId,
};

// =============================================================================
// Audit Sinks
// =============================================================================

/// A sink that rejects every event with the configured status.
#[derive(Debug)]
pub struct FailingAuditSink {
    status: u16,
    attempts: AtomicU64,
}

impl FailingAuditSink {
    /// Creates a sink that answers with `status`.
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            attempts: AtomicU64::new(0),
        }
    }

    /// Number of delivery attempts seen.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuditSink for FailingAuditSink {
    async fn deliver(&self, _event: &AuditEvent) -> AuditResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AuditError::status(self.status, "mock failure"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// A sink that stalls before accepting.
#[derive(Debug)]
pub struct SlowAuditSink {
    delay: Duration,
    delivered: AtomicU64,
}

impl SlowAuditSink {
    /// Creates a sink that waits `delay` per event.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            delivered: AtomicU64::new(0),
        }
    }

    /// Number of events that made it through the delay.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuditSink for SlowAuditSink {
    async fn deliver(&self, _event: &AuditEvent) -> AuditResult<()> {
        tokio::time::sleep(self.delay).await;
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "slow"
    }
}

// =============================================================================
// Credential Store
// =============================================================================

/// Wraps a store and fails every call while the switch is on.
pub struct FlakyCredentialStore {
    inner: Arc<dyn CredentialStore>,
    failing: AtomicBool,
}

impl FlakyCredentialStore {
    /// Wraps `inner`; calls pass through until [`Self::fail`] is called.
    pub fn new(inner: Arc<dyn CredentialStore>) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent call fail with a storage error.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Restores pass-through behavior.
    pub fn recover(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    fn check(&self) -> CoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CoreError::storage("store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FlakyCredentialStore {
    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        self.check()?;
        self.inner.find_by_email(email).await
    }

    async fn find_by_id(&self, id: UserId) -> CoreResult<Option<User>> {
        self.check()?;
        self.inner.find_by_id(id).await
    }

    async fn create(&self, new_user: NewUser) -> CoreResult<User> {
        self.check()?;
        self.inner.create(new_user).await
    }

    async fn assign_role(&self, id: UserId, role: RoleAssignment) -> CoreResult<()> {
        self.check()?;
        self.inner.assign_role(id, role).await
    }

    async fn verify_password(&self, user: &User, plain: &str) -> CoreResult<bool> {
        self.check()?;
        self.inner.verify_password(user, plain).await
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

// =============================================================================
// Mock Audit Server
// =============================================================================

/// A request received by [`MockAuditServer`].
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    /// Request path.
    pub path: String,
    /// `Content-Type` header.
    pub content_type: Option<String>,
    /// `Accept` header.
    pub accept: Option<String>,
    /// Parsed JSON body, `Null` if not JSON.
    pub body: Value,
}

#[derive(Clone)]
struct Shared {
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
    status: Arc<AtomicU16>,
    delay_ms: Arc<AtomicU64>,
}

/// Local HTTP server that records every request and answers with a
/// configurable status.
pub struct MockAuditServer {
    addr: SocketAddr,
    shared: Shared,
    handle: JoinHandle<()>,
}

impl MockAuditServer {
    /// Starts the server on an ephemeral port, answering `201 Created`.
    pub async fn start() -> Self {
        let shared = Shared {
            received: Arc::new(Mutex::new(Vec::new())),
            status: Arc::new(AtomicU16::new(StatusCode::CREATED.as_u16())),
            delay_ms: Arc::new(AtomicU64::new(0)),
        };

        let app = Router::new().fallback(record).with_state(shared.clone());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("listener address");

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            shared,
            handle,
        }
    }

    /// Base URL to configure the audit sink with.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Changes the response status.
    pub fn respond_with(&self, status: StatusCode) {
        self.shared.status.store(status.as_u16(), Ordering::SeqCst);
    }

    /// Delays every response.
    pub fn delay(&self, delay: Duration) {
        self.shared
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Requests received so far.
    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.shared.received.lock().clone()
    }

    /// Waits until at least `count` requests arrived, or `timeout` passes.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<ReceivedRequest> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let received = self.received();
            if received.len() >= count || tokio::time::Instant::now() >= deadline {
                return received;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Drop for MockAuditServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn record(
    State(shared): State<Shared>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let request = ReceivedRequest {
        path: uri.path().to_string(),
        content_type: header_value(header::CONTENT_TYPE),
        accept: header_value(header::ACCEPT),
        body: serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null),
    };

    let delay = shared.delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    shared.received.lock().push(request);

    StatusCode::from_u16(shared.status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
