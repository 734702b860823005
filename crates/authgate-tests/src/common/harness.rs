// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! [`TestApp`] assembles a complete service (seeded store, codec, audit
//! reporter over a recording sink, session store, router) and drives it
//! with in-process requests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use authgate_api::{ApiConfig, ApiServer, AuthOrchestrator, TokenCodec, TokenConfig};
use authgate_core::{
    AuditReporter, AuditSink, CredentialStore, InMemoryAuditSink, InMemorySessionStore,
};

use super::fixtures::{AccountFixtures, TokenFixtures, TEST_USER_AGENT};

/// Response bodies larger than this fail the test.
const MAX_BODY_BYTES: usize = 1024 * 1024;

// =============================================================================
// Configuration
// =============================================================================

/// Options for building a [`TestApp`].
pub struct TestAppConfig {
    /// API settings.
    pub api: ApiConfig,
    /// Token settings.
    pub token: TokenConfig,
    /// Seed the default accounts.
    pub seed: bool,
    /// Replaces the recording sink.
    pub sink: Option<Arc<dyn AuditSink>>,
    /// Reporter delivery ceiling.
    pub audit_timeout: Duration,
    /// Replaces the in-memory credential store.
    pub store: Option<Arc<dyn CredentialStore>>,
}

impl Default for TestAppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            token: TokenFixtures::config(),
            seed: true,
            sink: None,
            audit_timeout: Duration::from_secs(2),
            store: None,
        }
    }
}

impl TestAppConfig {
    /// Sets the API settings.
    pub fn api(mut self, api: ApiConfig) -> Self {
        self.api = api;
        self
    }

    /// Sets the token settings.
    pub fn token(mut self, token: TokenConfig) -> Self {
        self.token = token;
        self
    }

    /// Starts with an empty store.
    pub fn unseeded(mut self) -> Self {
        self.seed = false;
        self
    }

    /// Reports to `sink` instead of the recording sink.
    pub fn sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the reporter delivery ceiling.
    pub fn audit_timeout(mut self, timeout: Duration) -> Self {
        self.audit_timeout = timeout;
        self
    }

    /// Uses `store` for credentials. Seeding still applies.
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Builds the app.
    pub async fn build(self) -> TestApp {
        TestApp::from_config(self).await
    }
}

// =============================================================================
// TestApp
// =============================================================================

/// A fully wired service for integration tests.
pub struct TestApp {
    /// Router under test.
    pub router: Router,
    /// Orchestrator shared with the router.
    pub orchestrator: AuthOrchestrator,
    /// Sessions keyed by cookie value.
    pub sessions: InMemorySessionStore,
    /// Events reported through the default sink.
    pub audit_sink: Arc<InMemoryAuditSink>,
    /// Effective API settings.
    pub config: ApiConfig,
}

/// A captured response.
#[derive(Debug, Clone)]
pub struct TestResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Parsed JSON body, `Null` for non-JSON bodies.
    pub body: Value,
    /// Raw body text.
    pub text: String,
}

impl TestApp {
    /// An app with the default accounts and a recording audit sink.
    pub async fn new() -> Self {
        TestAppConfig::default().build().await
    }

    /// Options for a customized app.
    pub fn builder() -> TestAppConfig {
        TestAppConfig::default()
    }

    async fn from_config(config: TestAppConfig) -> Self {
        let store: Arc<dyn CredentialStore> = config
            .store
            .unwrap_or_else(|| AccountFixtures::fast_store() as Arc<dyn CredentialStore>);

        if config.seed {
            authgate_core::seed_default_users(store.as_ref())
                .await
                .expect("seeding succeeds");
        }

        let audit_sink = Arc::new(InMemoryAuditSink::new());
        let sink: Arc<dyn AuditSink> = config
            .sink
            .unwrap_or_else(|| audit_sink.clone() as Arc<dyn AuditSink>);
        let audit = AuditReporter::new(sink).with_timeout(config.audit_timeout);

        let codec = TokenFixtures::codec_with(config.token, store);
        let sessions = InMemorySessionStore::new();

        let server = ApiServer::builder()
            .config(config.api.clone())
            .codec(codec)
            .audit(audit)
            .sessions(sessions.clone())
            .build()
            .expect("server builds");

        Self {
            router: server.router(),
            orchestrator: server.state().orchestrator().clone(),
            sessions,
            audit_sink,
            config: config.api,
        }
    }

    /// The token codec.
    pub fn codec(&self) -> &TokenCodec {
        self.orchestrator.codec()
    }

    /// Prefixes `path` with the configured base path.
    pub fn path(&self, path: &str) -> String {
        self.config.route(path)
    }

    /// Starts a request for `path` under the base path.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder<'_> {
        self.raw(method, &self.path(path))
    }

    /// Starts a request for an absolute `uri`, ignoring the base path.
    pub fn raw(&self, method: Method, uri: &str) -> RequestBuilder<'_> {
        RequestBuilder {
            app: self,
            inner: Request::builder()
                .method(method)
                .uri(uri)
                .header(header::USER_AGENT, TEST_USER_AGENT),
            body: None,
        }
    }

    /// `POST` a JSON body.
    pub fn post(&self, path: &str) -> RequestBuilder<'_> {
        self.request(Method::POST, path)
    }

    /// `GET` a path.
    pub fn get(&self, path: &str) -> RequestBuilder<'_> {
        self.request(Method::GET, path)
    }

    /// Logs in over HTTP and returns the issued token.
    pub async fn login(&self, credentials: Value) -> String {
        let response = self.post("/auth/login").json(credentials).send().await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.text);
        response.body["data"]["token"]
            .as_str()
            .expect("login returns a token")
            .to_string()
    }

    /// Logs in as the seeded regular account.
    pub async fn login_user(&self) -> String {
        self.login(AccountFixtures::user_credentials()).await
    }

    /// Waits until the recording sink holds at least `count` events.
    pub async fn wait_for_events(&self, count: usize) -> Vec<authgate_core::AuditEvent> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let events = self.audit_sink.events();
            if events.len() >= count || tokio::time::Instant::now() >= deadline {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

// =============================================================================
// RequestBuilder
// =============================================================================

/// Fluent in-process request.
pub struct RequestBuilder<'a> {
    app: &'a TestApp,
    inner: axum::http::request::Builder,
    body: Option<Body>,
}

impl RequestBuilder<'_> {
    /// Adds a header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.inner = self.inner.header(name, value);
        self
    }

    /// Adds `Authorization: Bearer <token>`.
    pub fn bearer(self, token: &str) -> Self {
        self.header("authorization", &format!("Bearer {}", token))
    }

    /// Adds the session cookie.
    pub fn session_cookie(self, value: &str) -> Self {
        let cookie = format!("{}={}", self.app.config.session_cookie, value);
        self.header("cookie", &cookie)
    }

    /// Sets the peer address seen by the server.
    pub fn peer(mut self, addr: SocketAddr) -> Self {
        self.inner = self.inner.extension(ConnectInfo(addr));
        self
    }

    /// Sets a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.inner = self.inner.header(header::CONTENT_TYPE, "application/json");
        self.body = Some(Body::from(body.to_string()));
        self
    }

    /// Sets a form-encoded body.
    pub fn form(mut self, body: &str) -> Self {
        self.inner = self
            .inner
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.body = Some(Body::from(body.to_string()));
        self
    }

    /// Sends the request through the router.
    pub async fn send(self) -> TestResponse {
        let request = self
            .inner
            .body(self.body.unwrap_or_else(Body::empty))
            .expect("valid request");

        let response = self
            .app
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), MAX_BODY_BYTES)
            .await
            .expect("body fits");
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_slice::<Value>(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            text,
        }
    }
}
