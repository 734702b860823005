// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Audit Integration Tests
//!
//! Delivery of audit events to a live HTTP endpoint.
//!
//! ## Test Categories
//!
//! - `test_http_*`: the HTTP sink against the mock audit service
//! - `test_reporter_*`: delivery accounting in the reporter
//! - `test_end_to_end_*`: login and logout reaching the audit service

use std::sync::Arc;
use std::time::Duration;

use authgate_core::{
    AuditAction, AuditReporter, AuditSink, CredentialStore, HttpAuditSink, User,
};
use authgate_tests::prelude::*;
use serde_json::Value;
use tokio::net::TcpListener;

async fn seeded_user() -> User {
    let store = AccountFixtures::seeded_store().await;
    store
        .find_by_email(USER_EMAIL)
        .await
        .unwrap()
        .expect("seeded user exists")
}

fn http_reporter(base_url: &str, timeout: Duration) -> AuditReporter {
    let sink = HttpAuditSink::with_timeout(base_url, timeout).unwrap();
    AuditReporter::new(Arc::new(sink)).with_timeout(timeout * 2)
}

// =============================================================================
// HTTP Sink
// =============================================================================

#[tokio::test]
async fn test_http_posts_json_to_audit_path() {
    init_test_logging();
    let server = MockAuditServer::start().await;
    let reporter = http_reporter(&server.base_url(), Duration::from_secs(5));
    let user = seeded_user().await;

    let delivered = reporter
        .report(AuditAction::Login, &user, &ContextFixtures::anonymous())
        .await;
    assert!(delivered);

    let received = server.received();
    assert_eq!(received.len(), 1);
    let request = &received[0];
    assert_eq!(request.path, "/api/internal/audit-log");
    assert_eq!(request.accept.as_deref(), Some("application/json"));
    assert!(request
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("application/json")));

    let body = &request.body;
    assert_eq!(body["action"], "login");
    assert_eq!(body["user_id"], user.id);
    assert_eq!(body["user_email"], USER_EMAIL);
    assert_eq!(body["description"], format!("User {} logged in", USER_EMAIL));
    assert_eq!(body["role"], "user");
    assert_eq!(body["ip_address"], "203.0.113.7");
    assert_eq!(body["user_agent"], TEST_USER_AGENT);
    assert!(body["session_id"].as_str().is_some_and(|s| !s.is_empty()));
}

#[tokio::test]
async fn test_http_omits_unknown_optional_fields() {
    let server = MockAuditServer::start().await;
    let reporter = http_reporter(&server.base_url(), Duration::from_secs(5));
    let user = seeded_user().await;

    let ctx = authgate_core::RequestContext::new();
    assert!(reporter.report(AuditAction::Logout, &user, &ctx).await);

    let received = server.received();
    let body = received[0].body.as_object().expect("JSON object body");
    assert_eq!(body["action"], Value::from("logout"));
    assert!(!body.contains_key("ip_address"));
    assert!(!body.contains_key("user_agent"));
}

#[tokio::test]
async fn test_http_any_2xx_is_delivered() {
    let server = MockAuditServer::start().await;
    server.respond_with(StatusCode::NO_CONTENT);
    let reporter = http_reporter(&server.base_url(), Duration::from_secs(5));
    let user = seeded_user().await;

    assert!(
        reporter
            .report(AuditAction::Login, &user, &ContextFixtures::anonymous())
            .await
    );
    assert_eq!(reporter.stats().delivered, 1);
}

#[tokio::test]
async fn test_http_error_status_is_rejected() {
    let server = MockAuditServer::start().await;
    server.respond_with(StatusCode::INTERNAL_SERVER_ERROR);
    let reporter = http_reporter(&server.base_url(), Duration::from_secs(5));
    let user = seeded_user().await;

    let delivered = reporter
        .report(AuditAction::Login, &user, &ContextFixtures::anonymous())
        .await;

    assert!(!delivered);
    let stats = reporter.stats();
    assert_eq!(stats.delivered, 0);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.timeouts, 0);
    assert_eq!(server.received().len(), 1);
}

#[tokio::test]
async fn test_http_slow_service_times_out() {
    let server = MockAuditServer::start().await;
    server.delay(Duration::from_secs(2));
    let reporter = http_reporter(&server.base_url(), Duration::from_millis(200));
    let user = seeded_user().await;

    let delivered = reporter
        .report(AuditAction::Login, &user, &ContextFixtures::anonymous())
        .await;

    assert!(!delivered);
    let stats = reporter.stats();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.timeouts, 1);
}

#[tokio::test]
async fn test_http_unreachable_service_is_transport_failure() {
    // grab a free port, then close it
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let reporter = http_reporter(&format!("http://{}", addr), Duration::from_secs(2));
    let user = seeded_user().await;

    let delivered = reporter
        .report(AuditAction::Login, &user, &ContextFixtures::anonymous())
        .await;

    assert!(!delivered);
    let stats = reporter.stats();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.rejected, 0);
}

// =============================================================================
// Reporter
// =============================================================================

#[tokio::test]
async fn test_reporter_disabled_skips_delivery() {
    let reporter = AuditReporter::disabled();
    let user = seeded_user().await;

    assert!(!reporter.is_enabled());
    assert!(
        !reporter
            .report(AuditAction::Login, &user, &ContextFixtures::anonymous())
            .await
    );
    let handle = reporter.dispatch(AuditAction::Logout, &user, &ContextFixtures::anonymous());
    assert!(!handle.await.unwrap());

    let stats = reporter.stats();
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.attempted(), 0);
}

#[tokio::test]
async fn test_reporter_ceiling_applies_to_any_sink() {
    let sink = Arc::new(SlowAuditSink::new(Duration::from_secs(30)));
    let reporter =
        AuditReporter::new(sink.clone() as Arc<dyn AuditSink>).with_timeout(Duration::from_millis(100));
    let user = seeded_user().await;

    let delivered = reporter
        .report(AuditAction::Login, &user, &ContextFixtures::anonymous())
        .await;

    assert!(!delivered);
    assert_eq!(reporter.stats().timeouts, 1);
    assert_eq!(sink.delivered(), 0);
}

#[tokio::test]
async fn test_reporter_dispatch_completes_in_background() {
    let server = MockAuditServer::start().await;
    let reporter = http_reporter(&server.base_url(), Duration::from_secs(5));
    let user = seeded_user().await;

    let handle = reporter.dispatch(AuditAction::Login, &user, &ContextFixtures::anonymous());
    assert!(handle.await.unwrap());
    assert_eq!(server.received().len(), 1);
}

// =============================================================================
// End to End
// =============================================================================

#[tokio::test]
async fn test_end_to_end_login_and_logout_reach_audit_service() {
    let server = MockAuditServer::start().await;
    let sink = HttpAuditSink::with_timeout(&server.base_url(), Duration::from_secs(5)).unwrap();
    let app = TestApp::builder()
        .sink(Arc::new(sink))
        .audit_timeout(Duration::from_secs(10))
        .build()
        .await;

    let response = app
        .post("/auth/login")
        .json(AccountFixtures::user_credentials())
        .session_cookie("e2e-session")
        .send()
        .await;
    assert_status(&response, StatusCode::OK);
    let token = token_of(&response);

    let response = app
        .post("/auth/logout")
        .bearer(&token)
        .session_cookie("e2e-session")
        .send()
        .await;
    assert_status(&response, StatusCode::OK);

    let received = server.wait_for(2, Duration::from_secs(10)).await;
    assert_eq!(received.len(), 2);

    let mut actions: Vec<&str> = received
        .iter()
        .filter_map(|r| r.body["action"].as_str())
        .collect();
    actions.sort_unstable();
    assert_eq!(actions, vec!["login", "logout"]);
    assert_eq!(received[0].body["session_id"], received[1].body["session_id"]);
}

#[tokio::test]
async fn test_end_to_end_audit_outage_does_not_block_auth() {
    let server = MockAuditServer::start().await;
    server.respond_with(StatusCode::SERVICE_UNAVAILABLE);
    let sink = HttpAuditSink::with_timeout(&server.base_url(), Duration::from_secs(5)).unwrap();
    let app = TestApp::builder().sink(Arc::new(sink)).build().await;

    let token = app.login_user().await;
    let response = app.post("/auth/logout").bearer(&token).send().await;
    assert_status(&response, StatusCode::OK);

    let received = server.wait_for(2, Duration::from_secs(10)).await;
    assert_eq!(received.len(), 2);
}
