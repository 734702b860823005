// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Test Assertions
//!
//! Checks on the response envelope shared by every auth endpoint.

use axum::http::StatusCode;
use serde_json::Value;

use authgate_api::{Outcome, TOKEN_TYPE};

use super::harness::TestResponse;

/// Assertions on a JSON envelope.
pub trait EnvelopeAssertions {
    /// The envelope as JSON.
    fn envelope(&self) -> Value;

    /// `success: true` and, when given, the exact message.
    fn assert_success(&self, message: Option<&str>) {
        let body = self.envelope();
        assert_eq!(body["success"], Value::Bool(true), "expected success: {}", body);
        if let Some(message) = message {
            assert_eq!(body["message"], message, "unexpected message: {}", body);
        }
    }

    /// `success: false` with the exact message and no data.
    fn assert_failure(&self, message: &str) {
        let body = self.envelope();
        assert_eq!(body["success"], Value::Bool(false), "expected failure: {}", body);
        assert_eq!(body["message"], message, "unexpected message: {}", body);
        assert!(body.get("data").is_none(), "failure carries data: {}", body);
    }

    /// A validation envelope listing `field`, with no message.
    fn assert_validation_error(&self, field: &str) {
        let body = self.envelope();
        assert_eq!(body["success"], Value::Bool(false), "expected failure: {}", body);
        assert!(body.get("message").is_none(), "validation carries a message: {}", body);
        let messages = body["errors"][field]
            .as_array()
            .unwrap_or_else(|| panic!("no errors for {}: {}", field, body));
        assert!(!messages.is_empty());
    }

    /// `data` holds a bearer token payload for `email`.
    fn assert_token_payload(&self, email: &str) {
        let body = self.envelope();
        let data = &body["data"];
        assert!(
            data["token"].as_str().is_some_and(|t| !t.is_empty()),
            "missing token: {}",
            body
        );
        assert_eq!(data["token_type"], TOKEN_TYPE);
        assert!(data["expires_in"].as_i64().is_some_and(|s| s > 0));
        assert_eq!(data["user"]["email"], email);
        assert!(data["user"].get("password_hash").is_none());
    }
}

impl EnvelopeAssertions for Outcome {
    fn envelope(&self) -> Value {
        serde_json::to_value(self).expect("outcome serializes")
    }
}

impl EnvelopeAssertions for TestResponse {
    fn envelope(&self) -> Value {
        self.body.clone()
    }
}

/// Asserts the HTTP status with the body in the failure message.
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status, expected,
        "unexpected status, body: {}",
        response.text
    );
}

/// Extracts the token from a successful envelope.
pub fn token_of(envelope: &impl EnvelopeAssertions) -> String {
    envelope.envelope()["data"]["token"]
        .as_str()
        .expect("envelope carries a token")
        .to_string()
}
