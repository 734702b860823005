// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The uniform outcome envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use authgate_core::UserProfile;

use crate::auth::IssuedToken;
use crate::error::ValidationErrors;

/// Token type reported to clients.
pub const TOKEN_TYPE: &str = "bearer";

// =============================================================================
// Outcome
// =============================================================================

/// Result of every lifecycle operation.
///
/// `status` travels alongside the body and becomes the HTTP status; it is
/// not part of the serialized envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Whether the operation succeeded.
    pub success: bool,
    /// HTTP status matching the outcome.
    #[serde(skip)]
    pub status: u16,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Field validation errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
    /// Operation payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Outcome {
    /// Creates a successful outcome with status 200.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            status: StatusCode::OK.as_u16(),
            message: Some(message.into()),
            errors: None,
            data: None,
        }
    }

    /// Creates a successful outcome with status 201.
    pub fn created(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CREATED.as_u16(),
            ..Self::ok(message)
        }
    }

    /// Creates a successful outcome with data and no message.
    pub fn data_only(data: impl Serialize) -> Self {
        Self {
            success: true,
            status: StatusCode::OK.as_u16(),
            message: None,
            errors: None,
            data: Some(to_value(data)),
        }
    }

    /// Creates a failed outcome.
    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status: status.as_u16(),
            message: Some(message.into()),
            errors: None,
            data: None,
        }
    }

    /// Creates a 422 outcome carrying field errors.
    pub fn validation(errors: ValidationErrors) -> Self {
        Self {
            success: false,
            status: StatusCode::UNPROCESSABLE_ENTITY.as_u16(),
            message: None,
            errors: Some(errors),
            data: None,
        }
    }

    /// Attaches a payload.
    pub fn with_data(mut self, data: impl Serialize) -> Self {
        self.data = Some(to_value(data));
        self
    }

    /// Returns the status as an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Returns a field from `data`, if present.
    pub fn data_field(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.as_ref().and_then(|d| d.get(key))
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

fn to_value(data: impl Serialize) -> serde_json::Value {
    match serde_json::to_value(data) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response payload");
            serde_json::Value::Null
        }
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// Payload returned by login, register and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// The authenticated user.
    pub user: UserProfile,
    /// Bearer token.
    pub token: String,
    /// Always `bearer`.
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

impl TokenPayload {
    /// Builds the payload for `user` and a freshly issued token.
    pub fn new(user: UserProfile, issued: IssuedToken) -> Self {
        Self {
            user,
            token: issued.token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: issued.ttl_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_not_serialized() {
        let outcome = Outcome::ok("Login successful");
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Login successful");
        assert!(json.get("status").is_none());
        assert!(json.get("errors").is_none());
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_validation_outcome() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "The email field is required.");
        let outcome = Outcome::validation(errors);

        assert_eq!(outcome.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["errors"]["email"][0], "The email field is required.");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_created_and_data() {
        let outcome = Outcome::created("User registered successfully")
            .with_data(serde_json::json!({ "token": "t" }));
        assert_eq!(outcome.status, 201);
        assert_eq!(outcome.data_field("token").unwrap(), "t");

        let me = Outcome::data_only(serde_json::json!({ "id": 1 }));
        assert!(me.message.is_none());
        assert_eq!(me.status, 200);
    }

    #[test]
    fn test_into_response_status() {
        let response = Outcome::failure(StatusCode::NOT_FOUND, "User not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
