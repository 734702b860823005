// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API error types and handling.
//!
//! Every variant maps to an HTTP status and renders the standard envelope
//! `{success: false, message, errors?}`.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use authgate_core::CoreError;

use crate::auth::TokenError;
use crate::response::Outcome;

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// ApiError
// =============================================================================

/// API error type with HTTP status code mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request payload failed validation (422).
    #[error("Validation failed: {errors}")]
    Validation {
        /// Field-specific errors.
        errors: ValidationErrors,
    },

    /// Email/password pair did not match (401).
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing or unusable bearer token (401).
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Error message.
        message: String,
    },

    /// Token operation failed (401, or 500 for server-side failures).
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Resource not found (404).
    #[error("{resource} not found")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// Credential store failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Internal server error (500).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message (for logging, not user-facing).
        message: String,
    },
}

impl ApiError {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a validation error.
    pub fn validation(errors: ValidationErrors) -> Self {
        Self::Validation { errors }
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidCredentials | ApiError::Unauthorized { .. } => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Token(e) if e.is_server_error() => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Token(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Core(e) if e.is_client_error() => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Core(_) | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for categorization.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::Unauthorized { .. } => "UNAUTHORIZED",
            ApiError::Token(_) => "TOKEN_ERROR",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Core(_) => "STORE_ERROR",
            ApiError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns a message that is safe to show to clients.
    pub fn user_message(&self) -> Option<String> {
        match self {
            ApiError::Validation { .. } => None,
            ApiError::InvalidCredentials => Some("Invalid credentials".to_string()),
            ApiError::Unauthorized { message } => Some(message.clone()),
            ApiError::Token(e) if e.is_server_error() => {
                Some("Internal server error".to_string())
            }
            ApiError::Token(_) => Some("Unauthenticated.".to_string()),
            ApiError::NotFound { resource } => Some(format!("{} not found", resource)),
            ApiError::Core(_) | ApiError::Internal { .. } => {
                Some("Internal server error".to_string())
            }
        }
    }

    /// Returns `true` if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Converts the error into the response envelope.
    pub fn into_outcome(self) -> Outcome {
        let status = self.status_code();
        match self {
            ApiError::Validation { errors } => Outcome::validation(errors),
            other => Outcome::failure(status, other.user_message().unwrap_or_default()),
        }
    }
}

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if self.is_server_error() {
            tracing::error!(
                error = %self,
                error_code = error_code,
                status = %status,
                "Server error occurred"
            );
        } else {
            tracing::debug!(
                error = %self,
                error_code = error_code,
                status = %status,
                "Client error occurred"
            );
        }

        self.into_outcome().into_response()
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Field validation messages, keyed by field name.
///
/// Serializes as `{"email": ["The email field is required."], ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a message for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns the messages for a field.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Returns `true` if the field has at least one message.
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns `true` if there are no errors.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields with errors.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `Ok(value)` if empty, otherwise a validation error.
    pub fn into_result<T>(self, value: T) -> ApiResult<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::validation(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::validation(ValidationErrors::new()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(TokenError::Expired).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(TokenError::signing("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::not_found("User").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(CoreError::duplicate_email("a@x.com")).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(CoreError::storage("down")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = ApiError::internal("database password rejected");
        assert_eq!(err.user_message().unwrap(), "Internal server error");
    }

    #[test]
    fn test_validation_errors() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.add("email", "The email field is required.");
        errors.add("email", "The email field must be a valid email address.");
        errors.add("password", "The password field is required.");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("email").unwrap().len(), 2);

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["password"][0], "The password field is required.");
        assert!(errors.into_result(()).is_err());
    }
}
