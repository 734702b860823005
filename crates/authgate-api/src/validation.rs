// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request payload validation for the auth endpoints.
//!
//! Payloads arrive as raw JSON values so that missing fields, wrong types
//! and malformed bodies all end up as field messages instead of extractor
//! rejections.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::ValidationErrors;

/// Maximum length of `name` and `email` on registration.
pub const MAX_FIELD_LENGTH: usize = 255;

/// Minimum password length on registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

// WHATWG "valid email address" production.
static EMAIL_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .ok()
});

/// Returns `true` if `value` is a syntactically valid email address.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

// =============================================================================
// Inputs
// =============================================================================

/// Validated login credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginInput {
    /// Email, trimmed.
    pub email: String,
    /// Password, as given.
    pub password: String,
}

impl std::fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginInput")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Validated registration request.
#[derive(Clone, PartialEq, Eq)]
pub struct RegisterInput {
    /// Display name, trimmed.
    pub name: String,
    /// Email, trimmed.
    pub email: String,
    /// Password, as given.
    pub password: String,
}

impl std::fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterInput")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Validates a login payload: `email` required, string, email;
/// `password` required, string.
pub fn validate_login(body: &Value) -> Result<LoginInput, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let email = required_string(body, "email", &mut errors).map(|v| v.trim().to_string());
    if let Some(email) = email.as_deref() {
        check_email(email, &mut errors);
    }
    let password = required_string(body, "password", &mut errors);

    match (email, password) {
        (Some(email), Some(password)) if errors.is_empty() => Ok(LoginInput { email, password }),
        _ => Err(errors),
    }
}

/// Validates a registration payload: `name` required, string, max 255;
/// `email` required, string, email, max 255; `password` required, string,
/// min 8. Uniqueness is checked against the store by the caller.
pub fn validate_register(body: &Value) -> Result<RegisterInput, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = required_string(body, "name", &mut errors).map(|v| v.trim().to_string());
    if let Some(name) = name.as_deref() {
        check_max("name", name, MAX_FIELD_LENGTH, &mut errors);
    }

    let email = required_string(body, "email", &mut errors).map(|v| v.trim().to_string());
    if let Some(email) = email.as_deref() {
        check_email(email, &mut errors);
        check_max("email", email, MAX_FIELD_LENGTH, &mut errors);
    }

    let password = required_string(body, "password", &mut errors);
    if let Some(password) = password.as_deref() {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!(
                    "The password field must be at least {} characters.",
                    MIN_PASSWORD_LENGTH
                ),
            );
        }
    }

    match (name, email, password) {
        (Some(name), Some(email), Some(password)) if errors.is_empty() => Ok(RegisterInput {
            name,
            email,
            password,
        }),
        _ => Err(errors),
    }
}

/// Message used when an email is already registered.
pub fn email_taken_message() -> String {
    "The email has already been taken.".to_string()
}

fn required_string(body: &Value, field: &str, errors: &mut ValidationErrors) -> Option<String> {
    match body.get(field) {
        None | Some(Value::Null) => {
            errors.add(field, format!("The {} field is required.", field));
            None
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.add(field, format!("The {} field is required.", field));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.add(field, format!("The {} field must be a string.", field));
            None
        }
    }
}

fn check_email(value: &str, errors: &mut ValidationErrors) {
    if !is_valid_email(value) {
        errors.add("email", "The email field must be a valid email address.");
    }
}

fn check_max(field: &str, value: &str, max: usize, errors: &mut ValidationErrors) {
    if value.chars().count() > max {
        errors.add(
            field,
            format!(
                "The {} field must not be greater than {} characters.",
                field, max
            ),
        );
    }
}
