// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the authgate domain layer.
//!
//! Audit delivery has its own error type in [`crate::audit::AuditError`]
//! because those failures never leave the audit reporter.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// CoreError
// =============================================================================

/// Errors raised by the credential store and password primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A user with this email already exists.
    #[error("Email already registered: {email}")]
    DuplicateEmail {
        /// The conflicting email.
        email: String,
    },

    /// The referenced user does not exist.
    #[error("User not found: {user_id}")]
    UserNotFound {
        /// The missing user id.
        user_id: u64,
    },

    /// Password hashing failed.
    #[error("Password hashing failed: {message}")]
    Hashing {
        /// Error message.
        message: String,
    },

    /// Persistence layer failure.
    #[error("Storage error: {message}")]
    Storage {
        /// Error message.
        message: String,
    },
}

impl CoreError {
    /// Creates a duplicate email error.
    pub fn duplicate_email(email: impl Into<String>) -> Self {
        Self::DuplicateEmail {
            email: email.into(),
        }
    }

    /// Creates a user not found error.
    pub fn user_not_found(user_id: u64) -> Self {
        Self::UserNotFound { user_id }
    }

    /// Creates a hashing error.
    pub fn hashing(message: impl Into<String>) -> Self {
        Self::Hashing {
            message: message.into(),
        }
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Returns `true` if the error was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::DuplicateEmail { .. } | Self::UserNotFound { .. })
    }
}
