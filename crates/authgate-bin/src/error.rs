// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the authgate binary.

use thiserror::Error;

/// Result type for binary operations.
pub type BinResult<T> = Result<T, BinError>;

/// Errors surfaced by CLI commands. Each maps to a process exit code.
#[derive(Debug, Error)]
pub enum BinError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] authgate_config::ConfigError),

    /// A component could not be constructed.
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// The token codec rejected its configuration.
    #[error("Token configuration error: {0}")]
    Token(#[from] authgate_api::TokenError),

    /// The HTTP server failed.
    #[error("API error: {0}")]
    Api(#[from] authgate_api::ApiError),

    /// Seeding or another store operation failed.
    #[error("Core error: {0}")]
    Core(#[from] authgate_core::CoreError),

    /// Invalid command-line usage.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Error with additional context.
    #[error("{context}: {source}")]
    WithContext {
        /// What was being attempted.
        context: String,
        /// Underlying error.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Creates an initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Wraps this error with context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Token(_) => 1,
            Self::Initialization(_) | Self::Core(_) => 2,
            Self::Api(_) => 3,
            Self::InvalidArgument(_) => 64,
            Self::WithContext { source, .. } => source.exit_code(),
        }
    }
}

// =============================================================================
// Error Reporting
// =============================================================================

/// Prints the error and its cause chain to stderr.
pub fn report_error(error: &BinError) {
    eprintln!("Error: {}", error);

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }
}

/// Prints the error and exits with its code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_with_context() {
        let err = BinError::init("listener").with_context("starting server");
        assert_eq!(
            err.to_string(),
            "starting server: Initialization error: listener"
        );
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(BinError::from(authgate_config::ConfigError::MissingSecret).exit_code(), 1);
        assert_eq!(BinError::init("x").exit_code(), 2);
        assert_eq!(BinError::invalid_argument("x").exit_code(), 64);
    }
}
