// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration error types for authgate-config.
//!
//! Covers reading, parsing, numeric coercion, environment overrides,
//! validation and signing-secret resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("Failed to parse config file '{path}': {message}")]
    Parse {
        /// Path to the configuration file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// File I/O error.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Invalid environment variable value.
    #[error("Invalid environment variable value for '{name}': {message}")]
    InvalidEnvVar {
        /// The environment variable name.
        name: String,
        /// Error message.
        message: String,
    },

    /// A numeric setting held a value that is not an integer.
    #[error("Invalid number for '{field}': '{value}'")]
    InvalidNumber {
        /// The field name.
        field: String,
        /// The offending value.
        value: String,
    },

    /// No signing secret in the environment or the config file.
    #[error("No signing secret configured: set JWT_SECRET or token.secret")]
    MissingSecret,

    /// Unsupported configuration format.
    #[error("Unsupported configuration format: {format}")]
    UnsupportedFormat {
        /// The format.
        format: String,
    },

    /// Serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    /// Creates a parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates an invalid environment variable error.
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid number error.
    pub fn invalid_number(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidNumber {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates an unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Returns `true` if the configuration file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::FileNotFound { .. })
    }

    /// Returns a short, operator-facing message.
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::Parse { path, message } => {
                format!("Could not parse {}: {}", path.display(), message)
            }
            ConfigError::Validation { field, message } => {
                format!("Invalid setting {}: {}", field, message)
            }
            ConfigError::Io { path, .. } => format!("Could not read {}", path.display()),
            ConfigError::FileNotFound { path } => {
                format!("Config file not found: {}", path.display())
            }
            ConfigError::InvalidEnvVar { name, message } => {
                format!("Environment variable {} is invalid: {}", name, message)
            }
            ConfigError::InvalidNumber { field, value } => {
                format!("{} must be an integer, got '{}'", field, value)
            }
            ConfigError::MissingSecret => {
                "No signing secret: set JWT_SECRET or token.secret".to_string()
            }
            ConfigError::UnsupportedFormat { format } => {
                format!("Unsupported config format: {}", format)
            }
            ConfigError::Serialization { message } => message.clone(),
        }
    }
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let err = ConfigError::validation("token.ttl", "must be positive");
        assert!(err.to_string().contains("token.ttl"));

        let err = ConfigError::invalid_number("token.refresh_ttl", "two weeks");
        assert_eq!(
            err.user_message(),
            "token.refresh_ttl must be an integer, got 'two weeks'"
        );

        assert!(ConfigError::file_not_found("authgate.yaml").is_not_found());
        assert!(!ConfigError::MissingSecret.is_not_found());
    }
}
