// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # authgate-config
//!
//! Configuration management for authgate.
//!
//! ## Features
//!
//! - **Multi-Format Support**: YAML, TOML, and JSON configuration files
//! - **Placeholders**: `${VAR}` and `${VAR:default}` resolved before parsing
//! - **Environment Overrides**: `AUTHGATE_*` variables plus the shared
//!   `JWT_*` and `IP_SERVICE_URL` names
//! - **Numeric Coercion**: token timings accept integers or numeric strings
//! - **Secret Resolution**: `JWT_SECRET` first, then `token.secret`
//!
//! ## Quick Start
//!
//! ```no_run
//! use authgate_config::{load_config, resolve_signing_secret, ProcessEnv};
//!
//! let config = load_config("authgate.yaml").unwrap();
//! let secret = resolve_signing_secret(&config.token, &ProcessEnv).unwrap();
//!
//! println!("Token TTL: {} minutes", config.token.ttl);
//! println!("Secret from: {}", secret.source.as_str());
//! ```
//!
//! ## Example
//!
//! ```yaml
//! server:
//!   port: 8080
//!   base_path: /api
//! token:
//!   secret: "${JWT_SECRET:}"
//!   ttl: 60
//!   refresh_ttl: 20160
//! audit:
//!   service_base_url: "${IP_SERVICE_URL:http://ip:80}"
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod env;
pub mod error;
pub mod loader;
pub mod schema;
pub mod secret;

// =============================================================================
// Re-exports
// =============================================================================

pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_str, resolve_env_placeholders, ConfigFormat, ConfigLoader};
pub use schema::{
    AuditSettings, AuthgateConfig, CorsSettings, LogFormat, LogLevel, LoggingConfig, SecretValue,
    SeedSettings, ServerConfig, SessionSettings, TokenSettings, DEFAULT_AUDIT_BASE_URL,
    SUPPORTED_ALGORITHMS,
};
pub use secret::{
    resolve_signing_secret, ResolvedSecret, SecretSource, MIN_SECRET_BYTES, SECRET_ENV_VAR,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name() {
        assert_eq!(NAME, "authgate-config");
    }
}
