// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema definitions for authgate.
//!
//! # Schema Structure
//!
//! ```text
//! AuthgateConfig
//! ├── server: ServerConfig
//! ├── token: TokenSettings
//! ├── audit: AuditSettings
//! ├── session: SessionSettings
//! ├── logging: LoggingConfig
//! └── seed: SeedSettings
//! ```
//!
//! Token timings accept integers or numeric strings; both end up as `i64`.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Constants
// =============================================================================

/// Default API port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default route prefix.
pub const DEFAULT_BASE_PATH: &str = "/api";

/// Default token lifetime in minutes.
pub const DEFAULT_TOKEN_TTL: i64 = 60;

/// Default refresh window in minutes (two weeks).
pub const DEFAULT_TOKEN_REFRESH_TTL: i64 = 20160;

/// Largest accepted `token.ttl` and `token.refresh_ttl`, in minutes (ten years).
pub const MAX_TOKEN_TTL: i64 = 10 * 365 * 24 * 60;

/// Largest accepted `token.leeway` and `token.blacklist_grace_period`, in seconds.
pub const MAX_TOKEN_SKEW_SECS: i64 = 24 * 60 * 60;

/// Default audit service base URL.
pub const DEFAULT_AUDIT_BASE_URL: &str = "http://ip:80";

/// Default audit delivery timeout in seconds.
pub const DEFAULT_AUDIT_TIMEOUT_SECS: u64 = 5;

/// Default session cookie.
pub const DEFAULT_SESSION_COOKIE: &str = "authgate_session";

/// Default idle lifetime of a server-side session in seconds (two hours).
pub const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: u64 = 7_200;

/// Signing algorithms accepted in `token.algorithm`.
pub const SUPPORTED_ALGORITHMS: &[&str] = &["HS256", "HS384", "HS512"];

// =============================================================================
// AuthgateConfig
// =============================================================================

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthgateConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Token settings.
    pub token: TokenSettings,

    /// Audit delivery settings.
    pub audit: AuditSettings,

    /// Session settings.
    pub session: SessionSettings,

    /// Logging settings.
    pub logging: LoggingConfig,

    /// Startup seeding.
    pub seed: SeedSettings,
}

impl AuthgateConfig {
    /// Validates every section.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.token.validate()?;
        self.audit.validate()?;
        self.session.validate()?;
        Ok(())
    }
}

// =============================================================================
// Server
// =============================================================================

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: IpAddr,

    /// Listen port.
    pub port: u16,

    /// Prefix for the auth routes.
    pub base_path: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Graceful shutdown drain timeout in seconds.
    pub shutdown_timeout_secs: u64,

    /// Interval between revocation purges in seconds.
    pub revocation_purge_interval_secs: u64,

    /// CORS settings.
    pub cors: CorsSettings,
}

impl ServerConfig {
    /// Validates the server settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::validation("server.port", "cannot be 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout_secs",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: DEFAULT_PORT,
            base_path: DEFAULT_BASE_PATH.to_string(),
            request_timeout_secs: 30,
            shutdown_timeout_secs: 30,
            revocation_purge_interval_secs: 300,
            cors: CorsSettings::default(),
        }
    }
}

/// CORS settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    /// Allowed origins ("*" for any).
    pub allowed_origins: Vec<String>,

    /// Whether to allow credentials.
    pub allow_credentials: bool,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: false,
        }
    }
}

// =============================================================================
// Token
// =============================================================================

/// Token signing and lifetime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    /// Signing secret. `JWT_SECRET` in the environment takes precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretValue>,

    /// `iss` claim.
    pub issuer: String,

    /// Signing algorithm name.
    pub algorithm: String,

    /// Token lifetime in minutes.
    #[serde(deserialize_with = "coerce_i64")]
    pub ttl: i64,

    /// Refresh window in minutes, counted from the original issue time.
    #[serde(deserialize_with = "coerce_i64")]
    pub refresh_ttl: i64,

    /// Clock skew tolerance in seconds.
    #[serde(deserialize_with = "coerce_i64")]
    pub leeway: i64,

    /// Whether invalidated tokens are tracked.
    pub blacklist_enabled: bool,

    /// Seconds a revoked token keeps working.
    #[serde(deserialize_with = "coerce_i64")]
    pub blacklist_grace_period: i64,
}

impl TokenSettings {
    /// Validates the token settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::validation("token.issuer", "cannot be empty"));
        }
        if !SUPPORTED_ALGORITHMS.contains(&self.algorithm.to_uppercase().as_str()) {
            return Err(ConfigError::validation(
                "token.algorithm",
                format!(
                    "unsupported algorithm '{}' (expected one of {})",
                    self.algorithm,
                    SUPPORTED_ALGORITHMS.join(", ")
                ),
            ));
        }
        if self.ttl <= 0 {
            return Err(ConfigError::validation("token.ttl", "must be greater than 0"));
        }
        if self.ttl > MAX_TOKEN_TTL {
            return Err(ConfigError::validation(
                "token.ttl",
                format!("cannot exceed {} minutes", MAX_TOKEN_TTL),
            ));
        }
        if self.refresh_ttl < self.ttl {
            return Err(ConfigError::validation(
                "token.refresh_ttl",
                "cannot be shorter than token.ttl",
            ));
        }
        if self.refresh_ttl > MAX_TOKEN_TTL {
            return Err(ConfigError::validation(
                "token.refresh_ttl",
                format!("cannot exceed {} minutes", MAX_TOKEN_TTL),
            ));
        }
        if !(0..=MAX_TOKEN_SKEW_SECS).contains(&self.leeway) {
            return Err(ConfigError::validation(
                "token.leeway",
                format!("must be between 0 and {} seconds", MAX_TOKEN_SKEW_SECS),
            ));
        }
        if !(0..=MAX_TOKEN_SKEW_SECS).contains(&self.blacklist_grace_period) {
            return Err(ConfigError::validation(
                "token.blacklist_grace_period",
                format!("must be between 0 and {} seconds", MAX_TOKEN_SKEW_SECS),
            ));
        }
        Ok(())
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            secret: None,
            issuer: "authgate".to_string(),
            algorithm: "HS256".to_string(),
            ttl: DEFAULT_TOKEN_TTL,
            refresh_ttl: DEFAULT_TOKEN_REFRESH_TTL,
            leeway: 0,
            blacklist_enabled: true,
            blacklist_grace_period: 0,
        }
    }
}

// =============================================================================
// Audit
// =============================================================================

/// Audit delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    /// Whether login/logout events are delivered.
    pub enabled: bool,

    /// Base URL of the audit service.
    pub service_base_url: String,

    /// Delivery timeout in seconds.
    #[serde(deserialize_with = "coerce_u64")]
    pub timeout_secs: u64,
}

impl AuditSettings {
    /// Validates the audit settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }

        let url = self.service_base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::validation(
                "audit.service_base_url",
                "cannot be empty",
            ));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::validation(
                "audit.service_base_url",
                "must start with http:// or https://",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::validation(
                "audit.timeout_secs",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            service_base_url: DEFAULT_AUDIT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_AUDIT_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// Session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Cookie whose value keys the server-side session.
    pub cookie_name: String,

    /// Seconds a session may sit untouched before it is purged.
    pub idle_timeout_secs: u64,

    /// Interval between idle-session purges in seconds.
    pub purge_interval_secs: u64,
}

impl SessionSettings {
    /// Validates the session settings.
    pub fn validate(&self) -> ConfigResult<()> {
        let name = self.cookie_name.trim();
        if name.is_empty() {
            return Err(ConfigError::validation("session.cookie_name", "cannot be empty"));
        }
        if name.contains(|c: char| c == ';' || c == '=' || c.is_whitespace()) {
            return Err(ConfigError::validation(
                "session.cookie_name",
                "contains characters not allowed in a cookie name",
            ));
        }
        if self.idle_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "session.idle_timeout_secs",
                "must be greater than 0",
            ));
        }
        if self.purge_interval_secs == 0 {
            return Err(ConfigError::validation(
                "session.purge_interval_secs",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            idle_timeout_secs: DEFAULT_SESSION_IDLE_TIMEOUT_SECS,
            purge_interval_secs: 300,
        }
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level.
    pub level: LogLevel,

    /// Log format.
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the filter directive for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parses a level name, accepting `warning` for `warn`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, one event per line.
    #[default]
    Text,
    /// Abbreviated human-readable.
    Compact,
    /// JSON for log shippers.
    Json,
}

impl LogFormat {
    /// Parses a format name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "pretty" => Some(LogFormat::Text),
            "compact" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

// =============================================================================
// Seed
// =============================================================================

/// Startup seeding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedSettings {
    /// Create the default test and admin accounts at startup.
    pub default_users: bool,
}

// =============================================================================
// Secret Value
// =============================================================================

/// A secret that never shows up in logs or debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(String);

impl SecretValue {
    /// Wraps a secret.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret itself.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns the length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the secret is empty or whitespace.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue(***)")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

// =============================================================================
// Numeric coercion
// =============================================================================

/// Parses a configuration integer that may arrive as text.
pub fn parse_numeric(field: &str, value: &str) -> ConfigResult<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ConfigError::invalid_number(field, value))
}

struct IntOrString;

impl<'de> Visitor<'de> for IntOrString {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("{} is out of range", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
        if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
            Ok(v as i64)
        } else {
            Err(E::custom(format!("{} is not a whole number", v)))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        v.trim()
            .parse::<i64>()
            .map_err(|_| E::custom(format!("'{}' is not an integer", v)))
    }
}

fn coerce_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    deserializer.deserialize_any(IntOrString)
}

fn coerce_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = deserializer.deserialize_any(IntOrString)?;
    u64::try_from(value).map_err(|_| de::Error::custom(format!("{} cannot be negative", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AuthgateConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.token.ttl, 60);
        assert_eq!(config.token.refresh_ttl, 20160);
        assert_eq!(config.audit.service_base_url, "http://ip:80");
        assert_eq!(config.session.cookie_name, "authgate_session");
        assert!(!config.seed.default_users);
    }

    #[test]
    fn test_numeric_strings_coerced() {
        let config: AuthgateConfig = serde_json::from_str(
            r#"{"token": {"ttl": "15", "refresh_ttl": 120, "leeway": " 5 ", "blacklist_grace_period": "30"},
                "audit": {"timeout_secs": "2"}}"#,
        )
        .unwrap();

        assert_eq!(config.token.ttl, 15);
        assert_eq!(config.token.refresh_ttl, 120);
        assert_eq!(config.token.leeway, 5);
        assert_eq!(config.token.blacklist_grace_period, 30);
        assert_eq!(config.audit.timeout_secs, 2);
    }

    #[test]
    fn test_non_numeric_rejected() {
        let result: Result<AuthgateConfig, _> =
            serde_json::from_str(r#"{"token": {"ttl": "an hour"}}"#);
        assert!(result.is_err());

        assert!(parse_numeric("token.ttl", "60").is_ok());
        assert!(matches!(
            parse_numeric("token.ttl", "sixty"),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_token_validation() {
        let mut token = TokenSettings::default();
        token.ttl = 0;
        assert!(token.validate().is_err());

        let mut token = TokenSettings::default();
        token.refresh_ttl = 30;
        assert!(token.validate().is_err());

        let mut token = TokenSettings::default();
        token.algorithm = "RS256".to_string();
        assert!(token.validate().is_err());

        let mut token = TokenSettings::default();
        token.algorithm = "hs512".to_string();
        assert!(token.validate().is_ok());
    }

    #[test]
    fn test_token_validation_rejects_overflowing_timings() {
        let mut token = TokenSettings::default();
        token.ttl = i64::MAX / 30;
        token.refresh_ttl = i64::MAX / 30;
        assert!(matches!(
            token.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "token.ttl"
        ));

        let mut token = TokenSettings::default();
        token.refresh_ttl = i64::MAX;
        assert!(matches!(
            token.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "token.refresh_ttl"
        ));

        let mut token = TokenSettings::default();
        token.leeway = i64::MAX;
        assert!(token.validate().is_err());

        let mut token = TokenSettings::default();
        token.blacklist_grace_period = i64::MAX;
        assert!(token.validate().is_err());

        let mut token = TokenSettings::default();
        token.ttl = MAX_TOKEN_TTL;
        token.refresh_ttl = MAX_TOKEN_TTL;
        assert!(token.validate().is_ok());
    }

    #[test]
    fn test_session_validation() {
        assert!(SessionSettings::default().validate().is_ok());

        let mut session = SessionSettings::default();
        session.idle_timeout_secs = 0;
        assert!(session.validate().is_err());

        let mut session = SessionSettings::default();
        session.purge_interval_secs = 0;
        assert!(session.validate().is_err());

        let mut session = SessionSettings::default();
        session.cookie_name = "bad name".to_string();
        assert!(session.validate().is_err());
    }

    #[test]
    fn test_audit_validation() {
        let mut audit = AuditSettings::default();
        audit.service_base_url = String::new();
        assert!(audit.validate().is_err());

        audit.enabled = false;
        assert!(audit.validate().is_ok());

        let mut audit = AuditSettings::default();
        audit.timeout_secs = 0;
        assert!(audit.validate().is_err());
    }

    #[test]
    fn test_secret_redacted() {
        let secret = SecretValue::new("super-secret");
        assert_eq!(format!("{:?}", secret), "SecretValue(***)");
        assert_eq!(secret.to_string(), "***");
        assert_eq!(secret.expose(), "super-secret");
    }

    #[test]
    fn test_level_and_format_parse() {
        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("loud"), None);
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
    }
}
