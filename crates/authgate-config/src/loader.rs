// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading and processing for authgate.
//!
//! # Loading Pipeline
//!
//! 1. Read the YAML/TOML/JSON file
//! 2. Substitute `${VAR}` / `${VAR:default}` placeholders
//! 3. Parse, coercing numeric strings in token timings
//! 4. Apply environment overrides
//! 5. Validate
//!
//! # Environment Overrides
//!
//! ```text
//! AUTHGATE_PORT=9090
//! AUTHGATE_TOKEN_TTL=30                     (or JWT_TTL)
//! AUTHGATE_TOKEN_REFRESH_TTL=20160          (or JWT_REFRESH_TTL)
//! AUTHGATE_TOKEN_LEEWAY=0                   (or JWT_LEEWAY)
//! AUTHGATE_TOKEN_BLACKLIST_GRACE_PERIOD=0   (or JWT_BLACKLIST_GRACE_PERIOD)
//! AUTHGATE_TOKEN_BLACKLIST_ENABLED=true     (or JWT_BLACKLIST_ENABLED)
//! AUTHGATE_TOKEN_ALGORITHM=HS256            (or JWT_ALGO)
//! AUTHGATE_LOG_LEVEL=debug
//! AUTHGATE_LOG_FORMAT=json
//! AUTHGATE_AUDIT_ENABLED=false
//! IP_SERVICE_URL=http://audit:80
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::env::{EnvSource, ProcessEnv};
use crate::error::{ConfigError, ConfigResult};
use crate::schema::{parse_numeric, AuthgateConfig, LogFormat, LogLevel};

/// Port override.
pub const ENV_PORT: &[&str] = &["AUTHGATE_PORT"];
/// Token lifetime override (minutes).
pub const ENV_TOKEN_TTL: &[&str] = &["AUTHGATE_TOKEN_TTL", "JWT_TTL"];
/// Refresh window override (minutes).
pub const ENV_TOKEN_REFRESH_TTL: &[&str] = &["AUTHGATE_TOKEN_REFRESH_TTL", "JWT_REFRESH_TTL"];
/// Leeway override (seconds).
pub const ENV_TOKEN_LEEWAY: &[&str] = &["AUTHGATE_TOKEN_LEEWAY", "JWT_LEEWAY"];
/// Blacklist grace period override (seconds).
pub const ENV_TOKEN_GRACE_PERIOD: &[&str] = &[
    "AUTHGATE_TOKEN_BLACKLIST_GRACE_PERIOD",
    "JWT_BLACKLIST_GRACE_PERIOD",
];
/// Blacklist switch override.
pub const ENV_TOKEN_BLACKLIST_ENABLED: &[&str] =
    &["AUTHGATE_TOKEN_BLACKLIST_ENABLED", "JWT_BLACKLIST_ENABLED"];
/// Algorithm override.
pub const ENV_TOKEN_ALGORITHM: &[&str] = &["AUTHGATE_TOKEN_ALGORITHM", "JWT_ALGO"];
/// Log level override.
pub const ENV_LOG_LEVEL: &[&str] = &["AUTHGATE_LOG_LEVEL"];
/// Log format override.
pub const ENV_LOG_FORMAT: &[&str] = &["AUTHGATE_LOG_FORMAT"];
/// Audit switch override.
pub const ENV_AUDIT_ENABLED: &[&str] = &["AUTHGATE_AUDIT_ENABLED"];
/// Audit service base URL override.
pub const ENV_AUDIT_URL: &[&str] = &["IP_SERVICE_URL"];

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader.
#[derive(Clone)]
pub struct ConfigLoader {
    env: Arc<dyn EnvSource>,
    resolve_placeholders: bool,
    apply_overrides: bool,
}

impl ConfigLoader {
    /// Creates a loader reading the process environment.
    pub fn new() -> Self {
        Self {
            env: Arc::new(ProcessEnv),
            resolve_placeholders: true,
            apply_overrides: true,
        }
    }

    /// Replaces the environment source.
    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Enables or disables `${VAR}` substitution.
    pub fn with_placeholders(mut self, enabled: bool) -> Self {
        self.resolve_placeholders = enabled;
        self
    }

    /// Enables or disables environment overrides.
    pub fn with_env_overrides(mut self, enabled: bool) -> Self {
        self.apply_overrides = enabled;
        self
    }

    /// Returns the environment source.
    pub fn env(&self) -> &dyn EnvSource {
        self.env.as_ref()
    }

    /// Loads and validates a configuration file.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<AuthgateConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = self.read_file(path)?;
        let format = ConfigFormat::from_path(path)?;
        let config: AuthgateConfig = self.parse_content(&content, format, path)?;

        self.finish(config)
    }

    /// Loads a configuration file, falling back to defaults when it does
    /// not exist. Overrides and validation still apply.
    pub fn load_or_default(&self, path: impl AsRef<Path>) -> ConfigResult<AuthgateConfig> {
        let path = path.as_ref();
        if path.exists() {
            return self.load(path);
        }

        warn!(path = %path.display(), "Config file not found, using defaults");
        self.finish(AuthgateConfig::default())
    }

    /// Loads configuration from a string.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<AuthgateConfig> {
        let content = self.substitute(content);
        let config = parse_str(&content, format)?;
        self.finish(config)
    }

    fn finish(&self, mut config: AuthgateConfig) -> ConfigResult<AuthgateConfig> {
        if self.apply_overrides {
            self.apply_env_overrides(&mut config)?;
        }

        config.validate()?;

        debug!(
            port = config.server.port,
            token_ttl = config.token.ttl,
            refresh_ttl = config.token.refresh_ttl,
            audit_enabled = config.audit.enabled,
            "Configuration loaded"
        );

        Ok(config)
    }

    fn read_file(&self, path: &Path) -> ConfigResult<String> {
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
    }

    fn parse_content(
        &self,
        content: &str,
        format: ConfigFormat,
        path: &Path,
    ) -> ConfigResult<AuthgateConfig> {
        let content = self.substitute(content);

        parse_str(&content, format).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::parse(path, message),
            other => other,
        })
    }

    fn substitute(&self, content: &str) -> String {
        if self.resolve_placeholders {
            resolve_env_placeholders(content, self.env.as_ref())
        } else {
            content.to_string()
        }
    }

    /// Applies environment overrides to a parsed configuration.
    pub fn apply_env_overrides(&self, config: &mut AuthgateConfig) -> ConfigResult<()> {
        let env = self.env.as_ref();

        if let Some((name, value)) = env.first_of(ENV_PORT) {
            config.server.port = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(name, "expected valid port number"))?;
        }

        if let Some(v) = env_int(env, ENV_TOKEN_TTL)? {
            config.token.ttl = v;
        }
        if let Some(v) = env_int(env, ENV_TOKEN_REFRESH_TTL)? {
            config.token.refresh_ttl = v;
        }
        if let Some(v) = env_int(env, ENV_TOKEN_LEEWAY)? {
            config.token.leeway = v;
        }
        if let Some(v) = env_int(env, ENV_TOKEN_GRACE_PERIOD)? {
            config.token.blacklist_grace_period = v;
        }
        if let Some((_, value)) = env.first_of(ENV_TOKEN_BLACKLIST_ENABLED) {
            config.token.blacklist_enabled = parse_bool(&value);
        }
        if let Some((_, value)) = env.first_of(ENV_TOKEN_ALGORITHM) {
            config.token.algorithm = value.trim().to_uppercase();
        }

        if let Some((name, value)) = env.first_of(ENV_LOG_LEVEL) {
            match LogLevel::parse(&value) {
                Some(level) => config.logging.level = level,
                None => warn!(variable = %name, value = %value, "Ignoring unknown log level"),
            }
        }
        if let Some((name, value)) = env.first_of(ENV_LOG_FORMAT) {
            match LogFormat::parse(&value) {
                Some(format) => config.logging.format = format,
                None => warn!(variable = %name, value = %value, "Ignoring unknown log format"),
            }
        }

        if let Some((_, value)) = env.first_of(ENV_AUDIT_ENABLED) {
            config.audit.enabled = parse_bool(&value);
        }
        if let Some((_, value)) = env.first_of(ENV_AUDIT_URL) {
            config.audit.service_base_url = value.trim().to_string();
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("resolve_placeholders", &self.resolve_placeholders)
            .field("apply_overrides", &self.apply_overrides)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML.
    Yaml,
    /// TOML.
    Toml,
    /// JSON.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file extension.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }

    /// Returns the canonical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_str(content: &str, format: ConfigFormat) -> ConfigResult<AuthgateConfig> {
    match format {
        ConfigFormat::Yaml => yaml_parse(content),
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
    }
}

fn yaml_parse<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(content, config::FileFormat::Yaml))
        .build()
        .map_err(|e| ConfigError::serialization(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::serialization(e.to_string()))
}

/// Substitutes `${VAR}` and `${VAR:default}` placeholders.
///
/// Unset variables without a default are left in place.
pub fn resolve_env_placeholders(content: &str, env: &dyn EnvSource) -> String {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' || chars.peek() != Some(&'{') {
            result.push(c);
            continue;
        }
        chars.next();

        let mut var_content = String::new();
        let mut found_close = false;
        for c in chars.by_ref() {
            if c == '}' {
                found_close = true;
                break;
            }
            var_content.push(c);
        }

        if !found_close {
            result.push_str("${");
            result.push_str(&var_content);
            continue;
        }

        let (var_name, default_value) = match var_content.split_once(':') {
            Some((name, default)) => (name, Some(default)),
            None => (var_content.as_str(), None),
        };

        match (env.var(var_name), default_value) {
            (Some(value), _) => result.push_str(&value),
            (None, Some(default)) => result.push_str(default),
            (None, None) => {
                warn!("Environment variable '{}' not found", var_name);
                result.push_str(&format!("${{{}}}", var_name));
            }
        }
    }

    result
}

fn env_int(env: &dyn EnvSource, names: &[&str]) -> ConfigResult<Option<i64>> {
    match env.first_of(names) {
        Some((name, value)) => parse_numeric(&name, &value).map(Some).map_err(|_| {
            ConfigError::invalid_env_var(&name, format!("expected an integer, got '{}'", value))
        }),
        None => Ok(None),
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "enabled"
    )
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads a configuration file using the process environment.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<AuthgateConfig> {
    ConfigLoader::new().load(path)
}

/// Loads configuration from a string using the process environment.
pub fn load_config_str(content: &str, format: ConfigFormat) -> ConfigResult<AuthgateConfig> {
    ConfigLoader::new().load_from_str(content, format)
}

// =============================================================================
// Tests
// =============================================================================
