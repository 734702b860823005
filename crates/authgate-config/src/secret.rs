// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Signing-secret resolution.
//!
//! Runs once at startup. The process environment wins over the config file
//! so that every service sharing the environment signs with the same key.

use tracing::{info, warn};

use crate::env::EnvSource;
use crate::error::{ConfigError, ConfigResult};
use crate::schema::{SecretValue, TokenSettings};

/// Environment variable holding the signing secret.
pub const SECRET_ENV_VAR: &str = "JWT_SECRET";

/// Secrets shorter than this produce a warning.
pub const MIN_SECRET_BYTES: usize = 32;

/// Where the signing secret came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    /// The `JWT_SECRET` environment variable.
    Environment,
    /// `token.secret` in the config file.
    ConfigFile,
}

impl SecretSource {
    /// Returns a label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretSource::Environment => "environment",
            SecretSource::ConfigFile => "config_file",
        }
    }
}

/// A resolved signing secret.
#[derive(Debug, Clone)]
pub struct ResolvedSecret {
    /// The secret.
    pub value: SecretValue,
    /// Where it came from.
    pub source: SecretSource,
}

impl ResolvedSecret {
    /// Returns `true` if the secret is shorter than [`MIN_SECRET_BYTES`].
    pub fn is_weak(&self) -> bool {
        self.value.len() < MIN_SECRET_BYTES
    }
}

/// Resolves the signing secret: `JWT_SECRET`, then `token.secret`.
///
/// Empty values count as absent. Fails with [`ConfigError::MissingSecret`]
/// when neither is set.
pub fn resolve_signing_secret(
    token: &TokenSettings,
    env: &dyn EnvSource,
) -> ConfigResult<ResolvedSecret> {
    let resolved = if let Some(value) = env.var(SECRET_ENV_VAR) {
        ResolvedSecret {
            value: SecretValue::new(value),
            source: SecretSource::Environment,
        }
    } else if let Some(secret) = token.secret.as_ref().filter(|s| !s.is_empty()) {
        ResolvedSecret {
            value: secret.clone(),
            source: SecretSource::ConfigFile,
        }
    } else {
        return Err(ConfigError::MissingSecret);
    };

    if resolved.is_weak() {
        warn!(
            source = resolved.source.as_str(),
            length = resolved.value.len(),
            "Signing secret is shorter than {} bytes",
            MIN_SECRET_BYTES
        );
    }
    info!(source = resolved.source.as_str(), "Signing secret resolved");

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;

    fn settings(secret: Option<&str>) -> TokenSettings {
        TokenSettings {
            secret: secret.map(SecretValue::new),
            ..TokenSettings::default()
        }
    }

    #[test]
    fn test_environment_wins() {
        let env = MapEnv::new().with(SECRET_ENV_VAR, "from-env-0123456789-0123456789-01");
        let resolved = resolve_signing_secret(&settings(Some("from-file")), &env).unwrap();

        assert_eq!(resolved.source, SecretSource::Environment);
        assert_eq!(resolved.value.expose(), "from-env-0123456789-0123456789-01");
        assert!(!resolved.is_weak());
    }

    #[test]
    fn test_falls_back_to_file() {
        let env = MapEnv::new().with(SECRET_ENV_VAR, "");
        let resolved = resolve_signing_secret(&settings(Some("from-file")), &env).unwrap();

        assert_eq!(resolved.source, SecretSource::ConfigFile);
        assert_eq!(resolved.value.expose(), "from-file");
        assert!(resolved.is_weak());
    }

    #[test]
    fn test_missing_secret() {
        let env = MapEnv::new();
        assert!(matches!(
            resolve_signing_secret(&settings(None), &env),
            Err(ConfigError::MissingSecret)
        ));
        assert!(matches!(
            resolve_signing_secret(&settings(Some("   ")), &env),
            Err(ConfigError::MissingSecret)
        ));
    }
}
