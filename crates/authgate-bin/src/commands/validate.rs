// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use authgate_config::{resolve_signing_secret, AuthgateConfig, ConfigLoader, ProcessEnv, SecretValue};

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};

/// Loads and validates the configuration file and reports warnings.
///
/// Unlike `run`, a missing file is an error here.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    let config = ConfigLoader::new()
        .load(config_path)
        .map_err(|e| BinError::from(e).with_context("configuration validation failed"))?;

    let warnings = collect_warnings(&config);

    match args.format {
        OutputFormat::Text => {
            println!("Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!("  Listen:       {}:{}", config.server.host, config.server.port);
            println!("  Base path:    {}", config.server.base_path);
            println!("  Algorithm:    {}", config.token.algorithm);
            println!("  TTL:          {} min (refresh {} min)", config.token.ttl, config.token.refresh_ttl);
            println!("  Blacklist:    {}", enabled(config.token.blacklist_enabled));
            println!("  Audit:        {}", enabled(config.audit.enabled));

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  - {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Effective configuration:");
                println!("{}", to_json(&redacted(&config)));
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "warnings": warnings,
                "config": if args.show_config { Some(redacted(&config)) } else { None },
            });
            println!("{}", to_json(&output));
        }
    }

    Ok(())
}

/// Non-fatal findings worth surfacing before deployment.
pub fn collect_warnings(config: &AuthgateConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    match resolve_signing_secret(&config.token, &ProcessEnv) {
        Ok(secret) if secret.is_weak() => warnings.push(format!(
            "signing secret from {} is shorter than {} bytes",
            secret.source.as_str(),
            authgate_config::MIN_SECRET_BYTES
        )),
        Ok(_) => {}
        Err(_) => warnings.push("no signing secret: set JWT_SECRET or token.secret".to_string()),
    }

    if config.seed.default_users {
        warnings.push("default accounts with a well-known password will be seeded".to_string());
    }
    if config.server.cors.allow_credentials
        && config.server.cors.allowed_origins.iter().any(|o| o == "*")
    {
        warnings.push("CORS allows credentials from any origin".to_string());
    }
    if !config.token.blacklist_enabled {
        warnings.push("blacklist disabled: logout cannot revoke tokens".to_string());
    }

    warnings
}

fn redacted(config: &AuthgateConfig) -> AuthgateConfig {
    let mut config = config.clone();
    if config.token.secret.is_some() {
        config.token.secret = Some(SecretValue::new("***"));
    }
    config
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "(serialization error)".to_string())
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "disabled"
    }
}
