// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Logging and tracing initialization.
//!
//! `RUST_LOG` takes precedence over the level passed in, so individual
//! targets can be tuned without touching the config file.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::LogFormat;

/// Targets that are noisy at `info` and below.
const QUIET_TARGETS: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn", "tower=warn"];

// =============================================================================
// Logging Initialization
// =============================================================================

/// Initializes the global subscriber.
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init_logging(level: &str, format: LogFormat) {
    let filter = build_filter(level);

    let result = match format {
        LogFormat::Text => {
            let is_terminal = std::io::IsTerminal::is_terminal(&std::io::stdout());
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true).with_ansi(is_terminal))
                .try_init()
        }
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init(),
        LogFormat::Compact => {
            let is_terminal = std::io::IsTerminal::is_terminal(&std::io::stdout());
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_ansi(is_terminal),
                )
                .try_init()
        }
    };

    if let Err(e) = result {
        eprintln!("logging already initialized: {}", e);
    }
}

/// Builds the filter from `RUST_LOG`, falling back to `level`.
pub fn build_filter(level: &str) -> EnvFilter {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(normalize_level(level)).unwrap_or_else(|_| EnvFilter::new("info"))
    });

    for target in QUIET_TARGETS {
        if let Ok(directive) = target.parse() {
            filter = filter.add_directive(directive);
        }
    }

    filter
}

/// Maps level aliases onto filter directives. Unknown names become `info`.
pub fn normalize_level(level: &str) -> &'static str {
    authgate_config::LogLevel::parse(level)
        .unwrap_or_default()
        .as_str()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("trace"), "trace");
        assert_eq!(normalize_level("DEBUG"), "debug");
        assert_eq!(normalize_level("warning"), "warn");
        assert_eq!(normalize_level("error"), "error");
        assert_eq!(normalize_level("loud"), "info");
    }

    #[test]
    fn test_build_filter_does_not_panic() {
        let _ = build_filter("debug");
        let _ = build_filter("nonsense");
    }
}
