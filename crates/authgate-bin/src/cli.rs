// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Command-line interface definition.
//!
//! Global options apply to every subcommand. Running without a subcommand
//! is the same as `authgate run`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// =============================================================================
// Cli
// =============================================================================

/// authgate: token authentication service.
#[derive(Debug, Clone, Parser)]
#[command(name = "authgate", version = authgate_core::VERSION, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(
        short,
        long,
        global = true,
        default_value = "authgate.yaml",
        env = "AUTHGATE_CONFIG"
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Log output format. Overrides the config file.
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Only log warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text.
    Text,
    /// JSON lines.
    Json,
    /// Abbreviated text.
    Compact,
}

impl From<authgate_config::LogFormat> for LogFormat {
    fn from(format: authgate_config::LogFormat) -> Self {
        match format {
            authgate_config::LogFormat::Text => LogFormat::Text,
            authgate_config::LogFormat::Compact => LogFormat::Compact,
            authgate_config::LogFormat::Json => LogFormat::Json,
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Start the authentication service (default).
    Run(RunArgs),

    /// Load and validate the configuration, then exit.
    Validate(ValidateArgs),

    /// Print version information.
    Version,

    /// Generate a random signing secret for `JWT_SECRET`.
    GenSecret(GenSecretArgs),
}

/// Arguments for `run`.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Create the default test and admin accounts at startup.
    #[arg(long)]
    pub seed: bool,

    /// Development mode: seed default accounts and generate an ephemeral
    /// secret when none is configured.
    #[arg(long)]
    pub dev: bool,
}

/// Arguments for `validate`.
#[derive(Debug, Clone, Default, Args)]
pub struct ValidateArgs {
    /// Print the effective configuration (secret redacted).
    #[arg(long)]
    pub show_config: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for `gen-secret`.
#[derive(Debug, Clone, Args)]
pub struct GenSecretArgs {
    /// Number of random bytes before encoding.
    #[arg(short, long, default_value_t = 32)]
    pub bytes: usize,
}

impl Default for GenSecretArgs {
    fn default() -> Self {
        Self { bytes: 32 }
    }
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON.
    Json,
}

// =============================================================================
// Helpers
// =============================================================================

impl Cli {
    /// Parses the process arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the subcommand, defaulting to `run`.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Returns the log level after applying `--quiet` and `--verbose`,
    /// falling back to `configured`.
    pub fn effective_log_level<'a>(&'a self, configured: &'a str) -> &'a str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            self.log_level.as_deref().unwrap_or(configured)
        }
    }

    /// Returns the log format, falling back to `configured`.
    pub fn effective_log_format(&self, configured: authgate_config::LogFormat) -> LogFormat {
        self.log_format.unwrap_or_else(|| configured.into())
    }
}

// =============================================================================
// Tests
// =============================================================================
