// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.
//!
//! - `run`: start the service
//! - `validate`: check the configuration file
//! - `version`: print version information
//! - `gen-secret`: print a random signing secret

mod gen_secret;
mod run;
mod validate;
mod version;

pub use gen_secret::{gen_secret, generate_secret};
pub use run::run;
pub use validate::validate;
pub use version::version;

use std::path::Path;

use authgate_config::{AuthgateConfig, ConfigLoader};
use tracing::info;

use crate::cli::{Cli, Commands};
use crate::error::{BinError, BinResult};
use crate::logging::init_logging;

/// Dispatches the parsed command line.
pub async fn execute(cli: Cli) -> BinResult<()> {
    match cli.effective_command() {
        Commands::Run(args) => run::run(&cli, args).await,
        Commands::Validate(args) => validate::validate(&cli, args),
        Commands::Version => version::version(&cli),
        Commands::GenSecret(args) => gen_secret::gen_secret(&cli, args),
    }
}

/// Loads the configuration, then initializes logging from it and the
/// command-line overrides.
pub(crate) fn load_and_init_logging(cli: &Cli) -> BinResult<AuthgateConfig> {
    let config = load(&cli.config)?;

    init_logging(
        cli.effective_log_level(config.logging.level.as_str()),
        cli.effective_log_format(config.logging.format),
    );

    if !cli.config.exists() {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    Ok(config)
}

fn load(path: &Path) -> BinResult<AuthgateConfig> {
    ConfigLoader::new()
        .load_or_default(path)
        .map_err(|e| BinError::from(e).with_context(format!("loading {}", path.display())))
}
