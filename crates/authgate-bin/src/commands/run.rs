// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `run` command.

use crate::cli::{Cli, RunArgs};
use crate::error::BinResult;
use crate::runtime::RuntimeBuilder;

/// Loads configuration and serves until SIGINT/SIGTERM.
pub async fn run(cli: &Cli, args: RunArgs) -> BinResult<()> {
    let config = super::load_and_init_logging(cli)?;

    let runtime = RuntimeBuilder::new()
        .config(config)
        .seed(args.seed)
        .dev_mode(args.dev)
        .build()?;

    runtime.run().await
}
