// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use crate::cli::Cli;
use crate::error::BinResult;

/// Prints component versions and build target.
pub fn version(_cli: &Cli) -> BinResult<()> {
    println!("authgate {}", crate::VERSION);
    println!();
    println!("Components:");
    println!("  authgate-core:   {}", authgate_core::VERSION);
    println!("  authgate-api:    {}", authgate_api::VERSION);
    println!("  authgate-config: {}", authgate_config::VERSION);
    println!();
    println!("Target: {}-{}", std::env::consts::ARCH, std::env::consts::OS);
    println!();
    println!("License: PolyForm Noncommercial License 1.0.0");
    println!("Copyright (c) 2025 Sylvex. All rights reserved.");

    Ok(())
}
