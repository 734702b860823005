// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # authgate-bin
//!
//! CLI binary for the authgate authentication service.
//!
//! - CLI argument parsing with clap
//! - Runtime wiring from configuration to a running server
//! - Graceful shutdown on SIGINT/SIGTERM
//! - Logging initialization
//!
//! ## Usage
//!
//! ```bash
//! # Start the service (default command)
//! authgate
//!
//! # Custom config, seeded default accounts
//! authgate -c /etc/authgate/config.yaml run --seed
//!
//! # Validate configuration
//! authgate validate --show-config
//!
//! # Generate a signing secret
//! export JWT_SECRET=$(authgate gen-secret)
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{Runtime, RuntimeBuilder};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
