// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # authgate-api
//!
//! Token handling, the auth orchestrator and the HTTP surface of authgate.
//!
//! ## Routes
//!
//! | Method | Path | Auth |
//! |---|---|---|
//! | POST | `{base}/auth/register` | no |
//! | POST | `{base}/auth/login` | no |
//! | POST | `{base}/auth/refresh` | bearer |
//! | POST | `{base}/auth/logout` | bearer |
//! | GET | `{base}/auth/me` | bearer |
//! | GET | `/health` | no |
//!
//! Every auth route answers with the envelope
//! `{success, message?, errors?, data?}`.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod orchestrator;
pub mod response;
pub mod server;
pub mod state;
pub mod validation;

pub use auth::{
    spawn_purge_task, Claims, InMemoryRevocationStore, IssuedToken, RevocationStore, TokenCodec,
    TokenConfig, TokenError, TokenResult,
};
pub use config::{ApiConfig, CorsConfig};
pub use error::{ApiError, ApiResult, ValidationErrors};
pub use middleware::{AuthGateLayer, UNAUTHENTICATED};
pub use orchestrator::{messages, AuthOrchestrator};
pub use response::{Outcome, TokenPayload, TOKEN_TYPE};
pub use server::{ApiServer, ApiServerBuilder};
pub use state::{AppState, AppStateBuilder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
