// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API handlers for all endpoints.
//!
//! - [`health`]: Liveness check
//! - [`auth`]: Register, login, refresh, logout and me

mod auth;
mod health;

pub use auth::*;
pub use health::*;
