// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Middleware implementations for the API server.
//!
//! - [`AuthGate`]: bearer-token gate for protected routes

mod auth;

pub use auth::{AuthGate, AuthGateLayer, UNAUTHENTICATED};
