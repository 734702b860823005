// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token handling.
//!
//! This module provides:
//! - JWT claims with name, email and api-scope role
//! - The token codec (issue, verify, refresh, invalidate)
//! - Revocation markers for invalidated tokens

mod claims;
mod codec;
mod revocation;

pub use claims::Claims;
pub use codec::{
    parse_algorithm, IssuedToken, TokenCodec, TokenConfig, TokenError, TokenResult,
};
pub use revocation::{
    spawn_purge_task, InMemoryRevocationStore, RevocationEntry, RevocationStore,
};
