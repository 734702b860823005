// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # authgate-core
//!
//! Domain layer of the authgate authentication service.
//!
//! This crate holds everything the token and HTTP layers build on:
//!
//! - **User**: accounts with role assignments per authentication scope
//! - **Store**: the `CredentialStore` boundary and an in-memory implementation
//! - **Password**: argon2 hashing behind the `PasswordHasher` trait
//! - **Context**: the explicit per-request context
//! - **Session**: session storage and correlation ids
//! - **Audit**: best-effort login/logout reporting to an external service
//!
//! ## Example
//!
//! ```rust,ignore
//! use authgate_core::{CredentialStore, InMemoryCredentialStore, NewUser};
//!
//! let store = InMemoryCredentialStore::new();
//! let user = store.create(NewUser::new("Alice", "alice@example.com", "password")).await?;
//! assert_eq!(user.api_role(), "user");
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Domain Modules
// =============================================================================

pub mod error;
pub mod password;
pub mod seed;
pub mod store;
pub mod user;

// =============================================================================
// Request Modules
// =============================================================================

pub mod context;
pub mod session;

// =============================================================================
// Audit
// =============================================================================

pub mod audit;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use error::{CoreError, CoreResult};
pub use password::{Argon2Hasher, PasswordHasher};
pub use seed::{seed_default_users, DEFAULT_ACCOUNTS, DEFAULT_SEED_PASSWORD};
pub use store::{CredentialStore, InMemoryCredentialStore};
pub use user::{
    AuthScope, NewUser, RoleAssignment, User, UserId, UserProfile, DEFAULT_ROLE, SUPER_ADMIN_ROLE,
};

pub use context::RequestContext;
pub use session::{
    spawn_session_purge_task, InMemorySessionStore, SessionContext, SessionCorrelator,
    SessionHandle, SessionId, SESSION_HEADER, SESSION_KEY,
};

pub use audit::{
    AuditAction, AuditError, AuditEvent, AuditReporter, AuditResult, AuditSink,
    AuditStatsSnapshot, HttpAuditSink, InMemoryAuditSink, NoOpAuditSink,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
