// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Auth orchestrator: the lifecycle operations behind the HTTP surface.
//!
//! Each operation is a short pipeline over the credential store, the token
//! codec and the audit reporter. Every collaborator failure is folded into
//! an [`Outcome`]; nothing propagates to the caller. Audit events are
//! dispatched on background tasks and cannot change the outcome.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::Value;

use authgate_core::{
    AuditAction, AuditReporter, CoreError, CredentialStore, NewUser, RequestContext,
    RoleAssignment, DEFAULT_ROLE,
};

use crate::auth::{TokenCodec, TokenError};
use crate::error::ValidationErrors;
use crate::response::{Outcome, TokenPayload};
use crate::validation::{email_taken_message, validate_login, validate_register};

/// Client-facing messages.
pub mod messages {
    /// Successful login.
    pub const LOGIN_SUCCESS: &str = "Login successful";
    /// Bad email/password pair.
    pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
    /// Signing or store failure during login or registration.
    pub const TOKEN_CREATE_FAILED: &str = "Could not create token";
    /// Successful logout.
    pub const LOGOUT_SUCCESS: &str = "Successfully logged out";
    /// Token could not be invalidated.
    pub const LOGOUT_FAILED: &str = "Failed to logout, please try again";
    /// Successful refresh.
    pub const REFRESH_SUCCESS: &str = "Token refreshed successfully";
    /// Token could not be refreshed.
    pub const REFRESH_FAILED: &str = "Could not refresh token";
    /// Token subject does not resolve.
    pub const USER_NOT_FOUND: &str = "User not found";
    /// Successful registration.
    pub const REGISTER_SUCCESS: &str = "User registered successfully";
    /// Store failure during registration.
    pub const REGISTER_FAILED: &str = "Could not register user";
}

use messages::*;

// =============================================================================
// AuthOrchestrator
// =============================================================================

/// Composes the credential store, token codec and audit reporter into the
/// register, login, logout, refresh and me operations.
#[derive(Clone)]
pub struct AuthOrchestrator {
    codec: TokenCodec,
    store: Arc<dyn CredentialStore>,
    audit: AuditReporter,
}

impl AuthOrchestrator {
    /// Creates an orchestrator. The credential store is the codec's.
    pub fn new(codec: TokenCodec, audit: AuditReporter) -> Self {
        Self {
            store: codec.store(),
            codec,
            audit,
        }
    }

    /// Returns the token codec.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Returns the audit reporter.
    pub fn audit(&self) -> &AuditReporter {
        &self.audit
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Verifies credentials and issues a token.
    ///
    /// 422 on malformed credentials, 401 on a bad pair, 500 if the token
    /// cannot be created.
    pub async fn login(&self, credentials: &Value, ctx: &RequestContext) -> Outcome {
        let input = match validate_login(credentials) {
            Ok(input) => input,
            Err(errors) => return Outcome::validation(errors),
        };

        let (user, issued) = match self.codec.attempt(&input.email, &input.password).await {
            Ok(Some(found)) => found,
            Ok(None) => {
                tracing::debug!("Login rejected: invalid credentials");
                return Outcome::failure(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS);
            }
            Err(e) => {
                tracing::error!(error = %e, "Login failed: could not create token");
                return Outcome::failure(StatusCode::INTERNAL_SERVER_ERROR, TOKEN_CREATE_FAILED);
            }
        };

        tracing::info!(user_id = user.id, role = user.api_role(), "User logged in");
        self.audit.dispatch(AuditAction::Login, &user, ctx);

        Outcome::ok(LOGIN_SUCCESS).with_data(TokenPayload::new(user.profile(), issued))
    }

    // =========================================================================
    // Logout
    // =========================================================================

    /// Invalidates the presented token.
    ///
    /// Any invalidation failure (missing, expired, already revoked) is a 500.
    /// The logout event is reported only when the token resolved to a user.
    pub async fn logout(&self, ctx: &RequestContext) -> Outcome {
        let token = ctx.token().unwrap_or_default();
        let user = self.codec.verify(token).await.ok();

        if let Err(e) = self.codec.invalidate(token) {
            tracing::debug!(error = %e, error_code = e.error_code(), "Logout failed");
            return Outcome::failure(StatusCode::INTERNAL_SERVER_ERROR, LOGOUT_FAILED);
        }

        if let Some(user) = user {
            tracing::info!(user_id = user.id, "User logged out");
            self.audit.dispatch(AuditAction::Logout, &user, ctx);
        }

        Outcome::ok(LOGOUT_SUCCESS)
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Exchanges the presented token for a new one with the same claims.
    ///
    /// Not audited.
    pub async fn refresh(&self, ctx: &RequestContext) -> Outcome {
        let token = ctx.token().unwrap_or_default();

        let issued = match self.codec.refresh(token) {
            Ok(issued) => issued,
            Err(e) => {
                tracing::debug!(error = %e, error_code = e.error_code(), "Refresh failed");
                return Outcome::failure(StatusCode::UNAUTHORIZED, REFRESH_FAILED);
            }
        };

        let user = match self.codec.resolve_user(&issued.claims).await {
            Ok(user) => user,
            Err(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Refresh failed: store error");
                return Outcome::failure(StatusCode::INTERNAL_SERVER_ERROR, REFRESH_FAILED);
            }
            Err(_) => return Outcome::failure(StatusCode::NOT_FOUND, USER_NOT_FOUND),
        };

        Outcome::ok(REFRESH_SUCCESS).with_data(TokenPayload::new(user.profile(), issued))
    }

    // =========================================================================
    // Me
    // =========================================================================

    /// Returns the user behind the presented token.
    pub async fn me(&self, ctx: &RequestContext) -> Outcome {
        let token = ctx.token().unwrap_or_default();

        match self.codec.verify(token).await {
            Ok(user) => Outcome::data_only(user.profile()),
            Err(e) => {
                tracing::debug!(error = %e, error_code = e.error_code(), "Me lookup failed");
                Outcome::failure(StatusCode::NOT_FOUND, USER_NOT_FOUND)
            }
        }
    }

    // =========================================================================
    // Register
    // =========================================================================

    /// Creates an account with the default api-scope role and issues a
    /// token. Not audited.
    pub async fn register(&self, payload: &Value) -> Outcome {
        let input = match validate_register(payload) {
            Ok(input) => input,
            Err(errors) => return Outcome::validation(errors),
        };

        match self.store.find_by_email(&input.email).await {
            Ok(Some(_)) => return email_taken(),
            Ok(None) => {}
            Err(e) => return register_failed(e),
        }

        let user = match self
            .store
            .create(NewUser::new(input.name, input.email, input.password))
            .await
        {
            Ok(user) => user,
            Err(CoreError::DuplicateEmail { .. }) => return email_taken(),
            Err(e) => return register_failed(e),
        };

        if let Err(e) = self
            .store
            .assign_role(user.id, RoleAssignment::api(DEFAULT_ROLE))
            .await
        {
            return register_failed(e);
        }

        let user = match self.store.find_by_id(user.id).await {
            Ok(Some(user)) => user,
            Ok(None) => return register_failed(CoreError::user_not_found(user.id)),
            Err(e) => return register_failed(e),
        };

        let issued = match self.codec.issue(&user) {
            Ok(issued) => issued,
            Err(e) => return token_create_failed(e),
        };

        tracing::info!(user_id = user.id, "User registered");
        Outcome::created(REGISTER_SUCCESS).with_data(TokenPayload::new(user.profile(), issued))
    }
}

impl std::fmt::Debug for AuthOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthOrchestrator")
            .field("codec", &self.codec)
            .field("audit", &self.audit)
            .finish()
    }
}

fn email_taken() -> Outcome {
    let mut errors = ValidationErrors::new();
    errors.add("email", email_taken_message());
    Outcome::validation(errors)
}

fn register_failed(error: CoreError) -> Outcome {
    tracing::error!(error = %error, "Registration failed");
    Outcome::failure(StatusCode::INTERNAL_SERVER_ERROR, REGISTER_FAILED)
}

fn token_create_failed(error: TokenError) -> Outcome {
    tracing::error!(error = %error, "Registration failed: could not create token");
    Outcome::failure(StatusCode::INTERNAL_SERVER_ERROR, TOKEN_CREATE_FAILED)
}
