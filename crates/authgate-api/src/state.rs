// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use axum::extract::FromRef;

use authgate_core::{AuditReporter, InMemorySessionStore};

use crate::auth::TokenCodec;
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::orchestrator::AuthOrchestrator;

// =============================================================================
// AppState
// =============================================================================

/// Shared application state.
///
/// Cheap to clone; every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,

    /// Lifecycle operations.
    pub orchestrator: Arc<AuthOrchestrator>,

    /// Server-side sessions keyed by the session cookie.
    pub sessions: InMemorySessionStore,
}

impl AppState {
    /// Creates a new state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the orchestrator.
    pub fn orchestrator(&self) -> &AuthOrchestrator {
        &self.orchestrator
    }

    /// Returns the token codec.
    pub fn codec(&self) -> &TokenCodec {
        self.orchestrator.codec()
    }

    /// Returns the session store.
    pub fn sessions(&self) -> &InMemorySessionStore {
        &self.sessions
    }
}

impl FromRef<AppState> for Arc<AuthOrchestrator> {
    fn from_ref(state: &AppState) -> Self {
        state.orchestrator.clone()
    }
}

impl FromRef<AppState> for Arc<ApiConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for application state.
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    codec: Option<TokenCodec>,
    audit: Option<AuditReporter>,
    sessions: Option<InMemorySessionStore>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            codec: None,
            audit: None,
            sessions: None,
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the token codec.
    pub fn codec(mut self, codec: TokenCodec) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Sets the audit reporter.
    pub fn audit(mut self, audit: AuditReporter) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Sets the session store.
    pub fn sessions(mut self, sessions: InMemorySessionStore) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Builds the application state.
    ///
    /// Auditing is disabled when no reporter is given.
    pub fn build(self) -> ApiResult<AppState> {
        let codec = self
            .codec
            .ok_or_else(|| ApiError::internal("token codec is required"))?;
        let audit = self.audit.unwrap_or_else(AuditReporter::disabled);

        Ok(AppState {
            config: Arc::new(self.config.unwrap_or_default()),
            orchestrator: Arc::new(AuthOrchestrator::new(codec, audit)),
            sessions: self.sessions.unwrap_or_default(),
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenConfig;
    use authgate_core::InMemoryCredentialStore;

    #[test]
    fn test_build_requires_codec() {
        assert!(AppState::builder().build().is_err());
    }

    #[test]
    fn test_build_defaults() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let codec = TokenCodec::new(TokenConfig::new("state-test-secret"), store).unwrap();

        let state = AppState::builder().codec(codec).build().unwrap();
        assert_eq!(state.config.base_path, "/api");
        assert!(!state.orchestrator().audit().is_enabled());
        assert!(state.sessions().is_empty());
    }
}
