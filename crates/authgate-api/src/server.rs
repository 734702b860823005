// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderName, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use authgate_core::{AuditReporter, InMemorySessionStore};

use crate::auth::TokenCodec;
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::AuthGateLayer;
use crate::state::{AppState, AppStateBuilder};

// =============================================================================
// ApiServer
// =============================================================================

/// The HTTP server.
pub struct ApiServer {
    state: AppState,
    config: Arc<ApiConfig>,
}

impl ApiServer {
    /// Creates a server over the given state.
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        Self { state, config }
    }

    /// Creates a new server builder.
    pub fn builder() -> ApiServerBuilder {
        ApiServerBuilder::new()
    }

    /// Returns the application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Builds the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let config = &self.config;

        let gate = AuthGateLayer::new(self.state.codec().clone())
            .with_public_paths(vec![
                "/health".to_string(),
                config.route("/auth/register"),
                config.route("/auth/login"),
            ]);

        let middleware_stack = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                config.request_timeout(),
            ))
            .layer(create_cors_layer(config));

        Router::new()
            .route("/health", get(handlers::health))
            .route(&config.route("/auth/register"), post(handlers::register))
            .route(&config.route("/auth/login"), post(handlers::login))
            .route(&config.route("/auth/refresh"), post(handlers::refresh))
            .route(&config.route("/auth/logout"), post(handlers::logout))
            .route(&config.route("/auth/me"), get(handlers::me))
            .route_layer(gate)
            .layer(middleware_stack)
            .with_state(self.state.clone())
    }

    /// Binds the configured address and serves until the process exits.
    pub async fn run(self) -> ApiResult<()> {
        self.run_with_shutdown(std::future::pending::<()>()).await
    }

    /// Binds the configured address and serves until `shutdown_signal`
    /// resolves, then drains in-flight requests.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        self.serve(listener, shutdown_signal).await
    }

    /// Serves on an already bound listener.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let router = self.router();
        let addr = listener
            .local_addr()
            .map_err(|e| ApiError::internal(format!("Listener has no address: {}", e)))?;

        info!(%addr, base_path = %self.config.normalized_base_path(), "Starting API server");

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server shutdown complete");

        Ok(())
    }

    /// Returns the configured listen address.
    pub fn addr(&self) -> SocketAddr {
        self.config.socket_addr()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn create_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = &config.cors;

    let mut layer = CorsLayer::new().max_age(Duration::from_secs(cors.max_age));

    // Wildcards cannot be combined with credentials; mirror the request instead.
    if cors.allows_any_origin() {
        layer = if cors.allow_credentials {
            layer.allow_origin(AllowOrigin::mirror_request())
        } else {
            layer.allow_origin(Any)
        };
    } else {
        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer = layer.allow_origin(AllowOrigin::list(origins));
    }

    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    layer = layer.allow_methods(methods);

    if cors.allowed_headers.iter().any(|h| h == "*") {
        layer = if cors.allow_credentials {
            layer.allow_headers(AllowHeaders::mirror_request())
        } else {
            layer.allow_headers(Any)
        };
    } else {
        let headers: Vec<HeaderName> = cors
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        layer = layer.allow_headers(headers);
    }

    if cors.allow_credentials {
        layer = layer.allow_credentials(true);
    }

    layer
}

// =============================================================================
// Server Builder
// =============================================================================

/// Builder for [`ApiServer`].
pub struct ApiServerBuilder {
    state_builder: AppStateBuilder,
}

impl ApiServerBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            state_builder: AppState::builder(),
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.state_builder = self.state_builder.config(config);
        self
    }

    /// Sets the token codec.
    pub fn codec(mut self, codec: TokenCodec) -> Self {
        self.state_builder = self.state_builder.codec(codec);
        self
    }

    /// Sets the audit reporter.
    pub fn audit(mut self, audit: AuditReporter) -> Self {
        self.state_builder = self.state_builder.audit(audit);
        self
    }

    /// Sets the session store.
    pub fn sessions(mut self, sessions: InMemorySessionStore) -> Self {
        self.state_builder = self.state_builder.sessions(sessions);
        self
    }

    /// Builds the server.
    pub fn build(self) -> ApiResult<ApiServer> {
        let state = self.state_builder.build()?;
        Ok(ApiServer::new(state))
    }
}

impl Default for ApiServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenConfig;
    use crate::config::CorsConfig;
    use authgate_core::InMemoryCredentialStore;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_server(config: ApiConfig) -> ApiServer {
        let store = Arc::new(InMemoryCredentialStore::new());
        let codec = TokenCodec::new(
            TokenConfig::new("test-secret-key-that-is-long-enough-for-hs256"),
            store,
        )
        .unwrap();

        ApiServerBuilder::new()
            .config(config)
            .codec(codec)
            .build()
            .unwrap()
    }

    #[test]
    fn test_server_builder() {
        let server = test_server(ApiConfig::default());
        assert_eq!(server.addr().port(), 8080);
        assert!(ApiServerBuilder::new().build().is_err());
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let router = test_server(ApiConfig::default()).router();
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_not_gated() {
        let router = test_server(ApiConfig::default()).router();
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/devices")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_custom_base_path() {
        let router = test_server(ApiConfig::default().with_base_path("/v2")).router();
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/v2/auth/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_cors_layer_with_credentials() {
        let mut config = ApiConfig::default();
        config.cors = CorsConfig {
            allow_credentials: true,
            allowed_headers: vec!["*".to_string()],
            ..CorsConfig::default()
        };
        let _layer = create_cors_layer(&config);

        let strict = ApiConfig::default()
            .with_cors(CorsConfig::strict(vec!["https://app.example.com".to_string()]));
        let _layer = create_cors_layer(&strict);
    }
}
