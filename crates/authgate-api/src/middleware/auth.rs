// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bearer-token gate for protected routes.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::auth::{TokenCodec, TokenError};
use crate::error::ApiError;
use crate::extractors::bearer_token;

/// Message returned when a protected route is called without a usable token.
pub const UNAUTHENTICATED: &str = "Unauthenticated.";

// =============================================================================
// AuthGateLayer
// =============================================================================

/// Layer that rejects requests to protected routes lacking a valid token.
///
/// Public paths pass through untouched. Every other path, refresh included,
/// requires a live token whose subject still exists.
#[derive(Clone)]
pub struct AuthGateLayer {
    codec: TokenCodec,
    public_paths: Arc<HashSet<String>>,
}

impl AuthGateLayer {
    /// Creates a gate with no public paths.
    pub fn new(codec: TokenCodec) -> Self {
        Self {
            codec,
            public_paths: Arc::new(HashSet::new()),
        }
    }

    /// Adds paths that don't require authentication.
    pub fn with_public_paths(mut self, paths: Vec<String>) -> Self {
        self.public_paths = Arc::new(paths.into_iter().collect());
        self
    }
}

impl<S> Layer<S> for AuthGateLayer {
    type Service = AuthGate<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthGate {
            inner,
            codec: self.codec.clone(),
            public_paths: self.public_paths.clone(),
        }
    }
}

// =============================================================================
// AuthGate
// =============================================================================

/// Middleware produced by [`AuthGateLayer`].
#[derive(Clone)]
pub struct AuthGate<S> {
    inner: S,
    codec: TokenCodec,
    public_paths: Arc<HashSet<String>>,
}

impl<S> AuthGate<S> {
    fn is_public_path(&self, path: &str) -> bool {
        if self.public_paths.contains(path) {
            return true;
        }

        self.public_paths.iter().any(|public| {
            public
                .strip_suffix('*')
                .map(|prefix| path.starts_with(prefix))
                .unwrap_or(false)
        })
    }
}

impl<S> Service<Request<Body>> for AuthGate<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let path = req.uri().path().to_string();
        let is_public = self.is_public_path(&path);
        let codec = self.codec.clone();

        // Drive the clone that was polled ready.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            if is_public {
                return inner.call(req).await;
            }

            let Some(token) = bearer_token(req.headers()) else {
                tracing::debug!(path = %path, "No bearer token provided");
                return Ok(ApiError::unauthorized(UNAUTHENTICATED).into_response());
            };

            match codec.verify(&token).await {
                Ok(_) => inner.call(req).await,
                Err(e) => Ok(rejection(&path, e)),
            }
        })
    }
}

fn rejection(path: &str, error: TokenError) -> Response {
    if error.is_server_error() {
        return ApiError::from(error).into_response();
    }

    tracing::debug!(path = %path, error = %error, "Token rejected");
    ApiError::unauthorized(UNAUTHENTICATED).into_response()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenConfig;
    use authgate_core::{CredentialStore, InMemoryCredentialStore, NewUser};
    use axum::http::{header, StatusCode};
    use axum::Router;
    use tower::ServiceExt;

    fn gate(codec: TokenCodec) -> Router {
        Router::new()
            .fallback(|| async { StatusCode::OK })
            .layer(
                AuthGateLayer::new(codec)
                    .with_public_paths(vec![
                        "/api/auth/login".to_string(),
                        "/public/*".to_string(),
                    ]),
            )
    }

    async fn fixture() -> (TokenCodec, String) {
        let store = Arc::new(InMemoryCredentialStore::new());
        store
            .create(NewUser::new("Alice", "alice@x.com", "password123"))
            .await
            .unwrap();
        let codec = TokenCodec::new(TokenConfig::new("gate-test-secret"), store).unwrap();
        let (_, issued) = codec
            .attempt("alice@x.com", "password123")
            .await
            .unwrap()
            .unwrap();
        (codec, issued.token)
    }

    fn request(path: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_public_paths_pass() {
        let (codec, _) = fixture().await;

        let response = gate(codec.clone())
            .oneshot(request("/api/auth/login", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = gate(codec)
            .oneshot(request("/public/anything", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_rejected() {
        let (codec, _) = fixture().await;
        let response = gate(codec)
            .oneshot(request("/api/auth/me", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_and_revoked_tokens() {
        let (codec, token) = fixture().await;

        let response = gate(codec.clone())
            .oneshot(request("/api/auth/me", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        codec.invalidate(&token).unwrap();
        let response = gate(codec)
            .oneshot(request("/api/auth/me", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_rejected_on_refresh_path() {
        let (codec, _) = fixture().await;
        let response = gate(codec)
            .oneshot(request("/api/auth/refresh", Some("not.a.jwt")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_rejected_on_refresh_path() {
        let (codec, token) = fixture().await;
        let mut claims = codec.decode(&token).unwrap();
        claims.iat -= 7_200;
        claims.nbf -= 7_200;
        claims.orig_iat -= 7_200;
        claims.exp -= 7_200;
        let expired = codec.sign(&claims).unwrap();

        let response = gate(codec)
            .oneshot(request("/api/auth/refresh", Some(&expired)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
