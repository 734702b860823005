// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Custom extractors for the auth handlers.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    Form,
};
use serde_json::Value;

use authgate_core::{RequestContext, SESSION_HEADER};

use crate::state::AppState;

// =============================================================================
// Request Context Extractor
// =============================================================================

/// Extractor building the per-request [`RequestContext`].
///
/// Collects the bearer token, the `X-Session-ID` header, the client address,
/// the user agent, and binds the server-side session when the session cookie
/// is present. Never rejects.
#[derive(Debug, Clone)]
pub struct AuthRequest(pub RequestContext);

impl FromRequestParts<AppState> for AuthRequest {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(AuthRequest(request_context(parts, state)))
    }
}

/// Builds the request context from request parts.
pub fn request_context(parts: &Parts, state: &AppState) -> RequestContext {
    let mut ctx = RequestContext::new();

    if let Some(token) = bearer_token(&parts.headers) {
        ctx = ctx.with_token(token);
    }

    if let Some(session_id) = header_str(&parts.headers, SESSION_HEADER) {
        ctx = ctx.with_session_header(session_id);
    }

    if let Some(ip) = client_ip(parts) {
        ctx = ctx.with_client_ip(ip);
    }

    if let Some(agent) = header_str(&parts.headers, header::USER_AGENT.as_str()) {
        ctx = ctx.with_user_agent(agent);
    }

    if let Some(key) = cookie_value(&parts.headers, &state.config.session_cookie) {
        ctx = ctx.with_session(Arc::new(state.sessions.open(key)));
    }

    ctx
}

// =============================================================================
// Header Helpers
// =============================================================================

/// Extracts the bearer token from the Authorization header.
///
/// The scheme is matched case-insensitively; an empty token counts as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Returns the client address: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the peer address.
pub fn client_ip(parts: &Parts) -> Option<IpAddr> {
    let forwarded = parts
        .headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse().ok());

    if forwarded.is_some() {
        return forwarded;
    }

    let real_ip = parts
        .headers
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok());

    if real_ip.is_some() {
        return real_ip;
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
}

/// Returns the value of cookie `name`, if present and non-empty.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// =============================================================================
// Payload Extractor
// =============================================================================

/// Lenient body extractor.
///
/// Accepts JSON or URL-encoded forms. An empty or unparseable body becomes
/// `Value::Null` so that validation reports the missing fields.
#[derive(Debug, Clone)]
pub struct Payload(pub Value);

impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        if is_form {
            let value = match Form::<HashMap<String, String>>::from_request(req, state).await {
                Ok(Form(fields)) => Value::Object(
                    fields
                        .into_iter()
                        .map(|(k, v)| (k, Value::String(v)))
                        .collect(),
                ),
                Err(e) => {
                    tracing::debug!(error = %e, "Unreadable form body");
                    Value::Null
                }
            };
            return Ok(Payload(value));
        }

        let value = match Bytes::from_request(req, state).await {
            Ok(bytes) if bytes.is_empty() => Value::Null,
            Ok(bytes) => serde_json::from_slice::<Value>(&bytes).unwrap_or_else(|e| {
                tracing::debug!(error = %e, "Unparseable JSON body");
                Value::Null
            }),
            Err(e) => {
                tracing::debug!(error = %e, "Unreadable request body");
                Value::Null
            }
        };

        Ok(Payload(value))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("bearer mytoken123"),
        );
        assert_eq!(bearer_token(&headers).as_deref(), Some("mytoken123"));
    }

    #[test]
    fn test_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; authgate_session=abc123; empty="),
        );

        assert_eq!(
            cookie_value(&headers, "authgate_session").as_deref(),
            Some("abc123")
        );
        assert!(cookie_value(&headers, "empty").is_none());
        assert!(cookie_value(&headers, "missing").is_none());
    }

    #[test]
    fn test_client_ip_order() {
        let request = axum::http::Request::builder()
            .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
            .header("X-Real-IP", "198.51.100.2")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        assert_eq!(client_ip(&parts), Some("203.0.113.7".parse().unwrap()));

        let mut request = axum::http::Request::builder().body(()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 9000))));
        let (parts, _) = request.into_parts();
        assert_eq!(client_ip(&parts), Some("127.0.0.1".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_payload_json_and_garbage() {
        let req = Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"a@x.com"}"#))
            .unwrap();
        let Payload(value) = Payload::from_request(req, &()).await.unwrap();
        assert_eq!(value["email"], "a@x.com");

        let req = Request::builder()
            .body(Body::from("{not json"))
            .unwrap();
        let Payload(value) = Payload::from_request(req, &()).await.unwrap();
        assert!(value.is_null());
    }

    #[tokio::test]
    async fn test_payload_form() {
        let req = Request::builder()
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("email=a%40x.com&password=secret"))
            .unwrap();
        let Payload(value) = Payload::from_request(req, &()).await.unwrap();
        assert_eq!(value["email"], "a@x.com");
        assert_eq!(value["password"], "secret");
    }
}
