// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request-scoped context passed explicitly into every lifecycle operation.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use crate::session::SessionContext;

// =============================================================================
// RequestContext
// =============================================================================

/// Everything the auth core needs to know about the inbound request.
///
/// Built once by the HTTP adapter; the core never reaches for ambient
/// request state.
#[derive(Clone, Default)]
pub struct RequestContext {
    /// Bearer token presented by the caller.
    pub token: Option<String>,
    /// Caller-supplied correlation header value.
    pub session_header: Option<String>,
    /// Caller network address.
    pub client_ip: Option<IpAddr>,
    /// Caller user agent string.
    pub user_agent: Option<String>,
    /// Session context bound to this request, if the caller has one.
    pub session: Option<Arc<dyn SessionContext>>,
}

impl RequestContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the correlation header value.
    pub fn with_session_header(mut self, value: impl Into<String>) -> Self {
        self.session_header = Some(value.into());
        self
    }

    /// Sets the client IP address.
    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Binds a session context.
    pub fn with_session(mut self, session: Arc<dyn SessionContext>) -> Self {
        self.session = Some(session);
        self
    }

    /// Returns the bearer token, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns `true` if a session context is bound.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("session_header", &self.session_header)
            .field("client_ip", &self.client_ip)
            .field("user_agent", &self.user_agent)
            .field("session", &self.session.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let ctx = RequestContext::new()
            .with_token("abc.def.ghi")
            .with_client_ip("10.0.0.1".parse().unwrap())
            .with_user_agent("curl/8.0");

        assert_eq!(ctx.token(), Some("abc.def.ghi"));
        assert_eq!(ctx.client_ip.unwrap().to_string(), "10.0.0.1");
        assert!(!ctx.has_session());
    }

    #[test]
    fn test_debug_redacts_token() {
        let ctx = RequestContext::new().with_token("secret-token");
        let debug = format!("{:?}", ctx);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("redacted"));
    }
}
