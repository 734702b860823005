// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default cookie carrying the session key.
pub const DEFAULT_SESSION_COOKIE: &str = "authgate_session";

// =============================================================================
// ApiConfig
// =============================================================================

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Host address to bind to.
    pub host: IpAddr,

    /// Port to listen on.
    pub port: u16,

    /// Prefix for the auth routes (e.g. "/api").
    pub base_path: String,

    /// CORS configuration.
    pub cors: CorsConfig,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Graceful shutdown drain timeout in seconds.
    pub shutdown_timeout_secs: u64,

    /// Cookie whose value keys the server-side session.
    pub session_cookie: String,

    /// Interval between purges of expired revocation entries, in seconds.
    pub revocation_purge_interval_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
            base_path: "/api".to_string(),
            cors: CorsConfig::default(),
            request_timeout_secs: 30,
            shutdown_timeout_secs: 30,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            revocation_purge_interval_secs: 300,
        }
    }
}

impl ApiConfig {
    /// Creates a new API config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the shutdown drain timeout.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Returns the revocation purge interval.
    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.revocation_purge_interval_secs.max(1))
    }

    /// Returns the base path without a trailing slash ("" for the root).
    pub fn normalized_base_path(&self) -> String {
        let trimmed = self.base_path.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        }
    }

    /// Returns the full path of a route under the base path.
    pub fn route(&self, path: &str) -> String {
        format!("{}{}", self.normalized_base_path(), path)
    }

    /// Sets the host.
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the base path.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Sets the session cookie name.
    pub fn with_session_cookie(mut self, name: impl Into<String>) -> Self {
        self.session_cookie = name.into();
        self
    }

    /// Sets the CORS configuration.
    pub fn with_cors(mut self, cors: CorsConfig) -> Self {
        self.cors = cors;
        self
    }
}

// =============================================================================
// CorsConfig
// =============================================================================

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins ("*" for any).
    pub allowed_origins: Vec<String>,

    /// Allowed HTTP methods.
    pub allowed_methods: Vec<String>,

    /// Allowed headers.
    pub allowed_headers: Vec<String>,

    /// Whether to allow credentials.
    pub allow_credentials: bool,

    /// Max age for preflight cache in seconds.
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "OPTIONS".to_string(),
            ],
            allowed_headers: vec![
                "Content-Type".to_string(),
                "Authorization".to_string(),
                "X-Session-ID".to_string(),
            ],
            allow_credentials: false,
            max_age: 3600,
        }
    }
}

impl CorsConfig {
    /// Restricts to the given origins and enables credentials.
    pub fn strict(origins: Vec<String>) -> Self {
        Self {
            allowed_origins: origins,
            allow_credentials: true,
            ..Self::default()
        }
    }

    /// Returns `true` if any origin is allowed.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}
