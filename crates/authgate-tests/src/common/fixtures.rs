// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Pre-built accounts, payloads, token settings and configuration files.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use serde_json::{json, Value};

use authgate_api::{TokenCodec, TokenConfig};
use authgate_core::{
    seed_default_users, Argon2Hasher, CredentialStore, InMemoryCredentialStore, RequestContext,
    User, DEFAULT_SEED_PASSWORD,
};

// =============================================================================
// Accounts
// =============================================================================

/// Signing secret used across tests.
pub const TEST_SECRET: &str = "integration-test-secret-0123456789-abcdef";

/// Seeded regular account.
pub const USER_EMAIL: &str = "test@gmail.com";

/// Seeded administrator account.
pub const ADMIN_EMAIL: &str = "admin@gmail.com";

/// Password of both seeded accounts.
pub const SEED_PASSWORD: &str = DEFAULT_SEED_PASSWORD;

/// User agent attached to request contexts built here.
pub const TEST_USER_AGENT: &str = "authgate-tests/1.0";

/// Account fixtures.
pub struct AccountFixtures;

impl AccountFixtures {
    /// An empty store with cheap hashing parameters.
    pub fn fast_store() -> Arc<InMemoryCredentialStore> {
        let hasher = Argon2Hasher::with_cost(1024, 1).expect("valid argon2 cost");
        Arc::new(InMemoryCredentialStore::with_hasher(Arc::new(hasher)))
    }

    /// A fast store holding the two default accounts.
    pub async fn seeded_store() -> Arc<InMemoryCredentialStore> {
        let store = Self::fast_store();
        seed_default_users(store.as_ref() as &dyn CredentialStore)
            .await
            .expect("seeding an empty store succeeds");
        store
    }

    /// Login payload.
    pub fn credentials(email: &str, password: &str) -> Value {
        json!({ "email": email, "password": password })
    }

    /// Login payload for the seeded regular account.
    pub fn user_credentials() -> Value {
        Self::credentials(USER_EMAIL, SEED_PASSWORD)
    }

    /// Login payload for the seeded administrator.
    pub fn admin_credentials() -> Value {
        Self::credentials(ADMIN_EMAIL, SEED_PASSWORD)
    }

    /// Registration payload.
    pub fn registration(name: &str, email: &str, password: &str) -> Value {
        json!({ "name": name, "email": email, "password": password })
    }
}

// =============================================================================
// Tokens
// =============================================================================

/// Token fixtures.
pub struct TokenFixtures;

impl TokenFixtures {
    /// Default token settings with the test secret.
    pub fn config() -> TokenConfig {
        TokenConfig::new(TEST_SECRET)
    }

    /// A codec over `store`.
    pub fn codec(store: Arc<dyn CredentialStore>) -> TokenCodec {
        TokenCodec::new(Self::config(), store).expect("test token config is valid")
    }

    /// A codec with custom settings over `store`.
    pub fn codec_with(config: TokenConfig, store: Arc<dyn CredentialStore>) -> TokenCodec {
        TokenCodec::new(config, store).expect("test token config is valid")
    }

    /// A token for `user` signed by `codec` as if issued `secs_ago` seconds
    /// back; every timestamp claim is shifted, `orig_iat` included.
    pub fn backdated(codec: &TokenCodec, user: &User, secs_ago: i64) -> String {
        let mut claims = codec.issue(user).expect("token issues").claims;
        claims.iat -= secs_ago;
        claims.nbf -= secs_ago;
        claims.exp -= secs_ago;
        claims.orig_iat -= secs_ago;
        codec.sign(&claims).expect("token signs")
    }
}

// =============================================================================
// Request Contexts
// =============================================================================

/// Request context fixtures.
pub struct ContextFixtures;

impl ContextFixtures {
    /// A context carrying only caller metadata.
    pub fn anonymous() -> RequestContext {
        RequestContext::new()
            .with_client_ip(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)))
            .with_user_agent(TEST_USER_AGENT)
    }

    /// A context carrying a bearer token.
    pub fn bearer(token: &str) -> RequestContext {
        Self::anonymous().with_token(token)
    }
}

// =============================================================================
// Configuration Files
// =============================================================================

/// Configuration file fixtures.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// A complete YAML configuration.
    pub fn yaml() -> &'static str {
        r#"
server:
  host: 127.0.0.1
  port: 9090
  base_path: /api
  request_timeout_secs: 10
  cors:
    allowed_origins:
      - https://app.example.com
    allow_credentials: true
token:
  secret: "yaml-secret-0123456789-0123456789-abcdef"
  issuer: authgate-test
  algorithm: HS384
  ttl: 30
  refresh_ttl: 120
  leeway: 5
  blacklist_grace_period: 10
audit:
  enabled: true
  service_base_url: http://audit.internal:8081
  timeout_secs: 3
session:
  cookie_name: sid
logging:
  level: debug
  format: json
seed:
  default_users: true
"#
    }

    /// A TOML configuration whose timings are numeric strings.
    pub fn toml_with_string_numbers() -> &'static str {
        r#"
[server]
port = 8181

[token]
secret = "toml-secret-0123456789-0123456789-abcdef"
ttl = "15"
refresh_ttl = "60"
leeway = "2"
blacklist_grace_period = "0"
"#
    }

    /// A JSON configuration using placeholders.
    pub fn json_with_placeholders() -> &'static str {
        r#"{
  "server": { "port": 8282 },
  "token": { "secret": "${TEST_SIGNING_SECRET}", "ttl": 45 },
  "audit": { "service_base_url": "${TEST_AUDIT_URL:http://ip:80}" }
}"#
    }
}
