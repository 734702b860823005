// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token codec: issue, verify, refresh and invalidate bearer tokens.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use authgate_core::{CoreError, CredentialStore, User};

use super::claims::Claims;
use super::revocation::{InMemoryRevocationStore, RevocationEntry, RevocationStore};

/// Result type alias for token operations.
pub type TokenResult<T> = Result<T, TokenError>;

// =============================================================================
// TokenError
// =============================================================================

/// Errors raised by the token codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// No token was presented.
    #[error("Token not provided")]
    Missing,

    /// The token is malformed, badly signed or from another issuer.
    #[error("Token is invalid: {message}")]
    Invalid {
        /// Error message.
        message: String,
    },

    /// The token is past its expiry.
    #[error("Token has expired")]
    Expired,

    /// The token was invalidated.
    #[error("Token has been blacklisted")]
    Revoked,

    /// The token is past its refresh window.
    #[error("Token can no longer be refreshed")]
    RefreshExpired,

    /// The token's subject no longer resolves to a user.
    #[error("User not found")]
    UserNotFound,

    /// Invalidation requested while revocation is disabled.
    #[error("Token blacklist is disabled")]
    BlacklistDisabled,

    /// Signing failed.
    #[error("Could not sign token: {message}")]
    Signing {
        /// Error message.
        message: String,
    },

    /// The credential store failed while resolving the subject.
    #[error("Credential store error: {message}")]
    Store {
        /// Error message.
        message: String,
    },

    /// The codec configuration is unusable.
    #[error("Token configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },
}

impl TokenError {
    /// Creates an invalid token error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Creates a signing error.
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if the failure is on our side rather than the token's.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            TokenError::Signing { .. } | TokenError::Store { .. } | TokenError::Configuration { .. }
        )
    }

    /// Returns the error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenError::Missing => "token_missing",
            TokenError::Invalid { .. } => "token_invalid",
            TokenError::Expired => "token_expired",
            TokenError::Revoked => "token_revoked",
            TokenError::RefreshExpired => "token_refresh_expired",
            TokenError::UserNotFound => "user_not_found",
            TokenError::BlacklistDisabled => "blacklist_disabled",
            TokenError::Signing { .. } => "token_signing",
            TokenError::Store { .. } => "store",
            TokenError::Configuration { .. } => "configuration",
        }
    }
}

impl From<CoreError> for TokenError {
    fn from(err: CoreError) -> Self {
        TokenError::Store {
            message: err.to_string(),
        }
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature => TokenError::invalid("signature mismatch"),
        ErrorKind::InvalidIssuer => TokenError::invalid("issuer mismatch"),
        ErrorKind::ImmatureSignature => TokenError::invalid("token not yet valid"),
        ErrorKind::InvalidAlgorithm => TokenError::invalid("algorithm mismatch"),
        ErrorKind::MissingRequiredClaim(claim) => {
            TokenError::invalid(format!("missing claim: {}", claim))
        }
        _ => TokenError::invalid(err.to_string()),
    }
}

// =============================================================================
// TokenConfig
// =============================================================================

/// Upper bound for `ttl_minutes` and `refresh_ttl_minutes` (ten years).
pub const MAX_TTL_MINUTES: i64 = 10 * 365 * 24 * 60;

/// Upper bound for the leeway and the blacklist grace period, in seconds.
pub const MAX_SKEW_SECS: i64 = 24 * 60 * 60;

/// Token codec configuration.
///
/// Timings are already numeric here; string coercion happens when the
/// configuration file is loaded.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// HMAC signing secret.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Issuer claim.
    pub issuer: String,
    /// Signing algorithm (HMAC family only).
    #[serde(with = "algorithm_serde")]
    pub algorithm: Algorithm,
    /// Access token lifetime in minutes.
    pub ttl_minutes: i64,
    /// Refresh window in minutes, counted from the first issue.
    pub refresh_ttl_minutes: i64,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
    /// Whether invalidated tokens are recorded and rejected.
    pub blacklist_enabled: bool,
    /// Seconds an invalidated token keeps working.
    pub blacklist_grace_period_secs: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "authgate".to_string(),
            algorithm: Algorithm::HS256,
            ttl_minutes: 60,
            refresh_ttl_minutes: 20_160,
            leeway_secs: 0,
            blacklist_enabled: true,
            blacklist_grace_period_secs: 0,
        }
    }
}

impl TokenConfig {
    /// Creates a configuration with the given secret and defaults.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the access token lifetime.
    pub fn with_ttl_minutes(mut self, minutes: i64) -> Self {
        self.ttl_minutes = minutes;
        self
    }

    /// Sets the refresh window.
    pub fn with_refresh_ttl_minutes(mut self, minutes: i64) -> Self {
        self.refresh_ttl_minutes = minutes;
        self
    }

    /// Sets the blacklist grace period.
    pub fn with_grace_period_secs(mut self, secs: i64) -> Self {
        self.blacklist_grace_period_secs = secs;
        self
    }

    /// Sets the leeway.
    pub fn with_leeway_secs(mut self, secs: u64) -> Self {
        self.leeway_secs = secs;
        self
    }

    /// Enables or disables the blacklist.
    pub fn with_blacklist(mut self, enabled: bool) -> Self {
        self.blacklist_enabled = enabled;
        self
    }

    /// Access token lifetime in seconds.
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_minutes.saturating_mul(60)
    }

    /// Refresh window in seconds.
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_minutes.saturating_mul(60)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> TokenResult<()> {
        if self.secret.is_empty() {
            return Err(TokenError::configuration("signing secret is not configured"));
        }
        if !matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(TokenError::configuration(format!(
                "unsupported algorithm {:?}; only HS256, HS384 and HS512 are secret-based",
                self.algorithm
            )));
        }
        if self.ttl_minutes <= 0 {
            return Err(TokenError::configuration("ttl must be positive"));
        }
        if self.ttl_minutes > MAX_TTL_MINUTES {
            return Err(TokenError::configuration(format!(
                "ttl must not exceed {} minutes",
                MAX_TTL_MINUTES
            )));
        }
        if self.refresh_ttl_minutes < self.ttl_minutes {
            return Err(TokenError::configuration(
                "refresh_ttl must not be shorter than ttl",
            ));
        }
        if self.refresh_ttl_minutes > MAX_TTL_MINUTES {
            return Err(TokenError::configuration(format!(
                "refresh_ttl must not exceed {} minutes",
                MAX_TTL_MINUTES
            )));
        }
        if self.leeway_secs > MAX_SKEW_SECS as u64 {
            return Err(TokenError::configuration(format!(
                "leeway must not exceed {} seconds",
                MAX_SKEW_SECS
            )));
        }
        if !(0..=MAX_SKEW_SECS).contains(&self.blacklist_grace_period_secs) {
            return Err(TokenError::configuration(format!(
                "blacklist_grace_period must be between 0 and {} seconds",
                MAX_SKEW_SECS
            )));
        }
        if self.secret.len() < 32 {
            tracing::warn!("Signing secret is shorter than recommended (32 bytes)");
        }
        Ok(())
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("issuer", &self.issuer)
            .field("algorithm", &self.algorithm)
            .field("ttl_minutes", &self.ttl_minutes)
            .field("refresh_ttl_minutes", &self.refresh_ttl_minutes)
            .field("leeway_secs", &self.leeway_secs)
            .field("blacklist_enabled", &self.blacklist_enabled)
            .field("blacklist_grace_period_secs", &self.blacklist_grace_period_secs)
            .finish_non_exhaustive()
    }
}

/// Parses an algorithm name such as `HS256`.
pub fn parse_algorithm(name: &str) -> TokenResult<Algorithm> {
    Algorithm::from_str(name)
        .map_err(|_| TokenError::configuration(format!("unknown algorithm: {}", name)))
}

// =============================================================================
// IssuedToken
// =============================================================================

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Encoded token string.
    pub token: String,
    /// Lifetime in seconds, reported to clients as `expires_in`.
    pub ttl_seconds: i64,
    /// Claims signed into the token.
    pub claims: Claims,
}

// =============================================================================
// TokenCodec
// =============================================================================

/// Signs and validates bearer tokens and tracks their revocation.
#[derive(Clone)]
pub struct TokenCodec {
    config: Arc<TokenConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    store: Arc<dyn CredentialStore>,
    revocations: Arc<dyn RevocationStore>,
}

impl TokenCodec {
    /// Creates a codec backed by `store` with an in-memory revocation store.
    pub fn new(config: TokenConfig, store: Arc<dyn CredentialStore>) -> TokenResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "nbf"]);
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = config.leeway_secs;

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
            store,
            revocations: Arc::new(InMemoryRevocationStore::new()),
        })
    }

    /// Replaces the revocation store.
    pub fn with_revocation_store(mut self, revocations: Arc<dyn RevocationStore>) -> Self {
        self.revocations = revocations;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Returns the access token lifetime in seconds.
    pub fn ttl_seconds(&self) -> i64 {
        self.config.ttl_seconds()
    }

    /// Returns the revocation store.
    pub fn revocations(&self) -> Arc<dyn RevocationStore> {
        Arc::clone(&self.revocations)
    }

    /// Returns the credential store.
    pub fn store(&self) -> Arc<dyn CredentialStore> {
        Arc::clone(&self.store)
    }

    // =========================================================================
    // Issue
    // =========================================================================

    /// Signs arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> TokenResult<String> {
        encode(&Header::new(self.config.algorithm), claims, &self.encoding_key)
            .map_err(|e| TokenError::signing(e.to_string()))
    }

    /// Issues a token for `user` with the role resolved in the api scope.
    pub fn issue(&self, user: &User) -> TokenResult<IssuedToken> {
        let claims = Claims::for_user(user, &self.config.issuer, now(), self.ttl_seconds());
        let token = self.sign(&claims)?;

        Ok(IssuedToken {
            token,
            ttl_seconds: self.ttl_seconds(),
            claims,
        })
    }

    /// Verifies credentials and issues a token in one step.
    ///
    /// `Ok(None)` means the email is unknown or the password is wrong.
    pub async fn attempt(&self, email: &str, password: &str) -> TokenResult<Option<(User, IssuedToken)>> {
        let Some(user) = self.store.attempt(email, password).await? else {
            return Ok(None);
        };
        let issued = self.issue(&user)?;
        Ok(Some((user, issued)))
    }

    // =========================================================================
    // Verify
    // =========================================================================

    /// Decodes a token, checking signature, issuer, expiry and revocation.
    pub fn decode(&self, token: &str) -> TokenResult<Claims> {
        let claims = self.decode_with(token, &self.validation)?;
        self.ensure_not_revoked(&claims, now())?;
        Ok(claims)
    }

    /// Decodes a token and resolves its subject to a stored user.
    pub async fn verify(&self, token: &str) -> TokenResult<User> {
        let claims = self.decode(token)?;
        self.resolve_user(&claims).await
    }

    /// Resolves the user named by `claims.sub`.
    pub async fn resolve_user(&self, claims: &Claims) -> TokenResult<User> {
        let user_id = claims
            .user_id()
            .ok_or_else(|| TokenError::invalid("subject is not a user id"))?;

        self.store
            .find_by_id(user_id)
            .await?
            .ok_or(TokenError::UserNotFound)
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Decodes a token for refreshing.
    ///
    /// The token must pass [`decode`](Self::decode), expiry and leeway
    /// included, and the refresh window counted from `orig_iat` must still
    /// be open.
    pub fn check_refreshable(&self, token: &str) -> TokenResult<Claims> {
        let claims = self.decode(token)?;
        let now = now();

        if now > claims.refresh_deadline(self.config.refresh_ttl_seconds()) {
            return Err(TokenError::RefreshExpired);
        }
        Ok(claims)
    }

    /// Issues a new token carrying the same subject and claims, and revokes
    /// the presented one when the blacklist is enabled.
    pub fn refresh(&self, token: &str) -> TokenResult<IssuedToken> {
        let claims = self.check_refreshable(token)?;
        let now = now();

        let refreshed = claims.refreshed(now, self.ttl_seconds());
        let new_token = self.sign(&refreshed)?;

        if self.config.blacklist_enabled {
            self.revoke_claims(&claims, now);
        }

        tracing::debug!(user_id = %claims.sub, "Token refreshed");

        Ok(IssuedToken {
            token: new_token,
            ttl_seconds: self.ttl_seconds(),
            claims: refreshed,
        })
    }

    // =========================================================================
    // Invalidate
    // =========================================================================

    /// Marks a token as no longer acceptable.
    ///
    /// The token must itself be valid: expired, malformed or already revoked
    /// tokens are rejected.
    pub fn invalidate(&self, token: &str) -> TokenResult<()> {
        if !self.config.blacklist_enabled {
            return Err(TokenError::BlacklistDisabled);
        }

        let claims = self.decode(token)?;
        self.revoke_claims(&claims, now());

        tracing::debug!(user_id = %claims.sub, "Token invalidated");
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn decode_with(&self, token: &str, validation: &Validation) -> TokenResult<Claims> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Missing);
        }

        decode::<Claims>(token, &self.decoding_key, validation)
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }

    fn ensure_not_revoked(&self, claims: &Claims, now: i64) -> TokenResult<()> {
        if self.config.blacklist_enabled && self.revocations.is_revoked(&claims.jti, now) {
            return Err(TokenError::Revoked);
        }
        Ok(())
    }

    fn revoke_claims(&self, claims: &Claims, now: i64) {
        let retain_until = claims.exp.saturating_add(self.config.leeway_secs as i64);

        self.revocations.revoke(
            &claims.jti,
            RevocationEntry {
                revoked_at: now,
                effective_at: now.saturating_add(self.config.blacklist_grace_period_secs),
                retain_until,
            },
        );
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("config", &self.config)
            .field("store", &self.store.name())
            .field("revocations", &self.revocations.len())
            .finish()
    }
}

fn now() -> i64 {
    Utc::now().timestamp()
}

// =============================================================================
// Algorithm Serialization
// =============================================================================

mod algorithm_serde {
    use jsonwebtoken::Algorithm;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(algorithm: &Algorithm, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:?}", algorithm))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Algorithm, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_algorithm(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use authgate_core::{Argon2Hasher, InMemoryCredentialStore, NewUser, RoleAssignment};

    const SECRET: &str = "test-secret-key-that-is-long-enough-for-testing";

    async fn setup(config: TokenConfig) -> (TokenCodec, InMemoryCredentialStore, User) {
        let store = InMemoryCredentialStore::with_hasher(Arc::new(
            Argon2Hasher::with_cost(1024, 1).unwrap(),
        ));
        let user = store
            .create(NewUser::new("Alice", "alice@x.com", "secret"))
            .await
            .unwrap();
        store
            .assign_role(user.id, RoleAssignment::api("super_admin"))
            .await
            .unwrap();
        let user = store.find_by_id(user.id).await.unwrap().unwrap();

        let codec = TokenCodec::new(config, Arc::new(store.clone())).unwrap();
        (codec, store, user)
    }

    #[tokio::test]
    async fn test_issue_and_verify() {
        let (codec, _, user) = setup(TokenConfig::new(SECRET)).await;
        let issued = codec.issue(&user).unwrap();

        assert_eq!(issued.ttl_seconds, 3_600);
        let verified = codec.verify(&issued.token).await.unwrap();
        assert_eq!(verified.id, user.id);

        let claims = codec.decode(&issued.token).unwrap();
        assert_eq!(claims.role, "super_admin");
        assert_eq!(claims.email, "alice@x.com");
    }

    #[tokio::test]
    async fn test_attempt() {
        let (codec, _, user) = setup(TokenConfig::new(SECRET)).await;

        let (found, issued) = codec.attempt("alice@x.com", "secret").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(!issued.token.is_empty());

        assert!(codec.attempt("alice@x.com", "wrong").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_then_verify_fails() {
        let (codec, _, user) = setup(TokenConfig::new(SECRET)).await;
        let issued = codec.issue(&user).unwrap();

        codec.invalidate(&issued.token).unwrap();
        assert_eq!(codec.verify(&issued.token).await.unwrap_err(), TokenError::Revoked);
        assert_eq!(codec.invalidate(&issued.token).unwrap_err(), TokenError::Revoked);
    }

    #[tokio::test]
    async fn test_invalidate_requires_blacklist() {
        let (codec, _, user) = setup(TokenConfig::new(SECRET).with_blacklist(false)).await;
        let issued = codec.issue(&user).unwrap();

        assert_eq!(
            codec.invalidate(&issued.token).unwrap_err(),
            TokenError::BlacklistDisabled
        );
    }

    #[tokio::test]
    async fn test_grace_period_keeps_token_usable() {
        let (codec, _, user) = setup(TokenConfig::new(SECRET).with_grace_period_secs(60)).await;
        let issued = codec.issue(&user).unwrap();

        codec.invalidate(&issued.token).unwrap();
        assert!(codec.verify(&issued.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_role_change_not_reflected_until_refresh() {
        let (codec, store, user) = setup(TokenConfig::new(SECRET)).await;
        let issued = codec.issue(&user).unwrap();

        store.set_roles(user.id, vec![RoleAssignment::api("user")]).unwrap();

        let claims = codec.decode(&issued.token).unwrap();
        assert_eq!(claims.role, "super_admin");
    }

    #[tokio::test]
    async fn test_refresh_preserves_claims_and_revokes_old() {
        let (codec, _, user) = setup(TokenConfig::new(SECRET)).await;

        // Expires in ~10s so the refreshed expiry is strictly later.
        let claims = Claims::for_user(&user, "authgate", now() - 30, 40);
        let original = codec.sign(&claims).unwrap();

        let refreshed = codec.refresh(&original).unwrap();
        let new_claims = codec.decode(&refreshed.token).unwrap();

        assert_eq!(new_claims.sub, claims.sub);
        assert_eq!(new_claims.role, claims.role);
        assert_eq!(new_claims.orig_iat, claims.orig_iat);
        assert!(new_claims.exp > claims.exp);
        assert_ne!(new_claims.jti, claims.jti);

        assert_eq!(codec.refresh(&original).unwrap_err(), TokenError::Revoked);
    }

    #[tokio::test]
    async fn test_expired_token_not_refreshable() {
        let (codec, _, user) = setup(TokenConfig::new(SECRET)).await;

        // Well inside the two-week refresh window, but past exp.
        let claims = Claims::for_user(&user, "authgate", now() - 7_200, 3_600);
        let expired = codec.sign(&claims).unwrap();

        assert_eq!(codec.decode(&expired).unwrap_err(), TokenError::Expired);
        assert_eq!(codec.check_refreshable(&expired).unwrap_err(), TokenError::Expired);
        assert_eq!(codec.refresh(&expired).unwrap_err(), TokenError::Expired);
        assert!(codec.revocations().is_empty());
    }

    #[tokio::test]
    async fn test_leeway_covers_just_expired_refresh() {
        let (codec, _, user) = setup(TokenConfig::new(SECRET).with_leeway_secs(30)).await;

        let claims = Claims::for_user(&user, "authgate", now() - 70, 60);
        let token = codec.sign(&claims).unwrap();

        assert!(codec.refresh(&token).is_ok());
    }

    #[tokio::test]
    async fn test_refresh_window_closed() {
        let config = TokenConfig::new(SECRET)
            .with_ttl_minutes(1)
            .with_refresh_ttl_minutes(2);
        let (codec, _, user) = setup(config).await;

        // Unexpired link of a chain that started ten minutes ago.
        let mut claims = Claims::for_user(&user, "authgate", now(), 60);
        claims.orig_iat = now() - 600;
        let stale = codec.sign(&claims).unwrap();

        assert!(codec.decode(&stale).is_ok());
        assert_eq!(codec.refresh(&stale).unwrap_err(), TokenError::RefreshExpired);
    }

    #[tokio::test]
    async fn test_wrong_secret_and_garbage() {
        let (codec, store, user) = setup(TokenConfig::new(SECRET)).await;
        let other = TokenCodec::new(
            TokenConfig::new("another-secret-key-that-is-long-enough"),
            Arc::new(store),
        )
        .unwrap();

        let token = other.issue(&user).unwrap().token;
        assert!(matches!(codec.decode(&token), Err(TokenError::Invalid { .. })));
        assert!(matches!(codec.decode("not.a.jwt"), Err(TokenError::Invalid { .. })));
        assert_eq!(codec.decode("   ").unwrap_err(), TokenError::Missing);
    }

    #[tokio::test]
    async fn test_missing_user() {
        let (codec, store, user) = setup(TokenConfig::new(SECRET)).await;
        let issued = codec.issue(&user).unwrap();
        store.remove(user.id);

        assert_eq!(codec.verify(&issued.token).await.unwrap_err(), TokenError::UserNotFound);
    }

    #[test]
    fn test_config_validation() {
        assert!(TokenConfig::default().validate().is_err());
        assert!(TokenConfig::new(SECRET).validate().is_ok());
        assert!(TokenConfig::new(SECRET).with_ttl_minutes(0).validate().is_err());
        assert!(TokenConfig::new(SECRET)
            .with_ttl_minutes(60)
            .with_refresh_ttl_minutes(30)
            .validate()
            .is_err());

        let mut rsa = TokenConfig::new(SECRET);
        rsa.algorithm = Algorithm::RS256;
        assert!(rsa.validate().is_err());
    }

    #[test]
    fn test_config_rejects_overflowing_lifetimes() {
        let huge = TokenConfig::new(SECRET)
            .with_ttl_minutes(i64::MAX / 30)
            .with_refresh_ttl_minutes(i64::MAX / 30);
        assert!(huge.validate().is_err());
        assert_eq!(huge.ttl_seconds(), i64::MAX);

        assert!(TokenConfig::new(SECRET)
            .with_refresh_ttl_minutes(i64::MAX)
            .validate()
            .is_err());
        assert!(TokenConfig::new(SECRET)
            .with_ttl_minutes(MAX_TTL_MINUTES)
            .with_refresh_ttl_minutes(MAX_TTL_MINUTES)
            .validate()
            .is_ok());
        assert!(TokenConfig::new(SECRET).with_leeway_secs(u64::MAX).validate().is_err());
        assert!(TokenConfig::new(SECRET)
            .with_grace_period_secs(i64::MAX)
            .validate()
            .is_err());
    }

    #[tokio::test]
    async fn test_overflowing_config_does_not_build_codec() {
        let store = InMemoryCredentialStore::new();
        let config = TokenConfig::new(SECRET).with_ttl_minutes(i64::MAX / 30);

        assert!(matches!(
            TokenCodec::new(config, Arc::new(store)),
            Err(TokenError::Configuration { .. })
        ));
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(parse_algorithm("HS512").unwrap(), Algorithm::HS512);
        assert!(parse_algorithm("HS999").is_err());
    }

    #[test]
    fn test_error_classification() {
        assert!(TokenError::signing("x").is_server_error());
        assert!(!TokenError::Expired.is_server_error());
        assert_eq!(TokenError::Revoked.error_code(), "token_revoked");
    }
}
