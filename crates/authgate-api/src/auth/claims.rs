// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bearer token claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use authgate_core::{User, UserId, UserProfile};

/// Claims carried by every authgate token.
///
/// `name`, `email` and `role` are a snapshot taken at issuance. Later role
/// changes are not visible until the token is refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    // =========================================================================
    // Standard JWT Claims (RFC 7519)
    // =========================================================================
    /// Subject: the user id as a decimal string.
    pub sub: String,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at time (Unix timestamp).
    pub iat: i64,

    /// Not before time (Unix timestamp).
    pub nbf: i64,

    /// Issuer.
    pub iss: String,

    /// Token id, used as the revocation key.
    pub jti: String,

    // =========================================================================
    // Refresh Window
    // =========================================================================
    /// Issue time of the first token in this refresh chain.
    pub orig_iat: i64,

    // =========================================================================
    // Custom Claims
    // =========================================================================
    /// User display name.
    pub name: String,

    /// User email.
    pub email: String,

    /// Api-scope role.
    pub role: String,
}

impl Claims {
    /// Builds fresh claims for `user`, valid for `ttl_secs` from `now`.
    pub fn for_user(user: &User, issuer: &str, now: i64, ttl_secs: i64) -> Self {
        Self {
            sub: user.id.to_string(),
            exp: now.saturating_add(ttl_secs),
            iat: now,
            nbf: now,
            iss: issuer.to_string(),
            jti: Uuid::now_v7().to_string(),
            orig_iat: now,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.api_role().to_string(),
        }
    }

    /// Derives refreshed claims: same subject, custom claims and `orig_iat`,
    /// new `jti`, `iat`, `nbf` and `exp`.
    pub fn refreshed(&self, now: i64, ttl_secs: i64) -> Self {
        Self {
            exp: now.saturating_add(ttl_secs),
            iat: now,
            nbf: now,
            jti: Uuid::now_v7().to_string(),
            ..self.clone()
        }
    }

    /// Parses the subject as a user id.
    pub fn user_id(&self) -> Option<UserId> {
        self.sub.parse().ok()
    }

    /// Returns `true` if the token is past `exp` at `now`, allowing
    /// `leeway_secs` of clock skew.
    pub fn is_expired_at(&self, now: i64, leeway_secs: i64) -> bool {
        now > self.exp.saturating_add(leeway_secs)
    }

    /// Last instant at which this chain may still be refreshed.
    pub fn refresh_deadline(&self, refresh_ttl_secs: i64) -> i64 {
        self.orig_iat.saturating_add(refresh_ttl_secs)
    }

    /// Returns the expiration time as a DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Returns the user view embedded in the claims.
    ///
    /// `None` if the subject is not a valid user id.
    pub fn profile(&self) -> Option<UserProfile> {
        Some(UserProfile {
            id: self.user_id()?,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
        })
    }
}
