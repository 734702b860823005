// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User accounts and scoped role assignments.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric user identifier, carried as the token subject.
pub type UserId = u64;

/// Role reported when a user has no api-scope assignment.
pub const DEFAULT_ROLE: &str = "user";

/// Elevated role recognised by downstream gateways.
pub const SUPER_ADMIN_ROLE: &str = "super_admin";

// =============================================================================
// AuthScope
// =============================================================================

/// Authentication scope a role assignment belongs to.
///
/// Only [`AuthScope::Api`] assignments are authoritative for token claims,
/// audit payloads and API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScope {
    /// Bearer-token API scope.
    Api,
    /// Browser session scope.
    Web,
}

impl AuthScope {
    /// Returns the scope name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScope::Api => "api",
            AuthScope::Web => "web",
        }
    }
}

impl fmt::Display for AuthScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role granted to a user within one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Role name (open set, e.g. `user`, `super_admin`).
    pub name: String,
    /// Scope the role applies to.
    pub scope: AuthScope,
}

impl RoleAssignment {
    /// Creates a role assignment.
    pub fn new(name: impl Into<String>, scope: AuthScope) -> Self {
        Self {
            name: name.into(),
            scope,
        }
    }

    /// Creates an api-scope role assignment.
    pub fn api(name: impl Into<String>) -> Self {
        Self::new(name, AuthScope::Api)
    }
}

// =============================================================================
// User
// =============================================================================

/// A stored user account.
#[derive(Clone)]
pub struct User {
    /// User id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Unique email address.
    pub email: String,
    /// PHC-formatted password hash.
    pub password_hash: String,
    /// Role assignments across scopes, in assignment order.
    pub roles: Vec<RoleAssignment>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Returns the first role assigned in `scope`, if any.
    pub fn role_in(&self, scope: AuthScope) -> Option<&str> {
        self.roles
            .iter()
            .find(|r| r.scope == scope)
            .map(|r| r.name.as_str())
    }

    /// Returns the api-scope role, defaulting to [`DEFAULT_ROLE`].
    ///
    /// Assignments in other scopes are never consulted.
    pub fn api_role(&self) -> &str {
        self.role_in(AuthScope::Api).unwrap_or(DEFAULT_ROLE)
    }

    /// Returns `true` if the user holds `role` in `scope`.
    pub fn has_role(&self, scope: AuthScope, role: &str) -> bool {
        self.roles.iter().any(|r| r.scope == scope && r.name == role)
    }

    /// Returns `true` if the user is a super admin in the api scope.
    pub fn is_super_admin(&self) -> bool {
        self.has_role(AuthScope::Api, SUPER_ADMIN_ROLE)
    }

    /// Returns the public view of this user.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.api_role().to_string(),
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

/// Public user representation returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Api-scope role.
    pub role: String,
}

/// Input for creating a user account.
#[derive(Clone)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Plaintext password; hashed by the store.
    pub password: String,
}

impl NewUser {
    /// Creates a new account request.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(roles: Vec<RoleAssignment>) -> User {
        User {
            id: 1,
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            roles,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_api_role_defaults_to_user() {
        let user = user_with(vec![]);
        assert_eq!(user.api_role(), DEFAULT_ROLE);
    }

    #[test]
    fn test_web_scope_role_does_not_leak() {
        let user = user_with(vec![RoleAssignment::new(SUPER_ADMIN_ROLE, AuthScope::Web)]);
        assert_eq!(user.api_role(), DEFAULT_ROLE);
        assert!(!user.is_super_admin());
    }

    #[test]
    fn test_api_role_first_assignment_wins() {
        let user = user_with(vec![
            RoleAssignment::new("editor", AuthScope::Web),
            RoleAssignment::api(SUPER_ADMIN_ROLE),
            RoleAssignment::api("user"),
        ]);
        assert_eq!(user.api_role(), SUPER_ADMIN_ROLE);
        assert!(user.is_super_admin());
        assert_eq!(user.profile().role, SUPER_ADMIN_ROLE);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let user = user_with(vec![]);
        assert!(!format!("{:?}", user).contains("argon2"));

        let new_user = NewUser::new("A", "a@x.com", "hunter22");
        assert!(!format!("{:?}", new_user).contains("hunter22"));
    }

    #[test]
    fn test_scope_serde() {
        let json = serde_json::to_string(&AuthScope::Api).unwrap();
        assert_eq!(json, "\"api\"");
        assert_eq!(AuthScope::Web.to_string(), "web");
    }
}
