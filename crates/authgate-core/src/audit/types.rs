// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit event model.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::user::{User, UserId};

// =============================================================================
// AuditAction
// =============================================================================

/// Authentication events reported to the audit service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    /// Successful login.
    Login,
    /// Successful logout.
    Logout,
}

impl AuditAction {
    /// Returns the wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
        }
    }

    /// Returns the human-readable description for a user email.
    pub fn describe(&self, email: &str) -> String {
        match self {
            AuditAction::Login => format!("User {} logged in", email),
            AuditAction::Logout => format!("User {} logged out", email),
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// AuditEvent
// =============================================================================

/// Payload posted to the audit endpoint.
///
/// Optional fields are omitted from the JSON entirely when unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event kind.
    pub action: AuditAction,
    /// Acting user id.
    pub user_id: UserId,
    /// Acting user email.
    pub user_email: String,
    /// Human-readable description.
    pub description: String,
    /// Correlation id.
    pub session_id: String,
    /// Acting user display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Acting user api-scope role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Caller IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Caller user agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl AuditEvent {
    /// Creates an event with only the required fields.
    pub fn new(
        action: AuditAction,
        user_id: UserId,
        user_email: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        let user_email = user_email.into();
        Self {
            action,
            user_id,
            description: action.describe(&user_email),
            user_email,
            session_id: session_id.into(),
            name: None,
            role: None,
            ip_address: None,
            user_agent: None,
        }
    }

    /// Creates an event for `user`, filling name and api-scope role.
    pub fn for_user(action: AuditAction, user: &User, session_id: impl Into<String>) -> Self {
        Self::new(action, user.id, user.email.clone(), session_id)
            .with_name(user.name.clone())
            .with_role(user.api_role())
    }

    /// Sets the user name. Empty names are treated as unknown.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = non_empty(name.into());
        self
    }

    /// Sets the role. Empty roles are treated as unknown.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = non_empty(role.into());
        self
    }

    /// Sets the caller IP address.
    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = non_empty(ip.into());
        self
    }

    /// Sets the caller user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = non_empty(user_agent.into());
        self
    }

    /// Overrides the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
