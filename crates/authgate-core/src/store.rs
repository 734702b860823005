// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Credential store abstraction and in-memory implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::password::{Argon2Hasher, PasswordHasher};
use crate::user::{NewUser, RoleAssignment, User, UserId};

// =============================================================================
// CredentialStore
// =============================================================================

/// Persistence boundary for user accounts.
///
/// Implementations must be safe under concurrent access; the auth
/// orchestrator holds no locks of its own.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks up a user by exact email.
    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>>;

    /// Looks up a user by id.
    async fn find_by_id(&self, id: UserId) -> CoreResult<Option<User>>;

    /// Creates a user, hashing the supplied password.
    ///
    /// Fails with [`CoreError::DuplicateEmail`] if the email is taken.
    async fn create(&self, new_user: NewUser) -> CoreResult<User>;

    /// Grants a role to a user. Granting an existing assignment is a no-op.
    async fn assign_role(&self, id: UserId, role: RoleAssignment) -> CoreResult<()>;

    /// Verifies a plaintext password against the user's stored hash.
    ///
    /// Implementations must not run the hash on the async worker threads.
    async fn verify_password(&self, user: &User, plain: &str) -> CoreResult<bool>;

    /// Returns the user when `email` exists and `password` matches.
    async fn attempt(&self, email: &str, password: &str) -> CoreResult<Option<User>> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(None);
        };

        if self.verify_password(&user, password).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Returns the store name for diagnostics.
    fn name(&self) -> &str {
        "credential_store"
    }
}

// =============================================================================
// InMemoryCredentialStore
// =============================================================================

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    by_email: HashMap<String, UserId>,
}

/// Credential store backed by process memory.
#[derive(Clone)]
pub struct InMemoryCredentialStore {
    inner: Arc<RwLock<Inner>>,
    next_id: Arc<AtomicU64>,
    hasher: Arc<dyn PasswordHasher>,
}

impl InMemoryCredentialStore {
    /// Creates an empty store using the default argon2 hasher.
    pub fn new() -> Self {
        Self::with_hasher(Arc::new(Argon2Hasher::new()))
    }

    /// Creates an empty store with a custom password hasher.
    pub fn with_hasher(hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            next_id: Arc::new(AtomicU64::new(1)),
            hasher,
        }
    }

    /// Returns the number of stored users.
    pub fn len(&self) -> usize {
        self.inner.read().users.len()
    }

    /// Returns `true` if no users are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes a user's assignments in every scope and replaces them.
    ///
    /// Role changes do not affect tokens already issued.
    pub fn set_roles(&self, id: UserId, roles: Vec<RoleAssignment>) -> CoreResult<()> {
        let mut inner = self.inner.write();
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| CoreError::user_not_found(id))?;
        user.roles = roles;
        Ok(())
    }

    /// Deletes a user. Used by tests to simulate accounts removed after
    /// token issuance.
    pub fn remove(&self, id: UserId) -> Option<User> {
        let mut inner = self.inner.write();
        let user = inner.users.remove(&id)?;
        inner.by_email.remove(&user.email);
        Some(user)
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let inner = self.inner.read();
        Ok(inner
            .by_email
            .get(email)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> CoreResult<Option<User>> {
        Ok(self.inner.read().users.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> CoreResult<User> {
        if self.inner.read().by_email.contains_key(&new_user.email) {
            return Err(CoreError::duplicate_email(new_user.email));
        }

        // Hash outside the lock and off the runtime; it is the slow part.
        let hasher = Arc::clone(&self.hasher);
        let plain = new_user.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| CoreError::hashing(format!("Hashing task failed: {}", e)))??;

        let mut inner = self.inner.write();
        if inner.by_email.contains_key(&new_user.email) {
            return Err(CoreError::duplicate_email(new_user.email));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let user = User {
            id,
            name: new_user.name,
            email: new_user.email,
            password_hash,
            roles: Vec::new(),
            created_at: Utc::now(),
        };

        inner.by_email.insert(user.email.clone(), id);
        inner.users.insert(id, user.clone());

        tracing::debug!(user_id = id, "User created");
        Ok(user)
    }

    async fn assign_role(&self, id: UserId, role: RoleAssignment) -> CoreResult<()> {
        let mut inner = self.inner.write();
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| CoreError::user_not_found(id))?;

        if !user.roles.contains(&role) {
            tracing::debug!(user_id = id, role = %role.name, scope = %role.scope, "Role assigned");
            user.roles.push(role);
        }
        Ok(())
    }

    async fn verify_password(&self, user: &User, plain: &str) -> CoreResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        let hash = user.password_hash.clone();
        let plain = plain.to_string();

        tokio::task::spawn_blocking(move || hasher.verify(&hash, &plain))
            .await
            .map_err(|e| CoreError::hashing(format!("Verification task failed: {}", e)))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

impl std::fmt::Debug for InMemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCredentialStore")
            .field("users", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::{AuthScope, SUPER_ADMIN_ROLE};

    fn store() -> InMemoryCredentialStore {
        InMemoryCredentialStore::with_hasher(Arc::new(Argon2Hasher::with_cost(1024, 1).unwrap()))
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let store = store();
        let user = store
            .create(NewUser::new("Alice", "alice@example.com", "password"))
            .await
            .unwrap();

        assert_eq!(user.id, 1);
        assert_ne!(user.password_hash, "password");

        let by_email = store.find_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        let by_id = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "alice@example.com");

        assert!(store.find_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = store();
        store
            .create(NewUser::new("A", "dup@example.com", "password"))
            .await
            .unwrap();

        let err = store
            .create(NewUser::new("B", "dup@example.com", "password"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateEmail { .. }));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_attempt() {
        let store = store();
        store
            .create(NewUser::new("A", "a@x.com", "secret"))
            .await
            .unwrap();

        assert!(store.attempt("a@x.com", "secret").await.unwrap().is_some());
        assert!(store.attempt("a@x.com", "wrong").await.unwrap().is_none());
        assert!(store.attempt("missing@x.com", "secret").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_verify_password_malformed_hash() {
        let store = store();
        let mut user = store
            .create(NewUser::new("A", "a@x.com", "secret"))
            .await
            .unwrap();

        assert!(store.verify_password(&user, "secret").await.unwrap());
        user.password_hash = "not-a-phc-string".to_string();
        assert!(!store.verify_password(&user, "secret").await.unwrap());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_hashing_leaves_runtime_free() {
        let store = InMemoryCredentialStore::with_hasher(Arc::new(
            Argon2Hasher::with_cost(8 * 1024, 2).unwrap(),
        ));
        let polls = Arc::new(AtomicU64::new(0));
        let ticker = {
            let polls = Arc::clone(&polls);
            tokio::spawn(async move {
                loop {
                    polls.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            })
        };

        let user = store
            .create(NewUser::new("A", "a@x.com", "secret"))
            .await
            .unwrap();
        let after_create = polls.load(Ordering::SeqCst);
        assert!(after_create > 0);

        assert!(store.attempt("a@x.com", "secret").await.unwrap().is_some());
        assert!(polls.load(Ordering::SeqCst) > after_create);
        assert_eq!(user.id, 1);
        ticker.abort();
    }

    #[tokio::test]
    async fn test_assign_role_is_idempotent() {
        let store = store();
        let user = store
            .create(NewUser::new("A", "a@x.com", "secret"))
            .await
            .unwrap();

        store
            .assign_role(user.id, RoleAssignment::api(SUPER_ADMIN_ROLE))
            .await
            .unwrap();
        store
            .assign_role(user.id, RoleAssignment::api(SUPER_ADMIN_ROLE))
            .await
            .unwrap();
        store
            .assign_role(user.id, RoleAssignment::new("user", AuthScope::Web))
            .await
            .unwrap();

        let user = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.roles.len(), 2);
        assert_eq!(user.api_role(), SUPER_ADMIN_ROLE);
    }

    #[tokio::test]
    async fn test_assign_role_unknown_user() {
        let store = store();
        let err = store
            .assign_role(42, RoleAssignment::api("user"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UserNotFound { user_id: 42 }));
    }

    #[tokio::test]
    async fn test_remove() {
        let store = store();
        let user = store
            .create(NewUser::new("A", "a@x.com", "secret"))
            .await
            .unwrap();

        assert!(store.remove(user.id).is_some());
        assert!(store.find_by_email("a@x.com").await.unwrap().is_none());
        assert!(store.is_empty());
    }
}
