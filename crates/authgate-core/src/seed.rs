// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Default account seeding for development deployments.

use crate::error::CoreResult;
use crate::store::CredentialStore;
use crate::user::{NewUser, RoleAssignment, User, DEFAULT_ROLE, SUPER_ADMIN_ROLE};

/// Password shared by the seeded accounts.
pub const DEFAULT_SEED_PASSWORD: &str = "password";

/// One account created by [`seed_default_users`].
#[derive(Debug, Clone, Copy)]
pub struct SeedAccount {
    /// Display name.
    pub name: &'static str,
    /// Email address.
    pub email: &'static str,
    /// Api-scope role.
    pub role: &'static str,
}

/// Accounts created by [`seed_default_users`].
pub const DEFAULT_ACCOUNTS: [SeedAccount; 2] = [
    SeedAccount {
        name: "Test User",
        email: "test@gmail.com",
        role: DEFAULT_ROLE,
    },
    SeedAccount {
        name: "Super Admin",
        email: "admin@gmail.com",
        role: SUPER_ADMIN_ROLE,
    },
];

/// Creates the default accounts if they are missing.
///
/// Existing accounts are left untouched apart from ensuring their api-scope
/// role assignment, so running this twice is harmless.
pub async fn seed_default_users(store: &dyn CredentialStore) -> CoreResult<Vec<User>> {
    let mut seeded = Vec::with_capacity(DEFAULT_ACCOUNTS.len());

    for account in DEFAULT_ACCOUNTS {
        let user = match store.find_by_email(account.email).await? {
            Some(existing) => existing,
            None => {
                store
                    .create(NewUser::new(account.name, account.email, DEFAULT_SEED_PASSWORD))
                    .await?
            }
        };

        store
            .assign_role(user.id, RoleAssignment::api(account.role))
            .await?;

        tracing::info!(user_id = user.id, email = account.email, role = account.role, "Seeded account");

        seeded.push(store.find_by_id(user.id).await?.unwrap_or(user));
    }

    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::password::Argon2Hasher;
    use crate::store::InMemoryCredentialStore;

    fn store() -> InMemoryCredentialStore {
        InMemoryCredentialStore::with_hasher(Arc::new(Argon2Hasher::with_cost(1024, 1).unwrap()))
    }

    #[tokio::test]
    async fn test_seed_creates_accounts() {
        let store = store();
        let users = seed_default_users(&store).await.unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].api_role(), DEFAULT_ROLE);
        assert!(users[1].is_super_admin());

        let admin = store
            .attempt("admin@gmail.com", DEFAULT_SEED_PASSWORD)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.name, "Super Admin");
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = store();
        seed_default_users(&store).await.unwrap();
        let users = seed_default_users(&store).await.unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(users[1].roles.len(), 1);
    }
}
