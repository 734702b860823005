// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Password hashing primitive.

use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::error::{CoreError, CoreResult};

// =============================================================================
// PasswordHasher
// =============================================================================

/// Hashes and verifies user passwords.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password into a self-describing hash string.
    fn hash(&self, plain: &str) -> CoreResult<String>;

    /// Verifies a plaintext password against a stored hash.
    ///
    /// Malformed hashes verify as `false`.
    fn verify(&self, hash: &str, plain: &str) -> bool;
}

// =============================================================================
// Argon2Hasher
// =============================================================================

/// Argon2id password hasher producing PHC strings.
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    /// Creates a hasher with the crate's recommended parameters.
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Creates a hasher with explicit memory (KiB) and iteration costs.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> CoreResult<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| CoreError::hashing(format!("Invalid argon2 parameters: {}", e)))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plain: &str) -> CoreResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plain.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| CoreError::hashing(e.to_string()))
    }

    fn verify(&self, hash: &str, plain: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };
        self.argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }
}

impl fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2Hasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2Hasher {
        Argon2Hasher::with_cost(1024, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = cheap();
        let hash = hasher.hash("secret").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify(&hash, "secret"));
        assert!(!hasher.verify(&hash, "Secret"));
    }

    #[test]
    fn test_salted_hashes_differ() {
        let hasher = cheap();
        let a = hasher.hash("secret").unwrap();
        let b = hasher.hash("secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_rejected() {
        let hasher = cheap();
        assert!(!hasher.verify("not-a-phc-string", "secret"));
        assert!(!hasher.verify("", ""));
    }

    #[test]
    fn test_invalid_cost() {
        assert!(Argon2Hasher::with_cost(1, 0).is_err());
    }
}
