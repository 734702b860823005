// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Environment lookup used by placeholders, overrides and secret resolution.

use std::collections::HashMap;

/// Source of environment variables.
///
/// Empty values are reported as absent.
pub trait EnvSource: Send + Sync {
    /// Returns the value of `name`, if set and non-empty.
    fn var(&self, name: &str) -> Option<String>;

    /// Returns the first of `names` that is set.
    fn first_of(&self, names: &[&str]) -> Option<(String, String)> {
        names
            .iter()
            .find_map(|name| self.var(name).map(|value| (name.to_string(), value)))
    }
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }
}

/// A fixed set of variables, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).filter(|v| !v.is_empty()).cloned()
    }
}

impl<K, V> FromIterator<(K, V)> for MapEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_env() {
        let env: MapEnv = [("A", "1"), ("EMPTY", "")].into_iter().collect();
        assert_eq!(env.var("A").as_deref(), Some("1"));
        assert!(env.var("EMPTY").is_none());
        assert!(env.var("MISSING").is_none());
    }

    #[test]
    fn test_first_of() {
        let env = MapEnv::new().with("JWT_TTL", "30");
        assert_eq!(
            env.first_of(&["AUTHGATE_TOKEN_TTL", "JWT_TTL"]),
            Some(("JWT_TTL".to_string(), "30".to_string()))
        );

        let env = env.with("AUTHGATE_TOKEN_TTL", "45");
        assert_eq!(
            env.first_of(&["AUTHGATE_TOKEN_TTL", "JWT_TTL"]).map(|(_, v)| v),
            Some("45".to_string())
        );
    }
}
