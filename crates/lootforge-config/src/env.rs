// crates/lootforge-config/src/env.rs
// ============================================================================
// Module: Environment Source
// Description: An injectable source of environment variables.
// Purpose: Let every resolver in this crate be tested against a fixed map
//   instead of the real process environment.
// Dependencies: std
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;

// ============================================================================
// SECTION: Trait
// ============================================================================

/// A source of named string values, read by key.
pub trait EnvSource {
    /// Returns the value for `key`, if set.
    fn get(&self, key: &str) -> Option<String>;
}

// ============================================================================
// SECTION: Process Environment
// ============================================================================

/// Reads from the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

// ============================================================================
// SECTION: Fixed Environment
// ============================================================================

/// A fixed, in-memory environment for tests.
#[derive(Debug, Clone, Default)]
pub struct FixedEnv {
    values: BTreeMap<String, String>,
}

impl FixedEnv {
    /// Builds an empty fixed environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a fixed environment from the given key/value pairs.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (&'static str, &'static str)>) -> Self {
        Self {
            values: pairs.into_iter().map(|(key, value)| (key.to_string(), value.to_string())).collect(),
        }
    }

    /// Sets `key` to `value`, replacing any prior value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl EnvSource for FixedEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use super::EnvSource;
    use super::FixedEnv;

    #[test]
    fn fixed_env_round_trips() {
        let mut env = FixedEnv::new();
        env.set("LOOTFORGE_OPENAI_TIMEOUT_MS", "5000");
        assert_eq!(env.get("LOOTFORGE_OPENAI_TIMEOUT_MS"), Some("5000".to_string()));
        assert_eq!(env.get("LOOTFORGE_NANO_TIMEOUT_MS"), None);
    }
}
