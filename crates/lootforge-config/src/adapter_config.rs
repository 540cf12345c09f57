// crates/lootforge-config/src/adapter_config.rs
// ============================================================================
// Module: Soft-Metric Adapter Configuration
// Description: Resolves CLIP/LPIPS/SSIM adapter configuration from
//   environment variables.
// Purpose: Give the eval stage (C8) one place that reads
//   `LOOTFORGE_ENABLE_{CLIP,LPIPS,SSIM}_ADAPTER` and its `_CMD`/`_URL`/
//   `_TIMEOUT_MS` variants (§6, design note §9).
// Dependencies: none
// ============================================================================

//! ## Overview
//! An adapter with no enable flag, or one set to anything other than
//! `"true"`/`"1"`, resolves to [`AdapterMode::Unconfigured`] — a health
//! warning at eval time, never an error (§4.8 step 3).

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::env::EnvSource;

// ============================================================================
// SECTION: Adapter Name
// ============================================================================

/// A soft-metric adapter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterName {
    /// CLIP embedding similarity.
    Clip,
    /// Learned perceptual image patch similarity.
    Lpips,
    /// Structural similarity index.
    Ssim,
}

impl AdapterName {
    /// Returns the adapter's canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clip => "clip",
            Self::Lpips => "lpips",
            Self::Ssim => "ssim",
        }
    }

    const fn env_stem(self) -> &'static str {
        match self {
            Self::Clip => "CLIP",
            Self::Lpips => "LPIPS",
            Self::Ssim => "SSIM",
        }
    }

    /// Every adapter name known to this crate.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Clip, Self::Lpips, Self::Ssim]
    }
}

// ============================================================================
// SECTION: Mode
// ============================================================================

const DEFAULT_ADAPTER_TIMEOUT_MS: u64 = 10_000;

/// How an adapter is invoked, resolved from environment at registry
/// construction time (design note §9: "configured from environment at
/// registry-construction time").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterMode {
    /// No enable flag was set (or it was set to a falsy value).
    Unconfigured,
    /// Spawn a subprocess, pass context as stdin JSON, read stdout JSON.
    Command {
        /// Command line to spawn.
        command: String,
        /// Timeout in milliseconds.
        timeout_ms: u64,
    },
    /// POST context as JSON to a configured URL.
    Http {
        /// Endpoint URL.
        url: String,
        /// Timeout in milliseconds.
        timeout_ms: u64,
    },
}

/// Resolves `adapter`'s invocation mode from the environment.
#[must_use]
pub fn resolve(adapter: AdapterName, env: &dyn EnvSource) -> AdapterMode {
    let enabled = env
        .get(&format!("LOOTFORGE_ENABLE_{}_ADAPTER", adapter.env_stem()))
        .is_some_and(|value| value == "true" || value == "1");
    if !enabled {
        return AdapterMode::Unconfigured;
    }
    let timeout_ms = env
        .get(&format!("LOOTFORGE_{}_TIMEOUT_MS", adapter.env_stem()))
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_ADAPTER_TIMEOUT_MS);
    if let Some(url) = env.get(&format!("LOOTFORGE_{}_URL", adapter.env_stem())) {
        return AdapterMode::Http { url, timeout_ms };
    }
    if let Some(command) = env.get(&format!("LOOTFORGE_{}_CMD", adapter.env_stem())) {
        return AdapterMode::Command { command, timeout_ms };
    }
    AdapterMode::Unconfigured
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use super::AdapterMode;
    use super::AdapterName;
    use super::resolve;
    use crate::env::FixedEnv;

    #[test]
    fn unset_enable_flag_is_unconfigured() {
        let env = FixedEnv::new();
        assert_eq!(resolve(AdapterName::Clip, &env), AdapterMode::Unconfigured);
    }

    #[test]
    fn enabled_without_command_or_url_is_unconfigured() {
        let mut env = FixedEnv::new();
        env.set("LOOTFORGE_ENABLE_CLIP_ADAPTER", "true");
        assert_eq!(resolve(AdapterName::Clip, &env), AdapterMode::Unconfigured);
    }

    #[test]
    fn command_mode_resolves() {
        let mut env = FixedEnv::new();
        env.set("LOOTFORGE_ENABLE_LPIPS_ADAPTER", "1");
        env.set("LOOTFORGE_LPIPS_CMD", "lpips-score");
        let resolved = resolve(AdapterName::Lpips, &env);
        assert_eq!(resolved, AdapterMode::Command { command: "lpips-score".to_string(), timeout_ms: 10_000 });
    }
}
