// crates/lootforge-service/src/state.rs
// ============================================================================
// Module: Service State
// Description: Shared, cheaply-cloneable state every handler reads from.
// Purpose: Build the provider registry and clock once at startup instead
//   of re-resolving environment configuration per request.
// Dependencies: lootforge-config, lootforge-core, lootforge-providers, tokio
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use lootforge_config::env::ProcessEnv;
use lootforge_config::provider_config;
use lootforge_config::provider_config::ManifestProviderOverrides;
use lootforge_core::identifiers::ProviderName;
use lootforge_core::time::Clock;
use lootforge_core::time::SystemClock;
use lootforge_providers::ProviderRegistry;
use lootforge_providers::ProviderTransport;
use lootforge_providers::ReqwestTransport;

use crate::telemetry::NoopMetrics;
use crate::telemetry::ServiceMetrics;

// ============================================================================
// SECTION: State
// ============================================================================

/// Everything a handler needs beyond the request body itself.
///
/// Cheap to clone: every field is an `Arc`, so axum's per-request `State`
/// extraction never re-resolves environment configuration.
#[derive(Clone)]
pub struct AppState {
    /// Configured provider adapters, resolved from the process environment
    /// once at startup.
    pub registry: Arc<ProviderRegistry>,
    /// The HTTP boundary every adapter call goes through.
    pub transport: Arc<dyn ProviderTransport>,
    /// Time source for rate limiting and run-id derivation.
    pub clock: Arc<dyn Clock>,
    /// Metrics sink every handler records request/latency events to.
    pub metrics: Arc<dyn ServiceMetrics>,
}

impl AppState {
    /// Builds the application state, resolving every provider's runtime
    /// config from the real process environment.
    #[must_use]
    pub fn build() -> Self {
        let env = ProcessEnv;
        let mut registry = ProviderRegistry::with_builtin_adapters();
        for provider in [ProviderName::Openai, ProviderName::Nano, ProviderName::Local] {
            let config = provider_config::resolve(provider, ManifestProviderOverrides::default(), &env);
            registry.configure(provider, config);
        }

        Self {
            registry: Arc::new(registry),
            transport: Arc::new(ReqwestTransport),
            clock: Arc::new(SystemClock),
            metrics: Arc::new(NoopMetrics),
        }
    }
}
