// crates/lootforge-providers/src/registry.rs
// ============================================================================
// Module: Provider Registry & Router
// Description: Holds one adapter per provider name and routes targets to a
//   primary provider plus a capability-filtered fallback chain (§4.4).
// Purpose: Give the generate orchestrator one place to resolve "which
//   adapter, in which order" for a planned target.
// Dependencies: lootforge-core, lootforge-config
// ============================================================================

//! ## Overview
//! A target's primary provider is already resolved by the planner
//! (`target.provider`); the registry's job at generate time is to hold the
//! configured adapter instances and turn `target.generation_policy`'s
//! ordered fallback list into a capability-filtered [`Route`] (§4.4 step
//! 4). Configuration precedence (environment over manifest over adapter
//! default) is resolved by [`lootforge_config::provider_config::resolve`]
//! before a config is handed to [`ProviderRegistry::configure`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use lootforge_config::provider_config::ProviderRuntimeConfig;
use lootforge_core::capabilities::Feature;
use lootforge_core::domain::target::GenerationMode;
use lootforge_core::domain::target::PlannedTarget;
use lootforge_core::identifiers::ProviderName;

use crate::adapter::Provider;
use crate::adapters::local;
use crate::adapters::nano;
use crate::adapters::openai;

// ============================================================================
// SECTION: Route
// ============================================================================

/// A target's resolved provider chain: try `primary`, then walk
/// `fallbacks` in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// The provider to attempt first.
    pub primary: ProviderName,
    /// Capability-filtered fallback providers, in declared order.
    pub fallbacks: Vec<ProviderName>,
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Holds one configured adapter per provider name.
pub struct ProviderRegistry {
    /// Adapter instances, keyed by provider name.
    adapters: BTreeMap<ProviderName, Box<dyn Provider>>,
    /// Resolved runtime configuration, keyed by provider name.
    configs: BTreeMap<ProviderName, ProviderRuntimeConfig>,
}

impl ProviderRegistry {
    /// Builds a registry with the three built-in adapters registered, and
    /// no runtime configuration yet applied.
    #[must_use]
    pub fn with_builtin_adapters() -> Self {
        let mut adapters: BTreeMap<ProviderName, Box<dyn Provider>> = BTreeMap::new();
        adapters.insert(ProviderName::Openai, Box::new(openai::build()));
        adapters.insert(ProviderName::Nano, Box::new(nano::build()));
        adapters.insert(ProviderName::Local, Box::new(local::build()));
        Self { adapters, configs: BTreeMap::new() }
    }

    /// Registers or replaces the adapter for `provider`. Used by tests to
    /// inject a scripted adapter in place of a built-in one.
    pub fn register(&mut self, provider: ProviderName, adapter: Box<dyn Provider>) {
        self.adapters.insert(provider, adapter);
    }

    /// Records the resolved runtime configuration for `provider`.
    pub fn configure(&mut self, provider: ProviderName, config: ProviderRuntimeConfig) {
        self.configs.insert(provider, config);
    }

    /// Returns the adapter registered for `provider`, if any.
    #[must_use]
    pub fn adapter_for(&self, provider: ProviderName) -> Option<&dyn Provider> {
        self.adapters.get(&provider).map(AsRef::as_ref)
    }

    /// Returns the resolved runtime configuration for `provider`, if any.
    #[must_use]
    pub fn config_for(&self, provider: ProviderName) -> Option<&ProviderRuntimeConfig> {
        self.configs.get(&provider)
    }

    /// Resolves `target`'s provider route: its already-planned primary
    /// provider, plus its declared fallback providers filtered down to
    /// those registered here and capable of the target's requirements
    /// (§4.4 step 4).
    #[must_use]
    pub fn route(&self, target: &PlannedTarget) -> Route {
        let required = required_features(target);
        let fallbacks = target
            .generation_policy
            .fallback_providers
            .iter()
            .copied()
            .filter(|provider| *provider != target.provider)
            .filter(|provider| self.supports_all(*provider, &required))
            .collect();
        Route {
            primary: target.provider,
            fallbacks,
        }
    }

    /// Whether the adapter registered for `provider` supports every
    /// feature in `required`; a provider with no registered adapter never
    /// satisfies the predicate.
    fn supports_all(&self, provider: ProviderName, required: &[Feature]) -> bool {
        self.adapters.get(&provider).is_some_and(|adapter| required.iter().all(|feature| adapter.supports(*feature)))
    }
}

/// Computes the capability predicate a target's provider chain must
/// satisfy (§4.4 step 3: "transparent-background if alpha-required; edits
/// if generationMode=edit-first").
fn required_features(target: &PlannedTarget) -> Vec<Feature> {
    let mut features = vec![Feature::ImageGeneration];
    if target.acceptance.alpha {
        features.push(Feature::TransparentBackground);
    }
    if target.generation_policy.generation_mode == GenerationMode::EditFirst {
        features.push(Feature::ImageEdits);
    }
    features
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use lootforge_core::domain::target::AcceptancePolicy;
    use lootforge_core::domain::target::Background;
    use lootforge_core::domain::target::GenerationPolicy;
    use lootforge_core::domain::target::OutputFormat;
    use lootforge_core::domain::target::PromptSpec;
    use lootforge_core::domain::target::RuntimeSpec;
    use lootforge_core::domain::target::TargetKind;
    use lootforge_core::identifiers::ProviderName;
    use lootforge_core::identifiers::TargetId;

    use super::ProviderRegistry;

    fn target(provider: ProviderName, alpha: bool, fallback_providers: Vec<ProviderName>) -> lootforge_core::domain::target::PlannedTarget {
        lootforge_core::domain::target::PlannedTarget {
            id: TargetId::new("hero"),
            kind: TargetKind::Sprite,
            out: "hero.png".to_string(),
            acceptance: AcceptancePolicy {
                width: 64,
                height: 64,
                alpha,
                max_file_size_kb: 512,
            },
            runtime_spec: RuntimeSpec {
                anchor: None,
                preview_width: None,
                preview_height: None,
                alpha_required: alpha,
            },
            prompt_spec: PromptSpec {
                primary: "a hero".to_string(),
                facets: vec![],
            },
            generation_policy: GenerationPolicy {
                width: 64,
                height: 64,
                quality: None,
                background: if alpha { Background::Transparent } else { Background::Opaque },
                output_format: OutputFormat::Png,
                candidate_count: 1,
                max_retries: 2,
                fallback_providers,
                rate_limit_per_minute: None,
                provider_concurrency: None,
                vlm_gate_threshold: None,
                coarse_to_fine: None,
                generation_mode: lootforge_core::domain::target::GenerationMode::TextToImage,
            },
            post_process: lootforge_core::domain::target::PostProcessPolicy::default(),
            palette: vec![],
            wrap_grid: None,
            provider,
            model: None,
            edit_spec: None,
            spritesheet: None,
            consistency_group: None,
            evaluation_profile: None,
            catalog_disabled: false,
            generation_disabled: false,
            regeneration_source: None,
        }
    }

    #[test]
    fn fallback_chain_excludes_incapable_providers() {
        let registry = ProviderRegistry::with_builtin_adapters();
        let target = target(ProviderName::Openai, true, vec![ProviderName::Local, ProviderName::Nano]);
        let route = registry.route(&target);
        assert_eq!(route.primary, ProviderName::Openai);
        assert_eq!(route.fallbacks, vec![ProviderName::Local, ProviderName::Nano]);
    }

    #[test]
    fn fallback_chain_never_includes_the_primary() {
        let registry = ProviderRegistry::with_builtin_adapters();
        let target = target(ProviderName::Openai, false, vec![ProviderName::Openai, ProviderName::Nano]);
        let route = registry.route(&target);
        assert_eq!(route.fallbacks, vec![ProviderName::Nano]);
    }
}
