// crates/lootforge-core/src/capabilities.rs
// ============================================================================
// Module: Provider Capabilities
// Description: Static capability records for each built-in provider.
// Purpose: Give the planner (auto-select, compatibility checks) and the
//   provider registry a single shared source of truth, so the planner
//   never has to depend on the providers crate.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Capabilities are immutable and known at compile time (§4.3): "an
//! immutable record". Real adapters in `lootforge-providers` return the
//! same value from their `capabilities()` method; this module exists so
//! `lootforge-manifest` can reason about routing without depending on the
//! adapter crate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::domain::target::OutputFormat;
use crate::identifiers::ProviderName;

// ============================================================================
// SECTION: Feature
// ============================================================================

/// A capability predicate a target may require (§4.3 `supports`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    /// Plain text-to-image generation.
    ImageGeneration,
    /// Transparent background output.
    TransparentBackground,
    /// Edit-first (image + instruction) generation.
    ImageEdits,
    /// Multiple candidates per request.
    MultiCandidate,
    /// ControlNet-style conditioning input.
    ControlNet,
}

// ============================================================================
// SECTION: Capabilities
// ============================================================================

/// A provider's immutable capability record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderCapabilities {
    /// Format used when a target does not specify one.
    pub default_output_format: OutputFormat,
    /// Whether `format` is ever accepted for this provider.
    pub supports_format: fn(OutputFormat) -> bool,
    /// Whether transparent backgrounds are supported.
    pub supports_transparent_background: bool,
    /// Whether edit-first generation is supported.
    pub supports_edits: bool,
    /// Whether ControlNet-style conditioning is supported.
    pub supports_controlnet: bool,
    /// Maximum candidates accepted per request.
    pub max_candidates: u32,
    /// Default worker-pool concurrency.
    pub default_concurrency: u32,
    /// Minimum delay between dispatches, in milliseconds.
    pub min_delay_ms: u64,
}

impl ProviderCapabilities {
    /// Evaluates `feature` against this capability record.
    #[must_use]
    pub fn supports(self, feature: Feature) -> bool {
        match feature {
            Feature::ImageGeneration => true,
            Feature::TransparentBackground => self.supports_transparent_background,
            Feature::ImageEdits => self.supports_edits,
            Feature::MultiCandidate => self.max_candidates > 1,
            Feature::ControlNet => self.supports_controlnet,
        }
    }
}

const fn any_format(_format: OutputFormat) -> bool {
    true
}

const fn png_or_webp(format: OutputFormat) -> bool {
    matches!(format, OutputFormat::Png | OutputFormat::Webp)
}

/// Returns the static capability record for a built-in provider.
#[must_use]
pub const fn capabilities_for(provider: ProviderName) -> ProviderCapabilities {
    match provider {
        ProviderName::Openai => ProviderCapabilities {
            default_output_format: OutputFormat::Png,
            supports_format: any_format,
            supports_transparent_background: true,
            supports_edits: true,
            supports_controlnet: false,
            max_candidates: 4,
            default_concurrency: 4,
            min_delay_ms: 250,
        },
        ProviderName::Nano => ProviderCapabilities {
            default_output_format: OutputFormat::Png,
            supports_format: png_or_webp,
            supports_transparent_background: true,
            supports_edits: true,
            supports_controlnet: false,
            max_candidates: 1,
            default_concurrency: 2,
            min_delay_ms: 500,
        },
        ProviderName::Local => ProviderCapabilities {
            default_output_format: OutputFormat::Png,
            supports_format: any_format,
            supports_transparent_background: true,
            supports_edits: false,
            supports_controlnet: true,
            max_candidates: 8,
            default_concurrency: 1,
            min_delay_ms: 0,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use super::Feature;
    use super::capabilities_for;
    use crate::identifiers::ProviderName;

    #[test]
    fn local_has_no_edit_support() {
        let caps = capabilities_for(ProviderName::Local);
        assert!(!caps.supports(Feature::ImageEdits));
    }

    #[test]
    fn every_builtin_supports_transparent_background() {
        for provider in [ProviderName::Openai, ProviderName::Nano, ProviderName::Local] {
            assert!(capabilities_for(provider).supports(Feature::TransparentBackground));
        }
    }
}
