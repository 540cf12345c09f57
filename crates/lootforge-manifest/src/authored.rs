// crates/lootforge-manifest/src/authored.rs
// ============================================================================
// Module: Authored Manifest
// Description: The author-owned manifest document, before normalization.
// Purpose: Mirror the shape of `PlannedTarget` but leave every defaultable
//   field optional, exactly as an author would write it.
// Dependencies: serde, lootforge-core
// ============================================================================

//! ## Overview
//! `Manifest` is never mutated in place: the planner (`crate::plan`) reads
//! it and produces a `lootforge_core::contract::targets_index::TargetsIndex`
//! with every default already resolved.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use lootforge_core::domain::target::Background;
use lootforge_core::domain::target::EditSpec;
use lootforge_core::domain::target::OutputFormat;
use lootforge_core::domain::target::ResizeAlgorithm;
use lootforge_core::domain::target::TargetKind;
use lootforge_core::domain::target::WrapGrid;
use lootforge_core::identifiers::ProviderName;
use lootforge_core::identifiers::TargetId;

// ============================================================================
// SECTION: Manifest
// ============================================================================

/// The author-owned manifest document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Pack identity name.
    pub pack: String,
    /// Provider/runtime defaults applied when a target omits them.
    #[serde(default)]
    pub provider_defaults: ProviderDefaults,
    /// Declared style-kits, keyed by name.
    #[serde(default)]
    pub style_kits: BTreeMap<String, StyleKit>,
    /// Declared consistency-groups, keyed by name.
    #[serde(default)]
    pub consistency_groups: BTreeMap<String, ConsistencyGroup>,
    /// Declared evaluation profiles, keyed by name.
    #[serde(default)]
    pub evaluation_profiles: BTreeMap<String, EvaluationProfile>,
    /// Optional atlas grouping declarations.
    #[serde(default)]
    pub atlases: Vec<AtlasGroup>,
    /// Every authored target.
    pub targets: Vec<Target>,
}

/// Manifest-wide provider defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderDefaults {
    /// Default provider for targets that omit one.
    #[serde(default)]
    pub provider: Option<ProviderName>,
    /// Default model for the default provider.
    #[serde(default)]
    pub model: Option<String>,
    /// Default ordered fallback providers.
    #[serde(default)]
    pub fallback_providers: Vec<ProviderName>,
}

/// A named bundle of shared style rules, reference images and a palette.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleKit {
    /// Style preset name (e.g. `pixel-art-16bit`), used to derive the
    /// default resize algorithm.
    #[serde(default)]
    pub style_preset: Option<String>,
    /// Style facets appended to every member target's prompt.
    #[serde(default)]
    pub prompt_facets: Vec<String>,
    /// Reference image paths, relative to the output root (existence is
    /// checked as a warning, never an error).
    #[serde(default)]
    pub reference_images: Vec<String>,
    /// Palette colors, either declared inline or loaded from a path
    /// reference by the caller before planning.
    #[serde(default)]
    pub palette: Vec<String>,
    /// Path to an external palette asset, checked for existence as a
    /// warning.
    #[serde(default)]
    pub palette_path: Option<String>,
}

/// A set of targets that must share visual identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyGroup {
    /// The style-kit every member must also reference.
    pub style_kit: String,
    /// Member target ids.
    #[serde(default)]
    pub members: Vec<String>,
    /// Warning-level aggregate-deviation threshold for eval outlier
    /// scoring.
    #[serde(default)]
    pub warning_threshold: Option<f64>,
}

/// A reusable bundle of hard-gate thresholds and score weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationProfile {
    /// Weight applied to the base candidate score.
    #[serde(default = "default_weight")]
    pub candidate_score_weight: f64,
    /// Weight applied to the combined soft-metric adapter bonus.
    #[serde(default = "default_weight")]
    pub adapter_bonus_weight: f64,
    /// Declared texture-budget ceiling in kilobytes, summed across member
    /// targets.
    #[serde(default)]
    pub texture_budget_kb: Option<u64>,
}

const fn default_weight() -> f64 {
    1.0
}

/// An atlas packing group declaration (packing itself is out of scope).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasGroup {
    /// Atlas name.
    pub name: String,
    /// Member target ids.
    pub members: Vec<String>,
}

// ============================================================================
// SECTION: Target
// ============================================================================

/// One authored target, every defaultable field left optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Stable target identifier.
    pub id: TargetId,
    /// Asset kind.
    pub kind: TargetKind,
    /// Relative output path.
    pub out: String,
    /// Hard acceptance thresholds.
    pub acceptance: AuthoredAcceptance,
    /// Runtime hints for the game-side consumer.
    #[serde(default)]
    pub runtime_spec: AuthoredRuntimeSpec,
    /// Structured prompt content.
    pub prompt_spec: AuthoredPromptSpec,
    /// Generation knobs.
    pub generation_policy: AuthoredGenerationPolicy,
    /// Optional post-process policy.
    #[serde(default)]
    pub post_process: Option<lootforge_core::domain::target::PostProcessPolicy>,
    /// Optional explicit palette override.
    #[serde(default)]
    pub palette: Option<Vec<String>>,
    /// Optional wrap-grid declaration.
    #[serde(default)]
    pub wrap_grid: Option<WrapGrid>,
    /// Explicit provider override.
    #[serde(default)]
    pub provider: Option<ProviderName>,
    /// Explicit model override.
    #[serde(default)]
    pub model: Option<String>,
    /// Style-kit this target belongs to.
    #[serde(default)]
    pub style_kit: Option<String>,
    /// Consistency-group this target belongs to.
    #[serde(default)]
    pub consistency_group: Option<String>,
    /// Evaluation profile this target references.
    #[serde(default)]
    pub evaluation_profile: Option<String>,
    /// Edit-first generation request, when present.
    #[serde(default)]
    pub edit_spec: Option<EditSpec>,
    /// Regeneration lineage, when this target regenerates a prior lock
    /// entry.
    #[serde(default)]
    pub regeneration_source: Option<TargetId>,
    /// Spritesheet declaration, present only for `kind=spritesheet`.
    #[serde(default)]
    pub spritesheet: Option<AuthoredSpritesheet>,
}

/// Authored acceptance block (`size` is a `"WxH"` literal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthoredAcceptance {
    /// `"WxH"` size literal, e.g. `"64x64"`.
    pub size: String,
    /// Whether an alpha channel is required.
    #[serde(default)]
    pub alpha: bool,
    /// Maximum file size in kilobytes.
    #[serde(default)]
    pub max_file_size_kb: Option<u32>,
}

/// Authored runtime-spec block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthoredRuntimeSpec {
    /// Named anchor point.
    #[serde(default)]
    pub anchor: Option<String>,
    /// Preview `"WxH"` size literal.
    #[serde(default)]
    pub preview_size: Option<String>,
    /// Whether the runtime requires alpha independent of acceptance.
    #[serde(default)]
    pub alpha_required: bool,
}

/// Authored prompt-spec block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthoredPromptSpec {
    /// Primary natural-language prompt.
    pub primary: String,
    /// Structured facets appended at generation time.
    #[serde(default)]
    pub facets: Vec<String>,
}

/// Authored generation-policy block (`size` is a `"WxH"` literal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthoredGenerationPolicy {
    /// `"WxH"` size literal.
    #[serde(default)]
    pub size: Option<String>,
    /// Provider quality hint.
    #[serde(default)]
    pub quality: Option<String>,
    /// Background treatment.
    #[serde(default)]
    pub background: Option<Background>,
    /// Output raster format.
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
    /// Number of candidates to request.
    #[serde(default)]
    pub candidate_count: Option<u32>,
    /// Maximum retry attempts per provider.
    #[serde(default)]
    pub max_retries: Option<u32>,
    /// Ordered fallback providers.
    #[serde(default)]
    pub fallback_providers: Vec<ProviderName>,
    /// Requests-per-minute ceiling.
    #[serde(default)]
    pub rate_limit_per_minute: Option<u32>,
    /// Per-target concurrency hint.
    #[serde(default)]
    pub provider_concurrency: Option<u32>,
    /// Optional VLM-gate acceptance threshold.
    #[serde(default)]
    pub vlm_gate_threshold: Option<f64>,
    /// Optional coarse-to-fine policy.
    #[serde(default)]
    pub coarse_to_fine: Option<lootforge_core::domain::target::CoarseToFinePolicy>,
    /// Requested resize algorithm override.
    #[serde(default)]
    pub algorithm: Option<ResizeAlgorithm>,
}

/// Authored spritesheet declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthoredSpritesheet {
    /// Declared animations, each expanding into N frame targets.
    pub animations: Vec<AuthoredAnimation>,
}

/// One authored animation within a spritesheet target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthoredAnimation {
    /// Animation name.
    pub name: String,
    /// Number of frames to generate for this animation.
    pub frame_count: u32,
    /// Prompt template; frame index is appended as a facet.
    pub prompt: String,
}
