// crates/lootforge-core/src/domain/target.rs
// ============================================================================
// Module: Planned Target
// Description: The normalized target record produced by the planner.
// Purpose: Capture every defaultable field already resolved, so downstream
//   stages never need to re-derive a default.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`PlannedTarget`] has the same conceptual shape as an authored
//! `Target`, but every field the manifest normalizer (C2) can default has
//! already been resolved: palette colors, output format, algorithm,
//! background, alpha. Spritesheet expansion also lives at this level —
//! frame targets and the sheet target are both `PlannedTarget`s, flagged
//! with `catalog_disabled`/`generation_disabled`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::ProviderName;
use crate::identifiers::TargetId;

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// The kind of asset a target produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A single sprite image.
    Sprite,
    /// A tileable tile image.
    Tile,
    /// A background image.
    Background,
    /// A visual effect image.
    Effect,
    /// A spritesheet; expands into one sheet target plus N frame targets.
    Spritesheet,
}

/// Requested generation background treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    /// Transparent background; implies alpha is required.
    Transparent,
    /// Opaque background.
    Opaque,
}

/// Output raster format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// PNG; alpha-capable.
    Png,
    /// WebP; alpha-capable.
    Webp,
    /// JPEG; not alpha-capable.
    Jpeg,
}

impl OutputFormat {
    /// Returns whether this format can carry an alpha channel (used by the
    /// `alpha_requires_png_or_webp` check).
    #[must_use]
    pub const fn supports_alpha(self) -> bool {
        matches!(self, Self::Png | Self::Webp)
    }

    /// Infers a format from a file extension, defaulting to PNG when the
    /// extension is unrecognized (§4.2 step 3).
    #[must_use]
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "webp" => Self::Webp,
            "jpg" | "jpeg" => Self::Jpeg,
            _ => Self::Png,
        }
    }
}

/// Post-process resize algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeAlgorithm {
    /// Nearest-neighbor; canonical choice for pixel-art presets.
    Nearest,
    /// Lanczos3; the overall default.
    Lanczos3,
}

/// The role an edit-first input image plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditRole {
    /// The base image being edited.
    Base,
    /// An inpainting mask.
    Mask,
    /// A style/consistency reference image.
    Reference,
}

// ============================================================================
// SECTION: Prompt and Acceptance
// ============================================================================

/// Structured prompt content for a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSpec {
    /// The primary natural-language prompt.
    pub primary: String,
    /// Structured facets (style, palette, consistency constraints, ...)
    /// appended to `primary` at generation time.
    #[serde(default)]
    pub facets: Vec<String>,
}

/// Hard acceptance thresholds for a target (§3 Acceptance Report).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptancePolicy {
    /// Expected width in pixels.
    pub width: u32,
    /// Expected height in pixels.
    pub height: u32,
    /// Whether an alpha channel is required.
    pub alpha: bool,
    /// Maximum file size in kilobytes.
    pub max_file_size_kb: u32,
}

/// Runtime hints used by the game-side consumer, not by generation itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSpec {
    /// Named anchor point (e.g. `center`, `bottom-center`).
    #[serde(default)]
    pub anchor: Option<String>,
    /// Preview width in pixels.
    #[serde(default)]
    pub preview_width: Option<u32>,
    /// Preview height in pixels.
    #[serde(default)]
    pub preview_height: Option<u32>,
    /// Whether the runtime requires an alpha channel independent of
    /// `AcceptancePolicy::alpha`.
    #[serde(default)]
    pub alpha_required: bool,
}

// ============================================================================
// SECTION: Generation and Post-process Policy
// ============================================================================

/// Per-target generation knobs (§3 `generation-policy`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationPolicy {
    /// Requested width in pixels.
    pub width: u32,
    /// Requested height in pixels.
    pub height: u32,
    /// Provider quality hint, passed through verbatim.
    #[serde(default)]
    pub quality: Option<String>,
    /// Background treatment.
    pub background: Background,
    /// Output raster format.
    pub output_format: OutputFormat,
    /// Number of candidates to request.
    #[serde(default = "default_candidate_count")]
    pub candidate_count: u32,
    /// Maximum retry attempts per provider (not counting the first try).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Ordered fallback providers, tried after the primary is exhausted.
    #[serde(default)]
    pub fallback_providers: Vec<ProviderName>,
    /// Optional requests-per-minute ceiling for this target's jobs.
    #[serde(default)]
    pub rate_limit_per_minute: Option<u32>,
    /// Optional per-target concurrency hint fed into the provider pool's
    /// effective concurrency computation (§4.5 step 5).
    #[serde(default)]
    pub provider_concurrency: Option<u32>,
    /// Optional VLM-gate acceptance threshold.
    #[serde(default)]
    pub vlm_gate_threshold: Option<f64>,
    /// Optional coarse-to-fine policy.
    #[serde(default)]
    pub coarse_to_fine: Option<CoarseToFinePolicy>,
    /// Generation mode: text-to-image, or edit-first when an `edit_spec` is
    /// present.
    #[serde(default)]
    pub generation_mode: GenerationMode,
}

const fn default_candidate_count() -> u32 {
    1
}

const fn default_max_retries() -> u32 {
    2
}

/// Whether a job generates from text or edits a locked/base image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationMode {
    /// Plain text-to-image generation.
    #[default]
    TextToImage,
    /// Edit-first generation/regeneration using a base image input.
    EditFirst,
}

/// The three inputs controlling coarse-to-fine promotion (Open Question:
/// these are the sole inputs; see `DESIGN.md` for the chosen function).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoarseToFinePolicy {
    /// How many draft candidates advance to the refinement pass.
    pub promote_top_k: u32,
    /// Minimum draft score required to be eligible for promotion.
    pub min_draft_score: f64,
    /// Whether a draft must also pass acceptance to be eligible.
    pub require_draft_acceptance: bool,
}

/// Declared post-process operations (§4.7 fixed pipeline order).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostProcessPolicy {
    /// Emit the untouched raw candidate alongside the processed output.
    #[serde(default)]
    pub emit_raw: bool,
    /// Target resize dimensions, applied after trim/pad/smart-crop.
    #[serde(default)]
    pub resize: Option<(u32, u32)>,
    /// Resize algorithm.
    #[serde(default)]
    pub algorithm: Option<ResizeAlgorithm>,
    /// Palette quantization color count (`None` disables quantization).
    #[serde(default)]
    pub palette_colors: Option<u32>,
    /// Whether palette compliance must be exact (error, not warning).
    #[serde(default)]
    pub strict_palette: bool,
    /// Trim transparent/empty borders before padding.
    #[serde(default)]
    pub trim: bool,
    /// Pad to the target's declared acceptance size after trimming.
    #[serde(default)]
    pub pad: bool,
    /// Crop to the subject's bounding box plus margin before resize.
    #[serde(default)]
    pub smart_crop: bool,
    /// Snap the resized result to an integer pixel-art scale factor.
    #[serde(default)]
    pub pixel_perfect: bool,
    /// Outline width in pixels (`0` disables).
    #[serde(default)]
    pub outline_px: u32,
    /// Whether seam-healing runs for tileable targets.
    #[serde(default)]
    pub seam_heal: bool,
    /// Additional resize variants to emit alongside the primary size.
    #[serde(default)]
    pub resize_variants: Vec<(u32, u32)>,
    /// Emit a pixel-art style reference variant.
    #[serde(default)]
    pub emit_pixel_variant: bool,
    /// Emit a style-reference variant.
    #[serde(default)]
    pub emit_style_ref_variant: bool,
    /// Derive a normal map from the encoded buffer.
    #[serde(default)]
    pub emit_normal_map: bool,
    /// Derive a specular map from the encoded buffer.
    #[serde(default)]
    pub emit_specular_map: bool,
    /// Derive an ambient-occlusion map from the encoded buffer.
    #[serde(default)]
    pub emit_ao_map: bool,
}

/// Tileable/wrap-grid declaration for seam scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WrapGrid {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
}

// ============================================================================
// SECTION: Edit Spec
// ============================================================================

/// One edit-first input image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditInput {
    /// Relative path to the input image, validated under the output root.
    pub path: String,
    /// The role this input plays in the edit.
    pub role: EditRole,
    /// Fidelity hint passed to the provider (e.g. `low`, `high`).
    #[serde(default)]
    pub fidelity: Option<String>,
}

/// Edit-first generation request attached to a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditSpec {
    /// Input images for the edit.
    pub inputs: Vec<EditInput>,
    /// Edit instruction text.
    pub instruction: String,
    /// Whether the provider should preserve the base image's composition.
    #[serde(default)]
    pub preserve_composition: bool,
}

// ============================================================================
// SECTION: Spritesheet Linkage
// ============================================================================

/// Spritesheet frame/sheet linkage metadata (§4.2 step 4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpritesheetInfo {
    /// Shared sheet identifier for every frame of one animation sheet.
    pub sheet_id: TargetId,
    /// Whether this planned target is the (never generated) sheet itself.
    #[serde(default)]
    pub is_sheet: bool,
    /// The animation name this frame belongs to (frames only).
    #[serde(default)]
    pub animation_name: Option<String>,
    /// The zero-based frame index within its animation (frames only).
    #[serde(default)]
    pub frame_index: Option<u32>,
}

// ============================================================================
// SECTION: Planned Target
// ============================================================================

/// A manifest target with every defaultable field resolved.
///
/// # Invariants
/// - Immutable once produced by the planner; later stages read it, never
///   mutate it (data model lifecycle note).
/// - `catalog_disabled` is true only for spritesheet frame targets;
///   `generation_disabled` is true only for spritesheet sheet targets
///   (invariant 6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedTarget {
    /// Stable target identifier.
    pub id: TargetId,
    /// Asset kind.
    pub kind: TargetKind,
    /// Relative output path, normalized to forward slashes.
    pub out: String,
    /// Hard acceptance thresholds.
    pub acceptance: AcceptancePolicy,
    /// Runtime hints for the game-side consumer.
    pub runtime_spec: RuntimeSpec,
    /// Structured prompt content, with style-kit/consistency-group
    /// constraints already injected.
    pub prompt_spec: PromptSpec,
    /// Resolved generation knobs.
    pub generation_policy: GenerationPolicy,
    /// Resolved post-process operations.
    #[serde(default)]
    pub post_process: PostProcessPolicy,
    /// Resolved palette colors (hex strings), if any.
    #[serde(default)]
    pub palette: Vec<String>,
    /// Wrap-grid declaration for tileable targets.
    #[serde(default)]
    pub wrap_grid: Option<WrapGrid>,
    /// Resolved provider for this target.
    pub provider: ProviderName,
    /// Resolved model identifier, if the provider exposes one.
    #[serde(default)]
    pub model: Option<String>,
    /// Edit-first input spec, when present.
    #[serde(default)]
    pub edit_spec: Option<EditSpec>,
    /// Spritesheet linkage, present only for spritesheet sheet/frame
    /// targets.
    #[serde(default)]
    pub spritesheet: Option<SpritesheetInfo>,
    /// Consistency-group membership, if any.
    #[serde(default)]
    pub consistency_group: Option<String>,
    /// Evaluation profile reference, if any.
    #[serde(default)]
    pub evaluation_profile: Option<String>,
    /// True for spritesheet frame targets: excluded from the processed
    /// catalog (invariant 6).
    #[serde(default)]
    pub catalog_disabled: bool,
    /// True for spritesheet sheet targets: never generated, only
    /// assembled from its frames (invariant 6).
    #[serde(default)]
    pub generation_disabled: bool,
    /// Regeneration lineage: the prior selection-lock entry this target
    /// re-generates from, if this is a regenerate run.
    #[serde(default)]
    pub regeneration_source: Option<TargetId>,
}
