// crates/lootforge-process/src/pipeline.rs
// ============================================================================
// Module: Post-Process Pipeline Driver
// Description: Runs a target's declared PostProcessPolicy steps in the
//   pipeline's fixed order and collects every emitted variant.
// Purpose: Give every target the same deterministic step ordering,
//   regardless of which steps its policy actually enables (§4.7).
// Dependencies: lootforge-core
// ============================================================================

//! ## Overview
//! The fixed order is: emit-raw, trim, pad, smart-crop, resize (or its
//! pixel-perfect specialization), outline, seam-heal, palette
//! quantization, encode, then the variant-emitting steps (pixel variant,
//! style-ref variant, resize variants, auxiliary maps). "Encode" has no
//! dedicated transform here: this pipeline never decodes pixel data, so
//! the final byte payload is whatever the last metadata-affecting step
//! left behind.

use lootforge_core::domain::target::PostProcessPolicy;
use lootforge_core::domain::target::ResizeAlgorithm;
use lootforge_core::identifiers::TargetId;

use crate::error::ProcessError;
use crate::raster::ImageTransform as _;
use crate::raster::OutlineTransform;
use crate::raster::PadTransform;
use crate::raster::PaletteQuantizeTransform;
use crate::raster::PixelPerfectScaleTransform;
use crate::raster::RasterImage;
use crate::raster::ResizeTransform;
use crate::raster::SeamHealTransform;
use crate::raster::SmartCropTransform;
use crate::raster::TrimTransform;

/// Every image this pipeline produced for one target.
pub struct PipelineOutcome {
    /// The main processed image, written to the target's declared `out`.
    pub primary: RasterImage,
    /// The unprocessed candidate, emitted alongside when
    /// `policy.emit_raw` is set.
    pub raw: Option<RasterImage>,
    /// A pixel-art-faithful variant, when `policy.emit_pixel_variant` is
    /// set.
    pub pixel_variant: Option<RasterImage>,
    /// A style-reference variant, when `policy.emit_style_ref_variant` is
    /// set.
    pub style_ref_variant: Option<RasterImage>,
    /// Additional resized copies, one per `policy.resize_variants` entry.
    pub resize_variants: Vec<((u32, u32), RasterImage)>,
    /// A normal map, when `policy.emit_normal_map` is set.
    pub normal_map: Option<RasterImage>,
    /// A specular map, when `policy.emit_specular_map` is set.
    pub specular_map: Option<RasterImage>,
    /// An ambient-occlusion map, when `policy.emit_ao_map` is set.
    pub ao_map: Option<RasterImage>,
}

/// Runs `policy`'s enabled steps over `input` in the pipeline's fixed
/// order, returning every emitted image.
///
/// # Errors
///
/// Returns [`ProcessError`] when a step's declared parameters are invalid
/// for `input` (see each [`ImageTransform`](crate::raster::ImageTransform)
/// implementation for its specific checks).
pub fn run_pipeline(target_id: &TargetId, policy: &PostProcessPolicy, input: RasterImage) -> Result<PipelineOutcome, ProcessError> {
    let raw = policy.emit_raw.then(|| input.clone());

    let mut image = input;
    if policy.trim {
        image = TrimTransform.apply(image, target_id)?;
    }
    if policy.pad {
        image = PadTransform.apply(image, target_id)?;
    }
    if policy.smart_crop {
        image = SmartCropTransform.apply(image, target_id)?;
    }
    if let Some((width, height)) = policy.resize {
        image = apply_resize(image, target_id, width, height, policy)?;
    }
    if policy.outline_px > 0 {
        image = OutlineTransform { outline_px: policy.outline_px }.apply(image, target_id)?;
    }
    if policy.seam_heal {
        image = SeamHealTransform.apply(image, target_id)?;
    }
    if let Some(palette_colors) = policy.palette_colors {
        image = PaletteQuantizeTransform { palette_colors, strict: policy.strict_palette }.apply(image, target_id)?;
    }

    let pixel_variant = policy.emit_pixel_variant.then(|| image.clone());
    let style_ref_variant = policy.emit_style_ref_variant.then(|| image.clone());

    let mut resize_variants = Vec::with_capacity(policy.resize_variants.len());
    for &(width, height) in &policy.resize_variants {
        let variant = apply_resize(image.clone(), target_id, width, height, policy)?;
        resize_variants.push(((width, height), variant));
    }

    let normal_map = policy.emit_normal_map.then(|| image.clone());
    let specular_map = policy.emit_specular_map.then(|| image.clone());
    let ao_map = policy.emit_ao_map.then(|| image.clone());

    Ok(PipelineOutcome { primary: image, raw, pixel_variant, style_ref_variant, resize_variants, normal_map, specular_map, ao_map })
}

/// Resizes `image` to `(width, height)`, taking the pixel-perfect
/// integer-scale path when `policy.pixel_perfect` is set, else the
/// general resample path.
fn apply_resize(image: RasterImage, target_id: &TargetId, width: u32, height: u32, policy: &PostProcessPolicy) -> Result<RasterImage, ProcessError> {
    if policy.pixel_perfect {
        let factor_w = integer_factor(image.width, width, target_id)?;
        let factor_h = integer_factor(image.height, height, target_id)?;
        if factor_w != factor_h {
            return Err(ProcessError::new(target_id.clone(), "pixel_perfect_scale_not_uniform", "pixel-perfect resize requires equal width and height scale factors"));
        }
        PixelPerfectScaleTransform { factor: factor_w }.apply(image, target_id)
    } else {
        let algorithm = policy.algorithm.unwrap_or(ResizeAlgorithm::Lanczos3);
        ResizeTransform { width, height, algorithm }.apply(image, target_id)
    }
}

/// The integer scale factor taking `from` to `to`, or an error when `to`
/// is not an exact multiple of `from`.
fn integer_factor(from: u32, to: u32, target_id: &TargetId) -> Result<u32, ProcessError> {
    if from == 0 || to % from != 0 {
        return Err(ProcessError::new(target_id.clone(), "pixel_perfect_scale_not_integer", "pixel-perfect resize target must be an exact integer multiple of the source size"));
    }
    Ok(to / from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use lootforge_core::domain::target::PostProcessPolicy;
    use lootforge_core::identifiers::TargetId;

    use super::RasterImage;
    use super::run_pipeline;

    fn image(width: u32, height: u32) -> RasterImage {
        RasterImage { width, height, has_alpha: true, has_transparent_pixel: true, bytes: vec![0_u8; 64] }
    }

    #[test]
    fn pixel_perfect_resize_requires_an_integer_factor() {
        let target_id = TargetId::new("tile");
        let policy = PostProcessPolicy { pixel_perfect: true, resize: Some((100, 100)), ..PostProcessPolicy::default() };
        let error = run_pipeline(&target_id, &policy, image(32, 32)).unwrap_err();
        assert_eq!(error.code, "pixel_perfect_scale_not_integer");
    }

    #[test]
    fn pixel_perfect_resize_scales_uniformly() {
        let target_id = TargetId::new("tile");
        let policy = PostProcessPolicy { pixel_perfect: true, resize: Some((64, 64)), ..PostProcessPolicy::default() };
        let outcome = run_pipeline(&target_id, &policy, image(32, 32)).unwrap();
        assert_eq!(outcome.primary.width, 64);
        assert_eq!(outcome.primary.height, 64);
    }

    #[test]
    fn resize_variants_are_emitted_alongside_the_primary() {
        let target_id = TargetId::new("sprite");
        let policy = PostProcessPolicy { resize_variants: vec![(16, 16), (32, 32)], ..PostProcessPolicy::default() };
        let outcome = run_pipeline(&target_id, &policy, image(64, 64)).unwrap();
        assert_eq!(outcome.resize_variants.len(), 2);
        assert_eq!(outcome.primary.width, 64, "the primary image is untouched when no top-level resize is declared");
    }
}
