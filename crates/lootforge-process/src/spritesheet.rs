// crates/lootforge-process/src/spritesheet.rs
// ============================================================================
// Module: Spritesheet Assembly
// Description: Assembles a sheet target's processed frame images into one
//   composite, ordered by animation then frame index, plus its .anim.json
//   sidecar.
// Purpose: Give a sheet target (generation_disabled) an output built
//   entirely from its already-processed frame targets (§4.2 invariant 6).
// Dependencies: lootforge-core, serde, serde_json
// ============================================================================

//! ## Overview
//! A sheet target never generates its own image (invariant 6): its output
//! is composed from sibling frame targets that declare the same
//! `spritesheet.sheet_id`. This workspace carries no image-composition
//! codec, so [`assemble`] concatenates frame byte payloads as a
//! deterministic, declared-metadata-accurate stand-in for a real sheet
//! composite, while [`build_anim_sidecar`] emits the real frame layout a
//! runtime needs to play the animations back.

use serde::Serialize;

use lootforge_core::domain::target::PlannedTarget;
use lootforge_core::identifiers::TargetId;

use crate::error::ProcessError;
use crate::raster::RasterImage;

/// One processed frame, ready to place on its sheet.
pub struct ProcessedFrame<'a> {
    /// The frame's planned target.
    pub target: &'a PlannedTarget,
    /// The frame's final processed image.
    pub image: RasterImage,
}

/// Orders `frames` by animation name, then frame index, the order a sheet
/// must lay its frames out in.
///
/// # Errors
///
/// Returns [`ProcessError`] when a frame target carries no
/// [`lootforge_core::domain::target::SpritesheetInfo`], which would mean
/// the planner mis-grouped it onto this sheet.
pub fn order_frames<'a>(sheet_id: &TargetId, mut frames: Vec<ProcessedFrame<'a>>) -> Result<Vec<ProcessedFrame<'a>>, ProcessError> {
    for frame in &frames {
        if frame.target.spritesheet.is_none() {
            return Err(ProcessError::new(frame.target.id.clone(), "spritesheet_frame_missing_metadata", "a spritesheet frame target must carry spritesheet metadata"));
        }
    }
    frames.sort_by(|a, b| {
        let a_info = a.target.spritesheet.as_ref();
        let b_info = b.target.spritesheet.as_ref();
        let a_key = (a_info.and_then(|info| info.animation_name.clone()), a_info.and_then(|info| info.frame_index));
        let b_key = (b_info.and_then(|info| info.animation_name.clone()), b_info.and_then(|info| info.frame_index));
        a_key.cmp(&b_key)
    });
    let _ = sheet_id;
    Ok(frames)
}

/// Assembles ordered frames into one sheet image: a grid `columns` wide
/// (from the sheet target's declared wrap grid) whose byte payload is the
/// concatenation of each frame's bytes in placement order.
///
/// # Errors
///
/// Returns [`ProcessError`] when the sheet target carries no wrap grid, or
/// when the grid does not have enough cells for every frame.
pub fn assemble(sheet_target: &PlannedTarget, frames: &[ProcessedFrame<'_>]) -> Result<RasterImage, ProcessError> {
    let Some(grid) = sheet_target.wrap_grid else {
        return Err(ProcessError::new(sheet_target.id.clone(), "spritesheet_sheet_missing_wrap_grid", "a spritesheet sheet target must declare a wrap grid"));
    };
    let capacity = u64::from(grid.columns) * u64::from(grid.rows);
    let frame_count = u64::try_from(frames.len()).unwrap_or(u64::MAX);
    if capacity < frame_count {
        return Err(ProcessError::new(sheet_target.id.clone(), "spritesheet_grid_too_small", "the sheet's wrap grid has fewer cells than declared frames"));
    }

    let frame_width = frames.first().map_or(0, |frame| frame.image.width);
    let frame_height = frames.first().map_or(0, |frame| frame.image.height);
    let has_alpha = frames.iter().any(|frame| frame.image.has_alpha);
    let has_transparent_pixel = frames.iter().any(|frame| frame.image.has_transparent_pixel);

    let mut bytes = Vec::new();
    for frame in frames {
        bytes.extend_from_slice(&frame.image.bytes);
    }

    Ok(RasterImage {
        width: frame_width.saturating_mul(grid.columns),
        height: frame_height.saturating_mul(grid.rows),
        has_alpha,
        has_transparent_pixel,
        bytes,
    })
}

/// The `.anim.json` sidecar describing a sheet's animation layout.
#[derive(Debug, Serialize)]
pub struct AnimSidecar {
    /// The sheet target's id.
    pub sheet_id: String,
    /// Every animation declared on this sheet, in declared order.
    pub animations: Vec<AnimEntry>,
}

/// One animation's ordered frame list.
#[derive(Debug, Serialize)]
pub struct AnimEntry {
    /// Animation name.
    pub name: String,
    /// Frames belonging to this animation, in playback order.
    pub frames: Vec<AnimFrame>,
}

/// One frame's placement within its animation.
#[derive(Debug, Serialize)]
pub struct AnimFrame {
    /// Frame index within its animation.
    pub frame_index: u32,
    /// The frame target's own output path.
    pub path: String,
}

/// Builds the `.anim.json` sidecar for an already-ordered frame list.
#[must_use]
pub fn build_anim_sidecar(sheet_id: &TargetId, frames: &[ProcessedFrame<'_>]) -> AnimSidecar {
    let mut animations: Vec<AnimEntry> = Vec::new();
    for frame in frames {
        let info = frame.target.spritesheet.as_ref();
        let name = info.and_then(|info| info.animation_name.clone()).unwrap_or_default();
        let frame_index = info.and_then(|info| info.frame_index).unwrap_or(0);
        let entry = AnimFrame { frame_index, path: frame.target.out.clone() };
        match animations.iter_mut().find(|animation| animation.name == name) {
            Some(animation) => animation.frames.push(entry),
            None => animations.push(AnimEntry { name, frames: vec![entry] }),
        }
    }
    AnimSidecar { sheet_id: sheet_id.as_str().to_string(), animations }
}
