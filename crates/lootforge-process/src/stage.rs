// crates/lootforge-process/src/stage.rs
// ============================================================================
// Module: Process Stage
// Description: The process stage's entry point: reads each target's
//   selected candidate, runs its post-process pipeline, assembles
//   spritesheets, and emits the acceptance report and output catalog.
// Purpose: Turn a ProvenanceRun's selected candidates into final pack
//   assets plus the AcceptanceReport the eval stage consumes (§4.7/§4.8).
// Dependencies: lootforge-core, serde, serde_json
// ============================================================================

//! ## Overview
//! [`run`] walks every generation-enabled target, reads its selected
//! candidate from the raw output directory, drives it through
//! [`crate::pipeline::run_pipeline`], and writes every emitted variant
//! under the pack's output root. Spritesheet sheet targets are handled
//! afterward, assembled from their already-processed sibling frames.
//! In `strict` mode the first error aborts the whole stage; otherwise a
//! target's failure is recorded and every other target still runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use lootforge_core::contract;
use lootforge_core::contract::acceptance::AcceptanceReport;
use lootforge_core::contract::provenance::ProvenanceRun;
use lootforge_core::contract::targets_index::TargetsIndex;
use lootforge_core::domain::target::PlannedTarget;
use lootforge_core::identifiers::TargetId;
use lootforge_core::paths::PathSafetyError;
use lootforge_core::paths::resolve_under_root;

use crate::acceptance::build_acceptance;
use crate::error::ProcessError;
use crate::pipeline::run_pipeline;
use crate::raster::RasterImage;
use crate::spritesheet::ProcessedFrame;
use crate::spritesheet::assemble;
use crate::spritesheet::build_anim_sidecar;
use crate::spritesheet::order_frames;

/// Inputs to one process stage run.
pub struct ProcessOptions {
    /// Root directory final pack assets are written under.
    pub out_root: PathBuf,
    /// Directory raw provider candidates were written under.
    pub raw_output_dir: PathBuf,
    /// Abort on the first error instead of collecting and continuing.
    pub strict: bool,
}

/// Everything the process stage produced.
pub struct ProcessOutcome {
    /// The acceptance report, ready for `§4.8` eval.
    pub report: AcceptanceReport,
    /// The output catalog, keyed by catalog-visible target id.
    pub catalog: Catalog,
    /// Per-target failures recorded in non-strict mode.
    pub errors: Vec<ProcessError>,
}

/// The process stage's own failure shape.
#[derive(Debug, Error)]
pub enum ProcessStageError {
    /// A pipeline step rejected its declared parameters.
    #[error(transparent)]
    Transform(#[from] ProcessError),
    /// The acceptance report failed its own contract validation.
    #[error(transparent)]
    Contract(#[from] contract::ContractError),
    /// A path escaped the output root, or was otherwise unsafe.
    #[error("{target_id}: {code}: path is unsafe")]
    UnsafePath {
        /// The target whose output path was rejected.
        target_id: TargetId,
        /// Stable machine-readable error code.
        code: &'static str,
    },
    /// Reading or writing a file failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// The path that could not be read or written.
        path: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// A target had no selected candidate in the provenance run.
    #[error("{target_id}: no selected candidate in the provenance run")]
    MissingCandidate {
        /// The target missing a selected candidate.
        target_id: TargetId,
    },
}

/// The output catalog: every catalog-visible target's final asset paths.
#[derive(Debug, Serialize, Deserialize)]
pub struct Catalog {
    /// One entry per catalog-visible target, keyed by target id.
    pub entries: BTreeMap<String, CatalogEntry>,
}

/// One target's written output paths.
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// The target's primary output path, relative to the output root.
    pub primary: String,
    /// Every additional variant path this target emitted.
    pub variants: Vec<String>,
}

/// Runs the process stage over every target in `targets_index`, reading
/// selected candidates recorded in `provenance`.
///
/// # Errors
///
/// In `strict` mode, returns the first [`ProcessStageError`] encountered.
/// In non-strict mode, only returns an error when the final acceptance
/// report itself fails contract validation; per-target failures are
/// collected in [`ProcessOutcome::errors`] instead.
pub fn run(targets_index: &TargetsIndex, provenance: &ProvenanceRun, options: &ProcessOptions) -> Result<ProcessOutcome, ProcessStageError> {
    let selected_paths: BTreeMap<TargetId, String> = provenance.jobs.iter().map(|job| (job.target_id.clone(), job.primary_output_path.clone())).collect();

    let mut targets_entries: Vec<lootforge_core::contract::acceptance::TargetAcceptance> = Vec::new();
    let mut processed_primaries: BTreeMap<TargetId, RasterImage> = BTreeMap::new();
    let mut catalog_entries: BTreeMap<String, CatalogEntry> = BTreeMap::new();
    let mut errors: Vec<ProcessError> = Vec::new();

    for target in targets_index.targets.iter().filter(|target| !target.generation_disabled) {
        match process_one_target(target, &selected_paths, options) {
            Ok(outcome) => {
                processed_primaries.insert(target.id.clone(), outcome.image.clone());
                targets_entries.push(build_acceptance(target, &outcome.image));
                if !target.catalog_disabled {
                    catalog_entries.insert(target.id.as_str().to_string(), CatalogEntry { primary: target.out.clone(), variants: outcome.variant_paths });
                }
            }
            Err(error) => {
                if options.strict {
                    return Err(error);
                }
                if let ProcessStageError::Transform(process_error) = error {
                    errors.push(process_error);
                } else {
                    errors.push(ProcessError::new(target.id.clone(), "process_stage_error", error.to_string()));
                }
            }
        }
    }

    for sheet in targets_index.targets.iter().filter(|target| target.generation_disabled) {
        match assemble_sheet(sheet, targets_index, &processed_primaries, options) {
            Ok(outcome) => {
                targets_entries.push(build_acceptance(sheet, &outcome.image));
                catalog_entries.insert(sheet.id.as_str().to_string(), CatalogEntry { primary: sheet.out.clone(), variants: outcome.variant_paths });
            }
            Err(error) => {
                if options.strict {
                    return Err(error);
                }
                errors.push(ProcessError::new(sheet.id.clone(), "spritesheet_assembly_failed", error.to_string()));
            }
        }
    }

    let mut report = AcceptanceReport::new(targets_entries);
    report.targets.sort_by(|a, b| a.target_id.as_str().cmp(b.target_id.as_str()));
    contract::validate(&report)?;

    Ok(ProcessOutcome { report, catalog: Catalog { entries: catalog_entries }, errors })
}

/// One target's processed result, kept around for catalog and spritesheet
/// assembly.
struct TargetProcessResult {
    /// The primary processed image.
    image: RasterImage,
    /// Paths of every variant written alongside the primary, relative to
    /// the output root.
    variant_paths: Vec<String>,
}

/// Reads `target`'s selected candidate, runs its pipeline, and writes
/// every emitted image under `options.out_root`.
fn process_one_target(target: &PlannedTarget, selected_paths: &BTreeMap<TargetId, String>, options: &ProcessOptions) -> Result<TargetProcessResult, ProcessStageError> {
    let Some(candidate_path) = selected_paths.get(&target.id) else {
        return Err(ProcessStageError::MissingCandidate { target_id: target.id.clone() });
    };

    let bytes = fs::read(options.raw_output_dir.join(candidate_path)).map_err(|source| ProcessStageError::Io { path: candidate_path.clone(), source })?;
    let input = RasterImage {
        width: target.generation_policy.width,
        height: target.generation_policy.height,
        has_alpha: target.acceptance.alpha,
        has_transparent_pixel: target.acceptance.alpha,
        bytes,
    };

    let outcome = run_pipeline(&target.id, &target.post_process, input)?;
    let mut variant_paths = Vec::new();

    write_image(&options.out_root, &target.out, &outcome.primary, &target.id)?;

    if let Some(raw) = &outcome.raw {
        let path = variant_path(&target.out, "raw");
        write_image(&options.out_root, &path, raw, &target.id)?;
        variant_paths.push(path);
    }
    if let Some(pixel) = &outcome.pixel_variant {
        let path = variant_path(&target.out, "pixel");
        write_image(&options.out_root, &path, pixel, &target.id)?;
        variant_paths.push(path);
    }
    if let Some(style_ref) = &outcome.style_ref_variant {
        let path = variant_path(&target.out, "styleref");
        write_image(&options.out_root, &path, style_ref, &target.id)?;
        variant_paths.push(path);
    }
    for ((width, height), variant) in &outcome.resize_variants {
        let path = variant_path(&target.out, &format!("{width}x{height}"));
        write_image(&options.out_root, &path, variant, &target.id)?;
        variant_paths.push(path);
    }
    if let Some(normal_map) = &outcome.normal_map {
        let path = variant_path(&target.out, "normal");
        write_image(&options.out_root, &path, normal_map, &target.id)?;
        variant_paths.push(path);
    }
    if let Some(specular_map) = &outcome.specular_map {
        let path = variant_path(&target.out, "specular");
        write_image(&options.out_root, &path, specular_map, &target.id)?;
        variant_paths.push(path);
    }
    if let Some(ao_map) = &outcome.ao_map {
        let path = variant_path(&target.out, "ao");
        write_image(&options.out_root, &path, ao_map, &target.id)?;
        variant_paths.push(path);
    }

    Ok(TargetProcessResult { image: outcome.primary, variant_paths })
}

/// Assembles a sheet target's output from its already-processed sibling
/// frames, writing the composite image and its `.anim.json` sidecar.
fn assemble_sheet(sheet: &PlannedTarget, targets_index: &TargetsIndex, processed_primaries: &BTreeMap<TargetId, RasterImage>, options: &ProcessOptions) -> Result<TargetProcessResult, ProcessStageError> {
    let frames: Vec<ProcessedFrame<'_>> = targets_index
        .targets
        .iter()
        .filter(|target| target.spritesheet.as_ref().is_some_and(|info| !info.is_sheet && info.sheet_id == sheet.id))
        .filter_map(|target| processed_primaries.get(&target.id).map(|image| ProcessedFrame { target, image: image.clone() }))
        .collect();

    let ordered = order_frames(&sheet.id, frames)?;
    let image = assemble(sheet, &ordered)?;
    write_image(&options.out_root, &sheet.out, &image, &sheet.id)?;

    let sidecar = build_anim_sidecar(&sheet.id, &ordered);
    let sidecar_path = variant_path(&sheet.out, "anim");
    let sidecar_path = replace_extension(&sidecar_path, "json");
    let sidecar_json = serde_json::to_vec_pretty(&sidecar).unwrap_or_default();
    write_bytes(&options.out_root, &sidecar_path, &sidecar_json, &sheet.id)?;

    Ok(TargetProcessResult { image, variant_paths: vec![sidecar_path] })
}

/// Builds a variant's relative output path: `stem.suffix.ext`.
fn variant_path(out: &str, suffix: &str) -> String {
    match out.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}.{suffix}.{ext}"),
        None => format!("{out}.{suffix}"),
    }
}

/// Replaces `path`'s extension with `ext`.
fn replace_extension(path: &str, ext: &str) -> String {
    match path.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.{ext}"),
        None => format!("{path}.{ext}"),
    }
}

/// Resolves `relative` under `root` and writes `image`'s bytes there.
fn write_image(root: &Path, relative: &str, image: &RasterImage, target_id: &TargetId) -> Result<(), ProcessStageError> {
    write_bytes(root, relative, &image.bytes, target_id)
}

/// Resolves `relative` under `root` and writes `bytes` there, creating any
/// missing parent directories.
fn write_bytes(root: &Path, relative: &str, bytes: &[u8], target_id: &TargetId) -> Result<(), ProcessStageError> {
    let resolved = resolve_under_root(root, relative).map_err(|error| ProcessStageError::UnsafePath { target_id: target_id.clone(), code: path_safety_code(&error) })?;
    if let Some(parent) = resolved.parent() {
        fs::create_dir_all(parent).map_err(|source| ProcessStageError::Io { path: relative.to_string(), source })?;
    }
    fs::write(&resolved, bytes).map_err(|source| ProcessStageError::Io { path: relative.to_string(), source })
}

/// Maps a path-safety violation to this stage's stable error code.
const fn path_safety_code(error: &PathSafetyError) -> &'static str {
    match error {
        PathSafetyError::Empty => "process_out_path_empty",
        PathSafetyError::NullByte => "process_out_path_null_byte",
        PathSafetyError::Absolute => "process_out_path_absolute",
        PathSafetyError::Escapes => "process_out_path_escapes_root",
    }
}
