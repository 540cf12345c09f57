// crates/lootforge-core/src/domain/raw_output.rs
// ============================================================================
// Module: Raw Job Output
// Description: The unscored output of one provider call, before C6 scoring.
// Purpose: Let a `Provider::run_job` implementation hand candidate files
//   back to the generate orchestrator without depending on the scoring
//   crate, and without the scoring crate depending on the provider crate.
// Dependencies: none
// ============================================================================

//! ## Overview
//! A provider adapter only knows what it wrote to disk; it has no opinion
//! on acceptance or scoring. [`RawJobOutput`] carries exactly that: file
//! paths and measured facts. The generate orchestrator pairs each
//! candidate with a [`crate::domain::run_result::CandidateOutput`] once
//! C6 has scored it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::domain::target::GenerationMode;

// ============================================================================
// SECTION: Raw Candidate
// ============================================================================

/// One candidate file a provider adapter wrote to the run's raw directory.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCandidate {
    /// Path to the candidate file, relative to the run's raw directory.
    pub path: String,
    /// Size of the written file in bytes.
    pub byte_size: u64,
    /// Width in pixels, when the adapter can determine it without a full
    /// image decode.
    pub width: Option<u32>,
    /// Height in pixels, when the adapter can determine it without a full
    /// image decode.
    pub height: Option<u32>,
    /// Whether the candidate carries an alpha channel.
    pub has_alpha: bool,
    /// Whether any pixel in the candidate is actually transparent.
    pub has_transparent_pixel: bool,
}

// ============================================================================
// SECTION: Raw Job Output
// ============================================================================

/// The unscored output of one successful `run_job`/`run_edit_job` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RawJobOutput {
    /// Resolved model identifier, if any.
    pub model: Option<String>,
    /// Every candidate file the call produced, in request order.
    pub candidates: Vec<RawCandidate>,
    /// Generation mode this call executed under.
    pub generation_mode: GenerationMode,
}
