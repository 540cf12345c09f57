// crates/lootforge-core/src/domain/run_result.rs
// ============================================================================
// Module: Provider Run Result
// Description: The output of one successful job attempt.
// Purpose: Carry candidate outputs, scores, and provenance details from a
//   provider call back to the generate orchestrator.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A successful `run_job`/`run_edit_job` call returns a
//! [`ProviderRunResult`] naming every candidate file it wrote under the
//! run's raw directory. Scoring (C6) attaches a score and an acceptance
//! verdict to each [`CandidateOutput`] and marks exactly one `selected`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::ProviderName;
use crate::identifiers::TargetId;

// ============================================================================
// SECTION: Candidate Output
// ============================================================================

/// One generated candidate image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateOutput {
    /// Relative path to the candidate file under the run's raw directory.
    pub path: String,
    /// Size of the candidate file in bytes.
    pub byte_size: u64,
    /// Candidate width in pixels, if known.
    pub width: Option<u32>,
    /// Candidate height in pixels, if known.
    pub height: Option<u32>,
    /// Whether the candidate carries an alpha channel.
    pub has_alpha: bool,
    /// Whether any pixel in the candidate is actually transparent.
    pub has_transparent_pixel: bool,
    /// Base readability score (§4.6).
    pub score: f64,
    /// Whether the candidate passed hard acceptance checks.
    pub passed_acceptance: bool,
    /// Optional VLM-gate evaluation result.
    #[serde(default)]
    pub vlm_gate: Option<VlmGateResult>,
    /// Whether this candidate was chosen as the job's selected output.
    pub selected: bool,
}

/// Result of an optional VLM-gate evaluation (Open Question: rubric is
/// opaque, passed through verbatim).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VlmGateResult {
    /// Raw evaluator score.
    pub score: f64,
    /// Configured passing threshold.
    pub threshold: f64,
    /// Maximum possible score on the evaluator's scale.
    pub max_score: f64,
    /// Whether the candidate passed the gate.
    pub passed: bool,
    /// Evaluator's free-text reason.
    pub reason: String,
    /// Opaque rubric string, echoed back verbatim.
    #[serde(default)]
    pub rubric: Option<String>,
}

/// Report of a coarse-to-fine promotion pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoarseToFineReport {
    /// Number of draft candidates generated.
    pub draft_count: u32,
    /// Number of drafts promoted to the refinement pass.
    pub promoted_count: u32,
    /// Draft candidates discarded, with the reason each was dropped.
    pub discarded: Vec<DiscardedDraft>,
}

/// One draft candidate that did not advance past the coarse pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscardedDraft {
    /// Relative path to the discarded draft.
    pub path: String,
    /// Human-readable reason it was discarded.
    pub reason: String,
}

// ============================================================================
// SECTION: Run Result
// ============================================================================

/// Output of one successful `ProviderJob` attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRunResult {
    /// The target this result belongs to.
    pub target_id: TargetId,
    /// The provider that produced this result (may differ from the job's
    /// originally routed primary provider after a fallback walk).
    pub provider: ProviderName,
    /// Resolved model identifier, if any.
    pub model: Option<String>,
    /// Path to the primary (selected) output, after any copy-over to the
    /// canonical output path.
    pub primary_output_path: String,
    /// Every candidate produced for this job.
    pub candidates: Vec<CandidateOutput>,
    /// Optional coarse-to-fine report.
    #[serde(default)]
    pub coarse_to_fine: Option<CoarseToFineReport>,
    /// Generation mode used for this attempt.
    pub generation_mode: crate::domain::target::GenerationMode,
    /// Regeneration lineage, present only for edit-first regenerate runs.
    #[serde(default)]
    pub regeneration_source: Option<RegenerationSource>,
    /// Millisecond timestamp the job attempt started.
    pub started_at_millis: i64,
    /// Millisecond timestamp the job attempt finished.
    pub finished_at_millis: i64,
    /// Hash of the job's declared inputs.
    pub input_hash: String,
    /// Providers attempted before this one succeeded, in order, each with
    /// its recorded failure.
    #[serde(default)]
    pub attempts: Vec<JobAttempt>,
}

/// Lineage linking a regenerated job back to its selection-lock entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegenerationSource {
    /// The selection-lock entry's locked, resolved output path.
    pub lock_selected_output_path: String,
    /// The provider recorded in the original lock entry.
    pub lock_provider: ProviderName,
}

/// One recorded attempt in a provider/retry walk, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAttempt {
    /// The provider this attempt targeted.
    pub provider: ProviderName,
    /// 1-based attempt number within that provider's retry budget.
    pub attempt: u32,
    /// Outcome: `Ok(())` is never serialized as such; failures carry a code.
    pub outcome: AttemptOutcome,
}

/// Outcome of one provider attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The attempt succeeded.
    Success,
    /// The attempt failed with the given error code and message.
    Failure {
        /// Stable provider error code (e.g. `openai_http_error`).
        code: String,
        /// Human-readable failure detail.
        message: String,
    },
}

/// A job that exhausted every provider and retry in its chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    /// The target whose job failed.
    pub target_id: TargetId,
    /// The full attempted provider chain, in order.
    pub attempted_providers: Vec<ProviderName>,
    /// Every attempt made across the whole chain.
    pub attempts: Vec<JobAttempt>,
}
