// crates/lootforge-eval/src/stage.rs
// ============================================================================
// Module: Eval Stage Entry Point
// Description: Runs pack-level invariants and per-target scoring to
//   produce a validated EvalReport.
// Purpose: The eval stage's single public entry point (§4.8).
// Dependencies: lootforge-core, lootforge-config
// ============================================================================

use std::collections::BTreeMap;

use lootforge_config::adapter_config::AdapterMode;
use lootforge_config::adapter_config::AdapterName;
use lootforge_core::contract::acceptance::AcceptanceReport;
use lootforge_core::contract::eval::EvalReport;
use lootforge_core::contract::provenance::ProvenanceRun;
use lootforge_core::contract::targets_index::TargetsIndex;

use crate::error::EvalStageError;
use crate::invariants;
use crate::profile::ProfileWeights;
use crate::scoring;

/// Inputs the eval stage needs beyond the three stage-artifact documents.
pub struct EvalOptions {
    /// How each soft-metric adapter is invoked this run.
    pub adapter_modes: Vec<(AdapterName, AdapterMode)>,
    /// Per-evaluation-profile score weights, keyed by profile name.
    pub profile_weights: BTreeMap<String, ProfileWeights>,
    /// Per-consistency-group warning thresholds, keyed by group name.
    pub consistency_thresholds: BTreeMap<String, f64>,
    /// Abort on the first pack-invariant violation instead of continuing.
    pub strict: bool,
}

/// Pack invariant violations collected when `strict` is `false`.
pub struct EvalOutcome {
    /// The stage's validated output document.
    pub report: EvalReport,
    /// Non-fatal pack-invariant violations recorded during this run.
    pub warnings: Vec<invariants::InvariantViolation>,
}

/// Runs the eval stage: pack invariants, then per-target scoring, then
/// contract validation of the resulting report.
///
/// # Errors
///
/// Returns [`EvalStageError::PackInvariant`] in `strict` mode on the
/// first invariant violation, or [`EvalStageError::Contract`] if the
/// assembled report itself fails validation.
pub fn run(targets_index: &TargetsIndex, provenance: &ProvenanceRun, acceptance: &AcceptanceReport, options: &EvalOptions) -> Result<EvalOutcome, EvalStageError> {
    let violations = invariants::check_all(targets_index, acceptance, &options.profile_weights);
    if options.strict && let Some(first) = violations.first() {
        return Err(EvalStageError::PackInvariant { code: first.code, message: first.message.clone() });
    }
    let forced_ineligible = invariants::forced_ineligible(&violations);

    let (targets, adapter_health) = scoring::score_all(targets_index, provenance, acceptance, &options.adapter_modes, &options.profile_weights, &options.consistency_thresholds, &forced_ineligible);
    let report = EvalReport::new(targets, adapter_health);
    lootforge_core::contract::validate(&report)?;

    Ok(EvalOutcome { report, warnings: violations })
}
