// crates/lootforge-select/src/stage.rs
// ============================================================================
// Module: Select Stage Entry Point
// Description: Builds, merges, and validates a run's selection lock.
// Purpose: The select stage's single public entry point for the approval
//   path (§4.9); regenerate is driven separately through `regenerate::run`.
// Dependencies: lootforge-core
// ============================================================================

use lootforge_core::contract::eval::EvalReport;
use lootforge_core::contract::provenance::ProvenanceRun;
use lootforge_core::contract::selection_lock::SelectionLock;

use crate::error::SelectStageError;
use crate::lock;

/// Builds this run's lock entries from `provenance`/`eval_report`, merges
/// them with `previous` (the prior lock on disk, if any), and validates
/// the result.
///
/// # Errors
///
/// Returns [`SelectStageError::Contract`] if the merged lock fails
/// contract validation (an unapproved or empty-path entry slipped in).
pub fn run(provenance: &ProvenanceRun, eval_report: &EvalReport, previous: Option<&SelectionLock>) -> Result<SelectionLock, SelectStageError> {
    let fresh = lock::build(provenance, eval_report);
    let merged = lock::merge(previous, fresh);
    lootforge_core::contract::validate(&merged)?;
    Ok(merged)
}
