// crates/lootforge-select/src/error.rs
// ============================================================================
// Module: Select Stage Error
// Description: The select stage's own failure shape.
// Purpose: Distinguish a contract-validation failure from a regenerate-time
//   path-safety rejection.
// Dependencies: lootforge-core, thiserror
// ============================================================================

use lootforge_core::contract::ContractError;
use lootforge_core::paths::PathSafetyError;
use thiserror::Error;

/// A failure raised while locking or regenerating a pack's selections.
#[derive(Debug, Error)]
pub enum SelectStageError {
    /// The assembled selection lock failed contract validation.
    #[error(transparent)]
    Contract(#[from] ContractError),
    /// A locked output path could not be safely resolved under the output
    /// root before being injected as a regenerate edit input.
    #[error("regenerate_unsafe_locked_path: {0}")]
    UnsafeLockedPath(#[from] PathSafetyError),
    /// The target named for regeneration has no prior lock entry to base
    /// an edit-first request on.
    #[error("regenerate_target_not_locked: target `{0}` has no approved selection-lock entry")]
    TargetNotLocked(String),
}
