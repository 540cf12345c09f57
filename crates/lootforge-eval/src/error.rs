// crates/lootforge-eval/src/error.rs
// ============================================================================
// Module: Eval Stage Error
// Description: The eval stage's own failure shape.
// Purpose: Distinguish a contract-validation failure from a pack-invariant
//   violation, so strict mode can report which one aborted the run.
// Dependencies: lootforge-core, thiserror
// ============================================================================

use lootforge_core::contract::ContractError;
use thiserror::Error;

/// A failure raised while scoring and validating a pack's eval report.
#[derive(Debug, Error)]
pub enum EvalStageError {
    /// The eval report itself failed contract validation.
    #[error(transparent)]
    Contract(#[from] ContractError),
    /// A pack-level invariant (duplicate runtime paths, a texture budget,
    /// spritesheet frame continuity) was violated.
    #[error("{code}: {message}")]
    PackInvariant {
        /// Stable machine-readable error code.
        code: &'static str,
        /// Human-readable detail.
        message: String,
    },
}
