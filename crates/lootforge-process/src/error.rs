// crates/lootforge-process/src/error.rs
// ============================================================================
// Module: Process Error
// Description: The failure shape raised by a post-process pipeline step.
// Purpose: Let the process stage abort (strict mode) or keep going (issue
//   mode) on the same error shape regardless of which step failed.
// Dependencies: lootforge-core, thiserror
// ============================================================================

use lootforge_core::identifiers::TargetId;
use thiserror::Error;

/// A failure raised while post-processing one target's selected candidate.
#[derive(Debug, Clone, Error)]
#[error("{target_id}: {code}: {message}")]
pub struct ProcessError {
    /// The target being processed when the failure occurred.
    pub target_id: TargetId,
    /// Stable machine-readable error code, e.g. `resize_dimensions_invalid`.
    pub code: String,
    /// Human-readable detail.
    pub message: String,
}

impl ProcessError {
    /// Builds a process error for `target_id`.
    #[must_use]
    pub fn new(target_id: TargetId, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { target_id, code: code.into(), message: message.into() }
    }
}
