// crates/lootforge-generate/src/progress.rs
// ============================================================================
// Module: Generate Progress Reporting
// Description: The callback seam the orchestrator reports job lifecycle
//   events through, without depending on any particular renderer.
// Purpose: Let the CLI print one line per job and the service stream
//   structured progress, without the orchestrator knowing about either.
// ============================================================================

use lootforge_core::identifiers::ProviderName;
use lootforge_core::identifiers::RunId;
use lootforge_core::identifiers::TargetId;

/// One point in a generate run's lifecycle.
#[derive(Debug, Clone, Copy)]
pub enum ProgressEvent<'a> {
    /// The run has been assigned an id and is about to dispatch jobs.
    Prepare {
        /// The run's derived id.
        run_id: &'a RunId,
        /// Number of targets that will actually be dispatched (after any
        /// skip-locked filtering).
        target_count: usize,
    },
    /// A job is about to be attempted on `provider`.
    JobStart {
        /// The target whose job is starting.
        target_id: &'a TargetId,
        /// The provider this attempt targets.
        provider: ProviderName,
        /// Attempt number within this provider, starting at 1.
        attempt: u32,
    },
    /// A job attempt succeeded.
    JobFinish {
        /// The target whose job finished.
        target_id: &'a TargetId,
        /// The provider that produced the successful output.
        provider: ProviderName,
    },
    /// A job attempt failed.
    JobError {
        /// The target whose job failed.
        target_id: &'a TargetId,
        /// The provider that raised the failure.
        provider: ProviderName,
        /// The failure's stable error code.
        code: &'a str,
    },
    /// Every provider in a target's chain was exhausted without success.
    JobExhausted {
        /// The target whose job could not complete.
        target_id: &'a TargetId,
    },
}

/// Receives [`ProgressEvent`]s as the orchestrator runs.
pub trait ProgressSink: Send + Sync {
    /// Called synchronously at each lifecycle point; implementations must
    /// not block the caller for long.
    fn on_event(&self, event: ProgressEvent<'_>);
}

/// A [`ProgressSink`] that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn on_event(&self, _event: ProgressEvent<'_>) {}
}
