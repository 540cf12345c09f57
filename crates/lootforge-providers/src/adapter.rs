// crates/lootforge-providers/src/adapter.rs
// ============================================================================
// Module: Provider Adapter Interface
// Description: The trait every concrete provider implements.
// Purpose: Let the generate orchestrator call any provider uniformly,
//   without knowing its wire protocol (§4.3).
// Dependencies: lootforge-core
// ============================================================================

//! ## Overview
//! A [`Provider`] owns exactly one concern: turning a [`ProviderJob`] into
//! a [`RawJobOutput`], or a normalized [`ProviderError`] when it can't.
//! `prepare_jobs` and `supports` have default implementations driven by
//! [`lootforge_core::capabilities`], so a concrete adapter only has to
//! implement `name` and `run_job`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use lootforge_core::capabilities::Feature;
use lootforge_core::capabilities::ProviderCapabilities;
use lootforge_core::capabilities::capabilities_for;
use lootforge_core::domain::job::ProviderJob;
use lootforge_core::domain::job::RetryFallbackDirective;
use lootforge_core::domain::raw_output::RawJobOutput;
use lootforge_core::domain::target::EditSpec;
use lootforge_core::domain::target::PlannedTarget;
use lootforge_core::identifiers::ProviderName;

use lootforge_config::provider_config::ProviderRuntimeConfig;

use crate::error::ProviderError;
use crate::transport::ProviderTransport;

// ============================================================================
// SECTION: Contexts
// ============================================================================

/// Inputs needed to build a [`ProviderJob`] from a [`PlannedTarget`].
#[derive(Debug, Clone)]
pub struct PrepareContext {
    /// Hash of the job's declared inputs; `""` for text-to-image jobs.
    pub input_hash: String,
    /// Retry/fallback directive carried onto the built job.
    pub retry: RetryFallbackDirective,
}

/// Inputs a provider needs to actually execute a job.
pub struct RunContext<'a> {
    /// Directory raw candidate files are written under.
    pub raw_output_dir: &'a Path,
    /// Resolved runtime configuration (endpoint, timeout, API key, ...).
    pub config: &'a ProviderRuntimeConfig,
    /// The HTTP boundary this call goes through.
    pub transport: &'a dyn ProviderTransport,
}

// ============================================================================
// SECTION: Provider Trait
// ============================================================================

/// A concrete image-generation backend.
pub trait Provider: Send + Sync {
    /// This adapter's provider name.
    fn name(&self) -> ProviderName;

    /// This adapter's capability record; defaults to the shared static
    /// table so adapters never hand-roll a diverging record.
    fn capabilities(&self) -> ProviderCapabilities {
        capabilities_for(self.name())
    }

    /// Whether this adapter supports `feature`.
    fn supports(&self, feature: Feature) -> bool {
        self.capabilities().supports(feature)
    }

    /// Builds the jobs `target` requires on this provider. The default
    /// implementation builds exactly one job via
    /// [`ProviderJob::for_target`]; an adapter only needs to override this
    /// when a target demands more than one job per provider.
    fn prepare_jobs(&self, target: &PlannedTarget, ctx: &PrepareContext) -> Vec<ProviderJob> {
        vec![ProviderJob::for_target(target, self.name(), ctx.input_hash.clone(), ctx.retry.clone())]
    }

    /// Executes a text-to-image job, writing candidates under
    /// `ctx.raw_output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on any transport failure, missing
    /// configuration, or malformed response.
    fn run_job(&self, job: &ProviderJob, ctx: &RunContext<'_>) -> Result<RawJobOutput, ProviderError>;

    /// Executes an edit-first job. The default implementation reports
    /// `<provider>_edit_unsupported_model`; providers that support edits
    /// override this.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on any transport failure, missing
    /// configuration, malformed response, or (by default) unsupported
    /// edit mode.
    fn run_edit_job(&self, job: &ProviderJob, edit: &EditSpec, ctx: &RunContext<'_>) -> Result<RawJobOutput, ProviderError> {
        let _ = (job, edit, ctx);
        Err(ProviderError::actionable(
            self.name(),
            format!("{}_edit_unsupported_model", self.name().as_str()),
            "this provider does not support edit-first generation",
        ))
    }
}
