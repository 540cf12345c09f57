// crates/lootforge-generate/src/lib.rs
// ============================================================================
// Module: LootForge Generate
// Description: The generate orchestrator (job dispatch, retry/fallback,
//   rate limiting) and candidate scoring/selection.
// Purpose: Turn a validated targets index into a provenance run, by driving
//   every planned target's provider job to completion and picking exactly
//   one winning candidate per job (§4.3-§4.6).
// Dependencies: lootforge-core, lootforge-providers, tokio
// ============================================================================

//! ## Overview
//! [`orchestrator::run`] is the single entry point: given a
//! [`lootforge_core::contract::targets_index::TargetsIndex`] and a
//! [`GenerateContext`], it dispatches one job per eligible target through a
//! configured [`lootforge_providers::ProviderRegistry`], retrying and
//! falling back per target, and returns a complete
//! [`lootforge_core::contract::provenance::ProvenanceRun`] even when some
//! targets fail outright. [`scoring`] turns each provider's raw candidates
//! into scored, selected [`lootforge_core::domain::run_result::CandidateOutput`]s.

pub mod orchestrator;
pub mod progress;
pub mod scoring;

pub use orchestrator::GenerateContext;
pub use orchestrator::run;
pub use progress::NullProgressSink;
pub use progress::ProgressEvent;
pub use progress::ProgressSink;
