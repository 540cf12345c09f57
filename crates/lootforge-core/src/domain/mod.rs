// crates/lootforge-core/src/domain/mod.rs
// ============================================================================
// Module: LootForge Domain Records
// Description: Shared building-block types embedded in the stage artifacts.
// Purpose: Give PlannedTarget, ProviderJob, and ProviderRunResult one
//   definition every stage crate depends on instead of redefining them.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! These types are the nouns of the pipeline: a [`target::PlannedTarget`]
//! is what the planner (C2) produces and every later stage consumes
//! read-only; a [`job::ProviderJob`] is what the generate orchestrator (C5)
//! dispatches; a [`run_result::ProviderRunResult`] is what a successful
//! attempt returns. None of them know how to validate a whole document —
//! that's [`crate::contract`]'s job — they only know their own shape.

pub mod job;
pub mod raw_output;
pub mod run_result;
pub mod target;

pub use job::ProviderJob;
pub use job::RetryFallbackDirective;
pub use raw_output::RawCandidate;
pub use raw_output::RawJobOutput;
pub use run_result::CandidateOutput;
pub use run_result::CoarseToFineReport;
pub use run_result::ProviderRunResult;
pub use target::AcceptancePolicy;
pub use target::Background;
pub use target::EditInput;
pub use target::EditRole;
pub use target::EditSpec;
pub use target::GenerationPolicy;
pub use target::OutputFormat;
pub use target::PlannedTarget;
pub use target::PostProcessPolicy;
pub use target::PromptSpec;
pub use target::ResizeAlgorithm;
pub use target::RuntimeSpec;
pub use target::SpritesheetInfo;
pub use target::TargetKind;
