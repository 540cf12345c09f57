// crates/lootforge-core/src/lib.rs
// ============================================================================
// Module: LootForge Core
// Description: Shared domain types, identifiers, hashing, path safety, and the
//   stage artifact contract used by every LootForge pipeline stage.
// Purpose: Give the planner, generate, process, eval and select stages a
//   single, versioned vocabulary for the documents that cross stage
//   boundaries.
// Dependencies: serde, serde_jcs, serde_json, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! `lootforge-core` has no knowledge of manifests, providers, or image
//! kernels. It holds only what every stage must agree on: identifiers,
//! deterministic hashing, output-root path safety, and the five
//! stage-artifact schemas (targets-index, provenance-run,
//! acceptance-report, eval-report, selection-lock) together with their
//! shared domain records (`PlannedTarget`, `ProviderJob`, ...).
//!
//! No component in this crate reads the wall clock directly; callers
//! thread a [`time::Clock`] through anything that needs "now".

pub mod capabilities;
pub mod contract;
pub mod domain;
pub mod hashing;
pub mod identifiers;
pub mod paths;
pub mod time;

pub use contract::ArtifactKind;
pub use contract::ContractError;
pub use contract::Diagnostic;
pub use contract::Diagnostics;
pub use contract::STAGE_ARTIFACT_CONTRACT_VERSION;
pub use contract::StageArtifact;
