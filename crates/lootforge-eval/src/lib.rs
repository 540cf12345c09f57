// crates/lootforge-eval/src/lib.rs
// ============================================================================
// Module: LootForge Eval Stage
// Description: Scores processed candidates against soft-metric adapters
//   and pack-level invariants, producing the eval report (C8).
// Purpose: Crate root; re-exports the stage entry point and its supporting
//   types.
// Dependencies: lootforge-core, lootforge-config
// ============================================================================

//! ## Overview
//! The eval stage is the last read-only pass before selection locks a
//! target's output. It never mutates processed files; it only scores
//! them and records adapter health.

mod adapters;
mod error;
mod invariants;
mod profile;
mod scoring;
mod stage;

pub use adapters::AdapterInvocation;
pub use error::EvalStageError;
pub use invariants::InvariantViolation;
pub use profile::ProfileWeights;
pub use stage::EvalOptions;
pub use stage::EvalOutcome;
pub use stage::run;
