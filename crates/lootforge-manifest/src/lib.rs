// crates/lootforge-manifest/src/lib.rs
// ============================================================================
// Module: LootForge Manifest
// Description: The authored manifest model and the planner that normalizes
//   it into a validated targets index.
// Purpose: Own every concern of C2 — manifest validation, default
//   resolution, spritesheet expansion, and provider routing.
// Dependencies: lootforge-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `lootforge-manifest` is the only crate that understands the authored
//! manifest shape. Its output, a
//! `lootforge_core::contract::targets_index::TargetsIndex`, is the sole
//! artifact downstream crates consume — none of them ever see a
//! `Manifest` directly.

pub mod authored;
pub mod errors;
pub mod plan;

pub use errors::ManifestIssue;
pub use errors::PlanError;
pub use plan::PlanContext;
pub use plan::PlanOutcome;
pub use plan::plan;
pub use plan::validate;
