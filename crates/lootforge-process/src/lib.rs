// crates/lootforge-process/src/lib.rs
// ============================================================================
// Module: LootForge Process
// Description: The process stage: post-process pipeline, spritesheet
//   assembly, and acceptance-report/catalog emission.
// Purpose: Turn a generate run's selected candidates into final pack
//   assets (§4.7/§4.8).
// Dependencies: lootforge-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`stage::run`] is the entry point: for every generation-enabled target
//! it reads the selected candidate recorded in a
//! [`lootforge_core::contract::provenance::ProvenanceRun`], drives it
//! through [`pipeline::run_pipeline`], and writes the result. Spritesheet
//! sheet targets are assembled afterward from their processed sibling
//! frames via [`spritesheet`]. The result is an
//! [`lootforge_core::contract::acceptance::AcceptanceReport`] plus an
//! output [`stage::Catalog`].

pub mod acceptance;
pub mod error;
pub mod pipeline;
pub mod raster;
pub mod spritesheet;
pub mod stage;

pub use error::ProcessError;
pub use stage::Catalog;
pub use stage::ProcessOptions;
pub use stage::ProcessOutcome;
pub use stage::ProcessStageError;
pub use stage::run;
