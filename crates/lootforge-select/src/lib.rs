// crates/lootforge-select/src/lib.rs
// ============================================================================
// Module: LootForge Select Stage
// Description: Locks eligible targets' approved selections and drives
//   regenerate requests for a named subset (C9).
// Purpose: Crate root; re-exports the lock and regenerate entry points.
// Dependencies: lootforge-core, lootforge-generate
// ============================================================================

mod error;
mod lock;
mod regenerate;
mod stage;

pub use error::SelectStageError;
pub use lock::build;
pub use lock::merge;
pub use regenerate::plan;
pub use regenerate::run as run_regenerate;
pub use stage::run;
