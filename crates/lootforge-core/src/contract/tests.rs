// crates/lootforge-core/src/contract/tests.rs
// ============================================================================
// Module: Contract Integration Tests
// Description: Cross-kind round-trip and versioning checks for the stage
//   artifact contract.
// Dependencies: serde_json
// ============================================================================

#![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]

use crate::contract::STAGE_ARTIFACT_CONTRACT_VERSION;
use crate::contract::selection_lock::SelectionLock;
use crate::contract::targets_index::TargetsIndex;
use crate::contract::validate;
use crate::contract::validate_json;

#[test]
fn targets_index_round_trips_through_json() {
    let index = TargetsIndex::new(Vec::new());
    let raw = serde_json::to_value(&index).unwrap();
    let decoded: TargetsIndex = validate_json(&raw).unwrap();
    assert_eq!(decoded, index);
}

#[test]
fn empty_selection_lock_validates() {
    let lock = SelectionLock::new(std::collections::BTreeMap::new());
    assert!(validate(&lock).is_ok());
}

#[test]
fn new_documents_are_stamped_with_the_current_contract_version() {
    let index = TargetsIndex::new(Vec::new());
    assert_eq!(index.contract_version, STAGE_ARTIFACT_CONTRACT_VERSION);
}
