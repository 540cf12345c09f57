// crates/lootforge-service/src/contract_info.rs
// ============================================================================
// Module: Contract Introspection Endpoints
// Description: GET handlers reporting the stage artifact contract version
//   and the kinds of document validated against it.
// Purpose: Let a caller self-discover which wire format this deployment
//   speaks before POSTing a tool request (§10).
// Dependencies: axum, lootforge-core, serde
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use lootforge_core::contract::ArtifactKind;
use lootforge_core::contract::STAGE_ARTIFACT_CONTRACT_VERSION;
use serde::Serialize;

// ============================================================================
// SECTION: Response Bodies
// ============================================================================

/// Response body for `GET /v1/contract/version`.
#[derive(Debug, Serialize)]
pub struct ContractVersionResponse {
    /// The stage artifact contract version this deployment validates against.
    contract_version: &'static str,
}

/// Response body for `GET /v1/contract/kinds`.
#[derive(Debug, Serialize)]
pub struct ContractKindsResponse {
    /// The wire names of every artifact kind this deployment validates.
    kinds: Vec<&'static str>,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Returns the stage artifact contract version.
pub async fn contract_version() -> Json<ContractVersionResponse> {
    Json(ContractVersionResponse { contract_version: STAGE_ARTIFACT_CONTRACT_VERSION })
}

/// Returns the wire names of every artifact kind.
pub async fn contract_kinds() -> Json<ContractKindsResponse> {
    const KINDS: [ArtifactKind; 5] = [ArtifactKind::TargetsIndex, ArtifactKind::ProvenanceRun, ArtifactKind::AcceptanceReport, ArtifactKind::EvalReport, ArtifactKind::SelectionLock];
    Json(ContractKindsResponse { kinds: KINDS.iter().map(|kind| kind.as_str()).collect() })
}

#[cfg(test)]
mod tests {
    use super::contract_kinds;
    use super::contract_version;

    #[tokio::test]
    async fn version_matches_core_constant() {
        let response = contract_version().await;
        assert_eq!(response.0.contract_version, lootforge_core::contract::STAGE_ARTIFACT_CONTRACT_VERSION);
    }

    #[tokio::test]
    async fn kinds_lists_all_five() {
        let response = contract_kinds().await;
        assert_eq!(response.0.kinds.len(), 5);
        assert!(response.0.kinds.contains(&"targets-index"));
        assert!(response.0.kinds.contains(&"selection-lock"));
    }
}
