// crates/lootforge-core/src/contract/eval.rs
// ============================================================================
// Module: Eval Report Artifact
// Description: Schema for eval/report.json.
// Purpose: Record the eval stage's final per-target scoring, including
//   consistency-group and hard-gate penalties and adapter health.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`EvalReport`] is the select stage's (C9) sole input besides the
//! targets index and selection-lock history. `adapter_health` exposes which
//! configured eval adapters actually ran, so a disabled or failed adapter
//! never silently drops its weight from the final score (§4.8).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::contract::ArtifactKind;
use crate::contract::Diagnostic;
use crate::contract::Diagnostics;
use crate::contract::PathSegment;
use crate::contract::STAGE_ARTIFACT_CONTRACT_VERSION;
use crate::contract::StageArtifact;
use crate::identifiers::TargetId;

// ============================================================================
// SECTION: Per-target Score
// ============================================================================

/// One adapter's contribution to a target's final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterMetric {
    /// Adapter name (e.g. `"readability"`, `"vlm_gate"`, `"palette"`).
    pub adapter: String,
    /// Raw metric value, on the adapter's own scale.
    pub value: f64,
    /// Weight applied to this metric in the final score combination.
    pub weight: f64,
}

/// The eval stage's final decision for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEval {
    /// The target this entry describes.
    pub target_id: TargetId,
    /// Combined final score after weighting, outlier penalty, and hard
    /// gates.
    pub final_score: f64,
    /// Per-adapter metrics that fed the final score.
    pub adapter_metrics: Vec<AdapterMetric>,
    /// Penalty subtracted for being a statistical outlier within its
    /// consistency group, `0.0` when not a member of one or not an
    /// outlier.
    pub consistency_outlier_penalty: f64,
    /// Penalty subtracted for failing a hard gate (acceptance `Error`
    /// issues), `0.0` when all hard gates passed.
    pub hard_gate_penalty: f64,
    /// Whether this target is eligible for selection after penalties.
    pub eligible: bool,
}

// ============================================================================
// SECTION: Adapter Health
// ============================================================================

/// Which eval adapters were configured, actually ran, and failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AdapterHealth {
    /// Adapter names present in configuration.
    pub configured: Vec<String>,
    /// Adapter names that ran to completion for at least one target.
    pub active: Vec<String>,
    /// Adapter names that errored and were excluded from scoring.
    pub failed: Vec<String>,
    /// Per-adapter invocation counts, keyed by adapter name.
    #[serde(default)]
    pub invocation_counts: BTreeMap<String, u64>,
}

// ============================================================================
// SECTION: Document
// ============================================================================

/// The eval stage's output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    /// Schema version this document was written against.
    pub contract_version: String,
    /// One entry per evaluated target.
    pub targets: Vec<TargetEval>,
    /// Adapter health summary for this run.
    pub adapter_health: AdapterHealth,
}

impl EvalReport {
    /// Builds a new report stamped with the current contract version.
    #[must_use]
    pub fn new(targets: Vec<TargetEval>, adapter_health: AdapterHealth) -> Self {
        Self {
            contract_version: STAGE_ARTIFACT_CONTRACT_VERSION.to_string(),
            targets,
            adapter_health,
        }
    }
}

impl StageArtifact for EvalReport {
    const KIND: ArtifactKind = ArtifactKind::EvalReport;

    fn validate(&self) -> Result<(), Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        for (index, target) in self.targets.iter().enumerate() {
            if !target.eligible && target.hard_gate_penalty == 0.0 && target.consistency_outlier_penalty == 0.0 {
                diagnostics.push(Diagnostic::new(
                    vec![PathSegment::Field("targets"), PathSegment::Index(index), PathSegment::Field("eligible")],
                    "ineligible_without_penalty",
                    format!("target `{}` is ineligible but carries no recorded penalty", target.target_id),
                ));
            }
        }
        for adapter in &self.adapter_health.active {
            if !self.adapter_health.configured.contains(adapter) {
                diagnostics.push(Diagnostic::new(
                    vec![PathSegment::Field("adapter_health"), PathSegment::Field("active")],
                    "active_adapter_not_configured",
                    format!("adapter `{adapter}` is active but not present in configured"),
                ));
            }
        }
        if diagnostics.is_empty() { Ok(()) } else { Err(diagnostics) }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use super::AdapterHealth;
    use super::EvalReport;
    use super::TargetEval;
    use crate::contract::StageArtifact;
    use crate::identifiers::TargetId;

    #[test]
    fn active_adapter_must_be_configured() {
        let report = EvalReport::new(
            vec![TargetEval {
                target_id: TargetId::new("hero"),
                final_score: 0.9,
                adapter_metrics: Vec::new(),
                consistency_outlier_penalty: 0.0,
                hard_gate_penalty: 0.0,
                eligible: true,
            }],
            AdapterHealth {
                configured: Vec::new(),
                active: vec!["readability".to_string()],
                failed: Vec::new(),
                invocation_counts: std::collections::BTreeMap::new(),
            },
        );
        let diagnostics = report.validate().unwrap_err();
        assert!(diagnostics.iter().any(|d| d.code == "active_adapter_not_configured"));
    }
}
