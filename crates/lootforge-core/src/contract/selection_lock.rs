// crates/lootforge-core/src/contract/selection_lock.rs
// ============================================================================
// Module: Selection Lock Artifact
// Description: Schema for locks/selection-lock.json.
// Purpose: Durably record each target's approved output so a later run can
//   skip regeneration (`skipLocked`) and so provenance can link a
//   regenerate run back to what it replaced.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`SelectionLock`] entry is only ever written for a target that passed
//! eval's hard gates and was chosen by the select stage (C9). Re-running
//! with an unchanged `input_hash` and `skip_locked=true` (§4.9) makes the
//! select stage a no-op for that target.

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
use crate::identifiers::ProviderName;
use crate::identifiers::TargetId;

// ============================================================================
// SECTION: Entry
// ============================================================================

/// One target's locked selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockEntry {
    /// Always `true`; a target without an approved candidate has no entry.
    pub approved: bool,
    /// Hash of the inputs that produced this selection (prompt, size,
    /// provider, model, and any edit-input content).
    pub input_hash: String,
    /// Final resolved path to the selected output, relative to the output
    /// root.
    pub selected_output_path: String,
    /// Provider that produced the selected candidate.
    pub provider: ProviderName,
    /// Resolved model identifier, if any.
    pub model: Option<String>,
    /// Final eval score for the selected candidate.
    pub final_score: f64,
}

// ============================================================================
// SECTION: Document
// ============================================================================

/// The select stage's output document, keyed by target id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionLock {
    /// Schema version this document was written against.
    pub contract_version: String,
    /// Locked entries, keyed by target id string for stable JSON ordering.
    pub entries: BTreeMap<String, LockEntry>,
}

impl SelectionLock {
    /// Builds a new lock document stamped with the current contract
    /// version.
    #[must_use]
    pub fn new(entries: BTreeMap<String, LockEntry>) -> Self {
        Self {
            contract_version: STAGE_ARTIFACT_CONTRACT_VERSION.to_string(),
            entries,
        }
    }

    /// Looks up the lock entry for `target_id`, if any.
    #[must_use]
    pub fn get(&self, target_id: &TargetId) -> Option<&LockEntry> {
        self.entries.get(target_id.as_str())
    }
}

impl StageArtifact for SelectionLock {
    const KIND: ArtifactKind = ArtifactKind::SelectionLock;

    fn validate(&self) -> Result<(), Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        for (target_id, entry) in &self.entries {
            if !entry.approved {
                diagnostics.push(Diagnostic::new(
                    vec![PathSegment::Field("entries"), PathSegment::Key(target_id.clone())],
                    "unapproved_lock_entry",
                    format!("lock entry for `{target_id}` is present but not approved"),
                ));
            }
            if entry.selected_output_path.trim().is_empty() {
                diagnostics.push(Diagnostic::new(
                    vec![PathSegment::Field("entries"), PathSegment::Key(target_id.clone()), PathSegment::Field("selected_output_path")],
                    "empty_selected_output_path",
                    format!("lock entry for `{target_id}` has an empty selected_output_path"),
                ));
            }
        }
        if diagnostics.is_empty() { Ok(()) } else { Err(diagnostics) }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use std::collections::BTreeMap;

    use super::LockEntry;
    use super::SelectionLock;
    use crate::contract::StageArtifact;
    use crate::identifiers::ProviderName;
    use crate::identifiers::TargetId;

    fn entry() -> LockEntry {
        LockEntry {
            approved: true,
            input_hash: "h".to_string(),
            selected_output_path: "hero.png".to_string(),
            provider: ProviderName::Openai,
            model: None,
            final_score: 0.8,
        }
    }

    #[test]
    fn approved_entry_with_path_validates() {
        let mut entries = BTreeMap::new();
        entries.insert(TargetId::new("hero").as_str().to_string(), entry());
        let lock = SelectionLock::new(entries);
        assert!(lock.validate().is_ok());
    }

    #[test]
    fn unapproved_entry_is_rejected() {
        let mut entries = BTreeMap::new();
        let mut unapproved = entry();
        unapproved.approved = false;
        entries.insert(TargetId::new("hero").as_str().to_string(), unapproved);
        let lock = SelectionLock::new(entries);
        let diagnostics = lock.validate().unwrap_err();
        assert!(diagnostics.iter().any(|d| d.code == "unapproved_lock_entry"));
    }
}
