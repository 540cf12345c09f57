// crates/lootforge-manifest/src/errors.rs
// ============================================================================
// Module: Manifest Errors
// Description: Structural and semantic manifest issues, and the planner's
//   top-level error.
// Purpose: Let `plan`/`validate` collect every issue in one pass instead of
//   failing on the first one (§4.2 step 1: "collect issues").
// Dependencies: thiserror
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Issue
// ============================================================================

/// Severity of a manifest issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueLevel {
    /// Fatal to planning/generation.
    Error,
    /// Recorded but never blocks planning by itself.
    Warning,
}

/// One structural or semantic manifest issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestIssue {
    /// Severity.
    pub level: IssueLevel,
    /// Stable machine-readable code, e.g. `duplicate_target_out`.
    pub code: &'static str,
    /// The target id this issue concerns, if any.
    pub target_id: Option<String>,
    /// Human-readable detail.
    pub message: String,
}

impl ManifestIssue {
    /// Builds an error-level issue.
    #[must_use]
    pub fn error(code: &'static str, target_id: impl Into<Option<String>>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            code,
            target_id: target_id.into(),
            message: message.into(),
        }
    }

    /// Builds a warning-level issue.
    #[must_use]
    pub fn warning(code: &'static str, target_id: impl Into<Option<String>>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            code,
            target_id: target_id.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Plan Error
// ============================================================================

/// Failure planning or validating a manifest.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The manifest failed structural or semantic validation; fatal to
    /// `plan`/`validate`.
    #[error("manifest invalid: {} issue(s), {} error(s)", .issues.len(), error_count(.issues))]
    ManifestInvalid {
        /// Every issue collected during validation, error and warning
        /// level.
        issues: Vec<ManifestIssue>,
    },
    /// The resulting targets-index failed its own C1 contract validation.
    #[error("planned targets-index failed contract validation: {0}")]
    ContractInvalid(#[from] lootforge_core::contract::ContractError),
}

fn error_count(issues: &[ManifestIssue]) -> usize {
    issues.iter().filter(|issue| issue.level == IssueLevel::Error).count()
}
