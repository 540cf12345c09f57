// crates/lootforge-core/src/contract/acceptance.rs
// ============================================================================
// Module: Acceptance Report Artifact
// Description: Schema for checks/image-acceptance-report.json.
// Purpose: Record the process stage's per-target hard-check outcome.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! One [`TargetAcceptance`] entry per non-disabled processed target.
//! `issues` carries both `Error` and `Warning` level entries; only `Error`
//! issues block approval (eval stage, §4.9) or abort the process stage in
//! `strict` mode (§4.7).

// ============================================================================
// SECTION: Imports
// ============================================================================

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
// SECTION: Issues
// ============================================================================

/// Severity of an acceptance issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    /// Blocks approval; aborts the stage in `strict` mode.
    Error,
    /// Recorded but never blocks approval by itself.
    Warning,
}

/// One acceptance issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Severity.
    pub level: IssueLevel,
    /// Stable machine-readable code.
    pub code: String,
    /// Human-readable detail.
    pub message: String,
}

// ============================================================================
// SECTION: Boundary Quality
// ============================================================================

/// Optional boundary-quality metrics for alpha-edged assets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryQuality {
    /// Risk score for a light/dark halo around the alpha boundary.
    pub halo_risk: f64,
    /// Stray-noise pixel count outside the main silhouette.
    pub stray_noise: f64,
    /// Edge sharpness score.
    pub edge_sharpness: f64,
}

// ============================================================================
// SECTION: Per-target Acceptance
// ============================================================================

/// One target's hard-check outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetAcceptance {
    /// The target this entry describes.
    pub target_id: TargetId,
    /// Measured width in pixels.
    pub width: u32,
    /// Measured height in pixels.
    pub height: u32,
    /// Measured file size in bytes.
    pub file_size_bytes: u64,
    /// Whether the processed image carries an alpha channel.
    pub has_alpha: bool,
    /// Whether any pixel is actually transparent.
    pub has_transparent_pixel: bool,
    /// Optional boundary-quality metrics.
    #[serde(default)]
    pub boundary_quality: Option<BoundaryQuality>,
    /// Palette compliance score in `[0, 1]`, `1.0` meaning fully compliant.
    #[serde(default)]
    pub palette_compliance: Option<f64>,
    /// Tileable seam score, when applicable.
    #[serde(default)]
    pub seam_score: Option<f64>,
    /// Wrap-grid seam score, when applicable.
    #[serde(default)]
    pub wrap_grid_seam_score: Option<f64>,
    /// Issues raised for this target, error and warning level.
    pub issues: Vec<Issue>,
}

impl TargetAcceptance {
    /// Returns `true` when no `Error`-level issue was raised for this
    /// target (a hard gate pass).
    #[must_use]
    pub fn passed_hard_gates(&self) -> bool {
        !self.issues.iter().any(|issue| issue.level == IssueLevel::Error)
    }
}

// ============================================================================
// SECTION: Document
// ============================================================================

/// The process stage's acceptance document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceReport {
    /// Schema version this document was written against.
    pub contract_version: String,
    /// One entry per non-disabled processed target.
    pub targets: Vec<TargetAcceptance>,
}

impl AcceptanceReport {
    /// Builds a new report stamped with the current contract version.
    #[must_use]
    pub fn new(targets: Vec<TargetAcceptance>) -> Self {
        Self {
            contract_version: STAGE_ARTIFACT_CONTRACT_VERSION.to_string(),
            targets,
        }
    }
}

impl StageArtifact for AcceptanceReport {
    const KIND: ArtifactKind = ArtifactKind::AcceptanceReport;

    fn validate(&self) -> Result<(), Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        for (index, target) in self.targets.iter().enumerate() {
            if target.width == 0 || target.height == 0 {
                diagnostics.push(Diagnostic::new(
                    vec![PathSegment::Field("targets"), PathSegment::Index(index)],
                    "zero_dimension",
                    format!("target `{}` has a zero width or height", target.target_id),
                ));
            }
        }
        if diagnostics.is_empty() { Ok(()) } else { Err(diagnostics) }
    }
}
