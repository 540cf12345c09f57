// crates/lootforge-core/src/contract/mod.rs
// ============================================================================
// Module: Stage Artifact Contract
// Description: Versioned schemas for every inter-stage JSON document plus a
//   single validation entry point with structured diagnostics.
// Purpose: Freeze the wire format each stage reads from and writes to so a
//   schema mismatch fails loudly at the stage boundary instead of silently
//   downstream.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Five kinds of document cross a stage boundary: `targets-index`,
//! `provenance-run`, `acceptance-report`, `eval-report`, `selection-lock`.
//! Each is modeled as a typed Rust struct (not a runtime JSON Schema —
//! see design note §9) implementing [`StageArtifact`]. Validation failures
//! carry a [`Diagnostics`] list, each entry a structured JSON-pointer
//! [`Diagnostic::path`] rather than a pre-formatted string, so a caller can
//! render it as `$.targets[3].acceptance.size` or as a list of segments.
//!
//! Bumping [`STAGE_ARTIFACT_CONTRACT_VERSION`] is the only supported way to
//! evolve the wire format (§6 of the spec): it is a single module-level
//! string, so any wire-format change is a one-line, reviewable diff.

pub mod acceptance;
pub mod eval;
pub mod provenance;
pub mod selection_lock;
pub mod targets_index;

#[cfg(test)]
mod tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde_json::Value;

// ============================================================================
// SECTION: Version
// ============================================================================

/// Version of the stage artifact wire format. Bump on any breaking change
/// to a schema below; the bump itself is the only supported migration path.
pub const STAGE_ARTIFACT_CONTRACT_VERSION: &str = "1.0.0";

// ============================================================================
// SECTION: Artifact Kinds
// ============================================================================

/// The five kinds of document validated through this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// `jobs/targets-index.json`, emitted by the planner.
    TargetsIndex,
    /// `provenance/run.json`, emitted by the generate orchestrator.
    ProvenanceRun,
    /// `checks/image-acceptance-report.json`, emitted by the process stage.
    AcceptanceReport,
    /// `checks/eval-report.json`, emitted by the eval stage.
    EvalReport,
    /// `locks/selection-lock.json`, emitted by select.
    SelectionLock,
}

impl ArtifactKind {
    /// Returns the kind's wire name, used in error messages and file
    /// discriminators.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TargetsIndex => "targets-index",
            Self::ProvenanceRun => "provenance-run",
            Self::AcceptanceReport => "acceptance-report",
            Self::EvalReport => "eval-report",
            Self::SelectionLock => "selection-lock",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Diagnostics
// ============================================================================

/// One segment of a JSON-pointer-style diagnostic path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A struct/object field name.
    Field(&'static str),
    /// An array index.
    Index(usize),
    /// A map key, used for documents keyed by target id rather than array
    /// index (e.g. the selection lock).
    Key(String),
}

/// A single schema validation failure.
///
/// # Invariants
/// - `path` is rooted at `$` (the document root) when rendered.
/// - `code` is a stable machine-readable identifier; `message` is for humans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Structured path from the document root to the offending value.
    pub path: Vec<PathSegment>,
    /// Stable error code, e.g. `missing_field`, `enum_mismatch`.
    pub code: &'static str,
    /// Human-readable explanation.
    pub message: String,
}

impl Diagnostic {
    /// Builds a diagnostic rooted at `$` with the given path segments.
    #[must_use]
    pub fn new(path: Vec<PathSegment>, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            path,
            code,
            message: message.into(),
        }
    }

    /// Renders `path` as a dotted/bracketed JSON pointer, e.g.
    /// `$.targets[3].acceptance.size`.
    #[must_use]
    pub fn rendered_path(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.path {
            match segment {
                PathSegment::Field(name) => {
                    out.push('.');
                    out.push_str(name);
                }
                PathSegment::Index(index) => {
                    out.push('[');
                    out.push_str(&index.to_string());
                    out.push(']');
                }
                PathSegment::Key(key) => {
                    out.push('[');
                    out.push('"');
                    out.push_str(key);
                    out.push('"');
                    out.push(']');
                }
            }
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.rendered_path(), self.code, self.message)
    }
}

/// A non-empty list of diagnostics. Every schema failure carries at least
/// one entry (spec §4.1 edge policy).
pub type Diagnostics = Vec<Diagnostic>;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure reading, parsing, or validating a stage artifact file.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// The file could not be read as UTF-8 or parsed as JSON.
    #[error("stage_artifact_json_invalid: {0}")]
    JsonInvalid(String),
    /// The decoded value failed schema validation.
    #[error("stage_artifact_contract_invalid: {} diagnostic(s) for {kind}", .diagnostics.len())]
    ContractInvalid {
        /// The kind that failed to validate.
        kind: ArtifactKind,
        /// The diagnostics explaining why.
        diagnostics: Diagnostics,
    },
}

// ============================================================================
// SECTION: Stage Artifact
// ============================================================================

/// A typed document that can validate itself and report its kind.
pub trait StageArtifact: serde::Serialize + serde::de::DeserializeOwned {
    /// The artifact kind this type represents.
    const KIND: ArtifactKind;

    /// Validates `self`'s invariants, returning diagnostics on failure.
    ///
    /// # Errors
    ///
    /// Returns a non-empty [`Diagnostics`] list when any invariant fails.
    fn validate(&self) -> Result<(), Diagnostics>;
}

/// Validates an already-decoded value against `T`'s schema.
///
/// # Errors
///
/// Returns [`ContractError::ContractInvalid`] when validation fails.
pub fn validate<T: StageArtifact>(value: &T) -> Result<(), ContractError> {
    value.validate().map_err(|diagnostics| ContractError::ContractInvalid {
        kind: T::KIND,
        diagnostics,
    })
}

/// Decodes `raw` as JSON into `T` and validates it, producing
/// `stage_artifact_json_invalid` on decode failure.
///
/// # Errors
///
/// Returns [`ContractError`] on decode or validation failure.
pub fn validate_json<T: StageArtifact>(raw: &Value) -> Result<T, ContractError> {
    let typed: T = serde_json::from_value(raw.clone()).map_err(|err| ContractError::JsonInvalid(err.to_string()))?;
    validate(&typed)?;
    Ok(typed)
}

/// Reads `path` as UTF-8, parses it as JSON, decodes it into `T`, and
/// validates it.
///
/// # Errors
///
/// Returns [`ContractError::JsonInvalid`] on I/O or parse failure and
/// [`ContractError::ContractInvalid`] on schema failure.
pub fn read_and_validate<T: StageArtifact>(path: &std::path::Path) -> Result<T, ContractError> {
    let raw = std::fs::read_to_string(path).map_err(|err| ContractError::JsonInvalid(format!("{}: {err}", path.display())))?;
    let value: Value = serde_json::from_str(&raw).map_err(|err| ContractError::JsonInvalid(format!("{}: {err}", path.display())))?;
    validate_json(&value)
}
