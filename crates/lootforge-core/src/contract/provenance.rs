// crates/lootforge-core/src/contract/provenance.rs
// ============================================================================
// Module: Provenance Run Artifact
// Description: Schema for provenance/run.json, the generate orchestrator's
//   output.
// Purpose: Record every job result and failure from one generate invocation,
//   sorted for byte-identical determinism.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A `ProvenanceRun` is written even when some jobs fail (§4.5 step 6: "the
//! run-provenance file, always"). Its `validate` enforces the ordering
//! invariant the spec's determinism property depends on: results and
//! failures must already be sorted by target id when the document is
//! written.

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
use crate::domain::run_result::JobFailure;
use crate::domain::run_result::ProviderRunResult;
use crate::identifiers::RunId;

// ============================================================================
// SECTION: Document
// ============================================================================

/// The generate orchestrator's output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceRun {
    /// Schema version this document was written against.
    pub contract_version: String,
    /// This invocation's run id.
    pub run_id: RunId,
    /// Hash of the targets-index file this run consumed.
    pub input_hash: String,
    /// Per-job successful results, sorted by target id.
    pub jobs: Vec<ProviderRunResult>,
    /// Per-job failures, sorted by target id.
    pub failures: Vec<JobFailure>,
    /// Target ids skipped because a valid selection-lock entry already
    /// approved them (`skipLocked=true`).
    #[serde(default)]
    pub skipped: Vec<String>,
    /// Millisecond timestamp the run started.
    pub started_at_millis: i64,
    /// Millisecond timestamp the run finished.
    pub finished_at_millis: i64,
}

impl ProvenanceRun {
    /// Builds a provenance document, stamped with the current contract
    /// version.
    #[must_use]
    #[allow(clippy::too_many_arguments, reason = "Mirrors the flat provenance document shape.")]
    pub fn new(
        run_id: RunId,
        input_hash: String,
        mut jobs: Vec<ProviderRunResult>,
        mut failures: Vec<JobFailure>,
        skipped: Vec<String>,
        started_at_millis: i64,
        finished_at_millis: i64,
    ) -> Self {
        jobs.sort_by(|a, b| a.target_id.as_str().cmp(b.target_id.as_str()));
        failures.sort_by(|a, b| a.target_id.as_str().cmp(b.target_id.as_str()));
        Self {
            contract_version: STAGE_ARTIFACT_CONTRACT_VERSION.to_string(),
            run_id,
            input_hash,
            jobs,
            failures,
            skipped,
            started_at_millis,
            finished_at_millis,
        }
    }
}

impl StageArtifact for ProvenanceRun {
    const KIND: ArtifactKind = ArtifactKind::ProvenanceRun;

    fn validate(&self) -> Result<(), Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        check_jobs_sorted(&self.jobs, &mut diagnostics);
        check_failures_sorted(&self.failures, &mut diagnostics);
        check_exactly_one_selected(&self.jobs, &mut diagnostics);
        if self.finished_at_millis < self.started_at_millis {
            diagnostics.push(Diagnostic::new(
                vec![PathSegment::Field("finished_at_millis")],
                "run_finished_before_started",
                "finished_at_millis is earlier than started_at_millis",
            ));
        }
        if diagnostics.is_empty() { Ok(()) } else { Err(diagnostics) }
    }
}

fn check_jobs_sorted(jobs: &[ProviderRunResult], diagnostics: &mut Diagnostics) {
    let keys: Vec<&str> = jobs.iter().map(|job| job.target_id.as_str()).collect();
    check_keys_sorted(&keys, "jobs", diagnostics);
}

fn check_failures_sorted(failures: &[JobFailure], diagnostics: &mut Diagnostics) {
    let keys: Vec<&str> = failures.iter().map(|failure| failure.target_id.as_str()).collect();
    check_keys_sorted(&keys, "failures", diagnostics);
}

fn check_keys_sorted(keys: &[&str], field: &'static str, diagnostics: &mut Diagnostics) {
    let mut sorted = keys.to_vec();
    sorted.sort_unstable();
    if keys != sorted {
        diagnostics.push(Diagnostic::new(vec![PathSegment::Field(field)], "not_sorted_by_target_id", format!("{field} must be sorted by target id")));
    }
}

fn check_exactly_one_selected(jobs: &[ProviderRunResult], diagnostics: &mut Diagnostics) {
    for (index, job) in jobs.iter().enumerate() {
        let selected_count = job.candidates.iter().filter(|candidate| candidate.selected).count();
        if selected_count != 1 {
            diagnostics.push(Diagnostic::new(
                vec![PathSegment::Field("jobs"), PathSegment::Index(index), PathSegment::Field("candidates")],
                "selected_candidate_count_invalid",
                format!("job for target `{}` has {selected_count} selected candidates, expected exactly 1", job.target_id),
            ));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use super::ProvenanceRun;
    use crate::contract::StageArtifact;
    use crate::domain::run_result::JobFailure;
    use crate::identifiers::ProviderName;
    use crate::identifiers::RunId;
    use crate::identifiers::TargetId;

    #[test]
    fn new_sorts_jobs_and_failures() {
        let failures = vec![
            JobFailure {
                target_id: TargetId::new("z"),
                attempted_providers: vec![ProviderName::Openai],
                attempts: Vec::new(),
            },
            JobFailure {
                target_id: TargetId::new("a"),
                attempted_providers: vec![ProviderName::Openai],
                attempts: Vec::new(),
            },
        ];
        let run = ProvenanceRun::new(RunId::new("run1"), "hash".to_string(), Vec::new(), failures, Vec::new(), 0, 10);
        assert!(run.validate().is_ok());
        assert_eq!(run.failures[0].target_id.as_str(), "a");
        assert_eq!(run.failures[1].target_id.as_str(), "z");
    }
}
