// crates/lootforge-select/src/lock.rs
// ============================================================================
// Module: Selection Lock Assembly
// Description: Builds a SelectionLock from one run's eval report and
//   provenance, merging with any prior lock the run is superseding.
// Purpose: The select stage's approval step (§4.9).
// Dependencies: lootforge-core
// ============================================================================

//! ## Overview
//! A target earns a lock entry only when [`EvalReport`] marks it
//! `eligible`. [`merge`] reconciles a freshly built lock against the prior
//! one on disk: a target touched by this run always uses its new entry, a
//! target this run never touched keeps its prior entry, and the rare case
//! where both exist for the same target resolves by highest `final_score`,
//! ties broken by the lexicographically smaller output path.

use std::collections::BTreeMap;

use lootforge_core::contract::eval::EvalReport;
use lootforge_core::contract::provenance::ProvenanceRun;
use lootforge_core::contract::selection_lock::LockEntry;
use lootforge_core::contract::selection_lock::SelectionLock;

/// Builds the lock entries this run's eligible targets earn.
///
/// Targets absent from `eval_report` (never dispatched, or dispatched and
/// found ineligible) get no entry.
#[must_use]
pub fn build(provenance: &ProvenanceRun, eval_report: &EvalReport) -> BTreeMap<String, LockEntry> {
    let mut entries = BTreeMap::new();
    for target_eval in &eval_report.targets {
        if !target_eval.eligible {
            continue;
        }
        let Some(job) = provenance.jobs.iter().find(|job| job.target_id == target_eval.target_id) else {
            continue;
        };
        entries.insert(
            target_eval.target_id.as_str().to_string(),
            LockEntry {
                approved: true,
                input_hash: job.input_hash.clone(),
                selected_output_path: job.primary_output_path.clone(),
                provider: job.provider,
                model: job.model.clone(),
                final_score: target_eval.final_score,
            },
        );
    }
    entries
}

/// Merges a freshly built set of entries with the prior lock document, if
/// one exists.
#[must_use]
pub fn merge(previous: Option<&SelectionLock>, fresh: BTreeMap<String, LockEntry>) -> SelectionLock {
    let mut merged: BTreeMap<String, LockEntry> = previous.map(|lock| lock.entries.clone()).unwrap_or_default();
    for (target_id, new_entry) in fresh {
        match merged.get(&target_id) {
            Some(existing) if !supersedes(&new_entry, existing) => {}
            _ => {
                merged.insert(target_id, new_entry);
            }
        }
    }
    SelectionLock::new(merged)
}

/// Whether `candidate` should replace `existing` for the same target:
/// higher score wins, a tie breaks on the lexicographically smaller path.
fn supersedes(candidate: &LockEntry, existing: &LockEntry) -> bool {
    match candidate.final_score.partial_cmp(&existing.final_score) {
        Some(std::cmp::Ordering::Greater) => true,
        Some(std::cmp::Ordering::Less) => false,
        _ => candidate.selected_output_path < existing.selected_output_path,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use super::merge;
    use lootforge_core::contract::selection_lock::LockEntry;
    use lootforge_core::contract::selection_lock::SelectionLock;
    use lootforge_core::identifiers::ProviderName;
    use std::collections::BTreeMap;

    fn entry(score: f64, path: &str) -> LockEntry {
        LockEntry { approved: true, input_hash: "h".to_string(), selected_output_path: path.to_string(), provider: ProviderName::Openai, model: None, final_score: score }
    }

    #[test]
    fn untouched_prior_entries_survive_a_merge() {
        let mut previous_entries = BTreeMap::new();
        previous_entries.insert("hero".to_string(), entry(0.5, "hero.png"));
        let previous = SelectionLock::new(previous_entries);

        let merged = merge(Some(&previous), BTreeMap::new());
        assert!(merged.entries.contains_key("hero"));
    }

    #[test]
    fn a_higher_scoring_fresh_entry_replaces_the_prior_one() {
        let mut previous_entries = BTreeMap::new();
        previous_entries.insert("hero".to_string(), entry(0.4, "hero_v1.png"));
        let previous = SelectionLock::new(previous_entries);

        let mut fresh = BTreeMap::new();
        fresh.insert("hero".to_string(), entry(0.9, "hero_v2.png"));

        let merged = merge(Some(&previous), fresh);
        assert_eq!(merged.entries["hero"].selected_output_path, "hero_v2.png");
    }

    #[test]
    fn a_lower_scoring_fresh_entry_does_not_replace_the_prior_one() {
        let mut previous_entries = BTreeMap::new();
        previous_entries.insert("hero".to_string(), entry(0.9, "hero_v1.png"));
        let previous = SelectionLock::new(previous_entries);

        let mut fresh = BTreeMap::new();
        fresh.insert("hero".to_string(), entry(0.4, "hero_v2.png"));

        let merged = merge(Some(&previous), fresh);
        assert_eq!(merged.entries["hero"].selected_output_path, "hero_v1.png");
    }
}
