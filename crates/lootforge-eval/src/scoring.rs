// crates/lootforge-eval/src/scoring.rs
// ============================================================================
// Module: Final Score Computation
// Description: Combines a target's selected-candidate score, its soft
//   adapter metrics, a consistency-group outlier penalty, and a hard-gate
//   penalty into the eval stage's final per-target score (§4.8).
// Purpose: Turn raw generate/process output into the single ranked number
//   select (C9) uses to promote or reject a candidate.
// Dependencies: lootforge-core, lootforge-config
// ============================================================================

//! ## Overview
//! `final_score = candidateScore·weight + adapterBonus·weight −
//! consistencyPenalty − 1000·hardGateErrorCount`. A target is `eligible`
//! exactly when it carries zero hard-gate errors; a consistency-group
//! outlier lowers its score without making it ineligible on its own.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use lootforge_config::adapter_config::AdapterMode;
use lootforge_config::adapter_config::AdapterName;
use lootforge_core::contract::acceptance::AcceptanceReport;
use lootforge_core::contract::acceptance::IssueLevel;
use lootforge_core::contract::eval::AdapterHealth;
use lootforge_core::contract::eval::AdapterMetric;
use lootforge_core::contract::eval::TargetEval;
use lootforge_core::contract::provenance::ProvenanceRun;
use lootforge_core::contract::targets_index::TargetsIndex;

use crate::adapters;
use crate::adapters::AdapterInvocation;
use crate::profile::ProfileWeights;

/// Penalty subtracted per hard-gate (`Error`-level acceptance issue).
const HARD_GATE_PENALTY_PER_ERROR: f64 = 1000.0;
/// Scale applied to a consistency group's per-target deviation from its
/// median once that deviation exceeds the group's warning threshold.
const CONSISTENCY_PENALTY_SCALE: f64 = 10.0;

/// Fixed weight an adapter's metric contributes to the weighted adapter
/// bonus. CLIP carries the most weight as the primary semantic-similarity
/// signal; LPIPS and SSIM contribute smaller perceptual corrections.
fn adapter_weight(name: AdapterName) -> f64 {
    match name {
        AdapterName::Clip => 0.5,
        AdapterName::Lpips => 0.3,
        AdapterName::Ssim => 0.2,
    }
}

/// Scores every target in `provenance`, producing one [`TargetEval`] per
/// job plus the run's [`AdapterHealth`] summary.
#[must_use]
pub fn score_all(
    targets_index: &TargetsIndex,
    provenance: &ProvenanceRun,
    acceptance: &AcceptanceReport,
    adapter_modes: &[(AdapterName, AdapterMode)],
    profile_weights: &BTreeMap<String, ProfileWeights>,
    consistency_thresholds: &BTreeMap<String, f64>,
    forced_ineligible: &BTreeSet<String>,
) -> (Vec<TargetEval>, AdapterHealth) {
    let candidate_scores = candidate_scores_by_target(provenance);
    let hard_gate_counts = hard_gate_error_counts(acceptance);
    let group_penalties = consistency_penalties(targets_index, &candidate_scores, consistency_thresholds);

    let mut health = AdapterHealth { configured: adapter_modes.iter().filter(|(_, mode)| !matches!(mode, AdapterMode::Unconfigured)).map(|(name, _)| name.as_str().to_string()).collect(), ..AdapterHealth::default() };

    let mut targets = Vec::with_capacity(provenance.jobs.len());
    for job in &provenance.jobs {
        let candidate_score = candidate_scores.get(job.target_id.as_str()).copied().unwrap_or(0.0);
        let mut hard_gate_errors = hard_gate_counts.get(job.target_id.as_str()).copied().unwrap_or(0);
        if forced_ineligible.contains(job.target_id.as_str()) {
            hard_gate_errors = hard_gate_errors.max(1);
        }
        let hard_gate_penalty = HARD_GATE_PENALTY_PER_ERROR * f64::from(hard_gate_errors);
        let consistency_outlier_penalty = group_penalties.get(job.target_id.as_str()).copied().unwrap_or(0.0);

        let invocation = AdapterInvocation { target_id: &job.target_id, candidate_path: &job.primary_output_path };
        let adapter_metrics = run_adapters(&invocation, adapter_modes, &mut health);
        let adapter_bonus = weighted_adapter_bonus(&adapter_metrics);

        let weights = targets_index
            .targets
            .iter()
            .find(|target| target.id == job.target_id)
            .and_then(|target| target.evaluation_profile.as_deref())
            .and_then(|name| profile_weights.get(name))
            .copied()
            .unwrap_or_default();

        let final_score = candidate_score * weights.candidate_score_weight + adapter_bonus * weights.adapter_bonus_weight - consistency_outlier_penalty - hard_gate_penalty;

        targets.push(TargetEval {
            target_id: job.target_id.clone(),
            final_score,
            adapter_metrics,
            consistency_outlier_penalty,
            hard_gate_penalty,
            eligible: hard_gate_penalty == 0.0,
        });
    }

    (targets, health)
}

/// Maps each target id to its selected candidate's base score.
fn candidate_scores_by_target(provenance: &ProvenanceRun) -> BTreeMap<&str, f64> {
    provenance.jobs.iter().filter_map(|job| job.candidates.iter().find(|candidate| candidate.selected).map(|candidate| (job.target_id.as_str(), candidate.score))).collect()
}

/// Maps each target id to its count of `Error`-level acceptance issues.
fn hard_gate_error_counts(acceptance: &AcceptanceReport) -> BTreeMap<&str, u32> {
    acceptance.targets.iter().map(|entry| (entry.target_id.as_str(), u32::try_from(entry.issues.iter().filter(|issue| issue.level == IssueLevel::Error).count()).unwrap_or(u32::MAX))).collect()
}

/// Invokes every configured adapter for one candidate, recording health
/// and folding failures into `Err` skips rather than aborting the run.
fn run_adapters(invocation: &AdapterInvocation<'_>, adapter_modes: &[(AdapterName, AdapterMode)], health: &mut AdapterHealth) -> Vec<AdapterMetric> {
    let mut metrics = Vec::new();
    for (name, mode) in adapter_modes {
        if matches!(mode, AdapterMode::Unconfigured) {
            continue;
        }
        let adapter_name = name.as_str().to_string();
        *health.invocation_counts.entry(adapter_name.clone()).or_insert(0) += 1;
        match adapters::invoke(mode, invocation) {
            Ok(value) => {
                if !health.active.contains(&adapter_name) {
                    health.active.push(adapter_name.clone());
                }
                metrics.push(AdapterMetric { adapter: adapter_name, value, weight: adapter_weight(*name) });
            }
            Err(_) => {
                if !health.failed.contains(&adapter_name) {
                    health.failed.push(adapter_name);
                }
            }
        }
    }
    metrics
}

/// Weighted average of a target's adapter metrics, `0.0` when none ran.
fn weighted_adapter_bonus(metrics: &[AdapterMetric]) -> f64 {
    let total_weight: f64 = metrics.iter().map(|metric| metric.weight).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    metrics.iter().map(|metric| metric.value * metric.weight).sum::<f64>() / total_weight
}

/// Computes each consistency-group member's deviation penalty: `0.0`
/// below the group's warning threshold, otherwise the excess deviation
/// from the group's median score scaled by [`CONSISTENCY_PENALTY_SCALE`].
fn consistency_penalties(targets_index: &TargetsIndex, candidate_scores: &BTreeMap<&str, f64>, consistency_thresholds: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let mut groups: BTreeMap<&str, Vec<(&str, f64)>> = BTreeMap::new();
    for target in &targets_index.targets {
        let Some(group) = &target.consistency_group else { continue };
        let Some(score) = candidate_scores.get(target.id.as_str()) else { continue };
        groups.entry(group.as_str()).or_default().push((target.id.as_str(), *score));
    }

    let mut penalties = BTreeMap::new();
    for (group, members) in groups {
        let threshold = consistency_thresholds.get(group).copied().unwrap_or(0.1);
        let median = median_of(members.iter().map(|(_, score)| *score).collect());
        for (target_id, score) in members {
            let deviation = (score - median).abs();
            if deviation > threshold {
                penalties.insert(target_id.to_string(), (deviation - threshold) * CONSISTENCY_PENALTY_SCALE);
            }
        }
    }
    penalties
}

/// Median of an unsorted sample, `0.0` for an empty sample.
fn median_of(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 { (values[mid - 1] + values[mid]) / 2.0 } else { values[mid] }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use super::median_of;
    use super::weighted_adapter_bonus;
    use lootforge_core::contract::eval::AdapterMetric;

    #[test]
    fn median_of_even_sample_averages_the_middle_pair() {
        assert!((median_of(vec![1.0, 2.0, 3.0, 4.0]) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn weighted_bonus_is_zero_with_no_metrics() {
        assert_eq!(weighted_adapter_bonus(&[]), 0.0);
    }

    #[test]
    fn weighted_bonus_averages_by_weight() {
        let metrics = vec![
            AdapterMetric { adapter: "clip".to_string(), value: 1.0, weight: 0.5 },
            AdapterMetric { adapter: "ssim".to_string(), value: 0.0, weight: 0.2 },
        ];
        let bonus = weighted_adapter_bonus(&metrics);
        assert!((bonus - (0.5 / 0.7)).abs() < 1e-9);
    }
}
