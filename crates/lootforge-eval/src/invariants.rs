// crates/lootforge-eval/src/invariants.rs
// ============================================================================
// Module: Pack-Level Invariants
// Description: Checks that span the whole pack rather than one target:
//   runtime out-path uniqueness, per-profile texture budgets, and
//   spritesheet frame continuity.
// Purpose: Catch pack-wide regressions a single target's acceptance
//   report can't see on its own (§4.8 step 2). A violated invariant forces
//   every target it names ineligible, even if that target's own hard
//   gates otherwise passed (§4.9 eval-strictness example).
// Dependencies: lootforge-core
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use lootforge_core::contract::acceptance::AcceptanceReport;
use lootforge_core::contract::targets_index::TargetsIndex;
use lootforge_core::paths::uniqueness_key;

use crate::profile::ProfileWeights;

/// One pack-level invariant violation.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Stable machine-readable error code.
    pub code: &'static str,
    /// Human-readable detail.
    pub message: String,
    /// Target ids this violation forces ineligible.
    pub affected_targets: Vec<String>,
}

/// Runs every pack-level invariant check computed once across all targets.
#[must_use]
pub fn check_all(targets_index: &TargetsIndex, acceptance: &AcceptanceReport, profile_weights: &BTreeMap<String, ProfileWeights>) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    violations.extend(check_unique_runtime_out_paths(targets_index));
    violations.extend(check_texture_budgets(targets_index, acceptance, profile_weights));
    violations.extend(check_spritesheet_continuity(targets_index));
    violations
}

/// Collects the set of target ids forced ineligible by any violation in
/// `violations`.
#[must_use]
pub fn forced_ineligible(violations: &[InvariantViolation]) -> BTreeSet<String> {
    violations.iter().flat_map(|violation| violation.affected_targets.iter().cloned()).collect()
}

/// Every target's declared `out` path must still be unique; a regenerate
/// pass can have rewritten the index on disk since it was last planned.
fn check_unique_runtime_out_paths(targets_index: &TargetsIndex) -> Vec<InvariantViolation> {
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    let mut violations = Vec::new();
    for target in &targets_index.targets {
        let key = uniqueness_key(&target.out);
        if let Some(&first_id) = seen.get(&key) {
            violations.push(InvariantViolation {
                code: "duplicate_runtime_out_path",
                message: format!("target {} writes to the same runtime path as target {first_id}", target.id),
                affected_targets: vec![first_id.to_string(), target.id.as_str().to_string()],
            });
        } else {
            seen.insert(key, target.id.as_str());
        }
    }
    violations
}

/// Every target carrying an evaluation profile with a declared texture
/// budget must not push that profile's combined output size over budget.
fn check_texture_budgets(targets_index: &TargetsIndex, acceptance: &AcceptanceReport, profile_weights: &BTreeMap<String, ProfileWeights>) -> Vec<InvariantViolation> {
    let sizes: BTreeMap<&str, u64> = acceptance.targets.iter().map(|entry| (entry.target_id.as_str(), entry.file_size_bytes)).collect();
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    let mut members: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for target in &targets_index.targets {
        let Some(profile_name) = &target.evaluation_profile else { continue };
        let size = sizes.get(target.id.as_str()).copied().unwrap_or(0);
        *totals.entry(profile_name.as_str()).or_insert(0) += size;
        members.entry(profile_name.as_str()).or_default().push(target.id.as_str().to_string());
    }

    let mut violations = Vec::new();
    for (profile_name, total) in totals {
        let Some(weights) = profile_weights.get(profile_name) else { continue };
        if let Some(budget) = weights.texture_budget_bytes
            && total > budget
        {
            violations.push(InvariantViolation {
                code: "texture_budget_exceeded",
                message: format!("evaluation profile {profile_name} totals {total} bytes against a {budget}-byte budget"),
                affected_targets: members.remove(profile_name).unwrap_or_default(),
            });
        }
    }
    violations
}

/// Every spritesheet animation's frame indices must form a contiguous
/// `0..frame_count` run with no gaps.
fn check_spritesheet_continuity(targets_index: &TargetsIndex) -> Vec<InvariantViolation> {
    let mut by_sheet_and_animation: BTreeMap<(String, String), Vec<(u32, String)>> = BTreeMap::new();
    for target in &targets_index.targets {
        let Some(info) = &target.spritesheet else { continue };
        if info.is_sheet {
            continue;
        }
        let animation = info.animation_name.clone().unwrap_or_default();
        let Some(frame_index) = info.frame_index else { continue };
        by_sheet_and_animation.entry((info.sheet_id.as_str().to_string(), animation)).or_default().push((frame_index, target.id.as_str().to_string()));
    }

    let mut violations = Vec::new();
    for ((sheet_id, animation), members) in by_sheet_and_animation {
        let indices: BTreeSet<u32> = members.iter().map(|(index, _)| *index).collect();
        let expected: BTreeSet<u32> = (0..u32::try_from(indices.len()).unwrap_or(u32::MAX)).collect();
        if indices != expected {
            violations.push(InvariantViolation {
                code: "spritesheet_frame_gap",
                message: format!("sheet {sheet_id} animation {animation} has non-contiguous frame indices"),
                affected_targets: members.into_iter().map(|(_, target_id)| target_id).collect(),
            });
        }
    }
    violations
}
