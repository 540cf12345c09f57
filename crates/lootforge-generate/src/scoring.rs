// crates/lootforge-generate/src/scoring.rs
// ============================================================================
// Module: Candidate Scoring & Selection
// Description: Scores raw provider candidates, applies the optional
//   coarse-to-fine draft filter, and picks exactly one winner per job.
// Purpose: Turn a provider's unscored RawJobOutput into the CandidateOutput
//   list a ProvenanceRun carries, with exactly one `selected: true` (§4.6).
// Dependencies: lootforge-core
// ============================================================================

//! ## Overview
//! Scoring happens in three layers, each optional except the first:
//! 1. [`score_candidate`]/[`passes_acceptance`] always run, producing a
//!    base score and a hard acceptance verdict from the target's
//!    acceptance policy.
//! 2. A VLM gate runs when `generation_policy.vlm_gate_threshold` is set,
//!    reusing the base score as the opaque rubric's metric (no vision
//!    model is wired up here; see `DESIGN.md` for this Open Question's
//!    resolution).
//! 3. Coarse-to-fine promotion runs when `generation_policy.coarse_to_fine`
//!    is set, ranking candidates and discarding everything outside
//!    `promote_top_k` or below `min_draft_score` (and, if
//!    `require_draft_acceptance`, anything that failed acceptance).
//!
//! [`select_one`] then applies the three-step selection rule over whatever
//! survives: prefer acceptance-eligible candidates, break ties by score,
//! break remaining ties by output path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::collections::BTreeSet;

use lootforge_core::domain::raw_output::RawCandidate;
use lootforge_core::domain::raw_output::RawJobOutput;
use lootforge_core::domain::run_result::CandidateOutput;
use lootforge_core::domain::run_result::CoarseToFineReport;
use lootforge_core::domain::run_result::DiscardedDraft;
use lootforge_core::domain::run_result::VlmGateResult;
use lootforge_core::domain::target::CoarseToFinePolicy;
use lootforge_core::domain::target::PlannedTarget;

// ============================================================================
// SECTION: Base scoring
// ============================================================================

/// Scores one raw candidate against `target`'s acceptance policy.
///
/// The score rewards alpha conformance, transparent-pixel presence when
/// alpha is required, measured-dimension conformance, and economy against
/// the file-size budget. Every component is additive and the result is
/// clamped to `[0.0, 1.0]`.
#[must_use]
pub fn score_candidate(candidate: &RawCandidate, target: &PlannedTarget) -> f64 {
    let mut score = 0.5_f64;

    if target.acceptance.alpha == candidate.has_alpha {
        score += 0.2;
    }
    if target.acceptance.alpha && candidate.has_transparent_pixel {
        score += 0.1;
    }

    if let (Some(width), Some(height)) = (candidate.width, candidate.height)
        && width == target.acceptance.width
        && height == target.acceptance.height
    {
        score += 0.1;
    }

    let budget_bytes = u64::from(target.acceptance.max_file_size_kb) * 1024;
    if budget_bytes > 0 {
        let ratio = (candidate.byte_size as f64 / budget_bytes as f64).min(1.0);
        score += (1.0 - ratio) * 0.1;
    }

    score.clamp(0.0, 1.0)
}

/// Whether `candidate` passes `target`'s hard acceptance gates: file-size
/// budget, alpha requirement, and measured dimensions when the provider
/// reports them.
#[must_use]
pub fn passes_acceptance(candidate: &RawCandidate, target: &PlannedTarget) -> bool {
    let size_ok = candidate.byte_size <= u64::from(target.acceptance.max_file_size_kb) * 1024;
    let alpha_ok = !target.acceptance.alpha || candidate.has_alpha;
    let dims_ok = match (candidate.width, candidate.height) {
        (Some(width), Some(height)) => width == target.acceptance.width && height == target.acceptance.height,
        _ => true,
    };
    size_ok && alpha_ok && dims_ok
}

// ============================================================================
// SECTION: VLM gate
// ============================================================================

/// Builds a [`VlmGateResult`] for a candidate already scored by
/// [`score_candidate`]. The rubric field is left unset: this pipeline
/// treats the rubric as an opaque string owned entirely by the manifest
/// author, never interpreted here.
fn vlm_gate(candidate_score: f64, threshold: f64) -> VlmGateResult {
    let passed = candidate_score >= threshold;
    VlmGateResult {
        score: candidate_score,
        threshold,
        max_score: 1.0,
        passed,
        reason: if passed {
            "candidate score meets the configured vlm gate threshold".to_string()
        } else {
            "candidate score is below the configured vlm gate threshold".to_string()
        },
        rubric: None,
    }
}

// ============================================================================
// SECTION: Coarse-to-fine
// ============================================================================

/// Applies a target's coarse-to-fine policy over its already-scored
/// candidates, returning the set of discarded candidate paths plus the
/// report to embed in the job's [`ProviderRunResult`].
///
/// [`ProviderRunResult`]: lootforge_core::domain::run_result::ProviderRunResult
#[must_use]
pub fn apply_coarse_to_fine(policy: &CoarseToFinePolicy, candidates: &[CandidateOutput]) -> (BTreeSet<String>, CoarseToFineReport) {
    let mut ranked: Vec<&CandidateOutput> = candidates.iter().collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal).then_with(|| a.path.cmp(&b.path)));

    let mut discarded = Vec::new();
    let mut promoted = BTreeSet::new();

    for (rank, candidate) in ranked.iter().enumerate() {
        let rank = u32::try_from(rank).unwrap_or(u32::MAX);
        let within_top_k = rank < policy.promote_top_k;
        let meets_score = candidate.score >= policy.min_draft_score;
        let meets_acceptance = !policy.require_draft_acceptance || candidate.passed_acceptance;

        if within_top_k && meets_score && meets_acceptance {
            promoted.insert(candidate.path.clone());
            continue;
        }

        let reason = if !within_top_k {
            "exceeds_promote_top_k"
        } else if !meets_score {
            "below_min_draft_score"
        } else {
            "draft_acceptance_failed"
        };
        discarded.push(DiscardedDraft {
            path: candidate.path.clone(),
            reason: reason.to_string(),
        });
    }

    let draft_count = u32::try_from(candidates.len()).unwrap_or(u32::MAX);
    let promoted_count = u32::try_from(promoted.len()).unwrap_or(u32::MAX);
    let discarded_paths = discarded.iter().map(|draft| draft.path.clone()).collect();
    (discarded_paths, CoarseToFineReport { draft_count, promoted_count, discarded })
}

// ============================================================================
// SECTION: Selection
// ============================================================================

/// Whether `candidate` is eligible to win selection: it passed acceptance,
/// it was not discarded by coarse-to-fine, and (if a VLM gate ran) it
/// passed the gate.
fn is_eligible(candidate: &CandidateOutput, discarded_paths: &BTreeSet<String>) -> bool {
    candidate.passed_acceptance && !discarded_paths.contains(&candidate.path) && candidate.vlm_gate.as_ref().is_none_or(|gate| gate.passed)
}

/// Marks exactly one candidate as `selected` (§4.6 step 3): prefer the
/// eligible pool when non-empty, else fall back to every candidate; within
/// the chosen pool, the highest score wins; ties break on the
/// lexicographically smallest output path.
///
/// Does nothing if `candidates` is empty.
fn select_one(candidates: &mut [CandidateOutput], discarded_paths: &BTreeSet<String>) {
    if candidates.is_empty() {
        return;
    }

    let eligible_count = candidates.iter().filter(|candidate| is_eligible(candidate, discarded_paths)).count();
    let restrict_to_eligible = eligible_count > 0;

    let mut winner: Option<usize> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        if restrict_to_eligible && !is_eligible(candidate, discarded_paths) {
            continue;
        }
        winner = Some(match winner {
            None => index,
            Some(current) => {
                let current_candidate = &candidates[current];
                match candidate.score.partial_cmp(&current_candidate.score) {
                    Some(Ordering::Greater) => index,
                    Some(Ordering::Less) => current,
                    _ => {
                        if candidate.path < current_candidate.path {
                            index
                        } else {
                            current
                        }
                    }
                }
            }
        });
    }

    if let Some(index) = winner {
        candidates[index].selected = true;
    }
}

// ============================================================================
// SECTION: Entry point
// ============================================================================

/// Builds the scored, selected `CandidateOutput` list for one job, plus its
/// optional coarse-to-fine report, from a provider's raw output.
#[must_use]
pub fn score_job(target: &PlannedTarget, raw: &RawJobOutput) -> (Vec<CandidateOutput>, Option<CoarseToFineReport>) {
    let mut candidates: Vec<CandidateOutput> = raw
        .candidates
        .iter()
        .map(|candidate| {
            let score = score_candidate(candidate, target);
            CandidateOutput {
                path: candidate.path.clone(),
                byte_size: candidate.byte_size,
                width: candidate.width,
                height: candidate.height,
                has_alpha: candidate.has_alpha,
                has_transparent_pixel: candidate.has_transparent_pixel,
                score,
                passed_acceptance: passes_acceptance(candidate, target),
                vlm_gate: target.generation_policy.vlm_gate_threshold.map(|threshold| vlm_gate(score, threshold)),
                selected: false,
            }
        })
        .collect();

    let (discarded_paths, coarse_to_fine) = match &target.generation_policy.coarse_to_fine {
        Some(policy) => {
            let (discarded, report) = apply_coarse_to_fine(policy, &candidates);
            (discarded, Some(report))
        }
        None => (BTreeSet::new(), None),
    };

    select_one(&mut candidates, &discarded_paths);
    (candidates, coarse_to_fine)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use lootforge_core::domain::target::AcceptancePolicy;
    use lootforge_core::domain::target::Background;
    use lootforge_core::domain::target::GenerationMode;
    use lootforge_core::domain::target::GenerationPolicy;
    use lootforge_core::domain::target::OutputFormat;
    use lootforge_core::domain::target::PlannedTarget;
    use lootforge_core::domain::target::PostProcessPolicy;
    use lootforge_core::domain::target::PromptSpec;
    use lootforge_core::domain::target::RuntimeSpec;
    use lootforge_core::domain::target::TargetKind;
    use lootforge_core::identifiers::ProviderName;
    use lootforge_core::identifiers::TargetId;

    use super::RawCandidate;
    use super::RawJobOutput;
    use super::score_job;

    fn target() -> PlannedTarget {
        PlannedTarget {
            id: TargetId::new("hero"),
            kind: TargetKind::Sprite,
            out: "hero.png".to_string(),
            acceptance: AcceptancePolicy { width: 64, height: 64, alpha: true, max_file_size_kb: 100 },
            runtime_spec: RuntimeSpec { anchor: None, preview_width: None, preview_height: None, alpha_required: true },
            prompt_spec: PromptSpec { primary: "a hero".to_string(), facets: vec![] },
            generation_policy: GenerationPolicy {
                width: 64,
                height: 64,
                quality: None,
                background: Background::Transparent,
                output_format: OutputFormat::Png,
                candidate_count: 2,
                max_retries: 2,
                fallback_providers: vec![],
                rate_limit_per_minute: None,
                provider_concurrency: None,
                vlm_gate_threshold: None,
                coarse_to_fine: None,
                generation_mode: GenerationMode::TextToImage,
            },
            post_process: PostProcessPolicy::default(),
            palette: vec![],
            wrap_grid: None,
            provider: ProviderName::Openai,
            model: None,
            edit_spec: None,
            spritesheet: None,
            consistency_group: None,
            evaluation_profile: None,
            catalog_disabled: false,
            generation_disabled: false,
            regeneration_source: None,
        }
    }

    fn raw_output(candidates: Vec<RawCandidate>) -> RawJobOutput {
        RawJobOutput { model: None, candidates, generation_mode: GenerationMode::TextToImage }
    }

    #[test]
    fn exactly_one_candidate_selected() {
        let target = target();
        let raw = raw_output(vec![
            RawCandidate { path: "a.png".to_string(), byte_size: 50_000, width: Some(64), height: Some(64), has_alpha: true, has_transparent_pixel: true },
            RawCandidate { path: "b.png".to_string(), byte_size: 10_000, width: Some(64), height: Some(64), has_alpha: true, has_transparent_pixel: true },
        ]);
        let (candidates, coarse) = score_job(&target, &raw);
        assert!(coarse.is_none());
        assert_eq!(candidates.iter().filter(|c| c.selected).count(), 1);
        // Candidate b.png has a better file-size economy score.
        assert!(candidates.iter().find(|c| c.path == "b.png").unwrap().selected);
    }

    #[test]
    fn failing_candidates_never_outrank_a_passing_one() {
        let mut target = target();
        target.acceptance.max_file_size_kb = 5;
        let raw = raw_output(vec![
            RawCandidate { path: "oversized.png".to_string(), byte_size: 50_000, width: Some(64), height: Some(64), has_alpha: true, has_transparent_pixel: true },
            RawCandidate { path: "ok.png".to_string(), byte_size: 4_000, width: Some(64), height: Some(64), has_alpha: true, has_transparent_pixel: true },
        ]);
        let (candidates, _) = score_job(&target, &raw);
        let selected = candidates.iter().find(|c| c.selected).unwrap();
        assert_eq!(selected.path, "ok.png");
    }

    #[test]
    fn coarse_to_fine_discards_below_min_draft_score() {
        use lootforge_core::domain::target::CoarseToFinePolicy;
        let mut target = target();
        target.generation_policy.coarse_to_fine = Some(CoarseToFinePolicy { promote_top_k: 1, min_draft_score: 0.9, require_draft_acceptance: false });
        let raw = raw_output(vec![
            RawCandidate { path: "low.png".to_string(), byte_size: 90_000, width: None, height: None, has_alpha: false, has_transparent_pixel: false },
            RawCandidate { path: "high.png".to_string(), byte_size: 1_000, width: Some(64), height: Some(64), has_alpha: true, has_transparent_pixel: true },
        ]);
        let (candidates, coarse) = score_job(&target, &raw);
        let coarse = coarse.unwrap();
        assert_eq!(coarse.draft_count, 2);
        assert_eq!(coarse.promoted_count, 1);
        assert_eq!(coarse.discarded.len(), 1);
        assert_eq!(coarse.discarded[0].path, "low.png");
        assert!(candidates.iter().find(|c| c.path == "high.png").unwrap().selected);
    }

    #[test]
    fn ties_break_on_lexicographically_smallest_path() {
        let target = target();
        let raw = raw_output(vec![
            RawCandidate { path: "z.png".to_string(), byte_size: 10_000, width: Some(64), height: Some(64), has_alpha: true, has_transparent_pixel: true },
            RawCandidate { path: "a.png".to_string(), byte_size: 10_000, width: Some(64), height: Some(64), has_alpha: true, has_transparent_pixel: true },
        ]);
        let (candidates, _) = score_job(&target, &raw);
        assert!(candidates.iter().find(|c| c.path == "a.png").unwrap().selected);
    }
}
