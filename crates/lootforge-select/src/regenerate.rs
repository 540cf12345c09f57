// crates/lootforge-select/src/regenerate.rs
// ============================================================================
// Module: Regenerate
// Description: Rewrites a locked target into an edit-first request based
//   on its own locked output and drives the generate orchestrator over it.
// Purpose: Let an operator re-run generation for specific targets using
//   their last approved output as the edit base (§4.9 regenerate path).
// Dependencies: lootforge-core, lootforge-generate
// ============================================================================

//! ## Overview
//! [`plan`] never mutates the canonical targets index on disk: a
//! [`PlannedTarget`] is immutable once the planner produces it. Instead it
//! clones the targets named for regeneration into a transient index whose
//! clones carry `generation_mode = EditFirst` and a base edit input
//! pointing at the locked output, then hands that transient index to
//! [`lootforge_generate::run`].

use std::path::Path;
use std::sync::Arc;

use lootforge_core::contract::selection_lock::SelectionLock;
use lootforge_core::contract::targets_index::TargetsIndex;
use lootforge_core::domain::target::EditInput;
use lootforge_core::domain::target::EditRole;
use lootforge_core::domain::target::EditSpec;
use lootforge_core::domain::target::GenerationMode;
use lootforge_core::domain::target::PlannedTarget;
use lootforge_core::paths::resolve_under_root;

use crate::error::SelectStageError;

/// Fidelity hint injected on the base edit input so the provider treats
/// the locked output as a strong anchor rather than a loose reference.
const REGENERATE_BASE_FIDELITY: &str = "high";

/// Builds a transient targets index covering only `target_ids`, each
/// rewritten to an edit-first request based on its current lock entry.
///
/// # Errors
///
/// Returns [`SelectStageError::TargetNotLocked`] if a named target has no
/// approved lock entry, and [`SelectStageError::UnsafeLockedPath`] if the
/// locked output path cannot be safely resolved under `out_root`.
pub fn plan(targets_index: &TargetsIndex, lock: &SelectionLock, target_ids: &[String], out_root: &Path) -> Result<TargetsIndex, SelectStageError> {
    let mut regenerated = Vec::with_capacity(target_ids.len());
    for target_id in target_ids {
        let Some(planned) = targets_index.targets.iter().find(|target| target.id.as_str() == target_id) else {
            continue;
        };
        let Some(entry) = lock.entries.get(target_id).filter(|entry| entry.approved) else {
            return Err(SelectStageError::TargetNotLocked(target_id.clone()));
        };
        resolve_under_root(out_root, &entry.selected_output_path)?;

        let mut target = planned.clone();
        target.generation_mode = GenerationMode::EditFirst;
        target.regeneration_source = Some(target.id.clone());
        let base_input = EditInput { path: entry.selected_output_path.clone(), role: EditRole::Base, fidelity: Some(REGENERATE_BASE_FIDELITY.to_string()) };
        target.edit_spec = Some(match target.edit_spec.take() {
            Some(mut spec) => {
                spec.inputs.retain(|input| input.role != EditRole::Base);
                spec.inputs.insert(0, base_input);
                spec
            }
            None => EditSpec { inputs: vec![base_input], instruction: String::new(), preserve_composition: true },
        });
        regenerated.push(target);
    }

    Ok(TargetsIndex::new(regenerated))
}

/// Convenience wrapper around [`plan`] and [`lootforge_generate::run`]:
/// plans the transient index, then dispatches it with `ctx.selection_lock`
/// set to `lock` so the orchestrator can stitch regenerate lineage.
///
/// # Errors
///
/// Propagates [`plan`]'s errors.
pub async fn run(targets_index: &TargetsIndex, lock: Arc<SelectionLock>, target_ids: &[String], out_root: &Path, mut ctx: lootforge_generate::GenerateContext) -> Result<lootforge_core::contract::provenance::ProvenanceRun, SelectStageError> {
    let transient = plan(targets_index, &lock, target_ids, out_root)?;
    ctx.selection_lock = Some(lock);
    ctx.skip_locked = false;
    Ok(lootforge_generate::run(&transient, ctx).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use super::plan;
    use lootforge_core::contract::selection_lock::LockEntry;
    use lootforge_core::contract::selection_lock::SelectionLock;
    use lootforge_core::contract::targets_index::TargetsIndex;
    use lootforge_core::domain::target::AcceptancePolicy;
    use lootforge_core::domain::target::Background;
    use lootforge_core::domain::target::EditRole;
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
    use std::collections::BTreeMap;
    use std::path::Path;

    fn target() -> PlannedTarget {
        PlannedTarget {
            id: TargetId::new("hero"),
            kind: TargetKind::Sprite,
            out: "hero.png".to_string(),
            acceptance: AcceptancePolicy { width: 32, height: 32, alpha: true, max_file_size_kb: 1 },
            runtime_spec: RuntimeSpec { anchor: None, preview_width: None, preview_height: None, alpha_required: true },
            prompt_spec: PromptSpec { primary: "a hero".to_string(), facets: vec![] },
            generation_policy: GenerationPolicy {
                width: 32,
                height: 32,
                quality: None,
                background: Background::Transparent,
                output_format: OutputFormat::Png,
                candidate_count: 1,
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

    fn lock_with(target_id: &str, path: &str) -> SelectionLock {
        let mut entries = BTreeMap::new();
        entries.insert(
            target_id.to_string(),
            LockEntry { approved: true, input_hash: "h".to_string(), selected_output_path: path.to_string(), provider: ProviderName::Openai, model: None, final_score: 0.9 },
        );
        SelectionLock::new(entries)
    }

    #[test]
    fn regenerated_target_becomes_edit_first_with_a_base_input() {
        let index = TargetsIndex::new(vec![target()]);
        let lock = lock_with("hero", "hero.png");

        let transient = plan(&index, &lock, &["hero".to_string()], Path::new("/out")).unwrap();
        let rewritten = &transient.targets[0];
        assert_eq!(rewritten.generation_mode, GenerationMode::EditFirst);
        let edit_spec = rewritten.edit_spec.as_ref().unwrap();
        assert_eq!(edit_spec.inputs[0].role, EditRole::Base);
        assert_eq!(edit_spec.inputs[0].path, "hero.png");
    }

    #[test]
    fn regenerating_an_unlocked_target_errors() {
        let index = TargetsIndex::new(vec![target()]);
        let lock = SelectionLock::new(BTreeMap::new());

        let result = plan(&index, &lock, &["hero".to_string()], Path::new("/out"));
        assert!(result.is_err());
    }
}
