// crates/lootforge-core/src/contract/targets_index.rs
// ============================================================================
// Module: Targets Index Artifact
// Description: Schema for jobs/targets-index.json, the planner's output.
// Purpose: Enforce uniqueness and alpha/format invariants that must hold
//   regardless of which crate produced the document.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! `TargetsIndex` is the contract between the planner (C2) and everything
//! downstream. Its own `validate` only re-checks invariants that are cheap
//! to verify without filesystem access (duplicate output paths, alpha/format
//! compatibility, spritesheet linkage); the planner additionally enforces
//! output-root escape safety at plan time, where the root is known.

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
use crate::domain::target::PlannedTarget;
use crate::paths::uniqueness_key;

// ============================================================================
// SECTION: Document
// ============================================================================

/// The planner's output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetsIndex {
    /// Schema version this document was written against.
    pub contract_version: String,
    /// Every planned target, in the planner's emission order.
    pub targets: Vec<PlannedTarget>,
}

impl TargetsIndex {
    /// Builds a new index stamped with the current contract version.
    #[must_use]
    pub fn new(targets: Vec<PlannedTarget>) -> Self {
        Self {
            contract_version: STAGE_ARTIFACT_CONTRACT_VERSION.to_string(),
            targets,
        }
    }
}

impl StageArtifact for TargetsIndex {
    const KIND: ArtifactKind = ArtifactKind::TargetsIndex;

    fn validate(&self) -> Result<(), Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        check_unique_ids(&self.targets, &mut diagnostics);
        check_unique_out_paths(&self.targets, &mut diagnostics);
        check_alpha_format_compatibility(&self.targets, &mut diagnostics);
        check_spritesheet_linkage(&self.targets, &mut diagnostics);
        if diagnostics.is_empty() { Ok(()) } else { Err(diagnostics) }
    }
}

// ============================================================================
// SECTION: Invariant Checks
// ============================================================================

fn check_unique_ids(targets: &[PlannedTarget], diagnostics: &mut Diagnostics) {
    let mut seen = BTreeMap::new();
    for (index, target) in targets.iter().enumerate() {
        if let Some(previous) = seen.insert(target.id.as_str().to_string(), index) {
            diagnostics.push(Diagnostic::new(
                vec![PathSegment::Field("targets"), PathSegment::Index(index)],
                "duplicate_target_id",
                format!("target id `{}` also used at index {previous}", target.id),
            ));
        }
    }
}

fn check_unique_out_paths(targets: &[PlannedTarget], diagnostics: &mut Diagnostics) {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    for (index, target) in targets.iter().enumerate() {
        let key = uniqueness_key(&target.out);
        if let Some(previous) = seen.insert(key, index) {
            diagnostics.push(Diagnostic::new(
                vec![PathSegment::Field("targets"), PathSegment::Index(index), PathSegment::Field("out")],
                "duplicate_target_out",
                format!("output path `{}` collides with target at index {previous}", target.out),
            ));
        }
    }
}

fn check_alpha_format_compatibility(targets: &[PlannedTarget], diagnostics: &mut Diagnostics) {
    for (index, target) in targets.iter().enumerate() {
        let alpha_required = target.acceptance.alpha || target.runtime_spec.alpha_required;
        if alpha_required && !target.generation_policy.output_format.supports_alpha() {
            diagnostics.push(Diagnostic::new(
                vec![
                    PathSegment::Field("targets"),
                    PathSegment::Index(index),
                    PathSegment::Field("generation_policy"),
                    PathSegment::Field("output_format"),
                ],
                "alpha_requires_png_or_webp",
                format!("target `{}` requires alpha but declares a non-alpha output format", target.id),
            ));
        }
    }
}

fn check_spritesheet_linkage(targets: &[PlannedTarget], diagnostics: &mut Diagnostics) {
    for (index, target) in targets.iter().enumerate() {
        let Some(info) = &target.spritesheet else { continue };
        if info.is_sheet && !target.generation_disabled {
            diagnostics.push(Diagnostic::new(
                vec![PathSegment::Field("targets"), PathSegment::Index(index), PathSegment::Field("generation_disabled")],
                "spritesheet_sheet_must_disable_generation",
                format!("sheet target `{}` must set generation_disabled", target.id),
            ));
        }
        if !info.is_sheet && !target.catalog_disabled {
            diagnostics.push(Diagnostic::new(
                vec![PathSegment::Field("targets"), PathSegment::Index(index), PathSegment::Field("catalog_disabled")],
                "spritesheet_frame_must_disable_catalog",
                format!("frame target `{}` must set catalog_disabled", target.id),
            ));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use super::TargetsIndex;
    use crate::contract::StageArtifact;
    use crate::domain::target::AcceptancePolicy;
    use crate::domain::target::Background;
    use crate::domain::target::GenerationPolicy;
    use crate::domain::target::OutputFormat;
    use crate::domain::target::PlannedTarget;
    use crate::domain::target::PostProcessPolicy;
    use crate::domain::target::PromptSpec;
    use crate::domain::target::RuntimeSpec;
    use crate::domain::target::TargetKind;
    use crate::identifiers::ProviderName;
    use crate::identifiers::TargetId;

    fn sample_target(id: &str, out: &str, alpha: bool, format: OutputFormat) -> PlannedTarget {
        PlannedTarget {
            id: TargetId::new(id),
            kind: TargetKind::Sprite,
            out: out.to_string(),
            acceptance: AcceptancePolicy {
                width: 64,
                height: 64,
                alpha,
                max_file_size_kb: 256,
            },
            runtime_spec: RuntimeSpec {
                anchor: None,
                preview_width: None,
                preview_height: None,
                alpha_required: false,
            },
            prompt_spec: PromptSpec {
                primary: "a hero".to_string(),
                facets: Vec::new(),
            },
            generation_policy: GenerationPolicy {
                width: 64,
                height: 64,
                quality: None,
                background: if alpha { Background::Transparent } else { Background::Opaque },
                output_format: format,
                candidate_count: 1,
                max_retries: 2,
                fallback_providers: Vec::new(),
                rate_limit_per_minute: None,
                provider_concurrency: None,
                vlm_gate_threshold: None,
                coarse_to_fine: None,
                generation_mode: crate::domain::target::GenerationMode::TextToImage,
            },
            post_process: PostProcessPolicy::default(),
            palette: Vec::new(),
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

    #[test]
    fn duplicate_out_paths_are_rejected_case_insensitively() {
        let index = TargetsIndex::new(vec![
            sample_target("a", "Sprites/Hero.png", false, OutputFormat::Png),
            sample_target("b", "sprites\\hero.png", false, OutputFormat::Png),
        ]);
        let diagnostics = index.validate().unwrap_err();
        assert!(diagnostics.iter().any(|d| d.code == "duplicate_target_out"));
    }

    #[test]
    fn alpha_with_jpeg_is_rejected() {
        let index = TargetsIndex::new(vec![sample_target("a", "hero.jpg", true, OutputFormat::Jpeg)]);
        let diagnostics = index.validate().unwrap_err();
        assert!(diagnostics.iter().any(|d| d.code == "alpha_requires_png_or_webp"));
    }

    #[test]
    fn a_clean_single_target_validates() {
        let index = TargetsIndex::new(vec![sample_target("hero", "hero.png", true, OutputFormat::Png)]);
        assert!(index.validate().is_ok());
    }
}
