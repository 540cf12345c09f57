// crates/lootforge-manifest/src/plan.rs
// ============================================================================
// Module: Manifest Normalizer / Planner
// Description: Turns an authored manifest into a validated TargetsIndex.
// Purpose: Run the five normalization steps in order, producing the
//   planner's own issue list alongside a C1-valid targets-index.
// Dependencies: lootforge-core
// ============================================================================

//! ## Overview
//! `plan` runs the five steps of the planner in order: schema/semantic
//! validation (collecting every issue before failing), default resolution,
//! spritesheet expansion, provider routing, and deterministic id
//! assignment via [`PlannedTarget`]'s own fields. `validate` runs the same
//! first step alone, so a caller can lint a manifest without generating.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;

use lootforge_core::capabilities::Feature;
use lootforge_core::capabilities::capabilities_for;
use lootforge_core::contract::targets_index::TargetsIndex;
use lootforge_core::contract::validate as contract_validate;
use lootforge_core::domain::target::AcceptancePolicy;
use lootforge_core::domain::target::Background;
use lootforge_core::domain::target::GenerationMode;
use lootforge_core::domain::target::GenerationPolicy;
use lootforge_core::domain::target::OutputFormat;
use lootforge_core::domain::target::PlannedTarget;
use lootforge_core::domain::target::PromptSpec;
use lootforge_core::domain::target::ResizeAlgorithm;
use lootforge_core::domain::target::RuntimeSpec;
use lootforge_core::domain::target::SpritesheetInfo;
use lootforge_core::domain::target::TargetKind;
use lootforge_core::identifiers::ProviderName;
use lootforge_core::identifiers::TargetId;
use lootforge_core::paths::PathSafetyError;
use lootforge_core::paths::resolve_under_root;
use lootforge_core::paths::uniqueness_key;

use crate::authored::Manifest;
use crate::authored::Target;
use crate::errors::ManifestIssue;
use crate::errors::PlanError;

// ============================================================================
// SECTION: Context
// ============================================================================

/// Inputs the planner needs beyond the manifest itself.
#[derive(Debug, Clone)]
pub struct PlanContext {
    /// The output root every target's `out` must resolve inside.
    pub output_root: PathBuf,
    /// Provider requested by the invocation, used when a target declares
    /// none (§4.4 step 2).
    pub requested_provider: Option<ProviderName>,
}

/// Successful planner output: the validated index plus any warnings
/// collected along the way.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// The normalized, contract-valid targets index.
    pub index: TargetsIndex,
    /// Warning-level issues collected during validation; never fatal.
    pub warnings: Vec<ManifestIssue>,
}

// ============================================================================
// SECTION: Entry Points
// ============================================================================

/// Runs structural and semantic validation only, without producing an
/// index.
///
/// # Errors
///
/// Returns [`PlanError::ManifestInvalid`] when any error-level issue is
/// found.
pub fn validate(manifest: &Manifest, ctx: &PlanContext) -> Result<Vec<ManifestIssue>, PlanError> {
    let issues = collect_semantic_issues(manifest, ctx);
    if issues.iter().any(|issue| issue.level == crate::errors::IssueLevel::Error) {
        return Err(PlanError::ManifestInvalid { issues });
    }
    Ok(issues)
}

/// Runs the full planner: validate, resolve defaults, expand
/// spritesheets, route providers, and assemble the targets index.
///
/// # Errors
///
/// Returns [`PlanError::ManifestInvalid`] when semantic validation fails,
/// or [`PlanError::ContractInvalid`] when the assembled index somehow
/// fails its own C1 contract (a planner-internal invariant violation).
pub fn plan(manifest: &Manifest, ctx: &PlanContext) -> Result<PlanOutcome, PlanError> {
    let issues = collect_semantic_issues(manifest, ctx);
    if issues.iter().any(|issue| issue.level == crate::errors::IssueLevel::Error) {
        return Err(PlanError::ManifestInvalid { issues });
    }

    let mut planned = Vec::new();
    for target in &manifest.targets {
        if target.kind == TargetKind::Spritesheet {
            planned.extend(expand_spritesheet(manifest, target, ctx));
        } else {
            planned.push(resolve_target(manifest, target, None, ctx));
        }
    }
    for target in &mut planned {
        route_provider(target, ctx);
    }

    let index = TargetsIndex::new(planned);
    contract_validate(&index)?;

    Ok(PlanOutcome {
        index,
        warnings: issues,
    })
}

// ============================================================================
// SECTION: Step 1/2 — Validation
// ============================================================================

fn collect_semantic_issues(manifest: &Manifest, ctx: &PlanContext) -> Vec<ManifestIssue> {
    let mut issues = Vec::new();
    check_unique_ids(manifest, &mut issues);
    check_unique_out_paths(manifest, &mut issues);
    for target in &manifest.targets {
        check_out_path_safety(target, ctx, &mut issues);
        check_size_literal(target, &mut issues);
        check_strict_palette(target, &mut issues);
        check_wrap_grid(target, &mut issues);
        check_consistency_group(manifest, target, &mut issues);
        check_alpha_compatibility(target, &mut issues);
        check_asset_paths_exist(manifest, target, ctx, &mut issues);
    }
    issues
}

fn check_unique_ids(manifest: &Manifest, issues: &mut Vec<ManifestIssue>) {
    let mut seen = BTreeSet::new();
    for target in &manifest.targets {
        if !seen.insert(target.id.as_str().to_string()) {
            issues.push(ManifestIssue::error("duplicate_target_id", target.id.as_str().to_string(), format!("target id `{}` is declared more than once", target.id)));
        }
    }
}

fn check_unique_out_paths(manifest: &Manifest, issues: &mut Vec<ManifestIssue>) {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for target in &manifest.targets {
        let key = uniqueness_key(&target.out);
        if let Some(previous) = seen.insert(key, target.id.as_str().to_string()) {
            issues.push(ManifestIssue::error(
                "duplicate_target_out",
                target.id.as_str().to_string(),
                format!("output path `{}` collides with target `{previous}`", target.out),
            ));
        }
    }
}

fn check_out_path_safety(target: &Target, ctx: &PlanContext, issues: &mut Vec<ManifestIssue>) {
    if let Err(err) = resolve_under_root(&ctx.output_root, &target.out) {
        let message = match err {
            PathSafetyError::Empty => "output path is empty".to_string(),
            PathSafetyError::NullByte => "output path contains a null byte".to_string(),
            PathSafetyError::Absolute => "output path is absolute".to_string(),
            PathSafetyError::Escapes => format!("output path `{}` escapes the output root", target.out),
        };
        issues.push(ManifestIssue::error("invalid_target_out_path", target.id.as_str().to_string(), message));
    }
}

fn check_size_literal(target: &Target, issues: &mut Vec<ManifestIssue>) {
    if parse_size(&target.acceptance.size).is_none() {
        issues.push(ManifestIssue::error(
            "invalid_size_literal",
            target.id.as_str().to_string(),
            format!("acceptance.size `{}` does not match ^\\d+x\\d+$", target.acceptance.size),
        ));
    }
    if let Some(size) = &target.generation_policy.size {
        if parse_size(size).is_none() {
            issues.push(ManifestIssue::error("invalid_size_literal", target.id.as_str().to_string(), format!("generation_policy.size `{size}` does not match ^\\d+x\\d+$")));
        }
    }
    if let Some(post) = &target.post_process {
        for (width, height) in &post.resize_variants {
            if *width == 0 || *height == 0 {
                issues.push(ManifestIssue::error("invalid_size_literal", target.id.as_str().to_string(), "resize_variants entry has a zero edge".to_string()));
            }
        }
        if let Some((width, height)) = post.resize {
            if width == 0 || height == 0 {
                issues.push(ManifestIssue::error("invalid_size_literal", target.id.as_str().to_string(), "post_process.resize has a zero edge".to_string()));
            }
        }
    }
}

fn check_strict_palette(target: &Target, issues: &mut Vec<ManifestIssue>) {
    let Some(post) = &target.post_process else { return };
    if post.strict_palette && post.palette_colors.is_none() {
        issues.push(ManifestIssue::error(
            "strict_palette_without_quantization",
            target.id.as_str().to_string(),
            "strict_palette is set but palette_colors is not declared".to_string(),
        ));
    }
}

fn check_wrap_grid(target: &Target, issues: &mut Vec<ManifestIssue>) {
    let Some(grid) = &target.wrap_grid else { return };
    let Some((width, height)) = target
        .generation_policy
        .size
        .as_deref()
        .and_then(parse_size)
        .or_else(|| parse_size(&target.acceptance.size))
    else {
        return;
    };
    if grid.columns == 0 || grid.rows == 0 || width % grid.columns != 0 || height % grid.rows != 0 {
        issues.push(ManifestIssue::error(
            "wrap_grid_does_not_divide_evenly",
            target.id.as_str().to_string(),
            format!("wrap_grid {}x{} does not divide target size {width}x{height} evenly", grid.columns, grid.rows),
        ));
    }
}

fn check_consistency_group(manifest: &Manifest, target: &Target, issues: &mut Vec<ManifestIssue>) {
    let Some(group_name) = &target.consistency_group else { return };
    let Some(group) = manifest.consistency_groups.get(group_name) else {
        issues.push(ManifestIssue::error("unknown_consistency_group", target.id.as_str().to_string(), format!("consistency-group `{group_name}` is not declared")));
        return;
    };
    if target.style_kit.as_deref() != Some(group.style_kit.as_str()) {
        issues.push(ManifestIssue::error(
            "consistency_group_style_kit_mismatch",
            target.id.as_str().to_string(),
            format!("target's style-kit does not match consistency-group `{group_name}`'s declared style-kit `{}`", group.style_kit),
        ));
    }
}

fn check_alpha_compatibility(target: &Target, issues: &mut Vec<ManifestIssue>) {
    let alpha_required = target.acceptance.alpha || target.runtime_spec.alpha_required;
    if !alpha_required {
        return;
    }
    let format = resolved_output_format(target);
    if !format.supports_alpha() {
        issues.push(ManifestIssue::error("alpha_requires_png_or_webp", target.id.as_str().to_string(), format!("target `{}` requires alpha but resolves to a non-alpha output format", target.id)));
    }
    let provider = target.provider;
    if let Some(provider) = provider {
        if !capabilities_for(provider).supports(Feature::TransparentBackground) {
            issues.push(ManifestIssue::error(
                "provider_alpha_incompatible",
                target.id.as_str().to_string(),
                format!("provider `{}` does not support transparent backgrounds required by target `{}`", provider.as_str(), target.id),
            ));
        }
    }
}

fn check_asset_paths_exist(manifest: &Manifest, target: &Target, ctx: &PlanContext, issues: &mut Vec<ManifestIssue>) {
    if let Some(edit) = &target.edit_spec {
        for input in &edit.inputs {
            if !path_exists_under_root(ctx, &input.path) {
                issues.push(ManifestIssue::warning("referenced_asset_missing", target.id.as_str().to_string(), format!("edit input `{}` was not found under the output root", input.path)));
            }
        }
    }
    let Some(kit_name) = &target.style_kit else { return };
    let Some(kit) = manifest.style_kits.get(kit_name) else { return };
    for image in &kit.reference_images {
        if !path_exists_under_root(ctx, image) {
            issues.push(ManifestIssue::warning("referenced_asset_missing", target.id.as_str().to_string(), format!("style-kit `{kit_name}` reference image `{image}` was not found")));
        }
    }
}

fn path_exists_under_root(ctx: &PlanContext, relative: &str) -> bool {
    resolve_under_root(&ctx.output_root, relative).is_ok_and(|resolved| resolved.exists())
}

// ============================================================================
// SECTION: Step 3 — Default Resolution
// ============================================================================

fn resolved_output_format(target: &Target) -> OutputFormat {
    target.generation_policy.output_format.unwrap_or_else(|| {
        Path::new(&target.out)
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(OutputFormat::Png, OutputFormat::from_extension)
    })
}

fn resolved_background(target: &Target) -> Background {
    target.generation_policy.background.unwrap_or({
        if target.acceptance.alpha || target.runtime_spec.alpha_required {
            Background::Transparent
        } else {
            Background::Opaque
        }
    })
}

fn resolved_algorithm(manifest: &Manifest, target: &Target) -> ResizeAlgorithm {
    if let Some(algorithm) = target.generation_policy.algorithm {
        return algorithm;
    }
    let pixel_art = target
        .style_kit
        .as_ref()
        .and_then(|name| manifest.style_kits.get(name))
        .and_then(|kit| kit.style_preset.as_deref())
        .is_some_and(|preset| preset == "pixel-art-16bit");
    if pixel_art { ResizeAlgorithm::Nearest } else { ResizeAlgorithm::Lanczos3 }
}

fn resolved_palette(manifest: &Manifest, target: &Target) -> Vec<String> {
    if let Some(palette) = &target.palette {
        return palette.clone();
    }
    target.style_kit.as_ref().and_then(|name| manifest.style_kits.get(name)).map(|kit| kit.palette.clone()).unwrap_or_default()
}

fn resolved_prompt(manifest: &Manifest, target: &Target, extra_facets: &[String]) -> PromptSpec {
    let mut facets = target.prompt_spec.facets.clone();
    if let Some(kit) = target.style_kit.as_ref().and_then(|name| manifest.style_kits.get(name)) {
        facets.extend(kit.prompt_facets.iter().cloned());
    }
    facets.extend(extra_facets.iter().cloned());
    PromptSpec {
        primary: target.prompt_spec.primary.clone(),
        facets,
    }
}

/// Parses a `"WxH"` size literal.
fn parse_size(literal: &str) -> Option<(u32, u32)> {
    let (width, height) = literal.split_once('x')?;
    if width.is_empty() || height.is_empty() || !width.bytes().all(|b| b.is_ascii_digit()) || !height.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((width.parse().ok()?, height.parse().ok()?))
}

fn resolve_target(manifest: &Manifest, target: &Target, extra_facets: Option<&[String]>, ctx: &PlanContext) -> PlannedTarget {
    let (accept_width, accept_height) = parse_size(&target.acceptance.size).unwrap_or((0, 0));
    let (gen_width, gen_height) = target
        .generation_policy
        .size
        .as_deref()
        .and_then(parse_size)
        .unwrap_or((accept_width, accept_height));
    let background = resolved_background(target);
    let output_format = resolved_output_format(target);
    let algorithm = resolved_algorithm(manifest, target);
    let palette = resolved_palette(manifest, target);
    let facets = extra_facets.unwrap_or(&[]);

    let mut post_process = target.post_process.clone().unwrap_or_default();
    if post_process.algorithm.is_none() {
        post_process.algorithm = Some(algorithm);
    }

    let (preview_width, preview_height) = target.runtime_spec.preview_size.as_deref().and_then(parse_size).map_or((None, None), |(w, h)| (Some(w), Some(h)));

    PlannedTarget {
        id: target.id.clone(),
        kind: target.kind,
        out: normalize_out(&target.out),
        acceptance: AcceptancePolicy {
            width: accept_width,
            height: accept_height,
            alpha: target.acceptance.alpha,
            max_file_size_kb: target.acceptance.max_file_size_kb.unwrap_or(512),
        },
        runtime_spec: RuntimeSpec {
            anchor: target.runtime_spec.anchor.clone(),
            preview_width,
            preview_height,
            alpha_required: target.runtime_spec.alpha_required,
        },
        prompt_spec: resolved_prompt(manifest, target, facets),
        generation_policy: GenerationPolicy {
            width: gen_width,
            height: gen_height,
            quality: target.generation_policy.quality.clone(),
            background,
            output_format,
            candidate_count: target.generation_policy.candidate_count.unwrap_or(1).max(1),
            max_retries: target.generation_policy.max_retries.unwrap_or(2),
            fallback_providers: if target.generation_policy.fallback_providers.is_empty() {
                manifest.provider_defaults.fallback_providers.clone()
            } else {
                target.generation_policy.fallback_providers.clone()
            },
            rate_limit_per_minute: target.generation_policy.rate_limit_per_minute,
            provider_concurrency: target.generation_policy.provider_concurrency,
            vlm_gate_threshold: target.generation_policy.vlm_gate_threshold,
            coarse_to_fine: target.generation_policy.coarse_to_fine,
            generation_mode: if target.edit_spec.is_some() { GenerationMode::EditFirst } else { GenerationMode::TextToImage },
        },
        post_process,
        palette,
        wrap_grid: target.wrap_grid,
        provider: target.provider.or(manifest.provider_defaults.provider).or(ctx.requested_provider).unwrap_or(ProviderName::Openai),
        model: target.model.clone().or_else(|| manifest.provider_defaults.model.clone()),
        edit_spec: target.edit_spec.clone(),
        spritesheet: None,
        consistency_group: target.consistency_group.clone(),
        evaluation_profile: target.evaluation_profile.clone(),
        catalog_disabled: false,
        generation_disabled: false,
        regeneration_source: target.regeneration_source.clone(),
    }
}

fn normalize_out(out: &str) -> String {
    out.replace('\\', "/")
}

// ============================================================================
// SECTION: Step 4 — Spritesheet Expansion
// ============================================================================

fn expand_spritesheet(manifest: &Manifest, target: &Target, ctx: &PlanContext) -> Vec<PlannedTarget> {
    let Some(sheet) = &target.spritesheet else {
        return vec![resolve_target(manifest, target, None, ctx)];
    };

    let mut sheet_target = resolve_target(manifest, target, None, ctx);
    sheet_target.generation_disabled = true;
    sheet_target.spritesheet = Some(SpritesheetInfo {
        sheet_id: target.id.clone(),
        is_sheet: true,
        animation_name: None,
        frame_index: None,
    });

    let mut out = vec![sheet_target];
    for animation in &sheet.animations {
        for frame_index in 0..animation.frame_count {
            let frame_id = TargetId::new(format!("{}.{}.{frame_index}", target.id, animation.name));
            let mut frame_authored = target.clone();
            frame_authored.id = frame_id.clone();
            frame_authored.out = frame_out_path(&target.out, &animation.name, frame_index);
            frame_authored.prompt_spec.primary = animation.prompt.clone();
            frame_authored.kind = TargetKind::Sprite;

            let mut frame_target = resolve_target(manifest, &frame_authored, Some(&[format!("frame {frame_index} of {}", animation.name)]), ctx);
            frame_target.catalog_disabled = true;
            frame_target.spritesheet = Some(SpritesheetInfo {
                sheet_id: target.id.clone(),
                is_sheet: false,
                animation_name: Some(animation.name.clone()),
                frame_index: Some(frame_index),
            });
            out.push(frame_target);
        }
    }
    out
}

fn frame_out_path(sheet_out: &str, animation: &str, frame_index: u32) -> String {
    let normalized = normalize_out(sheet_out);
    let (stem, extension) = normalized.rsplit_once('.').unwrap_or((normalized.as_str(), "png"));
    format!("{stem}.{animation}.{frame_index:04}.{extension}")
}

// ============================================================================
// SECTION: Step 5 — Provider Routing
// ============================================================================

fn route_provider(target: &mut PlannedTarget, _ctx: &PlanContext) {
    let required = required_features(target);
    if !capabilities_for(target.provider).supports_all(&required) {
        if let Some(fallback) = target
            .generation_policy
            .fallback_providers
            .iter()
            .copied()
            .find(|candidate| capabilities_for(*candidate).supports_all(&required))
        {
            target.provider = fallback;
        }
    }
}

fn required_features(target: &PlannedTarget) -> Vec<Feature> {
    let mut required = vec![Feature::ImageGeneration];
    if target.acceptance.alpha || target.runtime_spec.alpha_required {
        required.push(Feature::TransparentBackground);
    }
    if target.generation_policy.generation_mode == GenerationMode::EditFirst {
        required.push(Feature::ImageEdits);
    }
    required
}

trait SupportsAll {
    fn supports_all(self, features: &[Feature]) -> bool;
}

impl SupportsAll for lootforge_core::capabilities::ProviderCapabilities {
    fn supports_all(self, features: &[Feature]) -> bool {
        features.iter().all(|feature| self.supports(*feature))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use std::collections::BTreeMap;

    use lootforge_core::domain::target::OutputFormat;
    use lootforge_core::identifiers::TargetId;

    use super::PlanContext;
    use super::plan;
    use crate::authored::AuthoredAcceptance;
    use crate::authored::AuthoredGenerationPolicy;
    use crate::authored::AuthoredPromptSpec;
    use crate::authored::AuthoredRuntimeSpec;
    use crate::authored::Manifest;
    use crate::authored::ProviderDefaults;
    use crate::authored::Target;
    use crate::errors::PlanError;
    use lootforge_core::domain::target::TargetKind;

    fn minimal_target(id: &str, out: &str) -> Target {
        Target {
            id: TargetId::new(id),
            kind: TargetKind::Sprite,
            out: out.to_string(),
            acceptance: AuthoredAcceptance {
                size: "64x64".to_string(),
                alpha: true,
                max_file_size_kb: None,
            },
            runtime_spec: AuthoredRuntimeSpec::default(),
            prompt_spec: AuthoredPromptSpec {
                primary: "a hero".to_string(),
                facets: Vec::new(),
            },
            generation_policy: AuthoredGenerationPolicy {
                size: None,
                quality: None,
                background: None,
                output_format: Some(OutputFormat::Png),
                candidate_count: None,
                max_retries: None,
                fallback_providers: Vec::new(),
                rate_limit_per_minute: None,
                provider_concurrency: None,
                vlm_gate_threshold: None,
                coarse_to_fine: None,
                algorithm: None,
            },
            post_process: None,
            palette: None,
            wrap_grid: None,
            provider: None,
            model: None,
            style_kit: None,
            consistency_group: None,
            evaluation_profile: None,
            edit_spec: None,
            regeneration_source: None,
            spritesheet: None,
        }
    }

    fn manifest(targets: Vec<Target>) -> Manifest {
        Manifest {
            pack: "demo".to_string(),
            provider_defaults: ProviderDefaults::default(),
            style_kits: BTreeMap::new(),
            consistency_groups: BTreeMap::new(),
            evaluation_profiles: BTreeMap::new(),
            atlases: Vec::new(),
            targets,
        }
    }

    fn ctx() -> PlanContext {
        PlanContext {
            output_root: std::env::temp_dir(),
            requested_provider: None,
        }
    }

    #[test]
    fn plans_a_minimal_manifest() {
        let outcome = plan(&manifest(vec![minimal_target("hero", "hero.png")]), &ctx()).unwrap();
        assert_eq!(outcome.index.targets.len(), 1);
        let target = &outcome.index.targets[0];
        assert_eq!(target.generation_policy.output_format, OutputFormat::Png);
        assert_eq!(target.post_process.algorithm, Some(lootforge_core::domain::target::ResizeAlgorithm::Lanczos3));
    }

    #[test]
    fn rejects_duplicate_out_paths_case_insensitively() {
        let err = plan(&manifest(vec![minimal_target("a", "Sprites/Hero.png"), minimal_target("b", "sprites\\hero.png")]), &ctx()).unwrap_err();
        let PlanError::ManifestInvalid { issues } = err else { panic!("expected ManifestInvalid") };
        assert!(issues.iter().any(|issue| issue.code == "duplicate_target_out"));
    }

    #[test]
    fn rejects_alpha_with_jpeg_output() {
        let mut target = minimal_target("hero", "hero.jpg");
        target.generation_policy.output_format = Some(OutputFormat::Jpeg);
        let err = plan(&manifest(vec![target]), &ctx()).unwrap_err();
        let PlanError::ManifestInvalid { issues } = err else { panic!("expected ManifestInvalid") };
        assert!(issues.iter().any(|issue| issue.code == "alpha_requires_png_or_webp"));
    }

    #[test]
    fn rejects_escaping_out_path() {
        let err = plan(&manifest(vec![minimal_target("hero", "../../escape.png")]), &ctx()).unwrap_err();
        let PlanError::ManifestInvalid { issues } = err else { panic!("expected ManifestInvalid") };
        assert!(issues.iter().any(|issue| issue.code == "invalid_target_out_path"));
    }
}
