// crates/lootforge-core/src/domain/job.rs
// ============================================================================
// Module: Provider Job
// Description: The deterministic, content-addressed unit of generate work.
// Purpose: Carry a resolved target plus its runtime parameters and
//   retry/fallback directives through the generate orchestrator.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ProviderJob`]'s id is a pure function of its content (§3 invariant
//! 4): same provider, model, target id, output path, prompt, size,
//! quality, background, format, candidate count, and input hash always
//! yield the same id, on any machine, on any run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::domain::target::Background;
use crate::domain::target::OutputFormat;
use crate::domain::target::PlannedTarget;
use crate::hashing::hash_tuple;
use crate::identifiers::JobId;
use crate::identifiers::ProviderName;
use crate::identifiers::TargetId;

// ============================================================================
// SECTION: Job
// ============================================================================

/// One content-addressed unit of generate work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderJob {
    /// Deterministic job identifier.
    pub id: JobId,
    /// The provider this job is routed to.
    pub provider: ProviderName,
    /// Resolved model identifier, if any.
    pub model: Option<String>,
    /// The target this job produces output for.
    pub target_id: TargetId,
    /// Resolved output path for the primary candidate.
    pub target_out: String,
    /// Fully resolved prompt text sent to the provider.
    pub prompt: String,
    /// Requested width.
    pub width: u32,
    /// Requested height.
    pub height: u32,
    /// Provider quality hint.
    pub quality: Option<String>,
    /// Background treatment.
    pub background: Background,
    /// Output raster format.
    pub format: OutputFormat,
    /// Number of candidates requested.
    pub candidate_count: u32,
    /// Hash of the job's declared inputs (edit images, base image, seed
    /// material); `""` for pure text-to-image jobs.
    pub input_hash: String,
    /// Retry/fallback directive for this job.
    pub retry: RetryFallbackDirective,
}

impl ProviderJob {
    /// Computes the deterministic id for a job over the given canonical
    /// tuple fields (§3: "hash of (provider, model, target-id, target-out,
    /// prompt, size, quality, background, format, candidate-count,
    /// input-hash)").
    #[must_use]
    pub fn compute_id(
        provider: ProviderName,
        model: Option<&str>,
        target_id: &TargetId,
        target_out: &str,
        prompt: &str,
        width: u32,
        height: u32,
        quality: Option<&str>,
        background: Background,
        format: OutputFormat,
        candidate_count: u32,
        input_hash: &str,
    ) -> JobId {
        let size = format!("{width}x{height}");
        let candidates = candidate_count.to_string();
        let digest = hash_tuple(&[
            provider.as_str(),
            model.unwrap_or(""),
            target_id.as_str(),
            target_out,
            prompt,
            &size,
            quality.unwrap_or(""),
            background_str(background),
            format_str(format),
            &candidates,
            input_hash,
        ]);
        JobId::new(digest)
    }

    /// Builds a job for `target` on `provider`, with a blank input hash
    /// (text-to-image) unless `input_hash` is supplied.
    #[must_use]
    pub fn for_target(target: &PlannedTarget, provider: ProviderName, input_hash: String, retry: RetryFallbackDirective) -> Self {
        let policy = &target.generation_policy;
        let quality = policy.quality.clone();
        let id = Self::compute_id(
            provider,
            target.model.as_deref(),
            &target.id,
            &target.out,
            &target.prompt_spec.primary,
            policy.width,
            policy.height,
            quality.as_deref(),
            policy.background,
            policy.output_format,
            policy.candidate_count,
            &input_hash,
        );
        Self {
            id,
            provider,
            model: target.model.clone(),
            target_id: target.id.clone(),
            target_out: target.out.clone(),
            prompt: full_prompt(target),
            width: policy.width,
            height: policy.height,
            quality,
            background: policy.background,
            format: policy.output_format,
            candidate_count: policy.candidate_count,
            input_hash,
            retry,
        }
    }
}

/// Joins the primary prompt with its structured facets in declared order.
fn full_prompt(target: &PlannedTarget) -> String {
    let mut prompt = target.prompt_spec.primary.clone();
    for facet in &target.prompt_spec.facets {
        prompt.push_str(", ");
        prompt.push_str(facet);
    }
    prompt
}

const fn background_str(background: Background) -> &'static str {
    match background {
        Background::Transparent => "transparent",
        Background::Opaque => "opaque",
    }
}

const fn format_str(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Png => "png",
        OutputFormat::Webp => "webp",
        OutputFormat::Jpeg => "jpeg",
    }
}

// ============================================================================
// SECTION: Retry / Fallback Directive
// ============================================================================

/// Per-job retry and fallback directive (§4.5 step 5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryFallbackDirective {
    /// Maximum retry attempts per provider (excludes the first try).
    pub max_retries: u32,
    /// Ordered fallback providers, tried after the primary chain is
    /// exhausted.
    pub fallback_providers: Vec<ProviderName>,
    /// Optional requests-per-minute ceiling feeding the rate limiter.
    pub rate_limit_per_minute: Option<u32>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use super::ProviderJob;
    use crate::domain::target::Background;
    use crate::domain::target::OutputFormat;
    use crate::identifiers::ProviderName;
    use crate::identifiers::TargetId;

    #[test]
    fn job_id_is_pure_function_of_content() {
        let target_id = TargetId::new("hero");
        let a = ProviderJob::compute_id(
            ProviderName::Openai,
            Some("gpt-image-1"),
            &target_id,
            "hero.png",
            "a hero",
            64,
            64,
            None,
            Background::Transparent,
            OutputFormat::Png,
            1,
            "",
        );
        let b = ProviderJob::compute_id(
            ProviderName::Openai,
            Some("gpt-image-1"),
            &target_id,
            "hero.png",
            "a hero",
            64,
            64,
            None,
            Background::Transparent,
            OutputFormat::Png,
            1,
            "",
        );
        assert_eq!(a, b);

        let c = ProviderJob::compute_id(
            ProviderName::Openai,
            Some("gpt-image-1"),
            &target_id,
            "hero.png",
            "a different hero",
            64,
            64,
            None,
            Background::Transparent,
            OutputFormat::Png,
            1,
            "",
        );
        assert_ne!(a, c);
    }
}
