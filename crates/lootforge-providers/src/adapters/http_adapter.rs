// crates/lootforge-providers/src/adapters/http_adapter.rs
// ============================================================================
// Module: Generic HTTP Provider Adapter
// Description: One HTTP-calling adapter, parameterized by wire envelope.
// Purpose: Every built-in provider is one endpoint returning base64-encoded
//   image candidates in a provider-specific envelope; this factors out
//   everything but that envelope (§4.3).
// Dependencies: base64, serde_json
// ============================================================================

//! ## Overview
//! [`HttpAdapter`] implements [`Provider`] once; `openai`, `nano`, and
//! `local` each construct one with a different default endpoint and
//! [`ResponseShape`]. Error codes are namespaced per provider
//! (`<provider>_missing_image`, `<provider>_http_error`, ...) per §4.3/§7.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;
use serde_json::json;

use lootforge_core::domain::job::ProviderJob;
use lootforge_core::domain::raw_output::RawCandidate;
use lootforge_core::domain::raw_output::RawJobOutput;
use lootforge_core::domain::target::Background;
use lootforge_core::domain::target::EditSpec;
use lootforge_core::domain::target::GenerationMode;
use lootforge_core::domain::target::OutputFormat;
use lootforge_core::identifiers::ProviderName;

use crate::adapter::Provider;
use crate::adapter::RunContext;
use crate::error::ProviderError;
use crate::transport::TransportError;

/// Candidates larger than this are rejected rather than written to disk.
const MAX_CANDIDATE_BYTES: u64 = 25 * 1024 * 1024;

// ============================================================================
// SECTION: Response Shape
// ============================================================================

/// How a provider's HTTP response encodes generated image candidates.
#[derive(Debug, Clone, Copy)]
pub enum ResponseShape {
    /// `{"data": [{"b64_json": "..."}]}`.
    DataB64Json,
    /// `{"candidates": [{"content": {"parts": [{"inlineData": {"data": "..."}}]}}]}`.
    CandidatesInlineData,
    /// `{"images": ["..."]}`.
    ImagesArray,
}

// ============================================================================
// SECTION: HTTP Adapter
// ============================================================================

/// A generic HTTP-calling provider adapter.
pub struct HttpAdapter {
    /// The provider this instance adapts.
    provider: ProviderName,
    /// Endpoint used when no environment override is configured.
    default_endpoint: String,
    /// How to decode this provider's response envelope.
    response_shape: ResponseShape,
    /// Whether this provider accepts edit-first requests.
    supports_edits: bool,
}

impl HttpAdapter {
    /// Builds an adapter for `provider` against `default_endpoint`.
    #[must_use]
    pub fn new(provider: ProviderName, default_endpoint: impl Into<String>, response_shape: ResponseShape, supports_edits: bool) -> Self {
        Self {
            provider,
            default_endpoint: default_endpoint.into(),
            response_shape,
            supports_edits,
        }
    }

    /// Resolves the endpoint to call, honoring any environment override.
    fn endpoint(&self, ctx: &RunContext<'_>) -> String {
        ctx.config.endpoint_override.clone().unwrap_or_else(|| self.default_endpoint.clone())
    }

    /// Fetches the configured API key or reports `missing_api_key`.
    fn require_api_key<'ctx>(&self, ctx: &'ctx RunContext<'_>) -> Result<&'ctx str, ProviderError> {
        ctx.config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::actionable(self.provider, "missing_api_key", format!("no API key configured for provider {}", self.provider.as_str())))
    }

    /// Builds the outbound JSON request body for a job, optionally
    /// layering edit-first fields on top.
    fn build_request(&self, job: &ProviderJob, edit: Option<&EditSpec>) -> Value {
        let mut body = json!({
            "model": job.model,
            "prompt": job.prompt,
            "size": format!("{}x{}", job.width, job.height),
            "n": job.candidate_count,
            "background": background_str(job.background),
            "response_format": "b64_json",
        });
        if let Some(quality) = &job.quality {
            body["quality"] = Value::String(quality.clone());
        }
        if let Some(edit) = edit {
            body["instruction"] = Value::String(edit.instruction.clone());
            body["preserve_composition"] = Value::Bool(edit.preserve_composition);
            body["input_count"] = Value::from(edit.inputs.len());
        }
        body
    }

    /// Maps a transport-level failure onto this provider's error codes.
    fn transport_error(&self, err: &TransportError) -> ProviderError {
        match err {
            TransportError::Timeout => ProviderError::transient(self.provider, format!("{}_request_timeout", self.provider.as_str()), "request exceeded its configured timeout"),
            TransportError::Other(message) => ProviderError::transient(self.provider, format!("{}_http_error", self.provider.as_str()), message.clone()),
        }
    }

    /// Pulls the base64 candidate strings out of a decoded response body,
    /// per this adapter's configured `response_shape`.
    fn extract_candidates(&self, payload: &Value) -> Result<Vec<String>, ProviderError> {
        let encoded: Vec<String> = match self.response_shape {
            ResponseShape::DataB64Json => payload
                .get("data")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(|item| item.get("b64_json").and_then(Value::as_str).map(str::to_string)).collect())
                .unwrap_or_default(),
            ResponseShape::CandidatesInlineData => payload
                .get("candidates")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.pointer("/content/parts/0/inlineData/data").and_then(Value::as_str).map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
            ResponseShape::ImagesArray => payload
                .get("images")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(|item| item.as_str().map(str::to_string)).collect())
                .unwrap_or_default(),
        };
        if encoded.is_empty() {
            return Err(ProviderError::transient(self.provider, format!("{}_missing_image", self.provider.as_str()), "response contained no image candidates"));
        }
        Ok(encoded)
    }

    /// Decodes and writes every candidate to `ctx.raw_output_dir`,
    /// rejecting zero-byte or oversized candidates.
    fn decode_candidates(&self, job: &ProviderJob, ctx: &RunContext<'_>, encoded: &[String]) -> Result<Vec<RawCandidate>, ProviderError> {
        let mut candidates = Vec::with_capacity(encoded.len());
        for (index, data) in encoded.iter().enumerate() {
            let bytes = BASE64
                .decode(data)
                .map_err(|err| ProviderError::transient(self.provider, format!("{}_empty_image", self.provider.as_str()), format!("candidate {index} was not valid base64: {err}")))?;
            if bytes.is_empty() {
                return Err(ProviderError::transient(self.provider, format!("{}_empty_image", self.provider.as_str()), format!("candidate {index} decoded to zero bytes")));
            }
            let byte_size = bytes.len() as u64;
            if byte_size > MAX_CANDIDATE_BYTES {
                return Err(ProviderError::transient(
                    self.provider,
                    format!("{}_image_too_large", self.provider.as_str()),
                    format!("candidate {index} was {byte_size} bytes, exceeding the {MAX_CANDIDATE_BYTES} byte ceiling"),
                ));
            }
            let relative_path = candidate_file_name(job, index);
            let full_path = ctx.raw_output_dir.join(&relative_path);
            write_candidate(&full_path, &bytes)
                .map_err(|err| ProviderError::transient(self.provider, format!("{}_http_error", self.provider.as_str()), format!("failed to write candidate {index}: {err}")))?;
            candidates.push(RawCandidate {
                path: relative_path,
                byte_size,
                width: None,
                height: None,
                has_alpha: job.background == Background::Transparent,
                has_transparent_pixel: job.background == Background::Transparent,
            });
        }
        Ok(candidates)
    }

    /// Runs one HTTP round trip for `job`, optionally as an edit-first
    /// request, and returns its decoded candidates.
    fn call(&self, job: &ProviderJob, edit: Option<&EditSpec>, ctx: &RunContext<'_>) -> Result<RawJobOutput, ProviderError> {
        let api_key = self.require_api_key(ctx)?;
        let url = self.endpoint(ctx);
        let body = self.build_request(job, edit);
        let timeout = Duration::from_millis(ctx.config.timeout_ms);
        let response = ctx.transport.post_json(&url, Some(api_key), &body, timeout).map_err(|err| self.transport_error(&err))?;
        if response.status >= 400 {
            return Err(ProviderError::transient(self.provider, format!("{}_http_error", self.provider.as_str()), format!("request failed with status {}", response.status)).with_status(response.status));
        }
        let payload: Value = serde_json::from_slice(&response.body)
            .map_err(|err| ProviderError::transient(self.provider, format!("{}_http_error", self.provider.as_str()), format!("response body was not valid JSON: {err}")))?;
        let encoded = self.extract_candidates(&payload)?;
        let candidates = self.decode_candidates(job, ctx, &encoded)?;
        let generation_mode = if edit.is_some() { GenerationMode::EditFirst } else { GenerationMode::TextToImage };
        Ok(RawJobOutput {
            model: job.model.clone(),
            candidates,
            generation_mode,
        })
    }
}

impl Provider for HttpAdapter {
    fn name(&self) -> ProviderName {
        self.provider
    }

    fn run_job(&self, job: &ProviderJob, ctx: &RunContext<'_>) -> Result<RawJobOutput, ProviderError> {
        self.call(job, None, ctx)
    }

    fn run_edit_job(&self, job: &ProviderJob, edit: &EditSpec, ctx: &RunContext<'_>) -> Result<RawJobOutput, ProviderError> {
        if !self.supports_edits {
            return Err(ProviderError::actionable(
                self.provider,
                format!("{}_edit_unsupported_model", self.provider.as_str()),
                "this provider does not support edit-first generation",
            ));
        }
        for input in &edit.inputs {
            if input.path.trim().is_empty() {
                return Err(ProviderError::actionable(self.provider, format!("{}_edit_missing_base_image", self.provider.as_str()), "edit spec input path was empty"));
            }
            if input.path.contains("..") {
                return Err(ProviderError::actionable(
                    self.provider,
                    format!("{}_edit_input_unsafe_path", self.provider.as_str()),
                    format!("edit input path escapes the output root: {}", input.path),
                ));
            }
        }
        self.call(job, Some(edit), ctx)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders a background treatment for the outbound request body.
const fn background_str(background: Background) -> &'static str {
    match background {
        Background::Transparent => "transparent",
        Background::Opaque => "opaque",
    }
}

/// Renders an output format's canonical file extension.
const fn extension_for(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Png => "png",
        OutputFormat::Webp => "webp",
        OutputFormat::Jpeg => "jpg",
    }
}

/// Builds the relative candidate file name for one job's `index`'th
/// candidate.
fn candidate_file_name(job: &ProviderJob, index: usize) -> String {
    format!("{}.{index}.{}", job.id.as_str(), extension_for(job.format))
}

/// Writes `bytes` to `path`, creating parent directories as needed.
fn write_candidate(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use lootforge_config::provider_config::ProviderRuntimeConfig;
    use lootforge_core::domain::job::ProviderJob;
    use lootforge_core::domain::job::RetryFallbackDirective;
    use lootforge_core::domain::target::Background;
    use lootforge_core::domain::target::OutputFormat;
    use lootforge_core::identifiers::ProviderName;
    use lootforge_core::identifiers::TargetId;
    use tempfile::TempDir;

    use super::HttpAdapter;
    use super::ResponseShape;
    use crate::adapter::Provider;
    use crate::adapter::RunContext;
    use crate::transport::ScriptedTransport;
    use crate::transport::TransportResponse;

    fn job() -> ProviderJob {
        let target_id = TargetId::new("hero");
        let id = ProviderJob::compute_id(
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
        ProviderJob {
            id,
            provider: ProviderName::Openai,
            model: Some("gpt-image-1".to_string()),
            target_id,
            target_out: "hero.png".to_string(),
            prompt: "a hero".to_string(),
            width: 64,
            height: 64,
            quality: None,
            background: Background::Transparent,
            format: OutputFormat::Png,
            candidate_count: 1,
            input_hash: String::new(),
            retry: RetryFallbackDirective {
                max_retries: 2,
                fallback_providers: vec![],
                rate_limit_per_minute: None,
            },
        }
    }

    fn config() -> ProviderRuntimeConfig {
        ProviderRuntimeConfig {
            provider: ProviderName::Openai,
            endpoint_override: None,
            timeout_ms: 5_000,
            max_retries: 2,
            min_delay_ms: 250,
            default_concurrency: 4,
            api_key: Some("sk-test".to_string()),
        }
    }

    #[test]
    fn missing_api_key_is_actionable() {
        let adapter = HttpAdapter::new(ProviderName::Openai, "https://example.invalid/v1/images", ResponseShape::DataB64Json, true);
        let transport = ScriptedTransport::new(vec![]);
        let mut cfg = config();
        cfg.api_key = None;
        let dir = TempDir::new().unwrap();
        let ctx = RunContext {
            raw_output_dir: dir.path(),
            config: &cfg,
            transport: &transport,
        };
        let err = adapter.run_job(&job(), &ctx).unwrap_err();
        assert_eq!(err.code, "missing_api_key");
        assert!(err.actionable);
    }

    #[test]
    fn decodes_and_writes_a_candidate() {
        let adapter = HttpAdapter::new(ProviderName::Openai, "https://example.invalid/v1/images", ResponseShape::DataB64Json, true);
        let body = serde_json::json!({ "data": [{ "b64_json": "aGVsbG8=" }] }).to_string().into_bytes();
        let transport = ScriptedTransport::new(vec![Ok(TransportResponse { status: 200, body })]);
        let cfg = config();
        let dir = TempDir::new().unwrap();
        let ctx = RunContext {
            raw_output_dir: dir.path(),
            config: &cfg,
            transport: &transport,
        };
        let output = adapter.run_job(&job(), &ctx).unwrap();
        assert_eq!(output.candidates.len(), 1);
        assert_eq!(output.candidates[0].byte_size, 5);
    }

    #[test]
    fn empty_candidate_list_reports_missing_image() {
        let adapter = HttpAdapter::new(ProviderName::Openai, "https://example.invalid/v1/images", ResponseShape::DataB64Json, true);
        let body = serde_json::json!({ "data": [] }).to_string().into_bytes();
        let transport = ScriptedTransport::new(vec![Ok(TransportResponse { status: 200, body })]);
        let cfg = config();
        let dir = TempDir::new().unwrap();
        let ctx = RunContext {
            raw_output_dir: dir.path(),
            config: &cfg,
            transport: &transport,
        };
        let err = adapter.run_job(&job(), &ctx).unwrap_err();
        assert_eq!(err.code, "openai_missing_image");
    }

    #[test]
    fn http_error_status_is_transient() {
        let adapter = HttpAdapter::new(ProviderName::Openai, "https://example.invalid/v1/images", ResponseShape::DataB64Json, true);
        let transport = ScriptedTransport::new(vec![Ok(TransportResponse { status: 500, body: Vec::new() })]);
        let cfg = config();
        let dir = TempDir::new().unwrap();
        let ctx = RunContext {
            raw_output_dir: dir.path(),
            config: &cfg,
            transport: &transport,
        };
        let err = adapter.run_job(&job(), &ctx).unwrap_err();
        assert!(err.is_retriable());
        assert_eq!(err.status, Some(500));
    }

    #[test]
    fn edit_unsupported_model_reports_actionable_error() {
        let adapter = HttpAdapter::new(ProviderName::Local, "https://example.invalid/v1/generate", ResponseShape::ImagesArray, false);
        let transport = ScriptedTransport::new(vec![]);
        let cfg = config();
        let dir = TempDir::new().unwrap();
        let ctx = RunContext {
            raw_output_dir: dir.path(),
            config: &cfg,
            transport: &transport,
        };
        let edit = lootforge_core::domain::target::EditSpec {
            inputs: vec![],
            instruction: "add a hat".to_string(),
            preserve_composition: true,
        };
        let err = adapter.run_edit_job(&job(), &edit, &ctx).unwrap_err();
        assert_eq!(err.code, "local_edit_unsupported_model");
        assert!(!err.is_retriable());
    }
}
