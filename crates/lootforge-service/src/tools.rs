// crates/lootforge-service/src/tools.rs
// ============================================================================
// Module: Tool Dispatch
// Description: `POST /v1/tools/:name` request/response bodies and the
//   dispatcher that routes a decoded body to one stage crate entry point.
// Purpose: Expose every pipeline operation that doesn't itself perform
//   provider I/O as a single stateless HTTP tool call (§10).
// Dependencies: axum, lootforge-core, lootforge-manifest, lootforge-eval,
//   lootforge-process, lootforge-select, serde, serde_json
// ============================================================================

//! ## Overview
//! Every tool here is a pure transform: it takes its inputs inline as JSON
//! fields (never a filesystem path — that's the CLI's job) and returns its
//! output document inline. `init`, `plan`, `validate`, `atlas`, `process`,
//! `eval`, `review`, `select` and `package` are exposed this way; `generate`
//! and `regenerate` are not, since they perform real provider I/O and are
//! exposed instead through `POST /v1/generation/requests`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use lootforge_config::adapter_config;
use lootforge_config::adapter_config::AdapterMode;
use lootforge_config::adapter_config::AdapterName;
use lootforge_config::env::ProcessEnv;
use lootforge_core::contract::acceptance::AcceptanceReport;
use lootforge_core::contract::eval::EvalReport;
use lootforge_core::contract::provenance::ProvenanceRun;
use lootforge_core::contract::selection_lock::SelectionLock;
use lootforge_core::contract::targets_index::TargetsIndex;
use lootforge_manifest::authored::Manifest;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ServiceError;
use crate::error::ServiceResult;
use crate::state::AppState;
use crate::telemetry::ServiceMethod;
use crate::telemetry::ServiceMetricEvent;
use crate::telemetry::ServiceOutcome;

// ============================================================================
// SECTION: Request/Response Bodies
// ============================================================================

/// Request body for the `init` tool.
#[derive(Debug, Deserialize)]
pub struct InitRequest {
    /// Pack identity name.
    pack: String,
}

/// Request body for the `plan` and `validate` tools.
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    /// The authored manifest to plan or validate.
    manifest: Manifest,
    /// Output root every target's `out` resolves inside.
    out_root: String,
    /// Provider used for targets that omit one, overriding manifest defaults.
    #[serde(default)]
    provider: Option<lootforge_core::identifiers::ProviderName>,
}

/// Response body for the `plan` tool.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    /// The resolved targets index, present only when planning succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<TargetsIndex>,
    /// Manifest issues surfaced during planning or validation.
    issues: Vec<lootforge_manifest::ManifestIssue>,
}

/// Request body for the `process` tool.
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    /// The targets index produced by `plan`.
    targets_index: TargetsIndex,
    /// The provenance run produced by a prior generation request.
    provenance: ProvenanceRun,
    /// Directory raw provider candidates were written under.
    raw_output_dir: String,
    /// Root directory final pack assets are written under.
    out_root: String,
    /// Abort on the first per-target failure instead of collecting them.
    #[serde(default)]
    strict: bool,
}

/// Response body for the `process` tool.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    /// The resulting acceptance report.
    report: AcceptanceReport,
    /// The resulting output catalog.
    catalog: lootforge_process::Catalog,
    /// Count of per-target failures encountered.
    failures: usize,
}

/// Request body for the `eval` tool.
#[derive(Debug, Deserialize)]
pub struct EvalRequest {
    /// The targets index produced by `plan`.
    targets_index: TargetsIndex,
    /// The provenance run produced by a prior generation request.
    provenance: ProvenanceRun,
    /// The acceptance report produced by `process`.
    acceptance: AcceptanceReport,
    /// The authored manifest, used for evaluation-profile weights and
    /// consistency-group thresholds.
    manifest: Manifest,
    /// Abort on the first pack-invariant violation instead of forcing the
    /// targets it names ineligible and continuing.
    #[serde(default)]
    strict: bool,
}

/// Request body for the `select` tool.
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    /// The provenance run produced by a prior generation request.
    provenance: ProvenanceRun,
    /// The eval report produced by `eval`.
    eval_report: EvalReport,
    /// A prior selection lock to merge fresh entries into, if any.
    #[serde(default)]
    previous_lock: Option<SelectionLock>,
}

/// Request body for the `atlas` tool.
#[derive(Debug, Deserialize)]
pub struct AtlasRequest {
    /// The authored manifest (atlas groups are manifest-only).
    manifest: Manifest,
    /// The targets index, used to resolve each member's final output path.
    targets_index: TargetsIndex,
}

/// One resolved atlas group: its declared members' final output paths.
#[derive(Debug, Serialize)]
pub struct ResolvedAtlasGroup {
    /// Atlas group name as declared in the manifest.
    name: String,
    /// The group's members, each resolved against the targets index.
    members: Vec<ResolvedAtlasMember>,
}

/// One atlas member, resolved against the planned targets index.
#[derive(Debug, Serialize)]
pub struct ResolvedAtlasMember {
    /// Member target id as declared in the manifest's atlas group.
    target_id: String,
    /// The member's final output path, absent if the target id is unknown.
    out: Option<String>,
}

/// Request body for the `review` tool.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// The eval report produced by `eval`.
    eval_report: EvalReport,
    /// The acceptance report produced by `process`.
    acceptance: AcceptanceReport,
}

/// A consolidated, renderer-agnostic review document.
#[derive(Debug, Serialize)]
pub struct ReviewDocument {
    /// One entry per scored target.
    targets: Vec<ReviewEntry>,
}

/// One target's review entry.
#[derive(Debug, Serialize)]
pub struct ReviewEntry {
    /// The target's id.
    target_id: String,
    /// The target's eval-stage final score.
    final_score: f64,
    /// Whether the target passed every hard gate.
    eligible: bool,
    /// Count of acceptance issues recorded against this target.
    issue_count: usize,
}

/// Request body for the `package` tool.
#[derive(Debug, Deserialize)]
pub struct PackageRequest {
    /// The output catalog produced by `process`.
    catalog: lootforge_process::Catalog,
    /// The selection lock produced by `select`.
    lock: SelectionLock,
}

/// The final shippable manifest: every catalog entry whose target carries
/// an approved selection-lock entry.
#[derive(Debug, Serialize)]
pub struct PackManifest {
    /// Shippable entries, keyed by target id.
    entries: BTreeMap<String, lootforge_process::stage::CatalogEntry>,
}

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Dispatches `POST /v1/tools/:name`, decoding `body` according to `name`
/// and routing it to the matching stage entry point.
///
/// # Errors
///
/// Returns [`ServiceError::BadRequest`] for an unknown tool name or a body
/// that fails to decode against the named tool's schema, and
/// [`ServiceError::Unprocessable`] when the stage itself rejects the input.
pub async fn dispatch_tool(State(state): State<AppState>, Path(name): Path<String>, Json(body): Json<serde_json::Value>) -> ServiceResult<Json<serde_json::Value>> {
    let result = match name.as_str() {
        "init" => run_init(body),
        "plan" => run_plan(body, false),
        "validate" => run_plan(body, true),
        "process" => run_process(body),
        "eval" => run_eval(body),
        "select" => run_select(body),
        "atlas" => run_atlas(body),
        "review" => run_review(body),
        "package" => run_package(body),
        other => Err(ServiceError::BadRequest(format!("unknown tool `{other}`"))),
    };

    let outcome = if result.is_ok() { ServiceOutcome::Ok } else { ServiceOutcome::Error };
    state.metrics.record_request(ServiceMetricEvent { method: ServiceMethod::Tool, tool: Some(name), outcome });

    result.map(Json)
}

/// Decodes `body` into `T`, mapping a decode failure to a bad-request error.
fn decode<T: serde::de::DeserializeOwned>(body: serde_json::Value) -> ServiceResult<T> {
    serde_json::from_value(body).map_err(|err| ServiceError::BadRequest(err.to_string()))
}

/// Encodes `value` as a JSON value, mapping a failure to an internal error.
fn encode<T: Serialize>(value: &T) -> ServiceResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|err| ServiceError::Internal(err.to_string()))
}

/// Builds a minimal starter manifest for `init`.
fn run_init(body: serde_json::Value) -> ServiceResult<serde_json::Value> {
    let request: InitRequest = decode(body)?;
    let manifest = Manifest {
        pack: request.pack,
        provider_defaults: lootforge_manifest::authored::ProviderDefaults::default(),
        style_kits: BTreeMap::new(),
        consistency_groups: BTreeMap::new(),
        evaluation_profiles: BTreeMap::new(),
        atlases: Vec::new(),
        targets: Vec::new(),
    };
    encode(&manifest)
}

/// Runs `plan` (or, when `validate_only`, `validate`) against a manifest.
fn run_plan(body: serde_json::Value, validate_only: bool) -> ServiceResult<serde_json::Value> {
    let request: PlanRequest = decode(body)?;
    let ctx = lootforge_manifest::PlanContext { output_root: request.out_root.into(), requested_provider: request.provider };

    if validate_only {
        return match lootforge_manifest::validate(&request.manifest, &ctx) {
            Ok(issues) => encode(&PlanResponse { index: None, issues }),
            Err(lootforge_manifest::PlanError::ManifestInvalid { issues }) => encode(&PlanResponse { index: None, issues }),
            Err(lootforge_manifest::PlanError::ContractInvalid(err)) => Err(ServiceError::Internal(err.to_string())),
        };
    }

    match lootforge_manifest::plan(&request.manifest, &ctx) {
        Ok(outcome) => encode(&PlanResponse { index: Some(outcome.index), issues: outcome.warnings }),
        Err(lootforge_manifest::PlanError::ManifestInvalid { issues }) => Err(ServiceError::Unprocessable(format!("{} manifest issue(s)", issues.len()))),
        Err(lootforge_manifest::PlanError::ContractInvalid(err)) => Err(ServiceError::Internal(err.to_string())),
    }
}

/// Runs the process stage over an already-produced provenance run.
fn run_process(body: serde_json::Value) -> ServiceResult<serde_json::Value> {
    let request: ProcessRequest = decode(body)?;
    let options = lootforge_process::ProcessOptions { out_root: request.out_root.into(), raw_output_dir: request.raw_output_dir.into(), strict: request.strict };
    let outcome = lootforge_process::run(&request.targets_index, &request.provenance, &options).map_err(|err| ServiceError::Unprocessable(err.to_string()))?;
    encode(&ProcessResponse { failures: outcome.errors.len(), report: outcome.report, catalog: outcome.catalog })
}

/// Runs the eval stage, resolving adapter modes from the real process
/// environment the same way the CLI does.
fn run_eval(body: serde_json::Value) -> ServiceResult<serde_json::Value> {
    let request: EvalRequest = decode(body)?;

    let env = ProcessEnv;
    let adapter_modes: Vec<(AdapterName, AdapterMode)> = AdapterName::all().into_iter().map(|name| (name, adapter_config::resolve(name, &env))).collect();

    let profile_weights: BTreeMap<String, lootforge_eval::ProfileWeights> = request
        .manifest
        .evaluation_profiles
        .iter()
        .map(|(name, profile)| {
            (
                name.clone(),
                lootforge_eval::ProfileWeights {
                    candidate_score_weight: profile.candidate_score_weight,
                    adapter_bonus_weight: profile.adapter_bonus_weight,
                    texture_budget_bytes: profile.texture_budget_kb.map(|kb| kb * 1024),
                },
            )
        })
        .collect();

    let consistency_thresholds: BTreeMap<String, f64> = request.manifest.consistency_groups.iter().filter_map(|(name, group)| group.warning_threshold.map(|threshold| (name.clone(), threshold))).collect();

    let options = lootforge_eval::EvalOptions { adapter_modes, profile_weights, consistency_thresholds, strict: request.strict };
    let outcome = lootforge_eval::run(&request.targets_index, &request.provenance, &request.acceptance, &options).map_err(|err| ServiceError::Unprocessable(err.to_string()))?;
    encode(&outcome.report)
}

/// Builds or merges a selection lock.
fn run_select(body: serde_json::Value) -> ServiceResult<serde_json::Value> {
    let request: SelectRequest = decode(body)?;
    let lock = lootforge_select::run(&request.provenance, &request.eval_report, request.previous_lock.as_ref()).map_err(|err| ServiceError::Unprocessable(err.to_string()))?;
    encode(&lock)
}

/// Resolves atlas group membership against a targets index.
fn run_atlas(body: serde_json::Value) -> ServiceResult<serde_json::Value> {
    let request: AtlasRequest = decode(body)?;
    let outs: BTreeMap<&str, &str> = request.targets_index.targets.iter().map(|target| (target.id.as_str(), target.out.as_str())).collect();

    let groups: Vec<ResolvedAtlasGroup> = request
        .manifest
        .atlases
        .iter()
        .map(|group| ResolvedAtlasGroup {
            name: group.name.clone(),
            members: group.members.iter().map(|member| ResolvedAtlasMember { target_id: member.clone(), out: outs.get(member.as_str()).map(|out| (*out).to_string()) }).collect(),
        })
        .collect();

    encode(&groups)
}

/// Aggregates eval scores next to acceptance issue counts.
fn run_review(body: serde_json::Value) -> ServiceResult<serde_json::Value> {
    let request: ReviewRequest = decode(body)?;
    let issue_counts: BTreeMap<&str, usize> = request.acceptance.targets.iter().map(|entry| (entry.target_id.as_str(), entry.issues.len())).collect();

    let targets: Vec<ReviewEntry> = request
        .eval_report
        .targets
        .iter()
        .map(|target| ReviewEntry {
            target_id: target.target_id.as_str().to_string(),
            final_score: target.final_score,
            eligible: target.eligible,
            issue_count: issue_counts.get(target.target_id.as_str()).copied().unwrap_or(0),
        })
        .collect();

    encode(&ReviewDocument { targets })
}

/// Filters a catalog down to entries with an approved selection-lock entry.
fn run_package(body: serde_json::Value) -> ServiceResult<serde_json::Value> {
    let request: PackageRequest = decode(body)?;
    let entries: BTreeMap<String, lootforge_process::stage::CatalogEntry> = request.catalog.entries.into_iter().filter(|(target_id, _)| request.lock.entries.contains_key(target_id.as_str())).collect();
    encode(&PackManifest { entries })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use super::run_init;
    use serde_json::json;

    #[test]
    fn init_builds_an_empty_manifest() {
        let body = json!({ "pack": "demo-pack" });
        let value = run_init(body).unwrap();
        assert_eq!(value["pack"], "demo-pack");
        assert_eq!(value["targets"].as_array().unwrap().len(), 0);
    }
}
