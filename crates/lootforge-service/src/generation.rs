// crates/lootforge-service/src/generation.rs
// ============================================================================
// Module: Generation Requests
// Description: `POST /v1/generation/requests` request/response bodies and
//   handler, dispatching either a full generate pass or a constrained
//   regenerate pass depending on the request shape.
// Purpose: The one route that performs real provider I/O; kept separate
//   from the stateless tool dispatcher (§10).
// Dependencies: axum, lootforge-core, lootforge-generate, lootforge-select,
//   serde_json
// ============================================================================

//! ## Overview
//! A request with `regenerate_targets` present regenerates that named
//! subset against `lock` (required in that case); otherwise every eligible
//! target in `targets_index` is dispatched fresh, honoring `lock` only to
//! skip already-approved targets when `skip_locked` is set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use lootforge_core::contract::provenance::ProvenanceRun;
use lootforge_core::contract::selection_lock::SelectionLock;
use lootforge_core::contract::targets_index::TargetsIndex;
use lootforge_core::hashing::hash_canonical_json;
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

/// Request body for `POST /v1/generation/requests`.
#[derive(Debug, Deserialize)]
pub struct GenerationRequest {
    /// The targets index to dispatch against.
    targets_index: TargetsIndex,
    /// Directory raw provider candidates are written under.
    raw_output_dir: String,
    /// Output root the locked selections were written under; required when
    /// `regenerate_targets` is present.
    #[serde(default)]
    out_root: Option<String>,
    /// A prior selection lock. Required for a regenerate request; optional
    /// for a fresh generate request where it gates `skip_locked`.
    #[serde(default)]
    lock: Option<SelectionLock>,
    /// Skip targets already covered by an approved, input-hash-matching
    /// lock entry instead of dispatching them again.
    #[serde(default)]
    skip_locked: bool,
    /// Target ids to regenerate. When present, this becomes a regenerate
    /// request instead of a fresh generate request.
    #[serde(default)]
    regenerate_targets: Option<Vec<String>>,
}

/// Response body for `POST /v1/generation/requests`.
#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    /// The resulting provenance run.
    provenance: ProvenanceRun,
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Dispatches a generate or regenerate pass depending on the request shape.
///
/// # Errors
///
/// Returns [`ServiceError::BadRequest`] when `regenerate_targets` is
/// present without `lock` or `out_root`, and [`ServiceError::Internal`]
/// when hashing the targets index fails.
pub async fn handle_generation_request(State(state): State<AppState>, Json(request): Json<GenerationRequest>) -> ServiceResult<Json<GenerationResponse>> {
    let result = run(state.clone(), request).await;

    let outcome = if result.is_ok() { ServiceOutcome::Ok } else { ServiceOutcome::Error };
    state.metrics.record_request(ServiceMetricEvent { method: ServiceMethod::GenerationRequest, tool: None, outcome });

    result.map(|provenance| Json(GenerationResponse { provenance }))
}

/// Builds a [`lootforge_generate::GenerateContext`] and runs either
/// [`lootforge_generate::run`] or [`lootforge_select::run_regenerate`].
async fn run(state: AppState, request: GenerationRequest) -> ServiceResult<ProvenanceRun> {
    let input_hash = hash_canonical_json(&request.targets_index).map_err(|err| ServiceError::Internal(format!("failed to hash targets index: {err}")))?;

    let ctx = lootforge_generate::GenerateContext {
        raw_output_dir: Arc::new(PathBuf::from(request.raw_output_dir)),
        registry: state.registry,
        transport: state.transport,
        clock: state.clock,
        progress: Arc::new(lootforge_generate::NullProgressSink),
        input_hash,
        skip_locked: request.skip_locked || request.regenerate_targets.is_some(),
        selection_lock: request.lock.clone().map(Arc::new),
    };

    match request.regenerate_targets {
        Some(targets) => {
            let lock = request.lock.ok_or_else(|| ServiceError::BadRequest("regenerate_targets requires lock".to_string()))?;
            let out_root = request.out_root.ok_or_else(|| ServiceError::BadRequest("regenerate_targets requires out_root".to_string()))?;
            lootforge_select::run_regenerate(&request.targets_index, Arc::new(lock), &targets, &PathBuf::from(out_root), ctx).await.map_err(|err| ServiceError::Unprocessable(err.to_string()))
        }
        None => Ok(lootforge_generate::run(&request.targets_index, ctx).await),
    }
}
