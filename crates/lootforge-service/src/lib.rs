// crates/lootforge-service/src/lib.rs
// ============================================================================
// Module: LootForge Service
// Description: HTTP façade exposing every pipeline stage as a tool call or
//   generation request, matching the teacher's axum server shape (§10).
// Purpose: Crate root; re-exports the router builder for the binary and
//   for integration tests.
// Dependencies: axum
// ============================================================================

//! ## Overview
//! `lootforge-service` performs no pipeline logic of its own: every route
//! decodes a request body, calls exactly one stage crate entry point, and
//! encodes the result. `/v1/tools/:name` covers every operation that takes
//! its inputs as plain JSON; `/v1/generation/requests` is split out
//! because it is the only route that performs real provider I/O.

pub mod contract_info;
pub mod error;
pub mod generation;
pub mod state;
pub mod telemetry;
pub mod tools;

use axum::Router;
use axum::routing::get;
use axum::routing::post;

use crate::state::AppState;

/// Builds the service's axum [`Router`], wired to `state`.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/tools/{name}", post(tools::dispatch_tool))
        .route("/v1/generation/requests", post(generation::handle_generation_request))
        .route("/v1/contract/version", get(contract_info::contract_version))
        .route("/v1/contract/kinds", get(contract_info::contract_kinds))
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions are permitted to unwrap/expect.")]
mod tests {
    use super::build_router;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::Request;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn contract_version_route_responds_ok() {
        let app = build_router(AppState::build());
        let request = Request::builder().uri("/v1/contract/version").body(Body::empty()).expect("request builds");
        let response = app.oneshot(request).await.expect("response arrives");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_tool_returns_bad_request() {
        let app = build_router(AppState::build());
        let request = Request::builder().method("POST").uri("/v1/tools/bogus").header("content-type", "application/json").body(Body::from("{}")).expect("request builds");
        let response = app.oneshot(request).await.expect("response arrives");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
