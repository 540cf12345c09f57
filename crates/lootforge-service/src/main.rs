// crates/lootforge-service/src/main.rs
// ============================================================================
// Module: LootForge Service Entry Point
// Description: Binds the axum router built by the library crate and serves
//   it until shutdown.
// Purpose: Thin process entry point; all routing logic lives in lib.rs.
// Dependencies: axum, lootforge-service, tokio
// ============================================================================

//! ## Overview
//! Binds `LOOTFORGE_SERVICE_BIND_ADDR` (default `127.0.0.1:7878`) and
//! serves the router until `ctrl_c`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;

use lootforge_service::build_router;
use lootforge_service::state::AppState;

/// Environment variable naming the address this service binds to.
const BIND_ADDR_VAR: &str = "LOOTFORGE_SERVICE_BIND_ADDR";
/// Default bind address when [`BIND_ADDR_VAR`] is unset.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7878";

/// Binds and serves the LootForge HTTP façade.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr: SocketAddr = std::env::var(BIND_ADDR_VAR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()).parse()?;

    let app = build_router(AppState::build());
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

/// Resolves once `ctrl_c` is received, used to drive graceful shutdown.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
