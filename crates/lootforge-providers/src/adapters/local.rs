// crates/lootforge-providers/src/adapters/local.rs
// ============================================================================
// Module: Local Adapter
// Description: The locally hosted diffusion server provider.
// ============================================================================

use super::http_adapter::HttpAdapter;
use super::http_adapter::ResponseShape;
use lootforge_core::identifiers::ProviderName;

/// Default local diffusion server endpoint.
const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:7860/v1/generate";

/// Builds the Local provider adapter. Local never supports edit-first
/// generation (§4.3 capability table).
#[must_use]
pub fn build() -> HttpAdapter {
    HttpAdapter::new(ProviderName::Local, DEFAULT_ENDPOINT, ResponseShape::ImagesArray, false)
}
