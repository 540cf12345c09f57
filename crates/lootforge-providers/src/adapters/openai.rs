// crates/lootforge-providers/src/adapters/openai.rs
// ============================================================================
// Module: OpenAI Adapter
// Description: The OpenAI Images API provider.
// ============================================================================

use super::http_adapter::HttpAdapter;
use super::http_adapter::ResponseShape;
use lootforge_core::identifiers::ProviderName;

/// Default OpenAI Images API endpoint.
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/images/generations";

/// Builds the OpenAI provider adapter.
#[must_use]
pub fn build() -> HttpAdapter {
    HttpAdapter::new(ProviderName::Openai, DEFAULT_ENDPOINT, ResponseShape::DataB64Json, true)
}
