// crates/lootforge-providers/src/adapters/nano.rs
// ============================================================================
// Module: Nano Adapter
// Description: The Gemini ("nano banana") image generation provider.
// ============================================================================

use super::http_adapter::HttpAdapter;
use super::http_adapter::ResponseShape;
use lootforge_core::identifiers::ProviderName;

/// Default Gemini image generation endpoint.
const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-image:generateContent";

/// Builds the Nano provider adapter.
#[must_use]
pub fn build() -> HttpAdapter {
    HttpAdapter::new(ProviderName::Nano, DEFAULT_ENDPOINT, ResponseShape::CandidatesInlineData, true)
}
