// crates/lootforge-providers/src/error.rs
// ============================================================================
// Module: Provider Error
// Description: The normalized failure shape every adapter raises.
// Purpose: Give the generate orchestrator one error shape regardless of
//   which provider failed (§4.3 `normalizeError`).
// Dependencies: thiserror
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use lootforge_core::identifiers::ProviderName;
use thiserror::Error;

// ============================================================================
// SECTION: Provider Error
// ============================================================================

/// A normalized provider failure.
///
/// # Invariants
/// - `code` is one of the stable codes named in §4.3/§4.5/§7
///   (`missing_api_key`, `<provider>_http_error`,
///   `<provider>_request_timeout`, `<provider>_missing_image`,
///   `<provider>_empty_image`, `<provider>_image_too_large`,
///   `<provider>_edit_unsupported_model`,
///   `<provider>_edit_missing_base_image`,
///   `<provider>_edit_input_unsafe_path`).
#[derive(Debug, Clone, Error)]
#[error("{provider}: {code}: {message}")]
pub struct ProviderError {
    /// The provider that raised this error.
    pub provider: ProviderName,
    /// Stable machine-readable error code.
    pub code: String,
    /// Human-readable detail.
    pub message: String,
    /// Whether the caller can act on this (e.g. set an API key), as
    /// opposed to a transient condition worth retrying.
    pub actionable: bool,
    /// HTTP status code, when the failure came from an HTTP response.
    pub status: Option<u16>,
}

impl ProviderError {
    /// Builds a non-actionable (transient) error.
    #[must_use]
    pub fn transient(provider: ProviderName, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider,
            code: code.into(),
            message: message.into(),
            actionable: false,
            status: None,
        }
    }

    /// Builds an actionable error (a misconfiguration the caller must
    /// fix; never worth retrying).
    #[must_use]
    pub fn actionable(provider: ProviderName, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider,
            code: code.into(),
            message: message.into(),
            actionable: true,
            status: None,
        }
    }

    /// Attaches an HTTP status code to this error.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether this failure is worth retrying (the inverse of
    /// `actionable`).
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        !self.actionable
    }
}
