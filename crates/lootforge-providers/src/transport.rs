// crates/lootforge-providers/src/transport.rs
// ============================================================================
// Module: Provider Transport
// Description: The injectable HTTP boundary every adapter calls through.
// Purpose: Let tests substitute a scripted transport instead of making real
//   network calls, the same shape as a pluggable HTTP client wrapper.
// Dependencies: reqwest (blocking)
// ============================================================================

//! ## Overview
//! Real adapters use [`ReqwestTransport`], a thin wrapper over a blocking
//! `reqwest::blocking::Client` (§5: "provider calls are
//! synchronous/blocking under the hood"). Tests use [`ScriptedTransport`],
//! which returns a pre-programmed sequence of responses, one per call,
//! modeling a provider that fails `k` times before succeeding.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

// ============================================================================
// SECTION: Response / Error
// ============================================================================

/// A transport-level response: status code plus raw body bytes.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body bytes.
    pub body: Vec<u8>,
}

/// A transport-level failure, before any provider-specific normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request exceeded its configured timeout.
    Timeout,
    /// Any other transport-level failure (DNS, connection reset, ...).
    Other(String),
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// The injectable HTTP boundary an adapter calls through.
pub trait ProviderTransport: Send + Sync {
    /// Sends `body` as JSON to `url`, with `api_key` as a bearer token
    /// when present, bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on timeout or any other transport
    /// failure. A non-2xx HTTP response is not an error at this layer —
    /// it is returned as an ordinary [`TransportResponse`] for the caller
    /// to classify.
    fn post_json(&self, url: &str, api_key: Option<&str>, body: &Value, timeout: Duration) -> Result<TransportResponse, TransportError>;
}

// ============================================================================
// SECTION: Real Transport
// ============================================================================

/// A [`ProviderTransport`] backed by a blocking `reqwest` client.
#[derive(Debug, Default)]
pub struct ReqwestTransport;

impl ProviderTransport for ReqwestTransport {
    fn post_json(&self, url: &str, api_key: Option<&str>, body: &Value, timeout: Duration) -> Result<TransportResponse, TransportError> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build().map_err(|err| TransportError::Other(err.to_string()))?;
        let mut request = client.post(url).json(body);
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().map_err(|err| if err.is_timeout() { TransportError::Timeout } else { TransportError::Other(err.to_string()) })?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(|err| TransportError::Other(err.to_string()))?.to_vec();
        Ok(TransportResponse { status, body })
    }
}

// ============================================================================
// SECTION: Scripted Transport (test double)
// ============================================================================

/// A scripted response queue: each call to `post_json` pops the next
/// entry, either a response or an injected transport error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<Vec<Result<TransportResponse, TransportError>>>,
}

impl ScriptedTransport {
    /// Builds a transport that replays `responses` in order, oldest
    /// first.
    #[must_use]
    pub fn new(responses: Vec<Result<TransportResponse, TransportError>>) -> Self {
        let mut responses = responses;
        responses.reverse();
        Self { responses: Mutex::new(responses) }
    }
}

impl ProviderTransport for ScriptedTransport {
    fn post_json(&self, _url: &str, _api_key: Option<&str>, _body: &Value, _timeout: Duration) -> Result<TransportResponse, TransportError> {
        let mut responses = self.responses.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        responses.pop().unwrap_or(Err(TransportError::Other("scripted transport exhausted".to_string())))
    }
}
