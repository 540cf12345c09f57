// crates/lootforge-core/src/identifiers.rs
// ============================================================================
// Module: LootForge Identifiers
// Description: Canonical opaque identifiers shared across every stage.
// Purpose: Provide strongly typed, serializable identifiers with stable wire
//   forms so targets-index, provenance, eval and selection-lock documents
//   can cross-reference each other unambiguously.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Target and job identifiers are opaque strings on the wire. Target ids are
//! author-supplied; job and run ids are content-addressed hashes computed by
//! [`crate::hashing`]. Provider names are a closed enum because the set of
//! supported providers is part of the stage contract (§4.3 of the spec).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Target Identity
// ============================================================================

/// Stable, author-supplied identifier for a manifest target.
///
/// # Invariants
/// - Non-empty.
/// - Unique within a plan (enforced by the planner, not by this type).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Creates a new target identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Job Identity
// ============================================================================

/// Content-addressed identifier for one `ProviderJob` (§3 invariant 4: a
/// pure function of its content tuple).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wraps a precomputed digest as a job id.
    #[must_use]
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Run Identity
// ============================================================================

/// Identifier for one generate invocation, derived from
/// `sha256(inputHash:startTimestamp)[0:16]` unless the caller supplies one
/// (§4.5 step 1).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Wraps a precomputed or caller-supplied run id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives a run id from an input hash and a start timestamp, truncated
    /// to the first 16 hex characters as the spec prescribes.
    #[must_use]
    pub fn derive(input_hash: &str, start_millis: i64) -> Self {
        let digest = crate::hashing::hash_bytes(format!("{input_hash}:{start_millis}").as_bytes());
        Self(digest.chars().take(16).collect())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Provider Name
// ============================================================================

/// The closed set of image providers LootForge knows how to route to
/// (§4.3). Concrete wire protocols are injectable adapters; this enum only
/// names which adapter a job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    /// OpenAI Images API adapter.
    Openai,
    /// Gemini ("nano banana") image generation adapter.
    Nano,
    /// Locally hosted diffusion server adapter.
    Local,
}

impl ProviderName {
    /// Returns the canonical lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Nano => "nano",
            Self::Local => "local",
        }
    }

    /// Parses a provider name from its wire form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "openai" => Some(Self::Openai),
            "nano" => Some(Self::Nano),
            "local" => Some(Self::Local),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use super::ProviderName;
    use super::RunId;

    #[test]
    fn provider_name_round_trips() {
        for provider in [ProviderName::Openai, ProviderName::Nano, ProviderName::Local] {
            assert_eq!(ProviderName::parse(provider.as_str()), Some(provider));
        }
    }

    #[test]
    fn run_id_is_pure_function_of_inputs() {
        let a = RunId::derive("abc123", 1_000);
        let b = RunId::derive("abc123", 1_000);
        let c = RunId::derive("abc123", 1_001);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 16);
    }
}
