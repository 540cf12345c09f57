// crates/lootforge-core/src/hashing.rs
// ============================================================================
// Module: LootForge Hashing
// Description: Deterministic content hashing for jobs, runs, and artifacts.
// Purpose: Give every content-addressed identity in the pipeline one
//   canonical recipe so two runs over identical inputs produce identical ids.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Every deterministic identity in LootForge (a `ProviderJob` id, a
//! provenance run id, an input hash) is `sha256` over a canonical byte
//! representation. Canonicalization goes through [`serde_jcs`] (JSON
//! Canonicalization Scheme) so that struct field order, whitespace, and
//! number formatting never leak into the digest — two hosts with the
//! same `serde_json::Value` always hash identically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure while canonicalizing a value for hashing.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// The value could not be serialized into canonical JSON.
    #[error("canonicalization failed: {0}")]
    Canonicalize(String),
}

// ============================================================================
// SECTION: Hashing
// ============================================================================

/// Returns the lowercase hex-encoded sha256 digest of `bytes`.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

/// Returns the lowercase hex-encoded sha256 digest of the canonical JSON
/// form of `value`.
///
/// # Errors
///
/// Returns [`HashError`] when `value` cannot be serialized.
pub fn hash_canonical_json<T: serde::Serialize>(value: &T) -> Result<String, HashError> {
    let canonical = canonical_json_bytes(value)?;
    Ok(hash_bytes(&canonical))
}

/// Serializes `value` into its canonical JSON byte form (RFC 8785 JCS).
///
/// # Errors
///
/// Returns [`HashError`] when `value` cannot be serialized.
pub fn canonical_json_bytes<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_string(value).map(String::into_bytes).map_err(|err| HashError::Canonicalize(err.to_string()))
}

/// Combines an ordered list of string fields into one deterministic digest.
///
/// This is the primitive behind the `ProviderJob` id recipe (§3 of the
/// spec): the caller supplies the canonical tuple fields in a fixed order
/// and joins them with a separator byte that cannot appear unescaped in any
/// field, then hashes the result.
#[must_use]
pub fn hash_tuple(fields: &[&str]) -> String {
    let mut buffer = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            buffer.push(0x1f); // ASCII unit separator
        }
        buffer.extend_from_slice(field.as_bytes());
    }
    hash_bytes(&buffer)
}

/// Hex-encodes `bytes` in lowercase without allocating a formatting crate.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted to unwrap."
)]
mod tests {
    use super::hash_bytes;
    use super::hash_canonical_json;
    use super::hash_tuple;

    #[test]
    fn hash_bytes_is_deterministic() {
        assert_eq!(hash_bytes(b"hello"), hash_bytes(b"hello"));
        assert_ne!(hash_bytes(b"hello"), hash_bytes(b"world"));
    }

    #[test]
    fn canonical_json_ignores_field_order() {
        let a = serde_json::json!({"a": 1, "b": 2});
        let b = serde_json::json!({"b": 2, "a": 1});
        assert_eq!(hash_canonical_json(&a).unwrap(), hash_canonical_json(&b).unwrap());
    }

    #[test]
    fn hash_tuple_distinguishes_field_boundaries() {
        let first = hash_tuple(&["ab", "c"]);
        let second = hash_tuple(&["a", "bc"]);
        assert_ne!(first, second);
    }
}
