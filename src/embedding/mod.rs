//! Deterministic text fingerprints and content hashing.
//!
//! A fingerprint is a short vector derived from the SHA-256 digest of the text, so
//! the same input yields the same vector across processes without calling a model.
//! [`content_hash`] is the duplicate-detection key stored alongside each memory.

use sha2::{Digest, Sha256};

/// Number of dimensions in stored fingerprints.
pub const FINGERPRINT_DIM: usize = 8;

/// SHA-256 yields 32 bytes and each dimension consumes two of them.
pub const MAX_FINGERPRINT_DIM: usize = 16;

/// Identifier recorded in `schema_meta` for the scheme that produced stored vectors.
pub const FINGERPRINT_SCHEME: &str = "sha256-u16be-8";

/// Fingerprint `text` into [`FINGERPRINT_DIM`] floats in `[-1, 1]`.
pub fn fingerprint(text: &str) -> Vec<f64> {
    fingerprint_with_dim(text, FINGERPRINT_DIM)
}

/// Fingerprint with an explicit dimension, capped at [`MAX_FINGERPRINT_DIM`].
///
/// Dimension `i` is the big-endian u16 formed by digest bytes `2i` and `2i + 1`,
/// scaled to `[0, 1]` and then to `[-1, 1]`.
pub fn fingerprint_with_dim(text: &str, dim: usize) -> Vec<f64> {
    let digest = Sha256::digest(text.as_bytes());
    digest
        .chunks_exact(2)
        .take(dim.min(MAX_FINGERPRINT_DIM))
        .map(|pair| {
            let v = u16::from_be_bytes([pair[0], pair[1]]);
            (f64::from(v) / 65535.0) * 2.0 - 1.0
        })
        .collect()
}

/// Lowercase hex SHA-256 of `summary` followed by `title`, no separator.
pub fn content_hash(summary: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(summary.as_bytes());
    hasher.update(title.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Euclidean norm.
pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Serialize a fingerprint for the `embedding` column.
pub fn encode_fingerprint(v: &[f64]) -> String {
    serde_json::to_string(v).unwrap_or_else(|_| "[]".to_string())
}

/// Decode a stored fingerprint. Missing, empty, or undecodable values yield `None`.
pub fn decode_fingerprint(raw: Option<&str>) -> Option<Vec<f64>> {
    let raw = raw?;
    match serde_json::from_str::<Vec<f64>>(raw) {
        Ok(v) if !v.is_empty() => Some(v),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "stored fingerprint is not a float array");
            None
        }
    }
}
