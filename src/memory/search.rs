use anyhow::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::embedding::{fingerprint, l2_norm};

/// Guards the cosine denominator when either vector is all zeros.
pub const COSINE_EPSILON: f64 = 1e-9;

// ── Public types ──────────────────────────────────────────────────────────────

/// A memory considered for ranking.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: i64,
    pub title: String,
    pub summary: String,
    /// Cached fingerprint; recomputed from `summary` when `None` or empty.
    pub fingerprint: Option<Vec<f64>>,
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarMemory {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub score: f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Rank `candidates` by cosine similarity to the fingerprint of `query_text`.
///
/// Results are sorted by score descending; equal scores keep candidate order.
/// A `limit` of zero or less returns nothing.
pub fn rank(query_text: &str, candidates: Vec<Candidate>, limit: i64) -> Vec<SimilarMemory> {
    let limit = usize::try_from(limit).unwrap_or(0);
    if limit == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let query = fingerprint(query_text);

    let mut results: Vec<SimilarMemory> = candidates
        .into_iter()
        .map(|c| {
            let score = match c.fingerprint.as_deref() {
                Some(v) if !v.is_empty() => cosine_similarity(&query, v),
                _ => cosine_similarity(&query, &fingerprint(&c.summary)),
            };
            SimilarMemory {
                id: c.id,
                title: c.title,
                summary: c.summary,
                score,
            }
        })
        .collect();

    // sort_by is stable; -0.0 and 0.0 compare equal here
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results.truncate(limit);
    results
}

/// Load every stored memory and rank it against `query_text`.
pub fn find_similar(conn: &Connection, query_text: &str, limit: i64) -> Result<Vec<SimilarMemory>> {
    let candidates = super::store::similarity_candidates(conn)?
        .into_iter()
        .map(|(id, title, summary, fingerprint)| Candidate {
            id,
            title,
            summary,
            fingerprint,
        })
        .collect();

    let results = rank(query_text, candidates, limit);
    tracing::debug!(query_len = query_text.len(), results = results.len(), "similarity search");
    Ok(results)
}

/// `dot(a, b) / (|a| * |b| + ε)`.
///
/// The dot product covers the common prefix when lengths differ; each norm covers
/// its whole vector.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (l2_norm(a) * l2_norm(b) + COSINE_EPSILON)
}
