//! Validation pipeline.
//!
//! Provides the [`Scorer`] trait with two independent strategies on different
//! scales: [`internal::InternalHeuristic`] (0–100, run inside the backend) and
//! [`external::ExternalHeuristic`] (0–1000, run by the polling worker). The
//! [`lifecycle`] module persists verdicts and moves memory status; [`queue`]
//! carries fire-and-forget trigger requests to a background worker.

pub mod external;
pub mod internal;
pub mod lifecycle;
pub mod queue;

use serde::Serialize;

use crate::memory::types::Memory;

/// Outcome of scoring one memory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCard {
    pub score: f64,
    pub valid: bool,
    /// Human-readable audit trail of the intermediate values.
    pub reason: String,
}

/// A named scoring strategy.
///
/// Implementations are pure: they read the memory and the duplicate count and never
/// touch the store. Thresholds are tied to each strategy's own scale.
pub trait Scorer: Send + Sync {
    /// Strategy name, e.g. `"internal"`.
    fn name(&self) -> &'static str;

    /// Upper bound of the score scale.
    fn max_score(&self) -> f64;

    /// Minimum score for a passing verdict.
    fn threshold(&self) -> f64;

    /// `duplicates` counts memories sharing this memory's content hash, itself included.
    fn score(&self, memory: &Memory, duplicates: i64) -> ScoreCard;
}

pub fn clamp_score(raw: f64, max: f64) -> f64 {
    raw.clamp(0.0, max)
}

/// Pick a strategy by name. Unknown names yield `None`.
pub fn scorer_by_name(name: &str) -> Option<Box<dyn Scorer>> {
    match name {
        "internal" => Some(Box::new(internal::InternalHeuristic)),
        "external" => Some(Box::new(external::ExternalHeuristic::default())),
        _ => None,
    }
}
