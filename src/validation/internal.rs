//! Text heuristic run inside the backend on create, on trigger, or from the CLI.

use super::{clamp_score, ScoreCard, Scorer};
use crate::memory::types::Memory;

pub const MAX_SCORE: f64 = 100.0;
pub const PASS_THRESHOLD: f64 = 50.0;
pub const MAX_LENGTH_SCORE: f64 = 40.0;
pub const KEYWORD_BONUS: f64 = 8.0;
pub const DUPLICATE_PENALTY: f64 = 20.0;

pub const KEYWORDS: [&str; 5] = ["important", "remember", "study", "note", "research"];

/// Length, keyword, and duplicate heuristic on a 0–100 scale.
#[derive(Debug, Clone, Copy, Default)]
pub struct InternalHeuristic;

impl Scorer for InternalHeuristic {
    fn name(&self) -> &'static str {
        "internal"
    }

    fn max_score(&self) -> f64 {
        MAX_SCORE
    }

    fn threshold(&self) -> f64 {
        PASS_THRESHOLD
    }

    fn score(&self, memory: &Memory, duplicates: i64) -> ScoreCard {
        let length = memory.summary.chars().count();
        let length_score = (length as f64 / 5.0).min(MAX_LENGTH_SCORE);

        let summary = memory.summary.to_lowercase();
        let title = memory.title.to_lowercase();
        let keyword_bonus = KEYWORDS
            .iter()
            .filter(|kw| summary.contains(*kw) || title.contains(*kw))
            .count() as f64
            * KEYWORD_BONUS;

        let duplicate_penalty = if duplicates > 1 { DUPLICATE_PENALTY } else { 0.0 };

        let raw = length_score + keyword_bonus - duplicate_penalty;
        let score = clamp_score(raw, MAX_SCORE);
        let valid = score >= PASS_THRESHOLD;

        // whole when the length score is capped or the raw score clamps to zero
        let rendered = if length_score >= MAX_LENGTH_SCORE || raw <= 0.0 {
            format!("{score}")
        } else {
            format!("{score:?}")
        };

        ScoreCard {
            score,
            valid,
            reason: format!(
                "length={length}, keywords={keyword_bonus}, duplicates={duplicates}, score={rendered}"
            ),
        }
    }
}
