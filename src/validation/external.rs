//! Fingerprint-norm heuristic used by the polling worker on its own 0–1000 scale.

use std::collections::BTreeMap;

use super::{clamp_score, ScoreCard, Scorer};
use crate::embedding::{fingerprint, l2_norm};
use crate::memory::types::Memory;

pub const MAX_SCORE: f64 = 1000.0;
pub const PASS_THRESHOLD: f64 = 300.0;
pub const TITLE_BONUS_PER_CHAR: f64 = 5.0;
pub const MAX_TITLE_BONUS: f64 = 200.0;

/// Norm of the title+summary fingerprint, plus title length and category bonuses.
#[derive(Debug, Clone)]
pub struct ExternalHeuristic {
    /// Exact, case-sensitive category matches.
    category_bonuses: BTreeMap<String, f64>,
}

impl Default for ExternalHeuristic {
    fn default() -> Self {
        let category_bonuses = [("science", 50.0), ("history", 30.0), ("art", 20.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Self { category_bonuses }
    }
}

impl ExternalHeuristic {
    pub fn with_category_bonuses(category_bonuses: BTreeMap<String, f64>) -> Self {
        Self { category_bonuses }
    }

    fn category_bonus(&self, category: &str) -> f64 {
        self.category_bonuses.get(category).copied().unwrap_or(0.0)
    }

    /// Score raw fields, for callers that hold no full [`Memory`].
    pub fn score_fields(&self, title: &str, summary: &str, category: &str) -> ScoreCard {
        let fp = fingerprint(&format!("{title} {summary}"));
        let base = (l2_norm(&fp) * 100.0).floor();
        let title_bonus = (title.chars().count() as f64 * TITLE_BONUS_PER_CHAR).min(MAX_TITLE_BONUS);
        let category_bonus = self.category_bonus(category);

        let score = clamp_score(base + title_bonus + category_bonus, MAX_SCORE);
        let valid = score >= PASS_THRESHOLD;

        ScoreCard {
            score,
            valid,
            reason: format!(
                "base={base}, title_bonus={title_bonus}, category_bonus={category_bonus}, score={score}"
            ),
        }
    }
}

impl Scorer for ExternalHeuristic {
    fn name(&self) -> &'static str {
        "external"
    }

    fn max_score(&self) -> f64 {
        MAX_SCORE
    }

    fn threshold(&self) -> f64 {
        PASS_THRESHOLD
    }

    /// Duplicates are not considered on this scale.
    fn score(&self, memory: &Memory, _duplicates: i64) -> ScoreCard {
        self.score_fields(&memory.title, &memory.summary, &memory.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::test_support::memory;

    fn score(title: &str, summary: &str, category: &str) -> ScoreCard {
        ExternalHeuristic::default().score(&memory(title, summary, category), 1)
    }

    #[test]
    fn science_note_below_threshold() {
        let card = score(
            "Test memory",
            "This is an important research note to remember",
            "science",
        );
        assert_eq!(card.score, 255.0);
        assert!(!card.valid);
        assert_eq!(
            card.reason,
            "base=150, title_bonus=55, category_bonus=50, score=255"
        );
    }

    #[test]
    fn empty_fields_score_base_only() {
        let card = score("", "", "");
        assert_eq!(card.score, 155.0);
        assert_eq!(card.reason, "base=155, title_bonus=0, category_bonus=0, score=155");
        assert!(!card.valid);
    }

    #[test]
    fn long_title_and_category_pass() {
        let card = score(
            "Photosynthesis basics",
            "Plants convert light into chemical energy",
            "science",
        );
        assert_eq!(card.score, 337.0);
        assert!(card.valid);
    }

    #[test]
    fn unknown_category_gets_no_bonus() {
        let card = score("x", "y", "general");
        assert_eq!(card.score, 164.0);
        assert!(card.reason.contains("category_bonus=0"));
    }

    #[test]
    fn category_match_is_case_sensitive() {
        let lower = score("x", "y", "history");
        let upper = score("x", "y", "History");
        assert_eq!(lower.score - upper.score, 30.0);
    }

    #[test]
    fn title_bonus_is_capped() {
        let title = "t".repeat(100);
        let card = score(&title, "s", "general");
        assert!(card.reason.contains("title_bonus=200"));
    }

    #[test]
    fn score_clamps_to_scale() {
        let heuristic = ExternalHeuristic::with_category_bonuses(BTreeMap::from([(
            "huge".to_string(),
            5000.0,
        )]));
        let card = heuristic.score(&memory("x", "y", "huge"), 1);
        assert_eq!(card.score, 1000.0);
        assert!(card.valid);
    }

    #[test]
    fn duplicates_do_not_change_score() {
        let m = memory("x", "y", "art");
        let h = ExternalHeuristic::default();
        assert_eq!(h.score(&m, 1), h.score(&m, 5));
    }
}
