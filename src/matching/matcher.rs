// ABOUTME: Threshold-based fuzzy matcher selecting the best candidate for a predicted label
// ABOUTME: Deterministic scan with lexicographic tie-breaking and a no-match outcome
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! The fuzzy matcher.
//!
//! Scores the query against every candidate and keeps the maximum. A score tie
//! resolves to the lexicographically smallest candidate name; a best score
//! below the threshold is a miss, not an error.

use crate::config::FuzzyMatchConfig;
use crate::matching::scorer::{scorer_for, SimilarityScorer};
use crate::models::MatchResult;
use tracing::trace;

/// Resolves a predicted label to the closest candidate name
pub struct FuzzyMatcher {
    scorer: Box<dyn SimilarityScorer + Send + Sync>,
    threshold: f64,
}

impl FuzzyMatcher {
    /// Build a matcher from configuration
    #[must_use]
    pub fn new(config: &FuzzyMatchConfig) -> Self {
        Self {
            scorer: scorer_for(config.scorer),
            threshold: config.threshold,
        }
    }

    /// Build a matcher with an explicit scoring strategy
    #[must_use]
    pub fn with_scorer(scorer: Box<dyn SimilarityScorer + Send + Sync>, threshold: f64) -> Self {
        Self { scorer, threshold }
    }

    /// The configured similarity threshold
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Match `query_label` against the candidate names.
    ///
    /// Deterministic: identical inputs always yield the identical result. When
    /// two candidates score equally, the lexicographically smaller name wins.
    /// An empty candidate set or a best score below the threshold yields
    /// `matched = false` with no name; the caller decides the fallback.
    pub fn match_label<'a>(
        &self,
        query_label: &str,
        candidates: impl IntoIterator<Item = &'a str>,
    ) -> MatchResult {
        let mut best_name: Option<&str> = None;
        let mut best_score = 0.0_f64;

        for candidate in candidates {
            let score = self.scorer.score(query_label, candidate);

            let better = match best_name {
                None => true,
                Some(current) => {
                    score > best_score || (score == best_score && candidate < current)
                }
            };
            if better {
                best_name = Some(candidate);
                best_score = score;
            }
        }

        trace!(
            query = query_label,
            best = ?best_name,
            score = best_score,
            scorer = self.scorer.name(),
            "fuzzy match scan complete"
        );

        match best_name {
            Some(name) if best_score >= self.threshold => MatchResult {
                query_label: query_label.to_owned(),
                matched_name: Some(name.to_owned()),
                similarity: best_score,
                matched: true,
            },
            _ => MatchResult::miss(query_label, best_score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::environment::DEFAULT_FUZZY_MATCH_THRESHOLD;

    fn default_matcher() -> FuzzyMatcher {
        FuzzyMatcher::new(&FuzzyMatchConfig::default())
    }

    #[test]
    fn test_case_mismatch_matches() {
        let result = default_matcher().match_label("Pizza", ["pizza", "salad"]);

        assert!(result.matched);
        assert_eq!(result.matched_name.as_deref(), Some("pizza"));
        assert!(result.similarity >= DEFAULT_FUZZY_MATCH_THRESHOLD);
    }

    #[test]
    fn test_below_threshold_is_a_miss() {
        let result = default_matcher().match_label("xylophone", ["pizza", "salad"]);

        assert!(!result.matched);
        assert_eq!(result.matched_name, None);
        assert!(result.similarity < DEFAULT_FUZZY_MATCH_THRESHOLD);
    }

    #[test]
    fn test_empty_candidates_is_a_miss() {
        let result = default_matcher().match_label("pizza", []);
        assert!(!result.matched);
        assert!((result.similarity - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tie_breaks_lexicographically() {
        // Both candidates differ from the query by the same trailing character
        let result = default_matcher().match_label("dumpling", ["dumplings", "dumplingz"]);

        assert!(result.matched);
        assert_eq!(result.matched_name.as_deref(), Some("dumplings"));
    }

    #[test]
    fn test_tie_break_is_order_independent() {
        let matcher = default_matcher();
        let forward = matcher.match_label("dumpling", ["dumplings", "dumplingz"]);
        let reverse = matcher.match_label("dumpling", ["dumplingz", "dumplings"]);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_idempotent() {
        let matcher = default_matcher();
        let first = matcher.match_label("caesar_salad", ["caesar salad", "greek salad"]);
        let second = matcher.match_label("caesar_salad", ["caesar salad", "greek salad"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_threshold_zero_always_matches_something() {
        let matcher = FuzzyMatcher::with_scorer(Box::new(crate::matching::TokenSetScorer), 0.0);
        let result = matcher.match_label("xylophone", ["pizza"]);
        assert!(result.matched);
        assert_eq!(result.matched_name.as_deref(), Some("pizza"));
    }
}
