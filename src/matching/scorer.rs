// ABOUTME: Similarity scoring strategies for fuzzy label matching
// ABOUTME: Token-set scoring with a Jaro-Winkler component plus a Levenshtein alternative
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Similarity scorers.
//!
//! All scorers are deterministic, symmetric in practice, and return a value in
//! [0, 1]. Inputs are normalized first: lowercased, underscores and hyphens
//! become spaces, runs of whitespace collapse.

use crate::config::ScorerKind;
use std::collections::BTreeSet;

/// A normalized string-similarity scoring strategy
pub trait SimilarityScorer {
    /// Score similarity of two labels; 1.0 is identical, 0.0 is unrelated
    fn score(&self, a: &str, b: &str) -> f64;

    /// Short stable name for logging
    fn name(&self) -> &'static str;
}

/// Lowercase and collapse separator characters to single spaces
#[must_use]
pub fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Default scorer: the maximum of whole-string Jaro-Winkler similarity and a
/// Dice coefficient over the token sets.
///
/// The token-set component makes word reordering cheap ("salad caesar" still
/// matches "caesar salad"); the Jaro-Winkler component covers single-token
/// typos the set overlap cannot see.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSetScorer;

impl SimilarityScorer for TokenSetScorer {
    fn score(&self, a: &str, b: &str) -> f64 {
        let a = normalize_label(a);
        let b = normalize_label(b);

        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        if a == b {
            return 1.0;
        }

        let whole_string = strsim::jaro_winkler(&a, &b);

        let tokens_a: BTreeSet<&str> = a.split(' ').collect();
        let tokens_b: BTreeSet<&str> = b.split(' ').collect();
        let shared = tokens_a.intersection(&tokens_b).count();
        #[allow(clippy::cast_precision_loss)]
        let dice = (2 * shared) as f64 / (tokens_a.len() + tokens_b.len()) as f64;

        whole_string.max(dice).clamp(0.0, 1.0)
    }

    fn name(&self) -> &'static str {
        "token_set"
    }
}

/// Alternative scorer: normalized Levenshtein edit distance over the whole
/// normalized strings
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedLevenshteinScorer;

impl SimilarityScorer for NormalizedLevenshteinScorer {
    fn score(&self, a: &str, b: &str) -> f64 {
        let a = normalize_label(a);
        let b = normalize_label(b);

        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        strsim::normalized_levenshtein(&a, &b).clamp(0.0, 1.0)
    }

    fn name(&self) -> &'static str {
        "levenshtein"
    }
}

/// Instantiate the configured scorer
#[must_use]
pub fn scorer_for(kind: ScorerKind) -> Box<dyn SimilarityScorer + Send + Sync> {
    match kind {
        ScorerKind::TokenSet => Box::new(TokenSetScorer),
        ScorerKind::Levenshtein => Box::new(NormalizedLevenshteinScorer),
    }
}
