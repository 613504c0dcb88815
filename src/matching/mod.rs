// ABOUTME: Fuzzy label matching module resolving predicted labels to dataset names
// ABOUTME: Pluggable similarity scoring behind a narrow trait plus the threshold matcher
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Fuzzy Label Matching
//!
//! Classifier labels and dataset names rarely agree byte-for-byte
//! (`caesar_salad` vs `Caesar salad`). This module resolves a predicted label
//! to the closest canonical name in the nutrition index, or reports a miss when
//! nothing scores above the configured threshold.
//!
//! The concrete similarity algorithm sits behind [`SimilarityScorer`] so it can
//! be swapped without touching the resolver.

/// The fuzzy matcher
pub mod matcher;
/// Similarity scoring strategies
pub mod scorer;

pub use matcher::FuzzyMatcher;
pub use scorer::{NormalizedLevenshteinScorer, SimilarityScorer, TokenSetScorer};
