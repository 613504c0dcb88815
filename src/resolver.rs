// ABOUTME: Prediction resolver ranking classifier output and attaching scaled nutrition
// ABOUTME: Validates input, ranks top-K classes, drives matching, and measures latency
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Prediction Resolver
//!
//! Turns a class-probability vector into a ranked, nutrition-annotated
//! response:
//!
//! 1. rank classes by probability descending, ties broken by ascending class
//!    index (fully deterministic)
//! 2. take the first `top_k`
//! 3. resolve each class name, look it up exactly, fall back to fuzzy matching
//! 4. attach nutrition scaled to the requested serving, or `None` on a miss
//! 5. stamp the response with latency, timestamp, and a prediction id
//!
//! Invalid input is rejected before any work begins; no partial response is
//! ever returned. A lookup miss is a per-entry outcome, never a failure of the
//! whole response.

use crate::config::ResolverConfig;
use crate::errors::{AppError, AppResult};
use crate::matching::FuzzyMatcher;
use crate::models::{
    ClassProbability, LabelMap, NutritionRecord, PredictionEntry, ResolutionResponse,
};
use crate::nutrition::NutritionIndex;
use chrono::Utc;
use std::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// Resolves classifier output into nutrition-annotated predictions
pub struct PredictionResolver {
    matcher: FuzzyMatcher,
    config: ResolverConfig,
}

impl PredictionResolver {
    /// Create a resolver with the given matcher and configuration
    #[must_use]
    pub fn new(matcher: FuzzyMatcher, config: ResolverConfig) -> Self {
        Self { matcher, config }
    }

    /// Resolve a probability vector into a ranked, nutrition-annotated response.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::InvalidInput`](crate::errors::ErrorCode) when the
    /// vector is empty, `top_k` is zero, `serving_grams` is not a positive
    /// finite number, or a ranked class index is missing from the label map.
    pub fn resolve(
        &self,
        probabilities: &[ClassProbability],
        label_map: &LabelMap,
        index: &NutritionIndex,
        top_k: usize,
        serving_grams: f64,
    ) -> AppResult<ResolutionResponse> {
        let started = Instant::now();
        validate_input(probabilities, top_k, serving_grams)?;

        let mut ranked = probabilities.to_vec();
        ranked.sort_by(|a, b| {
            b.probability
                .total_cmp(&a.probability)
                .then(a.class_index.cmp(&b.class_index))
        });
        ranked.truncate(top_k);

        let serving_scale = serving_grams / 100.0;
        let mut top_entries = Vec::with_capacity(ranked.len());

        for (position, class) in ranked.iter().enumerate() {
            let label = label_map.get(class.class_index).ok_or_else(|| {
                AppError::invalid_input(format!(
                    "class index {} is missing from the label map",
                    class.class_index
                ))
            })?;

            let nutrition = self.resolve_nutrition(label, index, serving_grams);

            top_entries.push(PredictionEntry {
                rank: position + 1,
                label: label.to_owned(),
                probability: class.probability,
                nutrition,
                serving_scale,
            });
        }

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        let response = ResolutionResponse {
            prediction_id: Uuid::new_v4(),
            top_entries,
            latency_ms,
            timestamp: Utc::now(),
        };

        debug!(
            prediction_id = %response.prediction_id,
            entries = response.top_entries.len(),
            latency_ms = response.latency_ms,
            "resolution complete"
        );

        Ok(response)
    }

    /// Exact lookup first, fuzzy match second; a miss is a normal outcome
    fn resolve_nutrition(
        &self,
        label: &str,
        index: &NutritionIndex,
        serving_grams: f64,
    ) -> Option<NutritionRecord> {
        let record = index.lookup_exact(label).or_else(|| {
            let matched = self.matcher.match_label(label, index.all_names());
            matched
                .matched_name
                .as_deref()
                .and_then(|name| index.lookup_exact(name))
        })?;

        let scaled = record.scaled_for_serving(serving_grams);
        Some(match self.config.scaled_decimals {
            Some(decimals) => scaled.rounded(decimals),
            None => scaled,
        })
    }
}

/// Reject malformed caller input before any work begins
fn validate_input(
    probabilities: &[ClassProbability],
    top_k: usize,
    serving_grams: f64,
) -> AppResult<()> {
    if probabilities.is_empty() {
        return Err(AppError::invalid_input("probability vector is empty"));
    }
    if top_k < 1 {
        return Err(AppError::invalid_input("top_k must be >= 1"));
    }
    if !serving_grams.is_finite() || serving_grams <= 0.0 {
        return Err(AppError::invalid_input(format!(
            "serving_grams must be a positive finite number, got {serving_grams}"
        )));
    }
    Ok(())
}
