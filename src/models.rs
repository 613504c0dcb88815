// ABOUTME: Core data models for the CalTrack nutrition resolution pipeline
// ABOUTME: Defines class probabilities, label maps, nutrition records, and feedback events
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Data Models
//!
//! Core data structures used throughout the resolution pipeline. All types are
//! plain serde-serializable values; nothing here performs I/O. Loading from
//! external sources lives in [`crate::nutrition::dataset`].
//!
//! ## Core Models
//!
//! - `ClassProbability`: one entry of a classifier output distribution
//! - `LabelMap`: read-only class index -> canonical name table
//! - `NutritionRecord`: per-100g nutrition facts for one canonical food
//! - `PredictionEntry` / `ResolutionResponse`: ranked resolution output
//! - `FeedbackEvent`: one append-only user judgment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// One entry of a classifier output distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbability {
    /// Index of the class in the model's output layer
    pub class_index: usize,
    /// Predicted probability in [0, 1]
    pub probability: f64,
}

impl ClassProbability {
    /// Create a single class/probability pair
    #[must_use]
    pub const fn new(class_index: usize, probability: f64) -> Self {
        Self {
            class_index,
            probability,
        }
    }

    /// Convert a dense softmax vector (position = class index) into pairs.
    ///
    /// This is the shape a classifier forward pass produces; the resolver
    /// consumes the explicit pair form so sparse inputs work too.
    #[must_use]
    pub fn from_dense(probabilities: &[f64]) -> Vec<Self> {
        probabilities
            .iter()
            .enumerate()
            .map(|(class_index, &probability)| Self {
                class_index,
                probability,
            })
            .collect()
    }
}

/// Read-only mapping from class index to canonical class name.
///
/// Loaded once at startup and never mutated afterwards, so shared references
/// can be handed to concurrent resolution calls without locking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelMap {
    labels: HashMap<usize, String>,
}

impl LabelMap {
    /// Build from an ordered label list (position = class index)
    #[must_use]
    pub fn from_labels(labels: Vec<String>) -> Self {
        Self {
            labels: labels.into_iter().enumerate().collect(),
        }
    }

    /// Build from a `name -> index` table, the orientation label-map files use,
    /// inverting it into the `index -> name` lookup the resolver needs
    #[must_use]
    pub fn from_name_to_index(table: HashMap<String, usize>) -> Self {
        Self {
            labels: table.into_iter().map(|(name, idx)| (idx, name)).collect(),
        }
    }

    /// Canonical name for a class index
    #[must_use]
    pub fn get(&self, class_index: usize) -> Option<&str> {
        self.labels.get(&class_index).map(String::as_str)
    }

    /// Number of known classes
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the map contains no classes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Per-100g nutrition facts for one canonical food name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionRecord {
    /// Canonical food name (unique key within a dataset)
    pub name: String,
    /// Energy in kcal per 100g
    pub calories: f64,
    /// Protein in grams per 100g
    pub protein_g: f64,
    /// Fat in grams per 100g
    pub fat_g: f64,
    /// Carbohydrates in grams per 100g
    pub carbs_g: f64,
    /// Optional micro-nutrients (name -> amount per 100g)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub micros: BTreeMap<String, f64>,
}

impl NutritionRecord {
    /// Create a record with the four macro fields and no micro-nutrients
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        calories: f64,
        protein_g: f64,
        fat_g: f64,
        carbs_g: f64,
    ) -> Self {
        Self {
            name: name.into(),
            calories,
            protein_g,
            fat_g,
            carbs_g,
            micros: BTreeMap::new(),
        }
    }

    /// Scale every nutrient linearly from the 100g reference to `serving_grams`.
    ///
    /// Scaling is exact; display rounding is applied separately via
    /// [`NutritionRecord::rounded`].
    #[must_use]
    pub fn scaled_for_serving(&self, serving_grams: f64) -> Self {
        let factor = serving_grams / 100.0;
        Self {
            name: self.name.clone(),
            calories: self.calories * factor,
            protein_g: self.protein_g * factor,
            fat_g: self.fat_g * factor,
            carbs_g: self.carbs_g * factor,
            micros: self
                .micros
                .iter()
                .map(|(k, v)| (k.clone(), v * factor))
                .collect(),
        }
    }

    /// Round every nutrient to `decimals` decimal places
    #[must_use]
    pub fn rounded(&self, decimals: u32) -> Self {
        Self {
            name: self.name.clone(),
            calories: round_to_decimals(self.calories, decimals),
            protein_g: round_to_decimals(self.protein_g, decimals),
            fat_g: round_to_decimals(self.fat_g, decimals),
            carbs_g: round_to_decimals(self.carbs_g, decimals),
            micros: self
                .micros
                .iter()
                .map(|(k, v)| (k.clone(), round_to_decimals(*v, decimals)))
                .collect(),
        }
    }
}

/// Round to a fixed number of decimal places
#[must_use]
#[allow(clippy::cast_possible_wrap)] // decimals is clamped well below i32::MAX
pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals.min(12) as i32);
    (value * factor).round() / factor
}

/// Outcome of matching a predicted label against the nutrition index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// The label the matcher was asked about
    pub query_label: String,
    /// Best candidate name, present only when the score cleared the threshold
    pub matched_name: Option<String>,
    /// Similarity score of the best candidate in [0, 1]
    pub similarity: f64,
    /// Whether `similarity` reached the configured threshold
    pub matched: bool,
}

impl MatchResult {
    /// A below-threshold (or empty-candidate-set) outcome
    #[must_use]
    pub fn miss(query_label: impl Into<String>, similarity: f64) -> Self {
        Self {
            query_label: query_label.into(),
            matched_name: None,
            similarity,
            matched: false,
        }
    }
}

/// One ranked prediction with its resolved nutrition, if any
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionEntry {
    /// 1-based rank; rank 1 is the highest-probability class
    pub rank: usize,
    /// Canonical class name from the label map
    pub label: String,
    /// Predicted probability in [0, 1]
    pub probability: f64,
    /// Nutrition facts scaled to the requested serving; `None` when neither
    /// exact nor fuzzy lookup found a record
    pub nutrition: Option<NutritionRecord>,
    /// `serving_grams / 100.0`, the factor applied to the per-100g reference
    pub serving_scale: f64,
}

/// Result of one resolution call.
///
/// Owned by the caller; the core retains nothing after returning it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionResponse {
    /// Unique id for this prediction event, used to key feedback
    pub prediction_id: Uuid,
    /// Ranked entries, `min(top_k, number of classes)` of them
    pub top_entries: Vec<PredictionEntry>,
    /// Wall-clock latency of the whole resolution in milliseconds
    pub latency_ms: f64,
    /// When the resolution completed
    pub timestamp: DateTime<Utc>,
}

impl ResolutionResponse {
    /// The rank-1 entry
    #[must_use]
    pub fn top1(&self) -> Option<&PredictionEntry> {
        self.top_entries.first()
    }
}

/// User judgment on a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackJudgment {
    /// The prediction was correct/helpful
    Positive,
    /// The prediction was wrong/unhelpful
    Negative,
}

impl FeedbackJudgment {
    /// Stable lowercase name, used in telemetry metric names
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

/// One user-submitted correctness judgment, appended to the feedback log.
///
/// Events are written once and never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    /// Id of the prediction event this feedback refers to
    pub prediction_id: String,
    /// The judgment
    pub judgment: FeedbackJudgment,
    /// Free-form comment; empty when the user left none
    #[serde(default)]
    pub comment: String,
    /// When the feedback was submitted
    pub timestamp: DateTime<Utc>,
}

impl FeedbackEvent {
    /// Create an event for a prediction id, stamped now
    #[must_use]
    pub fn new(
        prediction_id: impl Into<String>,
        judgment: FeedbackJudgment,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            prediction_id: prediction_id.into(),
            judgment,
            comment: comment.into(),
            timestamp: Utc::now(),
        }
    }

    /// Tie an event to a resolution response
    #[must_use]
    pub fn for_response(
        response: &ResolutionResponse,
        judgment: FeedbackJudgment,
        comment: impl Into<String>,
    ) -> Self {
        Self::new(response.prediction_id.to_string(), judgment, comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dense_preserves_order() {
        let pairs = ClassProbability::from_dense(&[0.1, 0.7, 0.2]);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[1].class_index, 1);
        assert!((pairs[1].probability - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_label_map_inversion() {
        let mut table = HashMap::new();
        table.insert("pizza".to_owned(), 0);
        table.insert("salad".to_owned(), 1);

        let map = LabelMap::from_name_to_index(table);
        assert_eq!(map.get(0), Some("pizza"));
        assert_eq!(map.get(1), Some("salad"));
        assert_eq!(map.get(2), None);
    }

    #[test]
    fn test_scaling_is_linear() {
        let record = NutritionRecord::new("pizza", 266.0, 11.0, 10.0, 33.0);
        let scaled = record.scaled_for_serving(200.0);

        assert!((scaled.calories - 532.0).abs() < 1e-9);
        assert!((scaled.protein_g - 22.0).abs() < 1e-9);

        // Un-scaling returns the original within floating-point tolerance
        let back = scaled.scaled_for_serving(50.0);
        assert!((back.calories - record.calories).abs() < 1e-9);
    }

    #[test]
    fn test_micros_scale_with_macros() {
        let mut record = NutritionRecord::new("spinach", 23.0, 2.9, 0.4, 3.6);
        record.micros.insert("iron_mg".to_owned(), 2.7);

        let scaled = record.scaled_for_serving(50.0);
        assert!((scaled.micros["iron_mg"] - 1.35).abs() < 1e-9);
    }

    #[test]
    fn test_rounding_policy() {
        let record = NutritionRecord::new("salad", 33.333, 1.004, 0.0, 4.999);
        let rounded = record.rounded(2);
        assert!((rounded.calories - 33.33).abs() < 1e-9);
        assert!((rounded.protein_g - 1.0).abs() < 1e-9);
        assert!((rounded.carbs_g - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_feedback_event_round_trips_as_json() {
        let event = FeedbackEvent::new("pred-1", FeedbackJudgment::Positive, "correct dish");

        let line = serde_json::to_string(&event).unwrap();
        assert!(line.contains("\"positive\""));
        let parsed: FeedbackEvent = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, event);
    }
}
