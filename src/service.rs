// ABOUTME: Facade bundling index, matcher, telemetry, and feedback into the core's API
// ABOUTME: Exposes resolve() and record_feedback(), recording telemetry on every path
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Resolution Service
//!
//! The seam the external serving layer wraps. Owns the load-once resources
//! (label map, nutrition index) and the process-wide recorders, and exposes the
//! core's two operations:
//!
//! - [`ResolutionService::resolve`] — run the pipeline and record telemetry,
//!   on the success and the rejection path alike
//! - [`ResolutionService::record_feedback`] — durably append a judgment, then
//!   bump its counter
//!
//! Telemetry is pulled via [`ResolutionService::telemetry`].

use crate::config::CoreConfig;
use crate::errors::AppResult;
use crate::feedback::FeedbackStore;
use crate::matching::FuzzyMatcher;
use crate::models::{ClassProbability, FeedbackEvent, LabelMap, ResolutionResponse};
use crate::nutrition::NutritionIndex;
use crate::resolver::PredictionResolver;
use crate::telemetry::TelemetryRecorder;
use std::time::Instant;
use tracing::warn;

/// Bundles the resolution pipeline with its load-once resources
pub struct ResolutionService {
    label_map: LabelMap,
    index: NutritionIndex,
    resolver: PredictionResolver,
    telemetry: TelemetryRecorder,
    feedback: FeedbackStore,
    default_top_k: usize,
}

impl ResolutionService {
    /// Assemble the service from configuration and pre-loaded resources
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::PersistenceError`](crate::errors::ErrorCode) when
    /// the feedback log cannot be opened.
    pub fn new(config: &CoreConfig, label_map: LabelMap, index: NutritionIndex) -> AppResult<Self> {
        let feedback = FeedbackStore::open(&config.feedback)?;
        let matcher = FuzzyMatcher::new(&config.fuzzy);

        Ok(Self {
            label_map,
            index,
            resolver: PredictionResolver::new(matcher, config.resolver.clone()),
            telemetry: TelemetryRecorder::new(),
            feedback,
            default_top_k: config.resolver.default_top_k,
        })
    }

    /// Resolve a probability vector, recording telemetry for the attempt.
    ///
    /// `top_k` falls back to the configured default when `None`. Rejected
    /// input still counts toward the request and error counters; no partial
    /// response is returned.
    ///
    /// # Errors
    ///
    /// Propagates [`ErrorCode::InvalidInput`](crate::errors::ErrorCode) from
    /// the resolver.
    pub fn resolve(
        &self,
        probabilities: &[ClassProbability],
        top_k: Option<usize>,
        serving_grams: f64,
    ) -> AppResult<ResolutionResponse> {
        let started = Instant::now();
        let top_k = top_k.unwrap_or(self.default_top_k);

        match self
            .resolver
            .resolve(probabilities, &self.label_map, &self.index, top_k, serving_grams)
        {
            Ok(response) => {
                self.telemetry.record_resolution(&response, true);
                Ok(response)
            }
            Err(error) => {
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                self.telemetry.record_rejected_request(latency_ms);
                warn!(code = ?error.code, "resolution rejected");
                Err(error)
            }
        }
    }

    /// Durably append a feedback event, then bump its judgment counter.
    ///
    /// The counter is incremented only after the append succeeded, so the
    /// counters never overcount stored events.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::PersistenceError`](crate::errors::ErrorCode) when
    /// the append fails; the event is not silently dropped and the caller may
    /// retry.
    pub fn record_feedback(&self, event: &FeedbackEvent) -> AppResult<()> {
        self.feedback.append(event)?;
        self.telemetry.record_feedback(event.judgment);
        Ok(())
    }

    /// The telemetry recorder, for pull-based scraping
    #[must_use]
    pub const fn telemetry(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    /// The feedback store, for offline analysis reads
    #[must_use]
    pub const fn feedback_store(&self) -> &FeedbackStore {
        &self.feedback
    }

    /// The nutrition index the service resolves against
    #[must_use]
    pub const fn nutrition_index(&self) -> &NutritionIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedbackConfig;
    use crate::errors::ErrorCode;
    use crate::models::{FeedbackJudgment, NutritionRecord};
    use tempfile::tempdir;

    fn test_service(dir: &std::path::Path) -> ResolutionService {
        let config = CoreConfig {
            feedback: FeedbackConfig {
                path: dir.join("feedback.jsonl"),
                sync_on_append: false,
            },
            ..CoreConfig::default()
        };

        let label_map = LabelMap::from_labels(vec!["pizza".to_owned(), "salad".to_owned()]);
        let index = NutritionIndex::load(vec![
            NutritionRecord::new("pizza", 266.0, 11.0, 10.0, 33.0),
            NutritionRecord::new("salad", 20.0, 1.0, 0.2, 3.0),
        ])
        .unwrap();

        ResolutionService::new(&config, label_map, index).unwrap()
    }

    #[test]
    fn test_resolve_records_success_telemetry() {
        let dir = tempdir().unwrap();
        let service = test_service(dir.path());

        let probabilities = vec![
            ClassProbability::new(0, 0.82),
            ClassProbability::new(1, 0.18),
        ];
        let response = service.resolve(&probabilities, Some(1), 200.0).unwrap();

        assert_eq!(response.top_entries[0].label, "pizza");

        let snapshot = service.telemetry().snapshot();
        assert_eq!(snapshot.prediction_requests_total, 1);
        assert_eq!(snapshot.prediction_errors_total, 0);
        assert_eq!(snapshot.prediction_confidence.count, 1);
    }

    #[test]
    fn test_rejection_counts_as_error() {
        let dir = tempdir().unwrap();
        let service = test_service(dir.path());

        let err = service.resolve(&[], Some(1), 100.0).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let snapshot = service.telemetry().snapshot();
        assert_eq!(snapshot.prediction_requests_total, 1);
        assert_eq!(snapshot.prediction_errors_total, 1);
    }

    #[test]
    fn test_default_top_k_applies() {
        let dir = tempdir().unwrap();
        let service = test_service(dir.path());

        let probabilities = vec![
            ClassProbability::new(0, 0.6),
            ClassProbability::new(1, 0.4),
        ];
        // default_top_k is 5, vector has 2 classes
        let response = service.resolve(&probabilities, None, 100.0).unwrap();
        assert_eq!(response.top_entries.len(), 2);
    }

    #[test]
    fn test_feedback_appends_then_counts() {
        let dir = tempdir().unwrap();
        let service = test_service(dir.path());

        let event = FeedbackEvent::new("pred-1", FeedbackJudgment::Positive, "");
        service.record_feedback(&event).unwrap();

        let stored: Vec<_> = service
            .feedback_store()
            .read_all()
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(stored.len(), 1);
        assert_eq!(service.telemetry().snapshot().feedback_positive_total, 1);
    }
}
