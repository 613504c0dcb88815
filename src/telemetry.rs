// ABOUTME: Process-wide telemetry counters and histograms for resolution and feedback events
// ABOUTME: Atomic-increment recording with pull-based snapshots and text exposition rendering
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Telemetry Recorder
//!
//! Operational telemetry for the resolution pipeline: a monotonic request
//! counter, an error counter, latency and top-1-confidence histograms, and
//! positive/negative feedback counters.
//!
//! All state is process-wide and lives for the process lifetime; counters only
//! ever increase and reset only on restart. Recording uses atomic increments so
//! concurrent resolution calls need no external synchronization. Consumers pull
//! a [`TelemetrySnapshot`] (or the text exposition format) periodically; the
//! recorder never pushes.

use crate::models::{FeedbackJudgment, ResolutionResponse};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

/// Upper bounds for the top-1 confidence histogram
pub const CONFIDENCE_BUCKETS: [f64; 6] = [0.1, 0.3, 0.5, 0.7, 0.9, 1.0];

/// Upper bounds in milliseconds for the resolution latency histogram
pub const LATENCY_BUCKETS_MS: [f64; 8] = [1.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0];

/// A fixed-bucket histogram with atomic observation
struct Histogram {
    bounds: &'static [f64],
    /// One cell per bound plus the overflow bucket
    buckets: Vec<AtomicU64>,
    count: AtomicU64,
    /// f64 bit pattern, updated by compare-exchange
    sum_bits: AtomicU64,
}

impl Histogram {
    fn new(bounds: &'static [f64]) -> Self {
        Self {
            bounds,
            buckets: (0..=bounds.len()).map(|_| AtomicU64::new(0)).collect(),
            count: AtomicU64::new(0),
            sum_bits: AtomicU64::new(0.0_f64.to_bits()),
        }
    }

    fn observe(&self, value: f64) {
        let slot = self
            .bounds
            .iter()
            .position(|bound| value <= *bound)
            .unwrap_or(self.bounds.len());

        self.buckets[slot].fetch_add(1, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
        add_f64(&self.sum_bits, value);
    }

    fn snapshot(&self) -> HistogramSnapshot {
        let mut cumulative = 0;
        let mut buckets = Vec::with_capacity(self.bounds.len());
        for (bound, cell) in self.bounds.iter().zip(&self.buckets) {
            cumulative += cell.load(Ordering::Relaxed);
            buckets.push(BucketCount {
                le: *bound,
                count: cumulative,
            });
        }

        HistogramSnapshot {
            buckets,
            count: self.count.load(Ordering::Relaxed),
            sum: f64::from_bits(self.sum_bits.load(Ordering::Relaxed)),
        }
    }
}

/// Atomically add to an f64 stored as bits
fn add_f64(cell: &AtomicU64, value: f64) {
    let mut current = cell.load(Ordering::Relaxed);
    loop {
        let next = (f64::from_bits(current) + value).to_bits();
        match cell.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break,
            Err(actual) => current = actual,
        }
    }
}

/// Cumulative count of observations at or below `le`
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BucketCount {
    /// Upper bound of the bucket
    pub le: f64,
    /// Observations with value <= `le`
    pub count: u64,
}

/// Point-in-time view of one histogram
#[derive(Debug, Clone, Serialize)]
pub struct HistogramSnapshot {
    /// Cumulative bucket counts in ascending bound order
    pub buckets: Vec<BucketCount>,
    /// Total number of observations
    pub count: u64,
    /// Sum of all observed values
    pub sum: f64,
}

/// Point-in-time view of all telemetry
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    /// Total resolution requests (successful and failed)
    pub prediction_requests_total: u64,
    /// Total failed resolution requests
    pub prediction_errors_total: u64,
    /// Total positive feedback events
    pub feedback_positive_total: u64,
    /// Total negative feedback events
    pub feedback_negative_total: u64,
    /// Resolution latency distribution in milliseconds
    pub prediction_latency_ms: HistogramSnapshot,
    /// Top-1 confidence distribution
    pub prediction_confidence: HistogramSnapshot,
}

impl TelemetrySnapshot {
    /// Flatten to `metric name -> value` for scrapers that want a flat view
    #[must_use]
    pub fn to_flat_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        #[allow(clippy::cast_precision_loss)]
        {
            map.insert(
                "prediction_requests_total".to_owned(),
                self.prediction_requests_total as f64,
            );
            map.insert(
                "prediction_errors_total".to_owned(),
                self.prediction_errors_total as f64,
            );
            map.insert(
                "feedback_positive_total".to_owned(),
                self.feedback_positive_total as f64,
            );
            map.insert(
                "feedback_negative_total".to_owned(),
                self.feedback_negative_total as f64,
            );
            flatten_histogram(&mut map, "prediction_latency_ms", &self.prediction_latency_ms);
            flatten_histogram(&mut map, "prediction_confidence", &self.prediction_confidence);
        }
        map
    }
}

#[allow(clippy::cast_precision_loss)]
fn flatten_histogram(map: &mut BTreeMap<String, f64>, name: &str, histogram: &HistogramSnapshot) {
    map.insert(format!("{name}_count"), histogram.count as f64);
    map.insert(format!("{name}_sum"), histogram.sum);
    for bucket in &histogram.buckets {
        map.insert(
            format!("{name}_bucket_le_{}", bucket.le),
            bucket.count as f64,
        );
    }
}

/// Records counters and histograms for every resolution and feedback event
pub struct TelemetryRecorder {
    prediction_requests: AtomicU64,
    prediction_errors: AtomicU64,
    feedback_positive: AtomicU64,
    feedback_negative: AtomicU64,
    latency_ms: Histogram,
    confidence: Histogram,
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryRecorder {
    /// Create a recorder with all counters at zero
    #[must_use]
    pub fn new() -> Self {
        Self {
            prediction_requests: AtomicU64::new(0),
            prediction_errors: AtomicU64::new(0),
            feedback_positive: AtomicU64::new(0),
            feedback_negative: AtomicU64::new(0),
            latency_ms: Histogram::new(&LATENCY_BUCKETS_MS),
            confidence: Histogram::new(&CONFIDENCE_BUCKETS),
        }
    }

    /// Record one completed resolution.
    ///
    /// Increments the request counter, the error counter when `success` is
    /// false, observes the response latency, and observes the top-1 confidence.
    pub fn record_resolution(&self, response: &ResolutionResponse, success: bool) {
        self.prediction_requests.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.prediction_errors.fetch_add(1, Ordering::Relaxed);
        }

        self.latency_ms.observe(response.latency_ms);
        if let Some(top1) = response.top1() {
            self.confidence.observe(top1.probability);
        }
    }

    /// Record a resolution call rejected before it produced a response
    /// (invalid input). Counts toward requests and errors; the rejection
    /// latency is still observed.
    pub fn record_rejected_request(&self, latency_ms: f64) {
        self.prediction_requests.fetch_add(1, Ordering::Relaxed);
        self.prediction_errors.fetch_add(1, Ordering::Relaxed);
        self.latency_ms.observe(latency_ms);
    }

    /// Record one user feedback judgment
    pub fn record_feedback(&self, judgment: FeedbackJudgment) {
        match judgment {
            FeedbackJudgment::Positive => &self.feedback_positive,
            FeedbackJudgment::Negative => &self.feedback_negative,
        }
        .fetch_add(1, Ordering::Relaxed);
    }

    /// Pull a point-in-time snapshot of all counters and histograms
    #[must_use]
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            prediction_requests_total: self.prediction_requests.load(Ordering::Relaxed),
            prediction_errors_total: self.prediction_errors.load(Ordering::Relaxed),
            feedback_positive_total: self.feedback_positive.load(Ordering::Relaxed),
            feedback_negative_total: self.feedback_negative.load(Ordering::Relaxed),
            prediction_latency_ms: self.latency_ms.snapshot(),
            prediction_confidence: self.confidence.snapshot(),
        }
    }

    /// Render the current state in the text exposition format metric scrapers
    /// consume
    #[must_use]
    pub fn render_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let mut out = String::new();

        render_counter(
            &mut out,
            "prediction_requests_total",
            "Total number of prediction requests",
            snapshot.prediction_requests_total,
        );
        render_counter(
            &mut out,
            "prediction_errors_total",
            "Total number of failed prediction requests",
            snapshot.prediction_errors_total,
        );
        render_histogram(
            &mut out,
            "prediction_latency_ms",
            "Time taken to resolve a prediction in milliseconds",
            &snapshot.prediction_latency_ms,
        );
        render_histogram(
            &mut out,
            "prediction_confidence",
            "Top-1 confidence of predictions",
            &snapshot.prediction_confidence,
        );
        render_counter(
            &mut out,
            "feedback_positive_total",
            "Total number of positive feedback responses",
            snapshot.feedback_positive_total,
        );
        render_counter(
            &mut out,
            "feedback_negative_total",
            "Total number of negative feedback responses",
            snapshot.feedback_negative_total,
        );

        out
    }
}

fn render_counter(out: &mut String, name: &str, help: &str, value: u64) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {value}");
}

fn render_histogram(out: &mut String, name: &str, help: &str, histogram: &HistogramSnapshot) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} histogram");
    for bucket in &histogram.buckets {
        let _ = writeln!(
            out,
            "{name}_bucket{{le=\"{}\"}} {}",
            bucket.le, bucket.count
        );
    }
    let _ = writeln!(out, "{name}_bucket{{le=\"+Inf\"}} {}", histogram.count);
    let _ = writeln!(out, "{name}_sum {}", histogram.sum);
    let _ = writeln!(out, "{name}_count {}", histogram.count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PredictionEntry;
    use chrono::Utc;
    use uuid::Uuid;

    fn fake_response(latency_ms: f64, top1_probability: f64) -> ResolutionResponse {
        ResolutionResponse {
            prediction_id: Uuid::new_v4(),
            top_entries: vec![PredictionEntry {
                rank: 1,
                label: "pizza".to_owned(),
                probability: top1_probability,
                nutrition: None,
                serving_scale: 1.0,
            }],
            latency_ms,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_request_and_error_counting() {
        let recorder = TelemetryRecorder::new();

        for _ in 0..3 {
            recorder.record_resolution(&fake_response(5.0, 0.8), true);
        }
        for _ in 0..2 {
            recorder.record_resolution(&fake_response(5.0, 0.4), false);
        }

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.prediction_requests_total, 5);
        assert_eq!(snapshot.prediction_errors_total, 2);
    }

    #[test]
    fn test_rejected_requests_count_as_errors() {
        let recorder = TelemetryRecorder::new();
        recorder.record_rejected_request(0.1);

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.prediction_requests_total, 1);
        assert_eq!(snapshot.prediction_errors_total, 1);
    }

    #[test]
    fn test_confidence_bucketing() {
        let recorder = TelemetryRecorder::new();
        recorder.record_resolution(&fake_response(1.0, 0.25), true);
        recorder.record_resolution(&fake_response(1.0, 0.82), true);

        let snapshot = recorder.snapshot();
        let buckets = &snapshot.prediction_confidence.buckets;

        // 0.25 lands in le=0.3; 0.82 first appears at le=0.9
        assert_eq!(buckets[0].count, 0); // le=0.1
        assert_eq!(buckets[1].count, 1); // le=0.3
        assert_eq!(buckets[4].count, 2); // le=0.9
        assert_eq!(snapshot.prediction_confidence.count, 2);
        assert!((snapshot.prediction_confidence.sum - 1.07).abs() < 1e-9);
    }

    #[test]
    fn test_feedback_counters() {
        let recorder = TelemetryRecorder::new();
        recorder.record_feedback(FeedbackJudgment::Positive);
        recorder.record_feedback(FeedbackJudgment::Positive);
        recorder.record_feedback(FeedbackJudgment::Negative);

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.feedback_positive_total, 2);
        assert_eq!(snapshot.feedback_negative_total, 1);
    }

    #[test]
    fn test_counters_never_decrease() {
        let recorder = TelemetryRecorder::new();
        let mut last_requests = 0;

        for round in 0..10 {
            recorder.record_resolution(&fake_response(2.0, 0.5), round % 3 != 0);
            let snapshot = recorder.snapshot();
            assert!(snapshot.prediction_requests_total >= last_requests);
            last_requests = snapshot.prediction_requests_total;
        }
    }

    #[test]
    fn test_prometheus_rendering() {
        let recorder = TelemetryRecorder::new();
        recorder.record_resolution(&fake_response(3.0, 0.9), true);
        recorder.record_feedback(FeedbackJudgment::Positive);

        let text = recorder.render_prometheus();
        assert!(text.contains("# TYPE prediction_requests_total counter"));
        assert!(text.contains("prediction_requests_total 1"));
        assert!(text.contains("# TYPE prediction_latency_ms histogram"));
        assert!(text.contains("prediction_latency_ms_bucket{le=\"+Inf\"} 1"));
        assert!(text.contains("feedback_positive_total 1"));
    }

    #[test]
    fn test_flat_map_view() {
        let recorder = TelemetryRecorder::new();
        recorder.record_resolution(&fake_response(3.0, 0.9), true);

        let flat = recorder.snapshot().to_flat_map();
        assert!((flat["prediction_requests_total"] - 1.0).abs() < f64::EPSILON);
        assert!((flat["prediction_latency_ms_count"] - 1.0).abs() < f64::EPSILON);
    }
}
