// ABOUTME: Shared test utilities and fixtures for integration tests
// ABOUTME: Provides quiet logging setup, sample datasets, and service builders
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

//! Shared test utilities for `caltrack_core`
//!
//! Common fixtures and setup functions to reduce duplication across
//! integration tests.

use caltrack_core::config::{CoreConfig, FeedbackConfig};
use caltrack_core::models::{LabelMap, NutritionRecord};
use caltrack_core::nutrition::NutritionIndex;
use caltrack_core::service::ResolutionService;
use std::path::Path;
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // TEST_LOG controls the level; default WARN keeps test output quiet
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Label map matching [`sample_records`]: indices 0-3
pub fn sample_label_map() -> LabelMap {
    LabelMap::from_labels(vec![
        "pizza".to_owned(),
        "salad".to_owned(),
        "caesar_salad".to_owned(),
        "miso_soup".to_owned(),
    ])
}

/// A small per-100g dataset covering exact hits, fuzzy hits, and misses
pub fn sample_records() -> Vec<NutritionRecord> {
    vec![
        NutritionRecord::new("pizza", 266.0, 11.0, 10.0, 33.0),
        NutritionRecord::new("salad", 20.0, 1.2, 0.2, 3.5),
        NutritionRecord::new("caesar salad", 44.0, 3.0, 2.0, 4.0),
    ]
}

/// Build the sample nutrition index
pub fn sample_index() -> NutritionIndex {
    init_test_logging();
    NutritionIndex::load(sample_records()).unwrap()
}

/// Build a service over the sample dataset with its feedback log in `dir`
pub fn sample_service(dir: &Path) -> ResolutionService {
    init_test_logging();

    let config = CoreConfig {
        feedback: FeedbackConfig {
            path: dir.join("feedback.jsonl"),
            sync_on_append: false,
        },
        ..CoreConfig::default()
    };

    ResolutionService::new(&config, sample_label_map(), sample_index()).unwrap()
}
