// ABOUTME: Main library entry point for the CalTrack nutrition resolution core
// ABOUTME: Resolves classifier output to ranked, serving-scaled nutrition facts with telemetry
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![deny(unsafe_code)]

//! # CalTrack Core
//!
//! The prediction-to-nutrition resolution pipeline behind the CalTrack food
//! tracker. Given raw classifier output (a probability distribution over food
//! classes), the core ranks the top-K candidates, matches each against a
//! per-100g nutrition reference table using fuzzy string matching, scales the
//! nutrients to the requested serving size, and records operational telemetry
//! for every attempt. User feedback on predictions lands in an append-only log.
//!
//! ## Features
//!
//! - **Deterministic ranking**: probability descending, ties broken by class
//!   index, stable across runs
//! - **Fuzzy label resolution**: classifier labels rarely match dataset names
//!   byte-for-byte; a pluggable similarity scorer bridges the gap
//! - **Graceful degradation**: a lookup miss keeps the prediction and marks
//!   nutrition unavailable instead of failing the response
//! - **Pull-based telemetry**: atomic counters and histograms, snapshots and
//!   text exposition for an external scraper
//!
//! ## Architecture
//!
//! The crate is synchronous and transport-free. The classifier, image
//! pre-processing, and serving layer are external collaborators:
//!
//! - **Models**: shared data structures for the pipeline
//! - **Nutrition**: the load-once reference index and dataset loaders
//! - **Matching**: similarity scoring and the threshold matcher
//! - **Resolver**: ranking and nutrition attachment
//! - **Telemetry**: process-wide counters and histograms
//! - **Feedback**: the append-only judgment log
//! - **Service**: the facade bundling the above
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use caltrack_core::config::CoreConfig;
//! use caltrack_core::models::{ClassProbability, LabelMap, NutritionRecord};
//! use caltrack_core::nutrition::NutritionIndex;
//! use caltrack_core::service::ResolutionService;
//!
//! fn main() -> caltrack_core::errors::AppResult<()> {
//!     let config = CoreConfig::from_env()?;
//!     let label_map = LabelMap::from_labels(vec!["pizza".into(), "salad".into()]);
//!     let index = NutritionIndex::load(vec![
//!         NutritionRecord::new("pizza", 266.0, 11.0, 10.0, 33.0),
//!     ])?;
//!
//!     let service = ResolutionService::new(&config, label_map, index)?;
//!     let response = service.resolve(
//!         &ClassProbability::from_dense(&[0.82, 0.18]),
//!         Some(1),
//!         200.0,
//!     )?;
//!
//!     println!("top-1: {}", response.top_entries[0].label);
//!     Ok(())
//! }
//! ```

/// Centralized configuration with environment overrides
pub mod config;

/// Unified error types and codes
pub mod errors;

/// Append-only feedback log
pub mod feedback;

/// Structured logging setup
pub mod logging;

/// Fuzzy label matching
pub mod matching;

/// Core data models
pub mod models;

/// Nutrition reference index and dataset loaders
pub mod nutrition;

/// Prediction resolution pipeline
pub mod resolver;

/// The service facade wrapping the pipeline
pub mod service;

/// Telemetry counters and histograms
pub mod telemetry;
