// ABOUTME: Configuration management module for the nutrition resolution core
// ABOUTME: Centralizes matching thresholds, resolution defaults, and feedback settings
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Configuration module for the CalTrack core
//!
//! Centralized configuration for all components of the resolution pipeline:
//!
//! - **Fuzzy matching**: similarity threshold and scoring strategy
//! - **Resolution**: top-K default and nutrient rounding policy
//! - **Feedback**: log location and append durability level
//!
//! Defaults are named constants; deployments override via `CALTRACK_*`
//! environment variables.

/// Environment-backed configuration types and defaults
pub mod environment;

pub use environment::{
    CoreConfig, FeedbackConfig, FuzzyMatchConfig, ResolverConfig, ScorerKind,
    DEFAULT_FUZZY_MATCH_THRESHOLD, DEFAULT_SCALED_DECIMALS, DEFAULT_TOP_K, REFERENCE_SERVING_GRAMS,
};
