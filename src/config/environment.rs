// ABOUTME: Environment configuration management for the nutrition resolution core
// ABOUTME: Handles env-var overrides for matching, resolution, and feedback settings
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Environment-based configuration for the resolution core.
//!
//! Every tunable carries a documented default as a named constant; deployments
//! override via `CALTRACK_*` environment variables. Malformed overrides fail
//! fast with [`ErrorCode::ConfigError`](crate::errors::ErrorCode) rather than
//! silently falling back.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

/// Minimum similarity score for a fuzzy match to count as a hit.
///
/// Empirically tunable; 0.6 mirrors the 60/100 cut-off the reference dataset
/// was curated against.
pub const DEFAULT_FUZZY_MATCH_THRESHOLD: f64 = 0.6;

/// Default number of ranked entries returned per resolution
pub const DEFAULT_TOP_K: usize = 5;

/// The serving size the reference dataset is expressed in
pub const REFERENCE_SERVING_GRAMS: f64 = 100.0;

/// Decimal places applied to scaled nutrient values
pub const DEFAULT_SCALED_DECIMALS: u32 = 2;

/// Default location of the append-only feedback log
pub const DEFAULT_FEEDBACK_PATH: &str = "./data/feedback.jsonl";

/// Which similarity scoring strategy the fuzzy matcher uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    /// Token-set similarity with a Jaro-Winkler component (default)
    TokenSet,
    /// Normalized Levenshtein edit distance
    Levenshtein,
}

impl FromStr for ScorerKind {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.to_lowercase().as_str() {
            "token_set" | "token-set" | "tokenset" => Ok(Self::TokenSet),
            "levenshtein" => Ok(Self::Levenshtein),
            other => Err(AppError::config(format!(
                "Invalid scorer '{other}'. Must be: token_set, levenshtein"
            ))),
        }
    }
}

/// Fuzzy matching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzyMatchConfig {
    /// Similarity threshold in [0, 1]; scores below it are misses
    pub threshold: f64,
    /// Similarity scoring strategy
    pub scorer: ScorerKind,
}

impl Default for FuzzyMatchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_FUZZY_MATCH_THRESHOLD,
            scorer: ScorerKind::TokenSet,
        }
    }
}

/// Resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Ranked entries returned when the caller does not specify `top_k`
    pub default_top_k: usize,
    /// Decimal places for scaled nutrient values; `None` keeps exact scaling
    pub scaled_decimals: Option<u32>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_top_k: DEFAULT_TOP_K,
            scaled_decimals: Some(DEFAULT_SCALED_DECIMALS),
        }
    }
}

/// Feedback log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Path of the JSON-Lines feedback log
    pub path: PathBuf,
    /// Call fsync after every append. Flush-to-OS always happens; fsync
    /// upgrades the durability guarantee at a latency cost.
    pub sync_on_append: bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_FEEDBACK_PATH),
            sync_on_append: false,
        }
    }
}

/// Top-level configuration for the resolution core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Fuzzy matching settings
    pub fuzzy: FuzzyMatchConfig,
    /// Resolution settings
    pub resolver: ResolverConfig,
    /// Feedback log settings
    pub feedback: FeedbackConfig,
}

impl CoreConfig {
    /// Load configuration from environment variables, falling back to defaults
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::ConfigError`](crate::errors::ErrorCode) when an
    /// override is present but malformed or out of range.
    pub fn from_env() -> AppResult<Self> {
        let threshold = parse_env_or(
            "CALTRACK_FUZZY_THRESHOLD",
            DEFAULT_FUZZY_MATCH_THRESHOLD,
            |v: &f64| (0.0..=1.0).contains(v),
            "must be in [0, 1]",
        )?;

        let scorer = match env::var("CALTRACK_FUZZY_SCORER") {
            Ok(raw) => raw.parse()?,
            Err(_) => ScorerKind::TokenSet,
        };

        let default_top_k = parse_env_or(
            "CALTRACK_TOP_K",
            DEFAULT_TOP_K,
            |v: &usize| *v >= 1,
            "must be >= 1",
        )?;

        let scaled_decimals = match env::var("CALTRACK_SCALED_DECIMALS") {
            Ok(raw) if raw.eq_ignore_ascii_case("none") => None,
            Ok(raw) => Some(raw.parse::<u32>().map_err(|e| {
                AppError::config(format!("Invalid CALTRACK_SCALED_DECIMALS '{raw}': {e}"))
            })?),
            Err(_) => Some(DEFAULT_SCALED_DECIMALS),
        };

        let path = env::var("CALTRACK_FEEDBACK_PATH")
            .map_or_else(|_| PathBuf::from(DEFAULT_FEEDBACK_PATH), PathBuf::from);

        let sync_on_append = env::var("CALTRACK_FEEDBACK_FSYNC")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let config = Self {
            fuzzy: FuzzyMatchConfig { threshold, scorer },
            resolver: ResolverConfig {
                default_top_k,
                scaled_decimals,
            },
            feedback: FeedbackConfig {
                path,
                sync_on_append,
            },
        };

        debug!(
            threshold = config.fuzzy.threshold,
            top_k = config.resolver.default_top_k,
            "loaded core configuration"
        );

        Ok(config)
    }
}

/// Parse an environment variable with a validity check, or use the default
fn parse_env_or<T>(
    key: &str,
    default: T,
    valid: impl Fn(&T) -> bool,
    requirement: &str,
) -> AppResult<T>
where
    T: FromStr + Copy,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => {
            let value = raw
                .parse::<T>()
                .map_err(|e| AppError::config(format!("Invalid {key} '{raw}': {e}")))?;
            if valid(&value) {
                Ok(value)
            } else {
                Err(AppError::config(format!(
                    "Invalid {key} '{raw}': {requirement}"
                )))
            }
        }
        Err(_) => Ok(default),
    }
}
