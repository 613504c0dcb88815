// ABOUTME: Nutrition reference table module built once at startup from a static dataset
// ABOUTME: Exposes exact lookup, candidate names for fuzzy matching, and dataset loaders
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Nutrition Reference Table
//!
//! An in-memory table of per-100g nutrition facts keyed by canonical food name.
//! The index is built once at process start from a static dataset and is
//! read-only afterwards, so concurrent resolution calls share it without
//! locking.

/// CSV dataset and JSON label-map loaders
pub mod dataset;
/// The in-memory nutrition index
pub mod index;

pub use dataset::{load_label_map, load_records_from_csv};
pub use index::NutritionIndex;
