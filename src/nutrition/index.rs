// ABOUTME: In-memory nutrition reference index keyed by canonical food name
// ABOUTME: Built once at startup, read-only thereafter, safe for unsynchronized reads
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! The in-memory nutrition index.
//!
//! Keys are canonical names normalized to lowercase. Storage is a `BTreeMap`
//! so [`NutritionIndex::all_names`] iterates in a stable lexicographic order,
//! which the fuzzy matcher relies on for its deterministic tie-break.

use crate::errors::{AppError, AppResult};
use crate::models::NutritionRecord;
use std::collections::BTreeMap;
use tracing::info;

/// Read-only mapping from canonical food name to per-100g nutrition facts
#[derive(Debug, Clone, Default)]
pub struct NutritionIndex {
    records: BTreeMap<String, NutritionRecord>,
}

impl NutritionIndex {
    /// Build the index from a record sequence.
    ///
    /// Keys are lowercased canonical names. Records with negative nutrient
    /// values are rejected up front; the index never holds a partially valid
    /// dataset.
    ///
    /// # Errors
    ///
    /// - [`ErrorCode::DuplicateKey`](crate::errors::ErrorCode) when two records
    ///   share a canonical name (dataset integrity failure, fatal to startup)
    /// - [`ErrorCode::ValueOutOfRange`](crate::errors::ErrorCode) on negative
    ///   nutrient values
    pub fn load(records: impl IntoIterator<Item = NutritionRecord>) -> AppResult<Self> {
        let mut table = BTreeMap::new();

        for record in records {
            validate_record(&record)?;
            let key = record.name.to_lowercase();
            if table.contains_key(&key) {
                return Err(AppError::duplicate_key(key));
            }
            table.insert(key, record);
        }

        info!(records = table.len(), "nutrition index loaded");
        Ok(Self { records: table })
    }

    /// Exact lookup by canonical name (case-insensitive)
    #[must_use]
    pub fn lookup_exact(&self, name: &str) -> Option<&NutritionRecord> {
        self.records.get(&name.to_lowercase())
    }

    /// All canonical names in lexicographic order, for candidate generation
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Number of records in the index
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reject records with negative nutrient values
fn validate_record(record: &NutritionRecord) -> AppResult<()> {
    let macros = [
        ("calories", record.calories),
        ("protein_g", record.protein_g),
        ("fat_g", record.fat_g),
        ("carbs_g", record.carbs_g),
    ];

    for (field, value) in macros {
        if value < 0.0 || !value.is_finite() {
            return Err(AppError::value_out_of_range(format!(
                "record '{}' has invalid {field} value {value}",
                record.name
            )));
        }
    }

    for (micro, value) in &record.micros {
        if *value < 0.0 || !value.is_finite() {
            return Err(AppError::value_out_of_range(format!(
                "record '{}' has invalid micro-nutrient {micro} value {value}",
                record.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    fn sample_records() -> Vec<NutritionRecord> {
        vec![
            NutritionRecord::new("Pizza", 266.0, 11.0, 10.0, 33.0),
            NutritionRecord::new("Caesar salad", 44.0, 3.0, 2.0, 4.0),
        ]
    }

    #[test]
    fn test_load_and_exact_lookup() {
        let index = NutritionIndex::load(sample_records()).unwrap();

        assert_eq!(index.len(), 2);
        let record = index.lookup_exact("pizza").unwrap();
        assert!((record.calories - 266.0).abs() < f64::EPSILON);

        // lookup is case-insensitive on both sides
        assert!(index.lookup_exact("PIZZA").is_some());
        assert!(index.lookup_exact("sushi").is_none());
    }

    #[test]
    fn test_duplicate_name_fails_load() {
        let mut records = sample_records();
        records.push(NutritionRecord::new("PIZZA", 300.0, 12.0, 11.0, 35.0));

        let err = NutritionIndex::load(records).unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateKey);
    }

    #[test]
    fn test_negative_value_fails_load() {
        let records = vec![NutritionRecord::new("ghost pepper", -1.0, 0.0, 0.0, 0.0)];
        let err = NutritionIndex::load(records).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    }

    #[test]
    fn test_all_names_is_sorted() {
        let index = NutritionIndex::load(sample_records()).unwrap();
        let names: Vec<&str> = index.all_names().collect();
        assert_eq!(names, vec!["caesar salad", "pizza"]);
    }
}
