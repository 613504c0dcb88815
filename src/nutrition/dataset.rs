// ABOUTME: Loaders for the static nutrition dataset and the classifier label map
// ABOUTME: Parses the per-100g CSV extract and the name-to-index JSON table
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Dataset loaders.
//!
//! The nutrition dataset is a CSV extract with one record per canonical food
//! name and per-100g columns `description,calories,protein,fat,carbohydrates`.
//! Blank numeric cells are treated as zero; non-numeric garbage fails the load.
//! The label map is a JSON object mapping class name to output-layer index.

use crate::errors::{AppError, AppResult};
use crate::models::{LabelMap, NutritionRecord};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

/// One raw CSV row of the nutrition dataset
#[derive(Debug, Deserialize)]
struct RawNutritionRow {
    description: String,
    calories: Option<f64>,
    protein: Option<f64>,
    fat: Option<f64>,
    carbohydrates: Option<f64>,
}

impl RawNutritionRow {
    fn into_record(self) -> NutritionRecord {
        NutritionRecord::new(
            self.description,
            self.calories.unwrap_or(0.0),
            self.protein.unwrap_or(0.0),
            self.fat.unwrap_or(0.0),
            self.carbohydrates.unwrap_or(0.0),
        )
    }
}

/// Parse nutrition records from a CSV reader
///
/// # Errors
///
/// Returns [`ErrorCode::InvalidInput`](crate::errors::ErrorCode) when a row
/// fails to parse.
pub fn records_from_csv_reader(reader: impl Read) -> AppResult<Vec<NutritionRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (row_index, row) in csv_reader.deserialize::<RawNutritionRow>().enumerate() {
        let row = row.map_err(|e| {
            AppError::invalid_input(format!(
                "nutrition dataset row {} is malformed",
                row_index + 1
            ))
            .with_source(e)
        })?;

        if row.description.is_empty() {
            warn!(row = row_index + 1, "skipping row with empty description");
            continue;
        }

        records.push(row.into_record());
    }

    Ok(records)
}

/// Load nutrition records from a CSV file
///
/// # Errors
///
/// Returns [`ErrorCode::ConfigError`](crate::errors::ErrorCode) when the file
/// cannot be opened, or [`ErrorCode::InvalidInput`](crate::errors::ErrorCode)
/// when a row fails to parse.
pub fn load_records_from_csv(path: impl AsRef<Path>) -> AppResult<Vec<NutritionRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        AppError::config(format!("cannot open nutrition dataset {}", path.display())).with_source(e)
    })?;

    let records = records_from_csv_reader(BufReader::new(file))?;
    info!(
        records = records.len(),
        path = %path.display(),
        "nutrition dataset loaded"
    );
    Ok(records)
}

/// Parse the label map from a JSON reader.
///
/// The on-disk orientation is `class name -> output index`; it is inverted into
/// the `index -> name` lookup the resolver uses.
///
/// # Errors
///
/// Returns [`ErrorCode::SerializationError`](crate::errors::ErrorCode) when the
/// JSON is malformed.
pub fn label_map_from_reader(reader: impl Read) -> AppResult<LabelMap> {
    let table: HashMap<String, usize> = serde_json::from_reader(reader)
        .map_err(|e| AppError::serialization("label map JSON is malformed").with_source(e))?;

    Ok(LabelMap::from_name_to_index(table))
}

/// Load the label map from a JSON file
///
/// # Errors
///
/// Returns [`ErrorCode::ConfigError`](crate::errors::ErrorCode) when the file
/// cannot be opened, or
/// [`ErrorCode::SerializationError`](crate::errors::ErrorCode) when the JSON is
/// malformed.
pub fn load_label_map(path: impl AsRef<Path>) -> AppResult<LabelMap> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        AppError::config(format!("cannot open label map {}", path.display())).with_source(e)
    })?;

    let map = label_map_from_reader(BufReader::new(file))?;
    info!(classes = map.len(), path = %path.display(), "label map loaded");
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    const SAMPLE_CSV: &str = "\
description,calories,protein,fat,carbohydrates
pizza,266,11,10,33
caesar salad,44,3,2,4
mystery broth,,,,
";

    #[test]
    fn test_csv_parsing() {
        let records = records_from_csv_reader(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "pizza");
        assert!((records[0].calories - 266.0).abs() < f64::EPSILON);

        // blank numeric cells are treated as zero
        assert!((records[2].calories - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_csv_garbage_fails() {
        let bad = "description,calories,protein,fat,carbohydrates\npizza,lots,11,10,33\n";
        let err = records_from_csv_reader(bad.as_bytes()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_label_map_parsing() {
        let json = r#"{"pizza": 0, "salad": 1}"#;
        let map = label_map_from_reader(json.as_bytes()).unwrap();
        assert_eq!(map.get(0), Some("pizza"));
        assert_eq!(map.get(1), Some("salad"));
    }

    #[test]
    fn test_label_map_garbage_fails() {
        let err = label_map_from_reader("not json".as_bytes()).unwrap_err();
        assert_eq!(err.code, ErrorCode::SerializationError);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = load_records_from_csv("/nonexistent/usda.csv").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
    }
}
