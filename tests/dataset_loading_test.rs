// ABOUTME: Integration tests for dataset ingestion and index construction
// ABOUTME: Covers CSV parsing, label-map loading, and load-time integrity failures
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Dataset Loading Integration Tests
//!
//! Loads the on-disk formats (per-100g CSV extract, name-to-index JSON label
//! map) and builds the index from them, including the failure modes that must
//! abort startup.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use caltrack_core::errors::ErrorCode;
use caltrack_core::nutrition::{load_label_map, load_records_from_csv, NutritionIndex};
use std::io::Write;
use tempfile::tempdir;

mod common;

const DATASET_CSV: &str = "\
description,calories,protein,fat,carbohydrates
pizza,266,11,10,33
caesar salad,44,3,2,4
miso soup,40,2.2,1.1,5.3
";

const LABEL_MAP_JSON: &str = r#"{"pizza": 0, "caesar_salad": 1, "miso_soup": 2}"#;

fn write_file(dir: &std::path::Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn test_csv_to_index_end_to_end() {
    common::init_test_logging();
    let dir = tempdir().unwrap();
    let csv_path = write_file(dir.path(), "usda.csv", DATASET_CSV);

    let records = load_records_from_csv(&csv_path).unwrap();
    let index = NutritionIndex::load(records).unwrap();

    assert_eq!(index.len(), 3);
    let soup = index.lookup_exact("miso soup").unwrap();
    assert!((soup.calories - 40.0).abs() < f64::EPSILON);
    assert!((soup.protein_g - 2.2).abs() < f64::EPSILON);
}

#[test]
fn test_label_map_file_round_trip() {
    common::init_test_logging();
    let dir = tempdir().unwrap();
    let json_path = write_file(dir.path(), "label_map.json", LABEL_MAP_JSON);

    let map = load_label_map(&json_path).unwrap();
    assert_eq!(map.len(), 3);
    assert_eq!(map.get(0), Some("pizza"));
    assert_eq!(map.get(1), Some("caesar_salad"));
    assert_eq!(map.get(2), Some("miso_soup"));
}

#[test]
fn test_duplicate_dataset_entry_aborts_load() {
    common::init_test_logging();
    let dir = tempdir().unwrap();
    let csv_path = write_file(
        dir.path(),
        "dupes.csv",
        "description,calories,protein,fat,carbohydrates\npizza,266,11,10,33\nPizza,300,12,11,35\n",
    );

    let records = load_records_from_csv(&csv_path).unwrap();
    let err = NutritionIndex::load(records).unwrap_err();
    assert_eq!(err.code, ErrorCode::DuplicateKey);
}

#[test]
fn test_negative_nutrient_aborts_load() {
    common::init_test_logging();
    let dir = tempdir().unwrap();
    let csv_path = write_file(
        dir.path(),
        "negative.csv",
        "description,calories,protein,fat,carbohydrates\nantifood,-5,0,0,0\n",
    );

    let records = load_records_from_csv(&csv_path).unwrap();
    let err = NutritionIndex::load(records).unwrap_err();
    assert_eq!(err.code, ErrorCode::ValueOutOfRange);
}

#[test]
fn test_missing_files_fail_with_config_error() {
    common::init_test_logging();
    let dir = tempdir().unwrap();

    let csv_err = load_records_from_csv(dir.path().join("absent.csv")).unwrap_err();
    assert_eq!(csv_err.code, ErrorCode::ConfigError);

    let map_err = load_label_map(dir.path().join("absent.json")).unwrap_err();
    assert_eq!(map_err.code, ErrorCode::ConfigError);
}
