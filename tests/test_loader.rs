//! Unit tests for dataset loading and writing

use lungrisk::pipeline::{load_dataset, write_dataset, Dataset, Schema};
use polars::prelude::*;
use std::io::Write;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_load_csv_file() {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "a,b,c").unwrap();
    writeln!(file, "1,2,3").unwrap();
    writeln!(file, "4,5,6").unwrap();
    drop(file);

    let df = load_dataset(&csv_path, 100).unwrap();

    assert_eq!(df.height(), 2, "Should have 2 data rows");
    assert_eq!(df.get_column_names(), &["a", "b", "c"]);
}

#[test]
fn test_load_lung_csv_with_built_in_schema() {
    let mut df = create_lung_dataframe(20);
    let (_temp_dir, csv_path) = create_temp_csv(&mut df);

    let loaded = load_dataset(&csv_path, 0).unwrap();
    let dataset = Dataset::from_frame(&loaded, &Schema::lung()).unwrap();
    assert_eq!(dataset.len(), 20);
}

#[test]
fn test_load_parquet_file() {
    let mut df = create_lung_dataframe(12);
    let (_temp_dir, parquet_path) = create_temp_parquet(&mut df);

    let loaded = load_dataset(&parquet_path, 100).unwrap();
    assert_eq!(loaded.height(), 12);
    assert_has_columns(&loaded, &["No", "Merokok", "Hasil"]);
}

#[test]
fn test_unsupported_extension() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.xlsx");
    std::fs::write(&path, "irrelevant").unwrap();

    let err = load_dataset(&path, 100).unwrap_err();
    assert!(err.to_string().contains("Unsupported file format"));
}

#[test]
fn test_missing_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(load_dataset(&temp_dir.path().join("absent.csv"), 100).is_err());
}

#[test]
fn test_write_then_load_csv_and_parquet() {
    let temp_dir = TempDir::new().unwrap();
    let mut df = df! {
        "probability" => [0.25f64, 0.75],
        "prediction" => [0i32, 1],
    }
    .unwrap();

    for name in ["scored.csv", "scored.parquet"] {
        let path = temp_dir.path().join(name);
        write_dataset(&mut df, &path).unwrap();

        let loaded = load_dataset(&path, 0).unwrap();
        assert_eq!(loaded.height(), 2, "{} should round-trip its rows", name);
        assert_has_columns(&loaded, &["probability", "prediction"]);
    }
}

#[test]
fn test_write_rejects_unknown_extension() {
    let temp_dir = TempDir::new().unwrap();
    let mut df = df! { "x" => [1i32] }.unwrap();
    let err = write_dataset(&mut df, &temp_dir.path().join("out.json")).unwrap_err();
    assert!(err.to_string().contains("Unsupported output format"));
}
