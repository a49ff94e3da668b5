//! Shared test utilities and fixture generators

#![allow(dead_code)]

use faer::Mat;
use lungrisk::pipeline::{Dataset, Schema};
use polars::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn pick<'a>(flag: bool, yes: &'a str, no: &'a str) -> &'a str {
    if flag {
        yes
    } else {
        no
    }
}

/// Create a survey table with the lung schema and `rows` unique records.
///
/// The outcome is "Ya" when at least two of smoking, staying up late,
/// rare exercise and a pre-existing condition hold, so the classes are
/// separable and roughly 11:5.
pub fn create_lung_dataframe(rows: usize) -> DataFrame {
    let mut no = Vec::with_capacity(rows);
    let mut usia = Vec::with_capacity(rows);
    let mut jenis_kelamin = Vec::with_capacity(rows);
    let mut merokok = Vec::with_capacity(rows);
    let mut bekerja = Vec::with_capacity(rows);
    let mut rumah_tangga = Vec::with_capacity(rows);
    let mut begadang = Vec::with_capacity(rows);
    let mut olahraga = Vec::with_capacity(rows);
    let mut asuransi = Vec::with_capacity(rows);
    let mut bawaan = Vec::with_capacity(rows);
    let mut hasil = Vec::with_capacity(rows);

    for i in 0..rows {
        let smokes = i % 2 == 0;
        let late = (i / 2) % 2 == 0;
        let sedentary = (i / 4) % 2 == 0;
        let condition = (i / 8) % 2 == 0;
        let risk = [smokes, late, sedentary, condition]
            .iter()
            .filter(|&&f| f)
            .count();

        no.push(i as i64 + 1);
        usia.push(pick(i % 3 == 0, "Tua", "Muda"));
        jenis_kelamin.push(pick(i % 5 < 2, "Pria", "Wanita"));
        merokok.push(pick(smokes, "Aktif", "Pasif"));
        bekerja.push(pick(i % 7 < 3, "Ya", "Tidak"));
        rumah_tangga.push(pick(i % 4 == 1, "Ya", "Tidak"));
        begadang.push(pick(late, "Ya", "Tidak"));
        olahraga.push(pick(sedentary, "Jarang", "Sering"));
        asuransi.push(pick(i % 6 < 4, "Ada", "Tidak"));
        bawaan.push(pick(condition, "Ada", "Tidak"));
        hasil.push(pick(risk >= 2, "Ya", "Tidak"));
    }

    df! {
        "No" => no,
        "Usia" => usia,
        "Jenis_Kelamin" => jenis_kelamin,
        "Merokok" => merokok,
        "Bekerja" => bekerja,
        "Rumah_Tangga" => rumah_tangga,
        "Aktivitas_Begadang" => begadang,
        "Aktivitas_Olahraga" => olahraga,
        "Asuransi" => asuransi,
        "Penyakit_Bawaan" => bawaan,
        "Hasil" => hasil,
    }
    .unwrap()
}

/// Six lung records: one with a missing value and one exact duplicate of
/// the first row.
pub fn create_dirty_lung_dataframe() -> DataFrame {
    df! {
        "No" => [1i64, 2, 3, 1, 5, 6],
        "Usia" => [Some("Tua"), Some("Muda"), Some("Tua"), Some("Tua"), Some("Muda"), Some("Muda")],
        "Jenis_Kelamin" => ["Pria", "Wanita", "Pria", "Pria", "Wanita", "Pria"],
        "Merokok" => [Some("Aktif"), Some("Pasif"), None, Some("Aktif"), Some("Aktif"), Some("Pasif")],
        "Bekerja" => ["Ya", "Tidak", "Ya", "Ya", "Tidak", "Ya"],
        "Rumah_Tangga" => ["Tidak", "Ya", "Tidak", "Tidak", "Ya", "Ya"],
        "Aktivitas_Begadang" => ["Ya", "Tidak", "Ya", "Ya", "Ya", "Tidak"],
        "Aktivitas_Olahraga" => ["Jarang", "Sering", "Sering", "Jarang", "Jarang", "Sering"],
        "Asuransi" => ["Ada", "Tidak", "Ada", "Ada", "Tidak", "Ada"],
        "Penyakit_Bawaan" => ["Ada", "Tidak", "Tidak", "Ada", "Ada", "Tidak"],
        "Hasil" => ["Ya", "Tidak", "Ya", "Ya", "Ya", "Tidak"],
    }
    .unwrap()
}

/// Lung records converted with the built-in schema
pub fn lung_dataset(rows: usize) -> Dataset {
    Dataset::from_frame(&create_lung_dataframe(rows), &Schema::lung()).unwrap()
}

/// Ten rows, five per class, one informative feature with overlap around
/// the boundary and one noise feature.
pub fn ten_row_problem() -> (Mat<f64>, Vec<u8>) {
    let signal = [0.5, 1.0, 1.5, 2.0, 3.5, 2.5, 4.0, 4.5, 5.0, 5.5];
    let noise = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0, 3.0];
    let y = vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1];
    let x = Mat::from_fn(10, 2, |i, j| if j == 0 { signal[i] } else { noise[i] });
    (x, y)
}

/// Two well separated numeric clusters of `per_class` rows each
pub fn separable_problem(per_class: usize) -> (Mat<f64>, Vec<u8>) {
    let n = per_class * 2;
    let x = Mat::from_fn(n, 2, |i, j| {
        let class = (i % 2) as f64;
        let jitter = ((i * 7 + j * 3) % 5) as f64 * 0.1;
        if j == 0 {
            class * 4.0 - 2.0 + jitter
        } else {
            class * 2.0 - 1.0 - jitter
        }
    });
    let y = (0..n).map(|i| (i % 2) as u8).collect();
    (x, y)
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert two matrices are equal element-wise within `tol`
pub fn assert_mat_close(a: &Mat<f64>, b: &Mat<f64>, tol: f64) {
    assert_eq!((a.nrows(), a.ncols()), (b.nrows(), b.ncols()), "shape mismatch");
    for i in 0..a.nrows() {
        for j in 0..a.ncols() {
            assert!(
                (a[(i, j)] - b[(i, j)]).abs() <= tol,
                "mismatch at ({}, {}): {} vs {}",
                i,
                j,
                a[(i, j)],
                b[(i, j)]
            );
        }
    }
}

/// Forty rows, one in four positive, split cleanly by a single feature.
///
/// Heavy regularization leaves only the intercept, which predicts the
/// majority class and scores 0.75; weaker regularization separates the
/// classes perfectly.
pub fn imbalanced_problem() -> (Mat<f64>, Vec<u8>) {
    let y: Vec<u8> = (0..40).map(|i| u8::from(i % 4 == 3)).collect();
    let x = Mat::from_fn(40, 1, |i, _| {
        let offset = 2.0 + (i % 5) as f64 * 0.25;
        if y[i] == 1 {
            offset
        } else {
            -offset
        }
    });
    (x, y)
}
