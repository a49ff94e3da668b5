//! Cleaning, categorical encoding and feature matrix construction

use std::collections::HashSet;

use anyhow::Result;
use faer::Mat;
use serde::{Deserialize, Serialize};

use super::dataset::{Dataset, Record, Value};
use super::error::PipelineError;
use super::schema::{ColumnKind, DEFAULT_DROP_COLUMNS};
use super::target::{OutcomeCoding, TargetMapping};

/// Stable factorization of one categorical column: `levels[code]` is the
/// original value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMapping {
    pub column: String,
    pub levels: Vec<String>,
}

impl CategoryMapping {
    /// Assign codes in first-seen order
    pub fn fit<'a>(column: &str, values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut levels: Vec<String> = Vec::new();
        for value in values {
            let key = value.key();
            if !levels.contains(&key) {
                levels.push(key);
            }
        }
        Self {
            column: column.to_string(),
            levels,
        }
    }

    pub fn code(&self, value: &Value) -> Option<usize> {
        let key = value.key();
        self.levels.iter().position(|l| *l == key)
    }
}

/// Everything needed to turn raw records into model inputs again
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    pub outcome_column: String,
    pub outcome: OutcomeCoding,
    pub mappings: Vec<CategoryMapping>,
}

impl CategoryEncoder {
    pub fn mapping(&self, column: &str) -> Option<&CategoryMapping> {
        self.mappings.iter().find(|m| m.column == column)
    }

    /// Encode one feature value. Columns without a mapping are numeric.
    pub fn encode_value(&self, column: &str, row: usize, value: &Value) -> Result<f64> {
        match self.mapping(column) {
            Some(mapping) => mapping.code(value).map(|c| c as f64).ok_or_else(|| {
                PipelineError::UnknownCategory {
                    column: column.to_string(),
                    value: value.key(),
                }
                .into()
            }),
            None => value.as_f64().ok_or_else(|| {
                PipelineError::NonNumeric {
                    column: column.to_string(),
                    row,
                    value: value.key(),
                }
                .into()
            }),
        }
    }

    /// Build a feature matrix for `features` from a dataset holding at least
    /// those columns. Missing values are rejected, not imputed.
    pub fn encode_features(&self, dataset: &Dataset, features: &[String]) -> Result<Mat<f64>> {
        let schema = dataset.schema();
        let mut indices = Vec::with_capacity(features.len());
        let mut missing = Vec::new();
        for name in features {
            match schema.index_of(name) {
                Some(idx) => indices.push(idx),
                None => missing.push(name.clone()),
            }
        }
        if !missing.is_empty() {
            anyhow::bail!(PipelineError::MissingColumns {
                missing,
                available: schema.columns().iter().map(|c| c.name.clone()).collect(),
            });
        }

        let mut x = Mat::<f64>::zeros(dataset.len(), features.len());
        for (row, record) in dataset.rows().iter().enumerate() {
            for (col, (&idx, name)) in indices.iter().zip(features).enumerate() {
                let value = record[idx].as_ref().ok_or_else(|| PipelineError::MissingValue {
                    column: name.clone(),
                    row,
                })?;
                x[(row, col)] = self.encode_value(name, row, value)?;
            }
        }

        Ok(x)
    }
}

/// Numeric model inputs: X with named columns and the aligned labels y
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub names: Vec<String>,
    pub x: Mat<f64>,
    pub y: Vec<u8>,
}

impl FeatureSet {
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.x.nrows()).map(|i| self.x[(i, j)]).collect()
    }
}

/// Preprocessing options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Columns removed before modeling; absent columns are ignored
    pub drop_columns: Vec<String>,
    /// Explicit outcome mapping; factorization is used when absent
    pub target_mapping: Option<TargetMapping>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            drop_columns: DEFAULT_DROP_COLUMNS.iter().map(|s| s.to_string()).collect(),
            target_mapping: None,
        }
    }
}

/// What the cleaning step removed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub dropped_missing: usize,
    pub dropped_duplicates: usize,
    pub output_rows: usize,
    pub dropped_columns: Vec<String>,
}

/// Output of the preprocessor
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Cleaned records, raw values, all schema columns
    pub dataset: Dataset,
    pub encoder: CategoryEncoder,
    pub features: FeatureSet,
    pub report: CleaningReport,
}

/// Hashable form of a complete record, used for duplicate detection
#[derive(Hash, PartialEq, Eq)]
enum CellKey {
    Number(u64),
    Text(String),
}

fn row_key(record: &Record) -> Vec<Option<CellKey>> {
    record
        .iter()
        .map(|cell| {
            cell.as_ref().map(|v| match v {
                // 0.0 and -0.0 compare equal
                Value::Number(n) if *n == 0.0 => CellKey::Number(0f64.to_bits()),
                Value::Number(n) => CellKey::Number(n.to_bits()),
                Value::Text(s) => CellKey::Text(s.clone()),
            })
        })
        .collect()
}

/// Remove incomplete rows, then exact duplicate rows (first occurrence wins)
pub fn clean_records(dataset: &Dataset) -> Result<(Dataset, CleaningReport)> {
    let input_rows = dataset.len();

    let complete: Vec<&Record> = dataset
        .rows()
        .iter()
        .filter(|r| r.iter().all(|cell| cell.is_some()))
        .collect();
    let dropped_missing = input_rows - complete.len();

    let mut seen = HashSet::new();
    let unique: Vec<Record> = complete
        .into_iter()
        .filter(|r| seen.insert(row_key(r)))
        .cloned()
        .collect();
    let dropped_duplicates = input_rows - dropped_missing - unique.len();

    let cleaned = Dataset::new(dataset.schema().clone(), unique)?;
    let report = CleaningReport {
        input_rows,
        dropped_missing,
        dropped_duplicates,
        output_rows: cleaned.len(),
        dropped_columns: Vec::new(),
    };

    Ok((cleaned, report))
}

/// Clean, encode and split a raw dataset into X and y
pub fn preprocess(dataset: &Dataset, config: &PreprocessConfig) -> Result<Preprocessed> {
    let schema = dataset.schema().clone();
    let outcome_idx = schema.outcome_index()?;
    let outcome_name = schema.columns()[outcome_idx].name.clone();

    let (cleaned, mut report) = clean_records(dataset)?;
    if cleaned.is_empty() {
        anyhow::bail!(PipelineError::EmptyDataset(format!(
            "all {} rows were removed while dropping missing values and duplicates",
            report.input_rows
        )));
    }

    // Every value is present after cleaning
    let cell = |record: &Record, idx: usize| -> Result<Value> {
        record[idx].clone().ok_or_else(|| {
            PipelineError::MissingValue {
                column: schema.columns()[idx].name.clone(),
                row: 0,
            }
            .into()
        })
    };

    let outcome_values: Vec<Value> = cleaned
        .rows()
        .iter()
        .map(|r| cell(r, outcome_idx))
        .collect::<Result<_>>()?;
    let outcome_refs: Vec<&Value> = outcome_values.iter().collect();
    let coding = OutcomeCoding::resolve(&outcome_name, &outcome_refs, config.target_mapping.as_ref())?;
    let y: Vec<u8> = outcome_refs
        .iter()
        .map(|v| coding.encode(&outcome_name, v))
        .collect::<Result<_>>()?;

    let mappings: Vec<CategoryMapping> = schema
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind == ColumnKind::Categorical)
        .map(|(idx, c)| CategoryMapping::fit(&c.name, cleaned.rows().iter().filter_map(|r| r[idx].as_ref())))
        .collect();

    // Never drop the outcome column
    report.dropped_columns = config
        .drop_columns
        .iter()
        .filter(|name| **name != outcome_name && schema.index_of(name).is_some())
        .cloned()
        .collect();

    let feature_names: Vec<String> = schema
        .columns()
        .iter()
        .filter(|c| c.kind.is_feature() && !report.dropped_columns.contains(&c.name))
        .map(|c| c.name.clone())
        .collect();

    if feature_names.is_empty() {
        anyhow::bail!(PipelineError::InvalidSchema(
            "no feature columns remain after dropping columns".to_string()
        ));
    }

    let encoder = CategoryEncoder {
        outcome_column: outcome_name,
        outcome: coding,
        mappings,
    };
    let x = encoder.encode_features(&cleaned, &feature_names)?;

    Ok(Preprocessed {
        dataset: cleaned,
        encoder,
        features: FeatureSet {
            names: feature_names,
            x,
            y,
        },
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_mapping_first_seen_order() {
        let values = vec![Value::from("Tua"), Value::from("Muda"), Value::from("Tua")];
        let mapping = CategoryMapping::fit("Usia", values.iter());

        assert_eq!(mapping.levels, vec!["Tua".to_string(), "Muda".to_string()]);
        assert_eq!(mapping.code(&Value::from("Muda")), Some(1));
        assert_eq!(mapping.code(&Value::from("Anak")), None);
    }

    #[test]
    fn test_negative_zero_is_duplicate_of_zero() {
        let a: Record = vec![Some(Value::Number(0.0))];
        let b: Record = vec![Some(Value::Number(-0.0))];
        assert!(row_key(&a) == row_key(&b));
    }
}
