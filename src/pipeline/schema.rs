//! Column schema for the lung disease dataset
//!
//! Every input column is tagged with a semantic kind so the rest of the
//! pipeline never has to guess whether a column is an identifier, a feature
//! or the outcome.

use std::collections::HashSet;
use std::fmt;

use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::PipelineError;

/// Outcome column of the lung disease dataset
pub const LUNG_OUTCOME: &str = "Hasil";

/// Columns removed before modeling: the row identifier plus insurance,
/// household and employment columns judged irrelevant to the outcome.
pub const DEFAULT_DROP_COLUMNS: [&str; 4] = ["No", "Asuransi", "Rumah_Tangga", "Bekerja"];

/// Lifestyle features summarized against the outcome during exploration
pub const LIFESTYLE_FEATURES: [&str; 7] = [
    "Usia",
    "Jenis_Kelamin",
    "Merokok",
    "Aktivitas_Begadang",
    "Aktivitas_Olahraga",
    "Bekerja",
    "Penyakit_Bawaan",
];

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Row identifier, never used as a feature
    Identifier,
    /// Real-valued feature
    Numeric,
    /// Feature whose values are factorized into integer codes
    Categorical,
    /// Binary outcome (label)
    Outcome,
}

impl ColumnKind {
    pub fn is_feature(self) -> bool {
        matches!(self, ColumnKind::Numeric | ColumnKind::Categorical)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Identifier => "identifier",
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Outcome => "outcome",
        };
        write!(f, "{}", name)
    }
}

/// A named column and its kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered set of column specifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    /// Build a training schema. Column names must be unique and exactly one
    /// column must be the outcome.
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self> {
        let schema = Self::for_inference(columns)?;
        let outcomes = schema
            .columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Outcome)
            .count();
        if outcomes != 1 {
            anyhow::bail!(PipelineError::InvalidSchema(format!(
                "expected exactly one outcome column, found {}",
                outcomes
            )));
        }
        Ok(schema)
    }

    /// Build a schema that may omit the outcome (records to be scored).
    pub fn for_inference(columns: Vec<ColumnSpec>) -> Result<Self> {
        if columns.is_empty() {
            anyhow::bail!(PipelineError::InvalidSchema(
                "schema has no columns".to_string()
            ));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                anyhow::bail!(PipelineError::InvalidSchema(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
        }

        if columns.iter().filter(|c| c.kind == ColumnKind::Outcome).count() > 1 {
            anyhow::bail!(PipelineError::InvalidSchema(
                "more than one outcome column".to_string()
            ));
        }

        Ok(Self { columns })
    }

    /// The fixed schema of the lung disease survey table
    pub fn lung() -> Self {
        use ColumnKind::*;

        let columns = vec![
            ColumnSpec::new("No", Identifier),
            ColumnSpec::new("Usia", Categorical),
            ColumnSpec::new("Jenis_Kelamin", Categorical),
            ColumnSpec::new("Merokok", Categorical),
            ColumnSpec::new("Bekerja", Categorical),
            ColumnSpec::new("Rumah_Tangga", Categorical),
            ColumnSpec::new("Aktivitas_Begadang", Categorical),
            ColumnSpec::new("Aktivitas_Olahraga", Categorical),
            ColumnSpec::new("Asuransi", Categorical),
            ColumnSpec::new("Penyakit_Bawaan", Categorical),
            ColumnSpec::new(LUNG_OUTCOME, Outcome),
        ];

        Self { columns }
    }

    /// Infer a schema from column dtypes: text and boolean columns are
    /// categorical, numeric columns are numeric.
    pub fn infer(df: &DataFrame, target: &str, identifiers: &[String]) -> Result<Self> {
        let available: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        if !available.iter().any(|c| c == target) {
            anyhow::bail!(PipelineError::MissingColumns {
                missing: vec![target.to_string()],
                available,
            });
        }

        let columns = df
            .get_columns()
            .iter()
            .map(|col| {
                let name = col.name().to_string();
                let kind = if name == target {
                    ColumnKind::Outcome
                } else if identifiers.contains(&name) {
                    ColumnKind::Identifier
                } else if col.dtype().is_primitive_numeric() {
                    ColumnKind::Numeric
                } else {
                    ColumnKind::Categorical
                };
                ColumnSpec { name, kind }
            })
            .collect();

        Self::new(columns)
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Index of the outcome column
    pub fn outcome_index(&self) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.kind == ColumnKind::Outcome)
            .ok_or_else(|| {
                PipelineError::InvalidSchema("schema has no outcome column".to_string()).into()
            })
    }

    pub fn outcome(&self) -> Result<&ColumnSpec> {
        Ok(&self.columns[self.outcome_index()?])
    }

    /// Check that every column the schema expects exists in the frame
    pub fn validate_frame(&self, df: &DataFrame) -> Result<()> {
        let available: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let missing: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !available.contains(&c.name))
            .map(|c| c.name.clone())
            .collect();

        if !missing.is_empty() {
            anyhow::bail!(PipelineError::MissingColumns { missing, available });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lung_schema_has_single_outcome() {
        let schema = Schema::lung();
        assert_eq!(schema.outcome().unwrap().name, LUNG_OUTCOME);
        assert_eq!(schema.get("No").unwrap().kind, ColumnKind::Identifier);
        assert_eq!(schema.len(), 11);
    }

    #[test]
    fn test_new_rejects_duplicate_columns() {
        let result = Schema::new(vec![
            ColumnSpec::new("a", ColumnKind::Numeric),
            ColumnSpec::new("a", ColumnKind::Numeric),
            ColumnSpec::new("y", ColumnKind::Outcome),
        ]);
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_new_requires_outcome() {
        let result = Schema::new(vec![ColumnSpec::new("a", ColumnKind::Numeric)]);
        assert!(result.is_err());
        assert!(Schema::for_inference(vec![ColumnSpec::new("a", ColumnKind::Numeric)]).is_ok());
    }

    #[test]
    fn test_infer_from_dtypes() {
        let df = df! {
            "id" => [1i64, 2, 3],
            "age" => [30.0f64, 40.0, 50.0],
            "smoker" => ["yes", "no", "yes"],
            "label" => [0i32, 1, 0],
        }
        .unwrap();

        let schema = Schema::infer(&df, "label", &["id".to_string()]).unwrap();
        assert_eq!(schema.get("id").unwrap().kind, ColumnKind::Identifier);
        assert_eq!(schema.get("age").unwrap().kind, ColumnKind::Numeric);
        assert_eq!(schema.get("smoker").unwrap().kind, ColumnKind::Categorical);
        assert_eq!(schema.get("label").unwrap().kind, ColumnKind::Outcome);
    }

    #[test]
    fn test_validate_frame_reports_missing_columns() {
        let df = df! {
            "Usia" => ["Tua", "Muda"],
            "Hasil" => ["Ya", "Tidak"],
        }
        .unwrap();

        let err = Schema::lung().validate_frame(&df).unwrap_err();
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::MissingColumns { missing, .. }) => {
                assert!(missing.contains(&"Merokok".to_string()));
                assert!(!missing.contains(&"Usia".to_string()));
            }
            other => panic!("Expected MissingColumns, got {:?}", other),
        }
    }
}
