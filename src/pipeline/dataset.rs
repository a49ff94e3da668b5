//! Typed in-memory table of survey records

use std::fmt;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::PipelineError;
use super::schema::{ColumnKind, Schema};

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// Key used for category factorization and row equality
    pub fn key(&self) -> String {
        match self {
            Value::Number(n) => format!("{}", n),
            Value::Text(s) => s.clone(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// One row of the table; `None` marks a missing value
pub type Record = Vec<Option<Value>>;

/// Ordered records sharing a schema
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    schema: Schema,
    rows: Vec<Record>,
}

impl Dataset {
    pub fn new(schema: Schema, rows: Vec<Record>) -> Result<Self> {
        let width = schema.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            anyhow::bail!(PipelineError::DimensionMismatch {
                expected: width,
                actual: bad.len(),
            });
        }
        Ok(Self { schema, rows })
    }

    /// Convert a polars frame into records, reading only the schema's columns
    /// in schema order.
    pub fn from_frame(df: &DataFrame, schema: &Schema) -> Result<Self> {
        schema.validate_frame(df)?;

        let height = df.height();
        let mut columns: Vec<Vec<Option<Value>>> = Vec::with_capacity(schema.len());

        for spec in schema.columns() {
            let column = df
                .column(&spec.name)
                .with_context(|| format!("Column '{}' not found", spec.name))?;

            let values = match spec.kind {
                ColumnKind::Numeric => column_to_numbers(column, &spec.name)?,
                _ => column_to_values(column)?,
            };
            columns.push(values);
        }

        let rows = (0..height)
            .map(|row| columns.iter().map(|col| col[row].clone()).collect())
            .collect();

        Self::new(schema.clone(), rows)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<Option<&Value>>> {
        let idx = self.schema.index_of(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_ref()).collect())
    }
}

/// Read a numeric column. Text columns are parsed and any unparsable value is
/// a schema error rather than a silent null.
fn column_to_numbers(col: &Column, name: &str) -> Result<Vec<Option<Value>>> {
    if col.dtype().is_primitive_numeric() || col.dtype() == &DataType::Boolean {
        let cast = col.cast(&DataType::Float64)?;
        return Ok(cast.f64()?.into_iter().map(|v| v.map(Value::Number)).collect());
    }

    let mut values = Vec::with_capacity(col.len());
    for (row, value) in column_to_values(col)?.into_iter().enumerate() {
        match value {
            None => values.push(None),
            Some(v) => match v.as_f64() {
                Some(n) => values.push(Some(Value::Number(n))),
                None => anyhow::bail!(PipelineError::NonNumeric {
                    column: name.to_string(),
                    row,
                    value: v.key(),
                }),
            },
        }
    }
    Ok(values)
}

/// Read any column as values, keeping numbers numeric and everything else as text
fn column_to_values(col: &Column) -> Result<Vec<Option<Value>>> {
    let values: Vec<Option<Value>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.map(|s| Value::Text(s.to_string())))
            .collect(),
        dtype if dtype.is_primitive_numeric() => {
            let cast = col.cast(&DataType::Float64)?;
            cast.f64()?.into_iter().map(|v| v.map(Value::Number)).collect()
        }
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| Value::Text(b.to_string())))
            .collect(),
        _ => {
            let cast = col.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(|s| Value::Text(s.to_string())))
                .collect()
        }
    };

    Ok(values)
}
