//! Outcome column analysis and coding
//!
//! The classifier needs a 0/1 label. Numeric 0/1 outcomes are used as they
//! are; textual outcomes are mapped with an explicit event / non-event pair or
//! factorized in first-seen order.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::dataset::Value;
use super::error::PipelineError;

/// Tolerance for floating point comparison when checking binary 0/1 values
const TOLERANCE: f64 = 1e-9;

/// Mapping configuration for converting outcome values to binary 0/1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMapping {
    /// Value that maps to 1 (disease present)
    pub event_value: String,
    /// Value that maps to 0 (disease absent)
    pub non_event_value: String,
}

impl TargetMapping {
    pub fn new(event_value: impl Into<String>, non_event_value: impl Into<String>) -> Self {
        Self {
            event_value: event_value.into(),
            non_event_value: non_event_value.into(),
        }
    }
}

/// How raw outcome values become labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeCoding {
    /// Values are already 0/1
    Binary,
    /// Explicit event / non-event mapping
    Mapped(TargetMapping),
    /// First-seen value is 0, the second distinct value is 1
    Factorized { levels: Vec<String> },
}

impl OutcomeCoding {
    /// Decide the coding for an outcome column. `values` must not contain
    /// missing entries.
    pub fn resolve(
        column: &str,
        values: &[&Value],
        mapping: Option<&TargetMapping>,
    ) -> Result<Self> {
        if values.is_empty() {
            anyhow::bail!(PipelineError::EmptyDataset(format!(
                "outcome column '{}' has no values",
                column
            )));
        }

        if let Some(mapping) = mapping {
            return Ok(OutcomeCoding::Mapped(mapping.clone()));
        }

        let all_numeric = values.iter().all(|v| matches!(v, Value::Number(_)));
        if all_numeric {
            let is_binary = values.iter().all(|v| {
                v.as_f64()
                    .map(|n| (n - 0.0).abs() < TOLERANCE || (n - 1.0).abs() < TOLERANCE)
                    .unwrap_or(false)
            });
            if is_binary {
                return Ok(OutcomeCoding::Binary);
            }
        }

        let mut levels: Vec<String> = Vec::new();
        for value in values {
            let key = value.key();
            if !levels.contains(&key) {
                levels.push(key);
            }
        }

        if levels.len() > 2 {
            anyhow::bail!(PipelineError::NonBinaryOutcome {
                column: column.to_string(),
                reason: format!("found {} distinct values {:?}", levels.len(), levels),
            });
        }

        Ok(OutcomeCoding::Factorized { levels })
    }

    /// Encode one outcome value as a 0/1 label
    pub fn encode(&self, column: &str, value: &Value) -> Result<u8> {
        let label = match self {
            OutcomeCoding::Binary => value.as_f64().and_then(|n| {
                if (n - 1.0).abs() < TOLERANCE {
                    Some(1)
                } else if (n - 0.0).abs() < TOLERANCE {
                    Some(0)
                } else {
                    None
                }
            }),
            OutcomeCoding::Mapped(mapping) => {
                let key = value.key();
                if key == mapping.event_value {
                    Some(1)
                } else if key == mapping.non_event_value {
                    Some(0)
                } else {
                    None
                }
            }
            OutcomeCoding::Factorized { levels } => {
                let key = value.key();
                levels.iter().position(|l| *l == key).map(|i| i as u8)
            }
        };

        label.ok_or_else(|| {
            PipelineError::NonBinaryOutcome {
                column: column.to_string(),
                reason: format!("value '{}' does not map to 0 or 1", value),
            }
            .into()
        })
    }

    /// Human readable name of each label, index 0 and 1
    pub fn label_names(&self) -> [String; 2] {
        match self {
            OutcomeCoding::Binary => ["0".to_string(), "1".to_string()],
            OutcomeCoding::Mapped(m) => [m.non_event_value.clone(), m.event_value.clone()],
            OutcomeCoding::Factorized { levels } => [
                levels.first().cloned().unwrap_or_else(|| "0".to_string()),
                levels.get(1).cloned().unwrap_or_else(|| "1".to_string()),
            ],
        }
    }
}
