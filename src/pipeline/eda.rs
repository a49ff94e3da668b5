//! Exploratory summaries: missing counts, descriptive statistics, class
//! balance and category-by-outcome counts.

use anyhow::Result;
use serde::Serialize;

use super::dataset::Dataset;
use super::preprocess::{CategoryEncoder, FeatureSet};

/// Descriptive statistics of one numeric column (the boxplot series)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1)
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Share of one class in the label vector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassShare {
    pub label: u8,
    pub name: String,
    pub count: usize,
    pub percentage: f64,
}

/// Outcome counts for one category value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub negatives: usize,
    pub positives: usize,
}

/// Count plot series for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub column: String,
    pub counts: Vec<CategoryCount>,
}

/// Missing values per column, in schema order
pub fn missing_counts(dataset: &Dataset) -> Vec<(String, usize)> {
    dataset
        .schema()
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, spec)| {
            let missing = dataset.rows().iter().filter(|r| r[idx].is_none()).count();
            (spec.name.clone(), missing)
        })
        .collect()
}

/// Linear-interpolated quantile of sorted data
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Summarize one column of values
pub fn summarize(name: &str, values: &[f64]) -> ColumnSummary {
    let count = values.len();
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mean = if count == 0 {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / count as f64
    };
    let std = if count < 2 {
        f64::NAN
    } else {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64).sqrt()
    };

    ColumnSummary {
        name: name.to_string(),
        count,
        mean,
        std,
        min: sorted.first().copied().unwrap_or(f64::NAN),
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted.last().copied().unwrap_or(f64::NAN),
    }
}

/// Describe every encoded feature column plus the label
pub fn describe(features: &FeatureSet, outcome: &str) -> Vec<ColumnSummary> {
    let mut summaries: Vec<ColumnSummary> = features
        .names
        .iter()
        .enumerate()
        .map(|(j, name)| summarize(name, &features.column(j)))
        .collect();

    let labels: Vec<f64> = features.y.iter().map(|&l| f64::from(l)).collect();
    summaries.push(summarize(outcome, &labels));
    summaries
}

/// Class counts and percentages (the pie chart series)
pub fn class_distribution(y: &[u8], label_names: &[String; 2]) -> Vec<ClassShare> {
    let total = y.len();
    (0..2u8)
        .map(|label| {
            let count = y.iter().filter(|&&l| l == label).count();
            ClassShare {
                label,
                name: label_names[label as usize].clone(),
                count,
                percentage: if total == 0 {
                    0.0
                } else {
                    count as f64 * 100.0 / total as f64
                },
            }
        })
        .collect()
}

/// Outcome counts per category of `column`, categories in first-seen order.
/// Rows with a missing category or outcome are skipped.
pub fn category_outcome_counts(
    dataset: &Dataset,
    column: &str,
    encoder: &CategoryEncoder,
) -> Result<Option<CategoryBreakdown>> {
    let schema = dataset.schema();
    let Some(col_idx) = schema.index_of(column) else {
        return Ok(None);
    };
    let outcome_idx = schema.outcome_index()?;

    let mut counts: Vec<CategoryCount> = Vec::new();
    for record in dataset.rows() {
        let (Some(value), Some(outcome)) = (&record[col_idx], &record[outcome_idx]) else {
            continue;
        };
        let label = encoder.outcome.encode(&encoder.outcome_column, outcome)?;
        let key = value.key();

        let entry = match counts.iter().position(|c| c.category == key) {
            Some(i) => &mut counts[i],
            None => {
                counts.push(CategoryCount {
                    category: key,
                    negatives: 0,
                    positives: 0,
                });
                let last = counts.len() - 1;
                &mut counts[last]
            }
        };
        if label == 1 {
            entry.positives += 1;
        } else {
            entry.negatives += 1;
        }
    }

    Ok(Some(CategoryBreakdown {
        column: column.to_string(),
        counts,
    }))
}

/// All exploration series for the cleaned dataset
#[derive(Debug, Clone, Serialize)]
pub struct Exploration {
    pub missing_before_cleaning: Vec<(String, usize)>,
    pub summaries: Vec<ColumnSummary>,
    pub class_distribution: Vec<ClassShare>,
    pub category_breakdowns: Vec<CategoryBreakdown>,
}

/// Build the exploration series. `raw` is the dataset before cleaning and
/// `cleaned` after; breakdowns are computed for the listed columns that exist.
pub fn explore(
    raw: &Dataset,
    cleaned: &Dataset,
    features: &FeatureSet,
    encoder: &CategoryEncoder,
    breakdown_columns: &[&str],
) -> Result<Exploration> {
    let mut category_breakdowns = Vec::new();
    for column in breakdown_columns {
        if let Some(breakdown) = category_outcome_counts(cleaned, column, encoder)? {
            category_breakdowns.push(breakdown);
        }
    }

    Ok(Exploration {
        missing_before_cleaning: missing_counts(raw),
        summaries: describe(features, &encoder.outcome_column),
        class_distribution: class_distribution(&features.y, &encoder.outcome.label_names()),
        category_breakdowns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantiles_interpolate() {
        let s = summarize("x", &[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert!((s.median - 2.5).abs() < 1e-12);
        assert!((s.q1 - 1.75).abs() < 1e-12);
        assert!((s.q3 - 3.25).abs() < 1e-12);
        assert!((s.std - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_class_distribution_percentages() {
        let names = ["Tidak".to_string(), "Ya".to_string()];
        let shares = class_distribution(&[0, 1, 1, 1], &names);
        assert_eq!(shares[1].count, 3);
        assert!((shares[1].percentage - 75.0).abs() < 1e-12);
        assert_eq!(shares[0].name, "Tidak");
    }
}
