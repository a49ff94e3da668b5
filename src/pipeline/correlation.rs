//! Pearson correlation matrix of the encoded table

use anyhow::Result;
use faer::Mat;
use serde::Serialize;

use super::error::PipelineError;

/// Represents a correlated pair of columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelatedPair {
    pub feature1: String,
    pub feature2: String,
    pub correlation: f64,
}

/// Square correlation matrix with its column names, ready for a heatmap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    pub values: Vec<Vec<f64>>,
    /// Columns left out because they have zero variance
    pub constant_columns: Vec<String>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.values[i][j])
    }

    /// Upper-triangle pairs with |r| above `threshold`, strongest first
    pub fn strongest_pairs(&self, threshold: f64) -> Vec<CorrelatedPair> {
        let n = self.names.len();
        let mut pairs = Vec::new();

        for i in 0..n {
            for j in (i + 1)..n {
                let corr = self.values[i][j];
                if corr.abs() > threshold && !corr.is_nan() {
                    pairs.push(CorrelatedPair {
                        feature1: self.names[i].clone(),
                        feature2: self.names[j].clone(),
                        correlation: corr,
                    });
                }
            }
        }

        // Sort by absolute correlation descending
        pairs.sort_by(|a, b| {
            b.correlation
                .abs()
                .partial_cmp(&a.correlation.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        pairs
    }
}

/// Compute the correlation matrix using matrix operations.
///
/// Algorithm:
/// 1. Standardize every column: Z = (X - mean) / (std * sqrt(n))
/// 2. Correlation matrix: R = Zᵀ Z
///
/// Constant columns have no defined correlation and are skipped.
pub fn correlation_matrix(names: &[String], x: &Mat<f64>) -> Result<CorrelationMatrix> {
    let (n_rows, n_cols) = (x.nrows(), x.ncols());
    if names.len() != n_cols {
        anyhow::bail!(PipelineError::DimensionMismatch {
            expected: n_cols,
            actual: names.len(),
        });
    }
    if n_rows == 0 {
        anyhow::bail!(PipelineError::EmptyDataset(
            "cannot correlate zero rows".to_string()
        ));
    }

    let n = n_rows as f64;
    let mut kept: Vec<(usize, f64, f64)> = Vec::with_capacity(n_cols);
    let mut constant_columns = Vec::new();

    for j in 0..n_cols {
        let mean = (0..n_rows).map(|i| x[(i, j)]).sum::<f64>() / n;
        let std = ((0..n_rows)
            .map(|i| (x[(i, j)] - mean).powi(2))
            .sum::<f64>()
            / n)
            .sqrt();
        if std == 0.0 {
            constant_columns.push(names[j].clone());
        } else {
            kept.push((j, mean, std));
        }
    }

    // Build the standardized data matrix Z (n_rows x kept columns)
    let z = Mat::from_fn(n_rows, kept.len(), |i, k| {
        let (j, mean, std) = kept[k];
        (x[(i, j)] - mean) / (std * n.sqrt())
    });
    let corr = z.transpose() * &z;

    let values = (0..kept.len())
        .map(|a| {
            (0..kept.len())
                .map(|b| if a == b { 1.0 } else { corr[(a, b)].clamp(-1.0, 1.0) })
                .collect()
        })
        .collect();

    Ok(CorrelationMatrix {
        names: kept.iter().map(|(j, _, _)| names[*j].clone()).collect(),
        values,
        constant_columns,
    })
}
