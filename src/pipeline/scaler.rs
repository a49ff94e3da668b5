//! Per-feature standardization fitted on the training partition

use anyhow::Result;
use faer::Mat;
use serde::{Deserialize, Serialize};

use super::error::PipelineError;

/// Relative spread below which a column counts as constant
const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;

/// Standard scaler (per-column mean and population standard deviation).
///
/// Columns with zero variance keep `std == 0.0` and transform to zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl StandardScaler {
    /// Learn column statistics from `x` (rows are samples)
    pub fn fit(x: &Mat<f64>) -> Result<Self> {
        let (nrows, ncols) = (x.nrows(), x.ncols());
        if nrows == 0 {
            anyhow::bail!(PipelineError::EmptyDataset(
                "cannot fit a scaler on zero rows".to_string()
            ));
        }

        let n = nrows as f64;
        let mut mean = vec![0.0; ncols];
        let mut std = vec![0.0; ncols];

        for j in 0..ncols {
            let mu = (0..nrows).map(|i| x[(i, j)]).sum::<f64>() / n;
            let var = (0..nrows)
                .map(|i| {
                    let d = x[(i, j)] - mu;
                    d * d
                })
                .sum::<f64>()
                / n;
            let sigma = var.sqrt();

            mean[j] = mu;
            std[j] = if sigma <= ZERO_VARIANCE_TOLERANCE * mu.abs().max(1.0) {
                0.0
            } else {
                sigma
            };
        }

        Ok(Self { mean, std })
    }

    /// Apply `(x - mean) / std` column-wise using the fitted statistics
    pub fn transform(&self, x: &Mat<f64>) -> Result<Mat<f64>> {
        if x.ncols() != self.mean.len() {
            anyhow::bail!(PipelineError::DimensionMismatch {
                expected: self.mean.len(),
                actual: x.ncols(),
            });
        }

        Ok(Mat::from_fn(x.nrows(), x.ncols(), |i, j| {
            if self.std[j] == 0.0 {
                0.0
            } else {
                (x[(i, j)] - self.mean[j]) / self.std[j]
            }
        }))
    }

    pub fn fit_transform(x: &Mat<f64>) -> Result<(Self, Mat<f64>)> {
        let scaler = Self::fit(x)?;
        let scaled = scaler.transform(x)?;
        Ok((scaler, scaled))
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn is_constant(&self, column: usize) -> bool {
        self.std.get(column).map(|s| *s == 0.0).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_column_transforms_to_zero() {
        let x = Mat::from_fn(4, 2, |i, j| if j == 0 { 0.1 * 3.0 } else { i as f64 });
        let (scaler, scaled) = StandardScaler::fit_transform(&x).unwrap();

        assert!(scaler.is_constant(0));
        assert!(!scaler.is_constant(1));
        for i in 0..4 {
            assert_eq!(scaled[(i, 0)], 0.0);
            assert!(scaled[(i, 1)].is_finite());
        }
    }

    #[test]
    fn test_transform_checks_width() {
        let x = Mat::from_fn(3, 2, |i, j| (i + j) as f64);
        let scaler = StandardScaler::fit(&x).unwrap();
        let wrong = Mat::<f64>::zeros(3, 3);
        assert!(scaler.transform(&wrong).is_err());
    }

    #[test]
    fn test_fit_rejects_empty() {
        let x = Mat::<f64>::zeros(0, 2);
        assert!(StandardScaler::fit(&x).is_err());
    }
}
