//! Principal component analysis of the scaled training matrix

use anyhow::Result;
use faer::{Mat, Side};
use serde::Serialize;

use super::error::PipelineError;

/// A fitted PCA projection
#[derive(Debug, Clone, Serialize)]
pub struct Pca {
    pub n_components: usize,
    pub mean: Vec<f64>,
    /// Principal axes, one row per kept component
    pub components: Vec<Vec<f64>>,
    /// Variance along every axis, largest first (all axes, for the scree plot)
    pub explained_variance: Vec<f64>,
    pub explained_variance_ratio: Vec<f64>,
}

/// A training row projected onto the first two components
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedPoint {
    pub pc1: f64,
    pub pc2: f64,
    pub label: u8,
}

impl Pca {
    /// Eigen-decompose the sample covariance of `x`
    pub fn fit(x: &Mat<f64>, n_components: usize) -> Result<Self> {
        let (n, p) = (x.nrows(), x.ncols());
        if n < 2 {
            anyhow::bail!(PipelineError::EmptyDataset(
                "PCA needs at least two rows".to_string()
            ));
        }
        if n_components == 0 || n_components > p {
            anyhow::bail!(PipelineError::DimensionMismatch {
                expected: p,
                actual: n_components,
            });
        }

        let mean: Vec<f64> = (0..p)
            .map(|j| (0..n).map(|i| x[(i, j)]).sum::<f64>() / n as f64)
            .collect();
        let centered = Mat::from_fn(n, p, |i, j| x[(i, j)] - mean[j]);
        let mut covariance = centered.transpose() * &centered;
        for i in 0..p {
            for j in 0..p {
                covariance[(i, j)] /= (n - 1) as f64;
            }
        }

        let (eigenvalues, eigenvectors) = symmetric_eigen(&covariance);

        let mut order: Vec<usize> = (0..p).collect();
        order.sort_by(|&a, &b| {
            eigenvalues[b]
                .partial_cmp(&eigenvalues[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Rounding can leave tiny negative eigenvalues
        let explained_variance: Vec<f64> = order.iter().map(|&k| eigenvalues[k].max(0.0)).collect();
        let total: f64 = explained_variance.iter().sum();
        let explained_variance_ratio = explained_variance
            .iter()
            .map(|v| if total > 0.0 { v / total } else { 0.0 })
            .collect();

        let components = order
            .iter()
            .take(n_components)
            .map(|&k| {
                let mut axis: Vec<f64> = (0..p).map(|i| eigenvectors[(i, k)]).collect();
                // Deterministic sign: largest loading is positive
                let pivot = axis
                    .iter()
                    .copied()
                    .fold(0.0f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
                if pivot < 0.0 {
                    axis.iter_mut().for_each(|v| *v = -*v);
                }
                axis
            })
            .collect();

        Ok(Self {
            n_components,
            mean,
            components,
            explained_variance,
            explained_variance_ratio,
        })
    }

    /// Component scores for each row
    pub fn transform(&self, x: &Mat<f64>) -> Result<Mat<f64>> {
        if x.ncols() != self.mean.len() {
            anyhow::bail!(PipelineError::DimensionMismatch {
                expected: self.mean.len(),
                actual: x.ncols(),
            });
        }
        Ok(Mat::from_fn(x.nrows(), self.n_components, |i, k| {
            self.components[k]
                .iter()
                .enumerate()
                .map(|(j, w)| w * (x[(i, j)] - self.mean[j]))
                .sum()
        }))
    }

    /// First two component scores paired with labels, for a scatter plot
    pub fn project_labeled(&self, x: &Mat<f64>, y: &[u8]) -> Result<Vec<ProjectedPoint>> {
        if x.nrows() != y.len() {
            anyhow::bail!(PipelineError::DimensionMismatch {
                expected: x.nrows(),
                actual: y.len(),
            });
        }
        let scores = self.transform(x)?;
        Ok((0..scores.nrows())
            .map(|i| ProjectedPoint {
                pc1: scores[(i, 0)],
                pc2: if self.n_components > 1 { scores[(i, 1)] } else { 0.0 },
                label: y[i],
            })
            .collect())
    }

    /// Cumulative share of variance captured by the kept components
    pub fn total_explained(&self) -> f64 {
        self.explained_variance_ratio
            .iter()
            .take(self.n_components)
            .sum()
    }
}

/// Eigenvalues and eigenvectors (as columns) of a symmetric matrix, unsorted
fn symmetric_eigen(matrix: &Mat<f64>) -> (Vec<f64>, Mat<f64>) {
    let eigen = matrix.selfadjoint_eigendecomposition(Side::Lower);
    let values = eigen.s().column_vector();
    let vectors = eigen.u();
    let eigenvalues = (0..values.nrows()).map(|k| values.read(k)).collect();
    let eigenvectors = Mat::from_fn(vectors.nrows(), vectors.ncols(), |i, k| vectors.read(i, k));
    (eigenvalues, eigenvectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_eigen_reconstructs_matrix() {
        let m = Mat::from_fn(2, 2, |i, j| [[2.0, 1.0], [1.0, 2.0]][i][j]);
        let (values, vectors) = symmetric_eigen(&m);

        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((sorted[0] - 1.0).abs() < 1e-10);
        assert!((sorted[1] - 3.0).abs() < 1e-10);

        // M v = λ v for every pair
        for (k, lambda) in values.iter().enumerate() {
            for i in 0..2 {
                let mv: f64 = (0..2).map(|j| m[(i, j)] * vectors[(j, k)]).sum();
                assert!((mv - lambda * vectors[(i, k)]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_first_component_follows_dominant_direction() {
        // Points spread along y = x with small noise in the orthogonal direction
        let data = [
            [-2.0, -2.1],
            [-1.0, -0.9],
            [0.0, 0.1],
            [1.0, 1.1],
            [2.0, 1.9],
        ];
        let x = Mat::from_fn(5, 2, |i, j| data[i][j]);
        let pca = Pca::fit(&x, 2).unwrap();

        assert!(pca.explained_variance_ratio[0] > 0.99);
        assert!((pca.explained_variance_ratio.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        let axis = &pca.components[0];
        assert!((axis[0] - axis[1]).abs() < 0.1);
        assert!(axis[0] > 0.0);
    }

    #[test]
    fn test_rejects_too_many_components() {
        let x = Mat::from_fn(4, 2, |i, j| (i * j) as f64);
        assert!(Pca::fit(&x, 3).is_err());
    }
}
