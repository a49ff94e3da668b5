//! L2-regularized binary logistic regression
//!
//! Minimizes
//!
//! ```text
//! L(w, b) = Σ [-y log σ(wᵀx + b) - (1 - y) log(1 - σ(wᵀx + b))] + (1/C) ‖w‖²
//! ```
//!
//! with damped Newton steps. The intercept is not penalized.

use anyhow::Result;
use faer::prelude::SpSolver;
use faer::{Col, Mat, Side};
use serde::{Deserialize, Serialize};

use super::error::PipelineError;

/// Sufficient-decrease constant for the backtracking line search
const ARMIJO: f64 = 1e-4;

/// Step halvings before the line search gives up
const MAX_BACKTRACKS: usize = 40;

/// Diagonal jitter keeping the Hessian positive definite
const HESSIAN_JITTER: f64 = 1e-10;

/// Default inverse regularization strength
pub const DEFAULT_C: f64 = 1.0;

/// Logistic regression hyperparameters (the untrained estimator)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Inverse regularization strength; higher means weaker regularization
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            c: DEFAULT_C,
            max_iter: 100,
            tol: 1e-8,
        }
    }
}

impl LogisticRegression {
    pub fn new(c: f64) -> Self {
        Self {
            c,
            ..Default::default()
        }
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Fit weights and intercept on `x` (rows are samples) and 0/1 labels `y`
    pub fn fit(&self, x: &Mat<f64>, y: &[u8]) -> Result<FittedModel> {
        let (n, p) = (x.nrows(), x.ncols());

        if n == 0 {
            anyhow::bail!(PipelineError::EmptyDataset(
                "cannot fit logistic regression on zero rows".to_string()
            ));
        }
        if y.len() != n {
            anyhow::bail!(PipelineError::DimensionMismatch {
                expected: n,
                actual: y.len(),
            });
        }
        if !(self.c.is_finite() && self.c > 0.0) {
            anyhow::bail!(PipelineError::Fit(format!(
                "C must be a positive finite number, got {}",
                self.c
            )));
        }

        let positives = y.iter().filter(|&&l| l == 1).count();
        if positives == 0 || positives == n {
            anyhow::bail!(PipelineError::Fit(format!(
                "training data contains a single class ({} of {} samples are positive)",
                positives, n
            )));
        }

        let penalty = 1.0 / self.c;
        // theta = [w_0 .. w_{p-1}, b]
        let mut theta = vec![0.0; p + 1];
        let mut loss = objective(x, y, &theta, penalty);
        let mut converged = false;
        let mut n_iter = 0;

        for iter in 0..self.max_iter {
            n_iter = iter + 1;

            let (gradient, hessian) = gradient_and_hessian(x, y, &theta, penalty);
            let direction = newton_direction(&hessian, &gradient)?;
            let slope: f64 = gradient.iter().zip(&direction).map(|(g, d)| g * d).sum();

            let mut step = 1.0;
            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                let candidate: Vec<f64> = theta
                    .iter()
                    .zip(&direction)
                    .map(|(t, d)| t - step * d)
                    .collect();
                let candidate_loss = objective(x, y, &candidate, penalty);
                if candidate_loss <= loss - ARMIJO * step * slope {
                    accepted = Some((candidate, candidate_loss));
                    break;
                }
                step *= 0.5;
            }

            let Some((candidate, candidate_loss)) = accepted else {
                // No representable decrease left: at the optimum up to rounding
                converged = true;
                break;
            };

            let change = direction
                .iter()
                .map(|d| (step * d).abs())
                .fold(0.0, f64::max);
            theta = candidate;
            loss = candidate_loss;

            log::debug!(
                "logistic regression C={} iter={} loss={:.6} max_step={:.3e}",
                self.c,
                n_iter,
                loss,
                change
            );

            if change < self.tol {
                converged = true;
                break;
            }
        }

        if !converged {
            log::warn!(
                "logistic regression (C={}) did not converge in {} iterations; consider raising max_iter or scaling the data",
                self.c,
                self.max_iter
            );
        }

        let intercept = theta[p];
        theta.truncate(p);

        Ok(FittedModel {
            weights: theta,
            intercept,
            c: self.c,
            n_iter,
            converged,
        })
    }
}

/// A fitted, immutable logistic regression model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    weights: Vec<f64>,
    intercept: f64,
    c: f64,
    n_iter: usize,
    converged: bool,
}

impl FittedModel {
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn c(&self) -> f64 {
        self.c
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    /// Linear scores `wᵀx + b`
    pub fn decision_function(&self, x: &Mat<f64>) -> Result<Vec<f64>> {
        if x.ncols() != self.weights.len() {
            anyhow::bail!(PipelineError::DimensionMismatch {
                expected: self.weights.len(),
                actual: x.ncols(),
            });
        }
        Ok((0..x.nrows())
            .map(|i| linear_score(x, i, &self.weights, self.intercept))
            .collect())
    }

    /// Probability of class 1 for every row
    pub fn predict_proba(&self, x: &Mat<f64>) -> Result<Vec<f64>> {
        Ok(self.decision_function(x)?.into_iter().map(sigmoid).collect())
    }

    /// Class labels, thresholding the probability at 0.5
    pub fn predict(&self, x: &Mat<f64>) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }

    /// Mean accuracy on the given data
    pub fn score(&self, x: &Mat<f64>, y: &[u8]) -> Result<f64> {
        let predictions = self.predict(x)?;
        super::metrics::accuracy(y, &predictions)
    }
}

/// Numerically stable logistic sigmoid
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// log(1 + e^z) without overflow
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

fn linear_score(x: &Mat<f64>, row: usize, weights: &[f64], intercept: f64) -> f64 {
    weights
        .iter()
        .enumerate()
        .map(|(j, w)| w * x[(row, j)])
        .sum::<f64>()
        + intercept
}

fn objective(x: &Mat<f64>, y: &[u8], theta: &[f64], penalty: f64) -> f64 {
    let p = x.ncols();
    let (weights, intercept) = (&theta[..p], theta[p]);

    let data_loss: f64 = (0..x.nrows())
        .map(|i| {
            let z = linear_score(x, i, weights, intercept);
            softplus(z) - f64::from(y[i]) * z
        })
        .sum();

    data_loss + penalty * weights.iter().map(|w| w * w).sum::<f64>()
}

/// Gradient and Hessian of the objective with respect to `[w, b]`
fn gradient_and_hessian(x: &Mat<f64>, y: &[u8], theta: &[f64], penalty: f64) -> (Vec<f64>, Mat<f64>) {
    let (n, p) = (x.nrows(), x.ncols());
    let (weights, intercept) = (&theta[..p], theta[p]);

    let mut gradient = vec![0.0; p + 1];
    let mut curvature = vec![0.0; n];

    for i in 0..n {
        let prob = sigmoid(linear_score(x, i, weights, intercept));
        let residual = prob - f64::from(y[i]);
        for j in 0..p {
            gradient[j] += residual * x[(i, j)];
        }
        gradient[p] += residual;
        curvature[i] = prob * (1.0 - prob);
    }
    for j in 0..p {
        gradient[j] += 2.0 * penalty * weights[j];
    }

    // H = Aᵀ A with A = diag(sqrt(s)) [X 1]
    let weighted = Mat::from_fn(n, p + 1, |i, j| {
        let value = if j < p { x[(i, j)] } else { 1.0 };
        curvature[i].sqrt() * value
    });
    let mut hessian = weighted.transpose() * &weighted;
    for j in 0..=p {
        hessian[(j, j)] += HESSIAN_JITTER;
        if j < p {
            hessian[(j, j)] += 2.0 * penalty;
        }
    }

    (gradient, hessian)
}

/// Solve the Newton system `H d = g` through a Cholesky factorization of `H`
fn newton_direction(hessian: &Mat<f64>, gradient: &[f64]) -> Result<Vec<f64>> {
    let cholesky = hessian
        .cholesky(Side::Lower)
        .map_err(|_| PipelineError::Fit("Hessian is not positive definite".to_string()))?;
    let rhs = Col::from_fn(gradient.len(), |i| gradient[i]);
    let direction = cholesky.solve(rhs.as_ref());
    Ok((0..direction.nrows()).map(|i| direction.read(i)).collect())
}
