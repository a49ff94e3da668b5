//! Cross-validation and grid search over the regularization strength

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use faer::Mat;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::PipelineError;
use super::model::{FittedModel, LogisticRegression};
use super::scaler::StandardScaler;
use super::split::{select_labels, select_rows, KFold};

/// Candidate C values searched by default
pub const DEFAULT_C_GRID: [f64; 6] = [0.001, 0.01, 0.1, 1.0, 10.0, 100.0];

/// Default number of folds
pub const DEFAULT_FOLDS: usize = 5;

/// Feature space used inside cross-validation.
///
/// `Raw` fits each fold on the features as given (unscaled), even though the
/// holdout evaluation uses scaled features. `Standardized` fits a scaler on
/// every training fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CvFeatures {
    #[default]
    Raw,
    Standardized,
}

impl fmt::Display for CvFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CvFeatures::Raw => write!(f, "raw"),
            CvFeatures::Standardized => write!(f, "standardized"),
        }
    }
}

impl FromStr for CvFeatures {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(CvFeatures::Raw),
            "standardized" | "scaled" => Ok(CvFeatures::Standardized),
            _ => Err(format!(
                "Invalid CV feature space '{}'. Valid options: raw, standardized",
                s
            )),
        }
    }
}

/// Accuracy of each validation fold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CvScores {
    pub fold_scores: Vec<f64>,
}

impl CvScores {
    pub fn mean(&self) -> f64 {
        if self.fold_scores.is_empty() {
            return 0.0;
        }
        self.fold_scores.iter().sum::<f64>() / self.fold_scores.len() as f64
    }

    /// Population standard deviation across folds
    pub fn std(&self) -> f64 {
        if self.fold_scores.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let var = self
            .fold_scores
            .iter()
            .map(|s| (s - mean).powi(2))
            .sum::<f64>()
            / self.fold_scores.len() as f64;
        var.sqrt()
    }
}

/// Fit on k-1 folds, score accuracy on the held-out fold, k times
pub fn cross_val_score(
    estimator: &LogisticRegression,
    x: &Mat<f64>,
    y: &[u8],
    folds: &KFold,
    features: CvFeatures,
) -> Result<CvScores> {
    cross_val_score_with_progress(estimator, x, y, folds, features, None)
}

fn cross_val_score_with_progress(
    estimator: &LogisticRegression,
    x: &Mat<f64>,
    y: &[u8],
    folds: &KFold,
    features: CvFeatures,
    progress: Option<&ProgressBar>,
) -> Result<CvScores> {
    if x.nrows() != y.len() {
        anyhow::bail!(PipelineError::DimensionMismatch {
            expected: x.nrows(),
            actual: y.len(),
        });
    }

    let mut fold_scores = Vec::with_capacity(folds.n_splits());
    for (fold, (train_idx, test_idx)) in folds.split(y)?.into_iter().enumerate() {
        let mut x_train = select_rows(x, &train_idx);
        let mut x_val = select_rows(x, &test_idx);
        if features == CvFeatures::Standardized {
            let scaler = StandardScaler::fit(&x_train)?;
            x_train = scaler.transform(&x_train)?;
            x_val = scaler.transform(&x_val)?;
        }

        let model = estimator.fit(&x_train, &select_labels(y, &train_idx))?;
        let score = model.score(&x_val, &select_labels(y, &test_idx))?;
        log::debug!("C={} fold {} accuracy {:.4}", estimator.c, fold + 1, score);
        fold_scores.push(score);

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    Ok(CvScores { fold_scores })
}

/// Cross-validation result of one candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    pub c: f64,
    pub scores: CvScores,
    pub mean_score: f64,
}

/// Index of the candidate with the highest mean score; the first listed wins ties
pub fn select_best(candidates: &[CandidateScore]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        match best {
            Some(b) if candidate.mean_score <= candidates[b].mean_score => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Outcome of a grid search
#[derive(Debug, Clone)]
pub struct GridSearchResult {
    pub candidates: Vec<CandidateScore>,
    pub best_index: usize,
    pub best_c: f64,
    pub best_score: f64,
    /// Winning estimator refitted on all of the search data, in the
    /// cross-validation feature space. `None` when refitting is disabled.
    pub best_model: Option<FittedModel>,
    /// Scaler the refit used, when searching standardized features
    pub best_scaler: Option<StandardScaler>,
}

/// Exhaustive cross-validated search over C
#[derive(Debug, Clone)]
pub struct GridSearch {
    pub candidates: Vec<f64>,
    pub folds: usize,
    pub cv_features: CvFeatures,
    pub estimator: LogisticRegression,
    pub refit: bool,
}

impl Default for GridSearch {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_C_GRID.to_vec(),
            folds: DEFAULT_FOLDS,
            cv_features: CvFeatures::default(),
            estimator: LogisticRegression::default(),
            refit: true,
        }
    }
}

impl GridSearch {
    pub fn new(candidates: Vec<f64>) -> Self {
        Self {
            candidates,
            ..Default::default()
        }
    }

    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = folds;
        self
    }

    pub fn with_cv_features(mut self, cv_features: CvFeatures) -> Self {
        self.cv_features = cv_features;
        self
    }

    /// Solver settings shared by every candidate; its C is replaced
    pub fn with_estimator(mut self, estimator: LogisticRegression) -> Self {
        self.estimator = estimator;
        self
    }

    /// Skip the final fit with the winning C, for callers that train their own
    pub fn with_refit(mut self, refit: bool) -> Self {
        self.refit = refit;
        self
    }

    /// Number of model fits performed by cross-validation
    pub fn total_fits(&self) -> usize {
        self.candidates.len() * self.folds
    }

    pub fn fit(&self, x: &Mat<f64>, y: &[u8]) -> Result<GridSearchResult> {
        self.fit_with_progress(x, y, None)
    }

    /// Run the search. Candidates are scored in parallel and selected in
    /// listed order.
    pub fn fit_with_progress(
        &self,
        x: &Mat<f64>,
        y: &[u8],
        progress: Option<&ProgressBar>,
    ) -> Result<GridSearchResult> {
        if self.candidates.is_empty() {
            anyhow::bail!(PipelineError::InvalidSplit(
                "grid search needs at least one candidate C".to_string()
            ));
        }

        let folds = KFold::stratified(self.folds);
        let candidates: Vec<CandidateScore> = self
            .candidates
            .par_iter()
            .map(|&c| {
                let estimator = self.estimator.with_c(c);
                let scores =
                    cross_val_score_with_progress(&estimator, x, y, &folds, self.cv_features, progress)?;
                let mean_score = scores.mean();
                Ok(CandidateScore {
                    c,
                    scores,
                    mean_score,
                })
            })
            .collect::<Result<_>>()?;

        let best_index = select_best(&candidates)
            .ok_or_else(|| PipelineError::Fit("no candidate could be scored".to_string()))?;
        let best_c = candidates[best_index].c;
        let best_score = candidates[best_index].mean_score;

        let (best_model, best_scaler) = match (self.refit, self.cv_features) {
            (false, _) => (None, None),
            (true, CvFeatures::Raw) => (Some(self.estimator.with_c(best_c).fit(x, y)?), None),
            (true, CvFeatures::Standardized) => {
                let (scaler, scaled) = StandardScaler::fit_transform(x)?;
                (Some(self.estimator.with_c(best_c).fit(&scaled, y)?), Some(scaler))
            }
        };

        log::info!("grid search selected C={} (mean accuracy {:.4})", best_c, best_score);

        Ok(GridSearchResult {
            candidates,
            best_index,
            best_c,
            best_score,
            best_model,
            best_scaler,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(c: f64, mean_score: f64) -> CandidateScore {
        CandidateScore {
            c,
            scores: CvScores {
                fold_scores: vec![mean_score],
            },
            mean_score,
        }
    }

    #[test]
    fn test_select_best_prefers_highest_mean() {
        let candidates = vec![candidate(0.1, 0.7), candidate(1.0, 0.9), candidate(10.0, 0.8)];
        assert_eq!(select_best(&candidates), Some(1));
    }

    #[test]
    fn test_select_best_breaks_ties_by_order() {
        let candidates = vec![candidate(0.1, 0.6), candidate(1.0, 0.9), candidate(10.0, 0.9)];
        assert_eq!(select_best(&candidates), Some(1));
        assert_eq!(select_best(&[]), None);
    }
}
