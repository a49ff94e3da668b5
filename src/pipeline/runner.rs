//! End-to-end training run: preprocess, explore, split, scale, project,
//! search, fit, evaluate and package.

use std::fmt;
use std::time::{Duration, Instant};

use anyhow::Result;
use faer::Mat;
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};

use super::correlation::{correlation_matrix, CorrelatedPair, CorrelationMatrix};
use super::dataset::Dataset;
use super::eda::{explore, Exploration};
use super::metrics::{evaluate, Evaluation};
use super::model::{LogisticRegression, DEFAULT_C};
use super::pca::{Pca, ProjectedPoint};
use super::preprocess::{preprocess, CleaningReport, PreprocessConfig};
use super::scaler::StandardScaler;
use super::schema::{DEFAULT_DROP_COLUMNS, LIFESTYLE_FEATURES, LUNG_OUTCOME};
use super::search::{cross_val_score, CvFeatures, CvScores, GridSearch, GridSearchResult, DEFAULT_C_GRID, DEFAULT_FOLDS};
use super::split::{train_test_split, KFold, DEFAULT_SEED, DEFAULT_TEST_RATIO};
use super::store::ModelArtifact;
use super::target::TargetMapping;

/// Settings for a full training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub target: String,
    pub drop_columns: Vec<String>,
    pub target_mapping: Option<TargetMapping>,
    pub test_ratio: f64,
    pub seed: u64,
    pub folds: usize,
    pub c_grid: Vec<f64>,
    pub cv_features: CvFeatures,
    /// C of the baseline model cross-validated before the search
    pub default_c: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub pca_components: usize,
    pub correlation_threshold: f64,
    /// Columns counted against the outcome during exploration
    pub breakdown_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target: LUNG_OUTCOME.to_string(),
            drop_columns: DEFAULT_DROP_COLUMNS.iter().map(|s| s.to_string()).collect(),
            target_mapping: None,
            test_ratio: DEFAULT_TEST_RATIO,
            seed: DEFAULT_SEED,
            folds: DEFAULT_FOLDS,
            c_grid: DEFAULT_C_GRID.to_vec(),
            cv_features: CvFeatures::default(),
            default_c: DEFAULT_C,
            max_iter: 100,
            tol: 1e-8,
            pca_components: 2,
            correlation_threshold: 0.5,
            breakdown_columns: LIFESTYLE_FEATURES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PipelineConfig {
    fn estimator(&self) -> LogisticRegression {
        LogisticRegression::new(self.default_c)
            .with_max_iter(self.max_iter)
            .with_tol(self.tol)
    }
}

/// Stages of a training run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Preprocess,
    Explore,
    Split,
    Scale,
    Project,
    BaselineCv,
    GridSearch,
    Train,
    Evaluate,
    Package,
}

impl Stage {
    pub const ALL: [Stage; 10] = [
        Stage::Preprocess,
        Stage::Explore,
        Stage::Split,
        Stage::Scale,
        Stage::Project,
        Stage::BaselineCv,
        Stage::GridSearch,
        Stage::Train,
        Stage::Evaluate,
        Stage::Package,
    ];

    /// 1-based position, used for step headers
    pub fn number(self) -> u8 {
        Stage::ALL.iter().position(|s| *s == self).unwrap_or(0) as u8 + 1
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::Preprocess => "Cleaning & Encoding",
            Stage::Explore => "Exploration & Correlation",
            Stage::Split => "Train/Test Split",
            Stage::Scale => "Feature Scaling",
            Stage::Project => "Principal Components",
            Stage::BaselineCv => "Baseline Cross-Validation",
            Stage::GridSearch => "Hyperparameter Search",
            Stage::Train => "Final Model Fit",
            Stage::Evaluate => "Holdout Evaluation",
            Stage::Package => "Model Packaging",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Receives stage boundaries while a pipeline runs
pub trait StageObserver {
    fn stage_started(&mut self, stage: Stage);

    fn stage_finished(&mut self, stage: Stage, elapsed: Duration);

    /// Progress bar ticked once per cross-validation fit of the grid search
    fn search_progress(&mut self, _total_fits: usize) -> Option<ProgressBar> {
        None
    }
}

/// Observer that ignores every event
#[derive(Debug, Default)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {
    fn stage_started(&mut self, _stage: Stage) {}

    fn stage_finished(&mut self, _stage: Stage, _elapsed: Duration) {}
}

/// Sizes of the two partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitSummary {
    pub train_rows: usize,
    pub test_rows: usize,
    pub train_positives: usize,
    pub test_positives: usize,
}

/// PCA series for the scree and scatter plots
#[derive(Debug, Clone, Serialize)]
pub struct Projection {
    pub pca: Pca,
    pub points: Vec<ProjectedPoint>,
}

/// Everything a training run produced
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub config: PipelineConfig,
    pub cleaning: CleaningReport,
    pub feature_names: Vec<String>,
    pub exploration: Exploration,
    pub correlation: CorrelationMatrix,
    pub strongest_pairs: Vec<CorrelatedPair>,
    pub split: SplitSummary,
    pub projection: Option<Projection>,
    pub baseline: CvScores,
    pub search: GridSearchResult,
    pub evaluation: Evaluation,
    pub artifact: ModelArtifact,
}

/// Chains the pipeline stages over one dataset
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

fn timed<T>(
    observer: &mut dyn StageObserver,
    stage: Stage,
    f: impl FnOnce(&mut dyn StageObserver) -> Result<T>,
) -> Result<T> {
    observer.stage_started(stage);
    let start = Instant::now();
    let value = f(&mut *observer)?;
    let elapsed = start.elapsed();
    log::debug!("stage '{}' finished in {:.2?}", stage, elapsed);
    observer.stage_finished(stage, elapsed);
    Ok(value)
}

/// X with the labels appended as a last column
fn with_outcome_column(x: &Mat<f64>, y: &[u8]) -> Mat<f64> {
    let p = x.ncols();
    Mat::from_fn(x.nrows(), p + 1, |i, j| {
        if j < p {
            x[(i, j)]
        } else {
            f64::from(y[i])
        }
    })
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, dataset: &Dataset, observer: &mut dyn StageObserver) -> Result<PipelineOutcome> {
        let config = &self.config;

        let prepared = timed(observer, Stage::Preprocess, |_| {
            preprocess(
                dataset,
                &PreprocessConfig {
                    drop_columns: config.drop_columns.clone(),
                    target_mapping: config.target_mapping.clone(),
                },
            )
        })?;
        let features = &prepared.features;
        log::info!(
            "{} rows kept of {} ({} with missing values, {} duplicates)",
            prepared.report.output_rows,
            prepared.report.input_rows,
            prepared.report.dropped_missing,
            prepared.report.dropped_duplicates
        );

        let (exploration, correlation) = timed(observer, Stage::Explore, |_| {
            let columns: Vec<&str> = config.breakdown_columns.iter().map(|s| s.as_str()).collect();
            let exploration = explore(dataset, &prepared.dataset, features, &prepared.encoder, &columns)?;

            let mut names = features.names.clone();
            names.push(prepared.encoder.outcome_column.clone());
            let correlation = correlation_matrix(&names, &with_outcome_column(&features.x, &features.y))?;
            Ok((exploration, correlation))
        })?;
        let strongest_pairs = correlation.strongest_pairs(config.correlation_threshold);

        let split = timed(observer, Stage::Split, |_| {
            train_test_split(&features.x, &features.y, config.test_ratio, config.seed)
        })?;
        let split_summary = SplitSummary {
            train_rows: split.y_train.len(),
            test_rows: split.y_test.len(),
            train_positives: split.y_train.iter().filter(|&&l| l == 1).count(),
            test_positives: split.y_test.iter().filter(|&&l| l == 1).count(),
        };

        let (scaler, x_train_scaled, x_test_scaled) = timed(observer, Stage::Scale, |_| {
            let (scaler, x_train_scaled) = StandardScaler::fit_transform(&split.x_train)?;
            let x_test_scaled = scaler.transform(&split.x_test)?;
            Ok((scaler, x_train_scaled, x_test_scaled))
        })?;

        let projection = timed(observer, Stage::Project, |_| {
            let components = config.pca_components.min(x_train_scaled.ncols());
            if components == 0 || x_train_scaled.nrows() < 2 {
                log::warn!("skipping PCA: not enough rows or features");
                return Ok(None);
            }
            let pca = Pca::fit(&x_train_scaled, components)?;
            let points = pca.project_labeled(&x_train_scaled, &split.y_train)?;
            Ok(Some(Projection { pca, points }))
        })?;

        let estimator = config.estimator();

        let baseline = timed(observer, Stage::BaselineCv, |_| {
            cross_val_score(
                &estimator,
                &features.x,
                &features.y,
                &KFold::stratified(config.folds),
                config.cv_features,
            )
        })?;
        log::info!(
            "baseline C={} cross-validation accuracy {:.4} (+/- {:.4})",
            config.default_c,
            baseline.mean(),
            baseline.std()
        );

        let search = timed(observer, Stage::GridSearch, |obs| {
            let grid = GridSearch::new(config.c_grid.clone())
                .with_folds(config.folds)
                .with_cv_features(config.cv_features)
                .with_estimator(estimator)
                .with_refit(false);
            let progress = obs.search_progress(grid.total_fits());
            // Standardized search scales inside each fold, so it also starts from raw rows.
            // The shipped model is trained on the scaled rows below.
            let result = grid.fit_with_progress(&split.x_train, &split.y_train, progress.as_ref());
            if let Some(pb) = progress {
                pb.finish_and_clear();
            }
            result
        })?;

        let model = timed(observer, Stage::Train, |_| {
            estimator
                .with_c(search.best_c)
                .fit(&x_train_scaled, &split.y_train)
        })?;
        if !model.converged() {
            log::warn!(
                "final model did not converge in {} iterations",
                model.n_iter()
            );
        }

        let evaluation = timed(observer, Stage::Evaluate, |_| {
            evaluate(&model, &x_test_scaled, &split.y_test, &features.names)
        })?;

        let artifact = timed(observer, Stage::Package, |_| {
            ModelArtifact::new(
                features.names.clone(),
                prepared.encoder.clone(),
                scaler,
                model,
                split.y_train.len(),
            )
        })?;

        Ok(PipelineOutcome {
            config: config.clone(),
            cleaning: prepared.report.clone(),
            feature_names: features.names.clone(),
            exploration,
            correlation,
            strongest_pairs,
            split: split_summary,
            projection,
            baseline,
            search,
            evaluation,
            artifact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_numbers_follow_order() {
        assert_eq!(Stage::Preprocess.number(), 1);
        assert_eq!(Stage::Package.number(), 10);
    }

    #[test]
    fn test_default_config_matches_lung_setup() {
        let config = PipelineConfig::default();
        assert_eq!(config.target, "Hasil");
        assert_eq!(config.c_grid.len(), 6);
        assert_eq!(config.cv_features, CvFeatures::Raw);
        assert!(config.drop_columns.contains(&"No".to_string()));
    }
}
