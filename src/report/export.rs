//! JSON export of every series a training run produced

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{
    CandidateScore, CleaningReport, CorrelatedPair, CorrelationMatrix, CvScores, Evaluation,
    Exploration, PipelineConfig, PipelineOutcome, Projection, SplitSummary,
};

/// Metadata about the training run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    pub lungrisk_version: String,
    pub input_file: String,
    pub model_file: String,
    pub config: PipelineConfig,
}

/// Grid search results without the refit model
#[derive(Serialize)]
pub struct SearchExport<'a> {
    pub candidates: &'a [CandidateScore],
    pub best_c: f64,
    pub best_cv_accuracy: f64,
}

#[derive(Serialize)]
pub struct CrossValidationExport<'a> {
    pub baseline_c: f64,
    pub baseline: &'a CvScores,
    pub baseline_mean: f64,
    pub baseline_std: f64,
}

/// Complete training report
#[derive(Serialize)]
pub struct TrainingReport<'a> {
    pub metadata: RunMetadata,
    pub cleaning: &'a CleaningReport,
    pub features: &'a [String],
    pub exploration: &'a Exploration,
    pub correlation: &'a CorrelationMatrix,
    pub strongest_pairs: &'a [CorrelatedPair],
    pub split: &'a SplitSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<&'a Projection>,
    pub cross_validation: CrossValidationExport<'a>,
    pub search: SearchExport<'a>,
    pub evaluation: &'a Evaluation,
}

impl<'a> TrainingReport<'a> {
    pub fn new(outcome: &'a PipelineOutcome, input_file: &Path, model_file: &Path) -> Self {
        Self {
            metadata: RunMetadata {
                timestamp: Utc::now().to_rfc3339(),
                lungrisk_version: env!("CARGO_PKG_VERSION").to_string(),
                input_file: input_file.display().to_string(),
                model_file: model_file.display().to_string(),
                config: outcome.config.clone(),
            },
            cleaning: &outcome.cleaning,
            features: &outcome.feature_names,
            exploration: &outcome.exploration,
            correlation: &outcome.correlation,
            strongest_pairs: &outcome.strongest_pairs,
            split: &outcome.split,
            projection: outcome.projection.as_ref(),
            cross_validation: CrossValidationExport {
                baseline_c: outcome.config.default_c,
                baseline: &outcome.baseline,
                baseline_mean: outcome.baseline.mean(),
                baseline_std: outcome.baseline.std(),
            },
            search: SearchExport {
                candidates: &outcome.search.candidates,
                best_c: outcome.search.best_c,
                best_cv_accuracy: outcome.search.best_score,
            },
            evaluation: &outcome.evaluation,
        }
    }
}

/// Write the training report as pretty JSON
pub fn export_training_report(
    outcome: &PipelineOutcome,
    input_file: &Path,
    model_file: &Path,
    output_path: &Path,
) -> Result<()> {
    let report = TrainingReport::new(outcome, input_file, model_file);

    let json = serde_json::to_string_pretty(&report)
        .context("Failed to serialize training report to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write training report to {}", output_path.display()))?;

    Ok(())
}
