//! Model persistence: everything needed to score new records, as JSON

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use faer::Mat;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::dataset::Dataset;
use super::error::PipelineError;
use super::model::FittedModel;
use super::preprocess::CategoryEncoder;
use super::scaler::StandardScaler;
use super::schema::{ColumnKind, ColumnSpec, Schema};

/// Artifact format version, bumped on incompatible layout changes
pub const ARTIFACT_VERSION: u32 = 1;

/// A trained classifier with the preprocessing it was trained behind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub crate_version: String,
    pub created_at: String,
    pub outcome_column: String,
    pub feature_names: Vec<String>,
    pub encoder: CategoryEncoder,
    pub scaler: StandardScaler,
    pub model: FittedModel,
    pub training_rows: usize,
}

/// Scores for a batch of records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predictions {
    pub probabilities: Vec<f64>,
    pub labels: Vec<u8>,
}

impl Predictions {
    /// Labels translated back to the outcome's own values
    pub fn label_names(&self, encoder: &CategoryEncoder) -> Vec<String> {
        let names = encoder.outcome.label_names();
        self.labels
            .iter()
            .map(|&l| names[l as usize].clone())
            .collect()
    }
}

impl ModelArtifact {
    pub fn new(
        feature_names: Vec<String>,
        encoder: CategoryEncoder,
        scaler: StandardScaler,
        model: FittedModel,
        training_rows: usize,
    ) -> Result<Self> {
        if scaler.n_features() != feature_names.len() {
            anyhow::bail!(PipelineError::DimensionMismatch {
                expected: feature_names.len(),
                actual: scaler.n_features(),
            });
        }
        if model.n_features() != feature_names.len() {
            anyhow::bail!(PipelineError::DimensionMismatch {
                expected: feature_names.len(),
                actual: model.n_features(),
            });
        }

        Ok(Self {
            version: ARTIFACT_VERSION,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now().to_rfc3339(),
            outcome_column: encoder.outcome_column.clone(),
            feature_names,
            encoder,
            scaler,
            model,
            training_rows,
        })
    }

    /// Schema of the columns a record must carry to be scored
    pub fn inference_schema(&self) -> Result<Schema> {
        let columns = self
            .feature_names
            .iter()
            .map(|name| {
                let kind = if self.encoder.mapping(name).is_some() {
                    ColumnKind::Categorical
                } else {
                    ColumnKind::Numeric
                };
                ColumnSpec::new(name.clone(), kind)
            })
            .collect();
        Schema::for_inference(columns)
    }

    /// Encode and scale records into the model's input space
    pub fn prepare(&self, dataset: &Dataset) -> Result<Mat<f64>> {
        let x = self.encoder.encode_features(dataset, &self.feature_names)?;
        self.scaler.transform(&x)
    }

    pub fn predict_records(&self, dataset: &Dataset) -> Result<Predictions> {
        let x = self.prepare(dataset)?;
        Ok(Predictions {
            probabilities: self.model.predict_proba(&x)?,
            labels: self.model.predict(&x)?,
        })
    }

    /// Score every row of a frame; extra columns are ignored
    pub fn predict_frame(&self, df: &DataFrame) -> Result<Predictions> {
        let schema = self.inference_schema()?;
        let dataset = Dataset::from_frame(df, &schema)?;
        self.predict_records(&dataset)
    }
}

/// Write the artifact as pretty-printed JSON
pub fn save_model(path: &Path, artifact: &ModelArtifact) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create model file: {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), artifact)
        .with_context(|| format!("Failed to write model file: {}", path.display()))?;
    log::info!("saved model to {}", path.display());
    Ok(())
}

pub fn load_model(path: &Path) -> Result<ModelArtifact> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open model file: {}", path.display()))?;
    let artifact: ModelArtifact = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse model file: {}", path.display()))?;

    if artifact.version != ARTIFACT_VERSION {
        anyhow::bail!(
            "Unsupported model version {} in {} (expected {})",
            artifact.version,
            path.display(),
            ARTIFACT_VERSION
        );
    }
    Ok(artifact)
}
