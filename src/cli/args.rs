//! Command-line argument definitions using clap

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::pipeline::{
    CvFeatures, PipelineConfig, TargetMapping, DEFAULT_C_GRID, DEFAULT_DROP_COLUMNS,
    LUNG_OUTCOME,
};

/// lungrisk - Train and apply a lung disease risk classifier
#[derive(Parser, Debug)]
#[command(name = "lungrisk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clean the data, search C by cross-validation, fit and evaluate a model
    Train(TrainArgs),

    /// Score new records with a stored model
    Predict(PredictArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct TrainArgs {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Outcome column name
    #[arg(short, long, default_value = LUNG_OUTCOME)]
    pub target: String,

    /// Share of rows held out for evaluation, between 0 and 1
    #[arg(long, default_value = "0.2", value_parser = validate_test_ratio)]
    pub test_ratio: f64,

    /// Seed for the train/test shuffle
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Number of cross-validation folds
    #[arg(long, default_value = "5", value_parser = validate_folds)]
    pub folds: usize,

    /// Candidate inverse regularization strengths (comma-separated)
    #[arg(long, value_delimiter = ',', value_parser = validate_c)]
    pub c_grid: Vec<f64>,

    /// Feature space used inside cross-validation: "raw" (unscaled) or "standardized"
    #[arg(long, default_value = "raw")]
    pub cv_features: CvFeatures,

    /// Columns to drop before modeling (comma-separated).
    /// Defaults to No,Asuransi,Rumah_Tangga,Bekerja.
    #[arg(long, value_delimiter = ',')]
    pub drop_columns: Vec<String>,

    /// Infer the schema from column types instead of using the lung survey schema
    #[arg(long, default_value = "false")]
    pub infer_schema: bool,

    /// Identifier columns excluded from features when inferring the schema (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "No")]
    pub id_columns: Vec<String>,

    /// Value in target column that represents EVENT (maps to 1).
    /// Required with --non-event-value; otherwise values are coded in first-seen order.
    #[arg(long, requires = "non_event_value")]
    pub event_value: Option<String>,

    /// Value in target column that represents NON-EVENT (maps to 0).
    #[arg(long, requires = "event_value")]
    pub non_event_value: Option<String>,

    /// Maximum solver iterations per fit
    #[arg(long, default_value = "100")]
    pub max_iter: usize,

    /// Model output path. Defaults to '<input>_model.json' next to the input.
    #[arg(long)]
    pub model_output: Option<PathBuf>,

    /// Report output path. Defaults to '<input>_report.json' next to the input.
    #[arg(long)]
    pub report_output: Option<PathBuf>,

    /// Skip interactive confirmation prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PredictArgs {
    /// Stored model (JSON written by 'train')
    #[arg(short, long)]
    pub model: PathBuf,

    /// Records to score (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file path (CSV or Parquet, determined by extension).
    /// Defaults to '<input>_predictions.csv' next to the input.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip interactive confirmation prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,

    /// Number of rows to use for schema inference (CSV only)
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

/// `<dir>/<stem><suffix>` next to `input`
pub fn derived_path(input: &Path, suffix: &str) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    parent.join(format!("{}{}", stem, suffix))
}

impl TrainArgs {
    pub fn model_path(&self) -> PathBuf {
        self.model_output
            .clone()
            .unwrap_or_else(|| derived_path(&self.input, "_model.json"))
    }

    pub fn report_path(&self) -> PathBuf {
        self.report_output
            .clone()
            .unwrap_or_else(|| derived_path(&self.input, "_report.json"))
    }

    /// Explicit outcome mapping, when both values were given
    pub fn target_mapping(&self) -> Option<TargetMapping> {
        match (&self.event_value, &self.non_event_value) {
            (Some(event), Some(non_event)) => Some(TargetMapping::new(event, non_event)),
            _ => None,
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            target: self.target.clone(),
            drop_columns: if self.drop_columns.is_empty() {
                DEFAULT_DROP_COLUMNS.iter().map(|s| s.to_string()).collect()
            } else {
                self.drop_columns.clone()
            },
            target_mapping: self.target_mapping(),
            test_ratio: self.test_ratio,
            seed: self.seed,
            folds: self.folds,
            c_grid: if self.c_grid.is_empty() {
                DEFAULT_C_GRID.to_vec()
            } else {
                self.c_grid.clone()
            },
            cv_features: self.cv_features,
            max_iter: self.max_iter,
            ..PipelineConfig::default()
        }
    }
}

impl PredictArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| derived_path(&self.input, "_predictions.csv"))
    }
}

/// Validator for the holdout ratio
fn validate_test_ratio(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "test_ratio must be between 0.0 and 1.0 (exclusive), got {}",
            value
        ))
    }
}

/// Validator for candidate C values
fn validate_c(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(format!("C must be a positive number, got {}", value))
    }
}

fn validate_folds(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid fold count", s))?;

    if value >= 2 {
        Ok(value)
    } else {
        Err(format!("folds must be at least 2, got {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validators() {
        assert!(validate_test_ratio("0.2").is_ok());
        assert!(validate_test_ratio("1.0").is_err());
        assert!(validate_test_ratio("abc").is_err());
        assert!(validate_c("0.001").is_ok());
        assert!(validate_c("0").is_err());
        assert!(validate_c("-1").is_err());
        assert!(validate_folds("1").is_err());
    }

    #[test]
    fn test_derived_paths() {
        let cli = Cli::parse_from(["lungrisk", "train", "-i", "/data/paru.csv"]);
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.model_path(), PathBuf::from("/data/paru_model.json"));
        assert_eq!(args.report_path(), PathBuf::from("/data/paru_report.json"));
        assert_eq!(args.pipeline_config(), PipelineConfig::default());
    }

    #[test]
    fn test_mapping_requires_both_values() {
        let result = Cli::try_parse_from(["lungrisk", "train", "-i", "a.csv", "--event-value", "Ya"]);
        assert!(result.is_err());

        let cli = Cli::parse_from([
            "lungrisk", "train", "-i", "a.csv", "--event-value", "Ya", "--non-event-value", "Tidak",
        ]);
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.target_mapping(), Some(TargetMapping::new("Ya", "Tidak")));
    }
}
