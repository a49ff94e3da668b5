//! Tests for model persistence and scoring new records

use lungrisk::pipeline::*;
use polars::prelude::*;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn trained_artifact() -> ModelArtifact {
    let config = PreprocessConfig {
        target_mapping: Some(TargetMapping::new("Ya", "Tidak")),
        ..PreprocessConfig::default()
    };
    let prepared = preprocess(&lung_dataset(48), &config).unwrap();
    let features = prepared.features;
    let (scaler, scaled) = StandardScaler::fit_transform(&features.x).unwrap();
    let model = LogisticRegression::new(1.0).fit(&scaled, &features.y).unwrap();

    ModelArtifact::new(
        features.names.clone(),
        prepared.encoder,
        scaler,
        model,
        features.y.len(),
    )
    .unwrap()
}

#[test]
fn test_save_and_load_roundtrip() {
    let artifact = trained_artifact();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("model.json");

    save_model(&path, &artifact).unwrap();
    let loaded = load_model(&path).unwrap();

    assert_eq!(loaded, artifact);
    assert_eq!(loaded.version, ARTIFACT_VERSION);
}

#[test]
fn test_loaded_model_predicts_identically() {
    let artifact = trained_artifact();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("model.json");
    save_model(&path, &artifact).unwrap();
    let loaded = load_model(&path).unwrap();

    let df = create_lung_dataframe(48);
    let before = artifact.predict_frame(&df).unwrap();
    let after = loaded.predict_frame(&df).unwrap();

    assert_eq!(before, after);
    assert_eq!(before.labels.len(), 48);
}

#[test]
fn test_predictions_translate_back_to_outcome_values() {
    let artifact = trained_artifact();
    let predictions = artifact.predict_frame(&create_lung_dataframe(16)).unwrap();
    let names = predictions.label_names(&artifact.encoder);

    for (label, name) in predictions.labels.iter().zip(&names) {
        let expected = if *label == 1 { "Ya" } else { "Tidak" };
        assert_eq!(name, expected);
    }
}

#[test]
fn test_inference_schema_lists_model_features() {
    let artifact = trained_artifact();
    let schema = artifact.inference_schema().unwrap();

    let names: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, artifact.feature_names.iter().map(|s| s.as_str()).collect::<Vec<_>>());
    assert!(schema
        .columns()
        .iter()
        .all(|c| c.kind == ColumnKind::Categorical));
}

#[test]
fn test_scoring_needs_no_outcome_column() {
    let artifact = trained_artifact();
    let df = create_lung_dataframe(10).drop("Hasil").unwrap();
    let predictions = artifact.predict_frame(&df).unwrap();
    assert_eq!(predictions.probabilities.len(), 10);
}

#[test]
fn test_unseen_category_is_rejected() {
    let artifact = trained_artifact();
    let mut df = create_lung_dataframe(3);
    df.with_column(Series::new("Usia".into(), ["Tua", "Anak", "Muda"]))
        .unwrap();

    let err = artifact.predict_frame(&df).unwrap_err();
    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::UnknownCategory { column, value }) => {
            assert_eq!(column, "Usia");
            assert_eq!(value, "Anak");
        }
        other => panic!("expected UnknownCategory, got {:?}", other),
    }
}

#[test]
fn test_missing_feature_column_is_rejected() {
    let artifact = trained_artifact();
    let df = create_lung_dataframe(5).drop("Merokok").unwrap();
    assert!(artifact.predict_frame(&df).is_err());
}

#[test]
fn test_unknown_artifact_version_is_rejected() {
    let mut artifact = trained_artifact();
    artifact.version = ARTIFACT_VERSION + 1;
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("model.json");
    save_model(&path, &artifact).unwrap();

    let err = load_model(&path).unwrap_err();
    assert!(err.to_string().contains("Unsupported model version"));
}

#[test]
fn test_corrupt_model_file_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("model.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(load_model(&path).is_err());
}
