//! Score new records with a stored model

use anyhow::{Context, Result};
use console::style;
use polars::prelude::*;

use super::args::PredictArgs;
use super::prompts::confirm_overwrite;
use crate::pipeline::{load_dataset, load_model, write_dataset};
use crate::utils::create_spinner;

/// Load the model and records, append `probability` and `prediction`
/// columns and write the result.
pub fn run_predict(args: &PredictArgs) -> Result<()> {
    let output_path = args.output_path();

    println!("\n {} Scoring records", style("◆").cyan().bold());
    println!("   Model:  {}", style(args.model.display()).dim());
    println!("   Input:  {}", style(args.input.display()).dim());
    println!("   Output: {}", style(output_path.display()).dim());
    println!();

    let spinner = create_spinner("Loading model...");
    let artifact = load_model(&args.model)?;
    spinner.finish_with_message(format!(
        "{} Model loaded ({} features, C={})",
        style("✓").green(),
        artifact.feature_names.len(),
        artifact.model.c()
    ));

    let spinner = create_spinner("Reading records...");
    let mut df = load_dataset(&args.input, args.infer_schema_length)?;
    spinner.finish_with_message(format!("{} {} records read", style("✓").green(), df.height()));

    let spinner = create_spinner("Scoring...");
    let predictions = artifact
        .predict_frame(&df)
        .with_context(|| format!("Failed to score records from {}", args.input.display()))?;
    let labels: Vec<i32> = predictions.labels.iter().map(|&l| i32::from(l)).collect();
    df.with_column(Series::new("probability".into(), predictions.probabilities.clone()))?;
    df.with_column(Series::new("prediction".into(), labels))?;
    spinner.finish_with_message(format!("{} Records scored", style("✓").green()));

    if !confirm_overwrite(&output_path, args.no_confirm)? {
        println!("Cancelled by user.");
        return Ok(());
    }
    write_dataset(&mut df, &output_path)?;

    let positives = predictions.labels.iter().filter(|&&l| l == 1).count();
    let names = artifact.encoder.outcome.label_names();
    println!();
    println!(
        "   {} predicted {}, {} predicted {}",
        style(positives).yellow(),
        names[1],
        style(predictions.labels.len() - positives).yellow(),
        names[0]
    );
    println!();
    println!(" {} Predictions written!", style("✓").green().bold());

    Ok(())
}
