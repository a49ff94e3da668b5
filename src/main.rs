//! lungrisk: Lung Disease Risk CLI Tool
//!
//! Trains a logistic-regression classifier on the lung disease survey and
//! scores new records with a stored model.

use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use console::style;
use indicatif::ProgressBar;

use lungrisk::cli::{confirm_overwrite, predict::run_predict, Cli, Commands, TrainArgs};
use lungrisk::pipeline::{
    load_dataset, save_model, Dataset, Pipeline, PipelineOutcome, Schema, Stage, StageObserver,
    LUNG_OUTCOME,
};
use lungrisk::report::{export_training_report, TrainingSummary};
use lungrisk::utils::{
    create_fit_progress_bar, create_spinner, finish_with_success, print_banner,
    print_completion, print_config, print_count, print_info, print_step_header, print_step_time,
    print_success, print_warning,
};

/// Prints a styled header per stage and a timing line when it ends
struct ConsoleObserver {
    spinner: Option<ProgressBar>,
}

impl StageObserver for ConsoleObserver {
    fn stage_started(&mut self, stage: Stage) {
        print_step_header(stage.number(), stage.title());
        if stage != Stage::GridSearch {
            self.spinner = Some(create_spinner(&format!("{}...", stage.title())));
        }
    }

    fn stage_finished(&mut self, stage: Stage, elapsed: Duration) {
        if let Some(spinner) = self.spinner.take() {
            finish_with_success(&spinner, &format!("{} complete", stage.title()));
        }
        print_step_time(elapsed);
    }

    fn search_progress(&mut self, total_fits: usize) -> Option<ProgressBar> {
        Some(create_fit_progress_bar(total_fits, "Cross-validating"))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Predict(args) => run_predict(args),
    }
}

fn build_schema(args: &TrainArgs, df: &polars::prelude::DataFrame) -> Result<Schema> {
    if args.infer_schema {
        return Schema::infer(df, &args.target, &args.id_columns);
    }
    if args.target != LUNG_OUTCOME {
        anyhow::bail!(
            "The built-in lung schema uses '{}' as the outcome. Use --infer-schema to train on '{}'.",
            LUNG_OUTCOME,
            args.target
        );
    }
    Ok(Schema::lung())
}

fn run_train(args: &TrainArgs) -> Result<()> {
    let config = args.pipeline_config();
    let model_path = args.model_path();
    let report_path = args.report_path();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&args.input, &model_path, &report_path, &config);

    if !confirm_overwrite(&model_path, args.no_confirm)? {
        println!("Cancelled by user.");
        return Ok(());
    }

    // Load dataset
    let step_start = Instant::now();
    let spinner = create_spinner("Loading dataset...");
    let df = load_dataset(&args.input, args.infer_schema_length)?;
    let schema = build_schema(args, &df)?;
    let dataset = Dataset::from_frame(&df, &schema)?;
    finish_with_success(&spinner, "Dataset loaded");

    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", df.height());
    println!("      Columns: {}", df.width());
    println!(
        "      Estimated memory: {:.2} MB",
        df.estimated_size() as f64 / (1024.0 * 1024.0)
    );
    print_step_time(step_start.elapsed());

    let mut observer = ConsoleObserver { spinner: None };
    let outcome = Pipeline::new(config).run(&dataset, &mut observer)?;

    report_run(&outcome);

    // Save artifacts
    let step_start = Instant::now();
    save_model(&model_path, &outcome.artifact)?;
    print_success(&format!("Model saved to {}", model_path.display()));
    export_training_report(&outcome, &args.input, &model_path, &report_path)?;
    print_success(&format!("Report saved to {}", report_path.display()));
    print_step_time(step_start.elapsed());

    TrainingSummary::new(&outcome).display();
    print_completion();

    Ok(())
}

/// Short per-stage findings printed after the run
fn report_run(outcome: &PipelineOutcome) {
    println!();
    let cleaning = &outcome.cleaning;
    print_count(
        "row(s) dropped for missing values",
        cleaning.dropped_missing,
        None,
    );
    print_count("duplicate row(s) dropped", cleaning.dropped_duplicates, None);
    if !cleaning.dropped_columns.is_empty() {
        print_info(&format!("Dropped columns: {}", cleaning.dropped_columns.join(", ")));
    }

    if let Some(projection) = &outcome.projection {
        print_info(&format!(
            "First {} principal components explain {:.1}% of variance",
            projection.pca.n_components,
            projection.pca.total_explained() * 100.0
        ));
    }

    if !outcome.artifact.model.converged() {
        print_warning("Final model hit the iteration limit before converging");
    }
}
