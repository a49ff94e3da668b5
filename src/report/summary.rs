//! Training summary tables

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::PipelineOutcome;

fn section_title(icon: &str, title: &str) {
    println!();
    println!(
        "    {} {}",
        style(icon).cyan(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        header
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn score_color(score: f64) -> Color {
    if score >= 0.8 {
        Color::Green
    } else if score >= 0.6 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Terminal view of a finished training run
pub struct TrainingSummary<'a> {
    outcome: &'a PipelineOutcome,
    label_names: [String; 2],
}

impl<'a> TrainingSummary<'a> {
    pub fn new(outcome: &'a PipelineOutcome) -> Self {
        Self {
            outcome,
            label_names: outcome.artifact.encoder.outcome.label_names(),
        }
    }

    /// Headline numbers of the run
    pub fn overview_table(&self) -> Table {
        let o = self.outcome;
        let mut table = new_table(vec!["Metric", "Value"]);

        table.add_row(vec![
            Cell::new("📁 Rows (raw → clean)"),
            Cell::new(format!("{} → {}", o.cleaning.input_rows, o.cleaning.output_rows)),
        ]);
        table.add_row(vec![
            Cell::new("🗑️  Dropped (missing / duplicate)"),
            Cell::new(format!(
                "{} / {}",
                o.cleaning.dropped_missing, o.cleaning.dropped_duplicates
            )),
        ]);
        table.add_row(vec![
            Cell::new("🧮 Features"),
            Cell::new(o.feature_names.len()),
        ]);
        table.add_row(vec![
            Cell::new("✂️  Train / Test"),
            Cell::new(format!("{} / {}", o.split.train_rows, o.split.test_rows)),
        ]);
        table.add_row(vec![
            Cell::new(format!("🔁 Baseline CV (C={})", o.config.default_c)),
            Cell::new(format!("{:.4} ± {:.4}", o.baseline.mean(), o.baseline.std())),
        ]);
        table.add_row(vec![
            Cell::new("🎯 Best C"),
            Cell::new(o.search.best_c)
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("✅ Test accuracy"),
            Cell::new(format!("{:.4}", o.evaluation.accuracy))
                .fg(score_color(o.evaluation.accuracy))
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("📈 ROC-AUC"),
            Cell::new(format!("{:.4}", o.evaluation.roc_auc))
                .fg(score_color(o.evaluation.roc_auc))
                .add_attribute(Attribute::Bold),
        ]);
        let cm = &o.evaluation.confusion;
        table.add_row(vec![
            Cell::new("⚠️  False positives / negatives"),
            Cell::new(format!("{} / {}", cm.false_positives(), cm.false_negatives())),
        ]);

        table
    }

    /// Mean accuracy per candidate, best row highlighted
    pub fn search_table(&self) -> Table {
        let search = &self.outcome.search;
        let mut table = new_table(vec!["C", "Mean CV accuracy", "Std"]);

        for (i, candidate) in search.candidates.iter().enumerate() {
            let best = i == search.best_index;
            let mut c_cell = Cell::new(candidate.c);
            let mut score_cell = Cell::new(format!("{:.4}", candidate.mean_score))
                .set_alignment(CellAlignment::Right);
            if best {
                c_cell = c_cell.fg(Color::Green).add_attribute(Attribute::Bold);
                score_cell = score_cell.fg(Color::Green).add_attribute(Attribute::Bold);
            }
            table.add_row(vec![
                c_cell,
                score_cell,
                Cell::new(format!("{:.4}", candidate.scores.std())).set_alignment(CellAlignment::Right),
            ]);
        }

        table
    }

    /// Rows are actual classes, columns predicted classes
    pub fn confusion_table(&self) -> Table {
        let cm = &self.outcome.evaluation.confusion;
        let [neg, pos] = &self.label_names;
        let mut table = new_table(vec![
            "Actual \\ Predicted",
            &format!("0 ({})", neg),
            &format!("1 ({})", pos),
        ]);

        for (actual, name) in self.label_names.iter().enumerate() {
            table.add_row(vec![
                Cell::new(format!("{} ({})", actual, name)).add_attribute(Attribute::Bold),
                Cell::new(cm.counts[actual][0]).set_alignment(CellAlignment::Right),
                Cell::new(cm.counts[actual][1]).set_alignment(CellAlignment::Right),
            ]);
        }

        table
    }

    pub fn classification_table(&self) -> Table {
        let report = &self.outcome.evaluation.report;
        let mut table = new_table(vec!["Class", "Precision", "Recall", "F1", "Support"]);

        for class in &report.classes {
            table.add_row(vec![
                Cell::new(format!(
                    "{} ({})",
                    class.label, self.label_names[class.label as usize]
                )),
                Cell::new(format!("{:.2}", class.precision)),
                Cell::new(format!("{:.2}", class.recall)),
                Cell::new(format!("{:.2}", class.f1)),
                Cell::new(class.support),
            ]);
        }
        for (name, avg) in [
            ("macro avg", &report.macro_avg),
            ("weighted avg", &report.weighted_avg),
        ] {
            table.add_row(vec![
                Cell::new(name).add_attribute(Attribute::Italic),
                Cell::new(format!("{:.2}", avg.precision)),
                Cell::new(format!("{:.2}", avg.recall)),
                Cell::new(format!("{:.2}", avg.f1)),
                Cell::new(avg.support),
            ]);
        }

        table
    }

    /// Model weights, largest first
    pub fn importance_table(&self) -> Table {
        let mut table = new_table(vec!["Feature", "Weight"]);
        for importance in &self.outcome.evaluation.importances {
            let color = if importance.weight >= 0.0 {
                Color::Red
            } else {
                Color::Blue
            };
            table.add_row(vec![
                Cell::new(&importance.feature),
                Cell::new(format!("{:+.4}", importance.weight))
                    .fg(color)
                    .set_alignment(CellAlignment::Right),
            ]);
        }
        table
    }

    pub fn display(&self) {
        section_title("📋", "TRAINING SUMMARY");
        print_indented(&self.overview_table());

        section_title("🔍", "HYPERPARAMETER SEARCH");
        print_indented(&self.search_table());

        section_title("🧩", "CONFUSION MATRIX");
        print_indented(&self.confusion_table());

        section_title("📝", "CLASSIFICATION REPORT");
        print_indented(&self.classification_table());

        section_title("⚖️ ", "FEATURE WEIGHTS");
        print_indented(&self.importance_table());

        if !self.outcome.strongest_pairs.is_empty() {
            section_title("🔗", "STRONGEST CORRELATIONS");
            for pair in &self.outcome.strongest_pairs {
                println!(
                    "      {} {} ↔ {}  {}",
                    style("•").dim(),
                    pair.feature1,
                    pair.feature2,
                    style(format!("{:+.3}", pair.correlation)).yellow()
                );
            }
        }
    }
}
