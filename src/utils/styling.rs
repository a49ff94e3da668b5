//! Terminal styling utilities for the training and scoring output

use std::path::Path;
use std::time::Duration;

use console::{style, Emoji};

use crate::pipeline::PipelineConfig;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");

const CARD_WIDTH: usize = 56;

/// Print the application banner
pub fn print_banner(version: &str) {
    let banner = r#"
    ██╗     ██╗   ██╗███╗   ██╗ ██████╗ ██████╗ ██╗███████╗██╗  ██╗
    ██║     ██║   ██║████╗  ██║██╔════╝ ██╔══██╗██║██╔════╝██║ ██╔╝
    ██║     ██║   ██║██╔██╗ ██║██║  ███╗██████╔╝██║███████╗█████╔╝
    ██║     ██║   ██║██║╚██╗██║██║   ██║██╔══██╗██║╚════██║██╔═██╗
    ███████╗╚██████╔╝██║ ╚████║╚██████╔╝██║  ██║██║███████║██║  ██╗
    ╚══════╝ ╚═════╝ ╚═╝  ╚═══╝ ╚═════╝ ╚═╝  ╚═╝╚═╝╚══════╝╚═╝  ╚═╝
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {}",
        style("Lung disease risk from lifestyle and medical history").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

fn card_row(label: &str, value: impl std::fmt::Display) {
    let text = format!("{} {}", label, value);
    let pad = (CARD_WIDTH - 4).saturating_sub(console::measure_text_width(&text));
    println!("    │  {}{}│", text, " ".repeat(pad));
}

/// Print configuration card
pub fn print_config(input: &Path, model_output: &Path, report_output: &Path, config: &PipelineConfig) {
    let line = "─".repeat(CARD_WIDTH - 2);

    println!("    ┌{}┐", line);
    card_row(&style("⚙️  Configuration").cyan().bold().to_string(), "");
    println!("    ├{}┤", line);
    card_row(&format!("{}Input: ", FOLDER), truncate_path(input, 38));
    card_row(&format!("{}Target:", TARGET), truncate_string(&config.target, 38));
    card_row(&format!("{}Model: ", SAVE), truncate_path(model_output, 38));
    card_row(&format!("{}Report:", SAVE), truncate_path(report_output, 38));
    println!("    ├{}┤", line);
    card_row(
        &format!("{}Test ratio:", CHART),
        style(format!("{:.2} (seed {})", config.test_ratio, config.seed)).yellow(),
    );
    card_row(
        &format!("{}CV folds:  ", CHART),
        style(format!("{} ({} features)", config.folds, config.cv_features)).yellow(),
    );
    let grid: Vec<String> = config.c_grid.iter().map(|c| c.to_string()).collect();
    card_row(
        &format!("{}C grid:    ", CHART),
        style(truncate_string(&grid.join(", "), 30)).yellow(),
    );
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

pub fn print_warning(message: &str) {
    println!("    {} {}", WARN, style(message).yellow());
}

/// Print how long a step took
pub fn print_step_time(elapsed: Duration) {
    println!(
        "      {}",
        style(format!("⏱  {:.2?}", elapsed)).dim()
    );
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("lungrisk training complete!").green().bold()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    if let Some(info) = detail {
        println!(
            "      {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!("      {} {}", style(count).yellow().bold(), description);
    }
}

// Helper functions

fn truncate_path(path: &Path, max_len: usize) -> String {
    let path_str = path.display().to_string();
    truncate_string(&path_str, max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_tail() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("/very/long/path/data.csv", 12), ".../data.csv");
    }
}
