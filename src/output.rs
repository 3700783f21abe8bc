//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored messages,
//! per-file outcome lines, progress tracking and summary tables.

use crate::category::Configuration;
use crate::file_organizer::{MoveAction, Outcome, Summary};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use sortdir::output::OutputFormatter;
    /// OutputFormatter::success("Directory organized!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for `total` actions.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Formats a single action relative to the organized directory.
    ///
    /// Planned moves read "would move", executed ones "moved".
    pub fn format_action(base: &Path, action: &MoveAction) -> String {
        let name = action.file_name();
        let target = action
            .destination
            .strip_prefix(base)
            .unwrap_or(&action.destination)
            .display()
            .to_string();

        match &action.outcome {
            Outcome::Planned => format!(
                "{} {} {}",
                "→".cyan(),
                name,
                format!("would move to {}", target).dimmed()
            ),
            Outcome::Moved => format!("{} {} → {}", "✓".green(), name, target),
            Outcome::Error(reason) => format!("{} {}: {}", "✗".red(), name, reason.red()),
            skipped => format!("{} {} {}", "-".dimmed(), name, skipped.to_string().dimmed()),
        }
    }

    /// Prints every action, one per line.
    pub fn print_actions(base: &Path, actions: &[MoveAction]) {
        for action in actions {
            println!("  {}", Self::format_action(base, action));
        }
    }

    /// Prints a summary table with file counts by category and outcome.
    pub fn summary_table(summary: &Summary) {
        Self::header("SUMMARY");

        let max_category_len = summary
            .by_category
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in &summary.by_category {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count),
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        let total = summary.planned + summary.moved;
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            plural(total),
            width = max_category_len
        );

        if summary.skipped > 0 {
            println!("Skipped: {}", summary.skipped);
        }
        if summary.errors > 0 {
            println!("Errors: {}", summary.errors.to_string().red());
        }
    }

    /// Prints the categories of a configuration and their extensions.
    pub fn print_configuration(config: &Configuration) {
        Self::header("CATEGORIES");
        for rule in config.rules() {
            let extensions = if rule.extensions().is_empty() {
                "(none)".dimmed().to_string()
            } else {
                rule.extensions().join(" ")
            };
            println!("  {} {}", format!("{}:", rule.name()).bold(), extensions);
        }
        println!(
            "  {} {}",
            format!("{}:", crate::category::FALLBACK_CATEGORY).bold(),
            "(everything else)".dimmed()
        );
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
