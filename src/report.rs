use crate::constants::{
    ERROR_PREFIX, INFO_PREFIX, PROGRESS_BAR_TEMPLATE, SIZE_PREFIX, SKIP_PREFIX, SUCCESS_PREFIX,
    WARNING_PREFIX,
};
use crate::policy::FileTask;
use crate::stats::{ConversionOutcome, RunStatistics};
use crate::utils::{calculate_compression_ratio, display_name, format_file_size};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::error;

/// Receives per-file events and the final statistics. Reporters only read.
pub trait Reporter {
    fn run_started(&mut self, _total: usize) {}

    fn task_finished(&mut self, task: &FileTask, outcome: &ConversionOutcome);

    fn run_finished(&mut self, stats: &RunStatistics, elapsed: Duration);
}

/// Human-readable console output with a progress bar.
pub struct ConsoleReporter {
    quiet: bool,
    progress: ProgressBar,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            progress: ProgressBar::hidden(),
        }
    }

    fn line(&self, message: String) {
        if !self.quiet {
            self.progress.suspend(|| println!("{}", message));
        }
    }
}

impl Reporter for ConsoleReporter {
    fn run_started(&mut self, total: usize) {
        if self.quiet || total == 0 {
            return;
        }
        let progress = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_BAR_TEMPLATE) {
            progress.set_style(style.progress_chars("#>-"));
        }
        self.progress = progress;
        self.line(format!("{} Found {} files to process", INFO_PREFIX, total));
    }

    fn task_finished(&mut self, task: &FileTask, outcome: &ConversionOutcome) {
        let name = display_name(&task.input);
        match outcome {
            ConversionOutcome::Converted {
                original_bytes,
                output_bytes,
            } => self.line(format!(
                "{} {} -> {} ({} -> {}, {:.1}% saved)",
                SUCCESS_PREFIX,
                name,
                display_name(&task.output),
                format_file_size(*original_bytes),
                format_file_size(*output_bytes),
                calculate_compression_ratio(*original_bytes, *output_bytes)
            )),
            ConversionOutcome::Skipped(reason) => {
                self.line(format!("{}  {} ({})", SKIP_PREFIX, name, reason))
            }
            ConversionOutcome::Failed(e) => {
                error!("{}", e);
                self.line(format!("{} {}: {}", ERROR_PREFIX, name, e));
            }
        }
        self.progress.set_message(name);
        self.progress.inc(1);
    }

    fn run_finished(&mut self, stats: &RunStatistics, elapsed: Duration) {
        self.progress.finish_and_clear();
        print!("{}", render_summary(stats, elapsed));
    }
}

/// Machine-readable summary on stdout; per-file events are left to the log.
#[derive(Debug, Default)]
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn task_finished(&mut self, _task: &FileTask, outcome: &ConversionOutcome) {
        if let ConversionOutcome::Failed(e) = outcome {
            error!("{}", e);
        }
    }

    fn run_finished(&mut self, stats: &RunStatistics, _elapsed: Duration) {
        match serde_json::to_string_pretty(stats) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize summary: {}", e),
        }
    }
}

pub fn render_summary(stats: &RunStatistics, elapsed: Duration) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{} Conversion Summary:\n", SIZE_PREFIX));
    out.push_str(&format!("  📁 Files found: {}\n", stats.total));
    out.push_str(&format!("  {} Converted: {}\n", SUCCESS_PREFIX, stats.converted));
    out.push_str(&format!("  {}  Skipped: {}\n", SKIP_PREFIX, stats.skipped));
    out.push_str(&format!("  {} Failed: {}\n", ERROR_PREFIX, stats.failed));

    if stats.converted > 0 {
        out.push_str(&format!(
            "  {} Original size: {}\n",
            SIZE_PREFIX,
            format_file_size(stats.original_bytes)
        ));
        out.push_str(&format!(
            "  📈 Converted size: {}\n",
            format_file_size(stats.output_bytes)
        ));
        let saved = stats.bytes_saved();
        out.push_str(&format!(
            "  🎯 Overall savings: {:.1}% ({}{})\n",
            stats.savings_percent(),
            if saved < 0 { "-" } else { "" },
            format_file_size(saved.unsigned_abs())
        ));
    }
    out.push_str(&format!("  ⏱️  Total time: {:.2?}\n", elapsed));

    if !stats.failures.is_empty() {
        out.push_str(&format!("\n{}  Failed files:\n", WARNING_PREFIX));
        for failure in &stats.failures {
            out.push_str(&format!(
                "  - {}: {}\n",
                failure.path.display(),
                failure.error
            ));
        }
    }

    if !stats.unreadable_dirs.is_empty() {
        out.push_str(&format!("\n{}  Unreadable directories:\n", WARNING_PREFIX));
        for dir in &stats.unreadable_dirs {
            out.push_str(&format!("  - {}: {}\n", dir.path.display(), dir.error));
        }
    }
    out
}
