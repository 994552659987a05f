use crate::error::ConvertError;
use crate::policy::{FileTask, SkipReason};
use crate::utils::calculate_compression_ratio;
use serde::Serialize;
use std::path::PathBuf;

/// Result of one conversion attempt.
#[derive(Debug)]
pub enum ConversionOutcome {
    Converted {
        original_bytes: u64,
        output_bytes: u64,
    },
    Skipped(SkipReason),
    Failed(ConvertError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: String,
}

/// Totals for one run. A fresh value per run, returned by the driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    pub total: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub original_bytes: u64,
    pub output_bytes: u64,
    pub failures: Vec<FailedFile>,
    /// Directories the scan could not list. Not counted in `total`.
    pub unreadable_dirs: Vec<FailedFile>,
}

impl RunStatistics {
    pub fn record(&mut self, task: &FileTask, outcome: &ConversionOutcome) {
        self.total += 1;
        match outcome {
            ConversionOutcome::Converted {
                original_bytes,
                output_bytes,
            } => {
                self.converted += 1;
                self.original_bytes += original_bytes;
                self.output_bytes += output_bytes;
            }
            ConversionOutcome::Skipped(_) => self.skipped += 1,
            ConversionOutcome::Failed(error) => {
                self.failed += 1;
                self.failures.push(FailedFile {
                    path: task.input.clone(),
                    error: error.to_string(),
                });
            }
        }
    }

    pub fn record_unreadable(&mut self, error: &ConvertError) {
        let path = match error {
            ConvertError::SubtreeUnreadable { path, .. } => path.clone(),
            _ => PathBuf::new(),
        };
        self.unreadable_dirs.push(FailedFile {
            path,
            error: error.to_string(),
        });
    }

    /// Percentage saved across converted files (negative when outputs grew).
    pub fn savings_percent(&self) -> f64 {
        calculate_compression_ratio(self.original_bytes, self.output_bytes)
    }

    pub fn bytes_saved(&self) -> i64 {
        self.original_bytes as i64 - self.output_bytes as i64
    }
}
