use crate::codec::Codec;
use crate::config::Config;
use crate::constants::MIN_AVAILABLE_MEMORY_MIB;
use crate::error::{ConvertError, Result};
use crate::formats::lowercase_extension;
use crate::policy::{ConversionPolicy, FileTask};
use crate::report::Reporter;
use crate::scanner;
use crate::stats::{ConversionOutcome, RunStatistics};
use std::fs;
use std::path::Path;
use std::time::Instant;
use sysinfo::{MemoryRefreshKind, RefreshKind, System};
use tracing::{debug, warn};

/// Estimates memory usage for decoding a file without loading it.
///
/// # Arguments
/// * `file_path` - Path to the input file
///
/// # Returns
/// * `Ok(memory_mib)` - Estimated peak memory in MiB
/// * `Err(ConvertError)` - If file metadata cannot be read
fn estimate_decoded_memory_mib(file_path: &Path) -> Result<f64> {
    let metadata = fs::metadata(file_path)?;
    let file_size_mib = metadata.len() as f64 / (1024.0 * 1024.0);

    // Decoded pixels are typically several times the compressed size
    let multiplier = match lowercase_extension(file_path).as_deref() {
        Some("jpg" | "jpeg") => 4.0,
        Some("png") => 3.0,
        Some("webp") => 3.5,
        Some("bmp" | "tif" | "tiff") => 1.2,
        // Every frame is held in memory at once
        Some("gif") => 8.0,
        _ => 3.0,
    };

    Ok(file_size_mib * multiplier)
}

/// Warns when the largest input probably does not fit in available memory.
/// Files are converted one at a time, so only the peak matters. Advisory only.
///
/// Returns the estimate for the largest file, in MiB.
pub fn preflight_memory(tasks: &[FileTask]) -> f64 {
    let largest = tasks
        .iter()
        .filter_map(|task| estimate_decoded_memory_mib(&task.input).ok())
        .fold(0.0_f64, f64::max);

    if largest > 0.0 {
        let mut sys = System::new_with_specifics(
            RefreshKind::new().with_memory(MemoryRefreshKind::new()),
        );
        sys.refresh_memory();
        let available_mib = sys.available_memory() / (1024 * 1024);
        let required_mib = largest.ceil() as u64 + MIN_AVAILABLE_MEMORY_MIB;
        if available_mib > 0 && required_mib > available_mib {
            warn!(
                "Largest input may need ~{:.0} MiB but only {} MiB is available",
                largest, available_mib
            );
        }
    }

    largest
}

/// Runs conversions strictly one at a time.
///
/// A single file can never abort the batch: every task yields exactly one
/// outcome, and `converted + skipped + failed == total` on return.
pub struct BatchDriver<'a, C: Codec + ?Sized> {
    policy: &'a ConversionPolicy,
    codec: &'a C,
}

impl<'a, C: Codec + ?Sized> BatchDriver<'a, C> {
    pub fn new(policy: &'a ConversionPolicy, codec: &'a C) -> Self {
        Self { policy, codec }
    }

    pub fn run(&self, tasks: Vec<FileTask>, reporter: &mut dyn Reporter) -> RunStatistics {
        self.run_scanned(tasks, &[], reporter)
    }

    /// Like [`run`](Self::run), also carrying the directories the scan
    /// could not list into the statistics.
    pub fn run_scanned(
        &self,
        tasks: Vec<FileTask>,
        unreadable: &[ConvertError],
        reporter: &mut dyn Reporter,
    ) -> RunStatistics {
        let start_time = Instant::now();
        let mut stats = RunStatistics::default();
        for error in unreadable {
            stats.record_unreadable(error);
        }

        reporter.run_started(tasks.len());
        for task in &tasks {
            let outcome = self.process(task);
            stats.record(task, &outcome);
            reporter.task_finished(task, &outcome);
        }
        reporter.run_finished(&stats, start_time.elapsed());

        stats
    }

    /// Converts one task, turning every error into a `Failed` outcome.
    pub fn process(&self, task: &FileTask) -> ConversionOutcome {
        let decision = match self.policy.decide(task, self.codec) {
            Ok(decision) => decision,
            Err(e) => return ConversionOutcome::Failed(e),
        };

        if let Some(reason) = decision.skip {
            return ConversionOutcome::Skipped(reason);
        }

        let original_bytes = match fs::metadata(&task.input) {
            Ok(metadata) => metadata.len(),
            Err(e) => return ConversionOutcome::Failed(e.into()),
        };

        match self
            .codec
            .encode(&task.input, &decision.output_path, &decision.params)
        {
            Ok(output_bytes) => {
                debug!(
                    "Converted {} ({} -> {} bytes)",
                    task.input.display(),
                    original_bytes,
                    output_bytes
                );
                ConversionOutcome::Converted {
                    original_bytes,
                    output_bytes,
                }
            }
            Err(e) => ConversionOutcome::Failed(e),
        }
    }
}

/// Discovers the work set for `config` and converts it.
///
/// Fails only when the work set itself is inaccessible; per-file problems
/// end up in the returned statistics.
pub fn convert_all<C: Codec + ?Sized>(
    config: &Config,
    codec: &C,
    reporter: &mut dyn Reporter,
) -> Result<RunStatistics> {
    let scan = scanner::discover(config)?;
    let policy = ConversionPolicy::new(config);
    let tasks: Vec<FileTask> = scan
        .files
        .into_iter()
        .map(|path| policy.task_for(path))
        .collect();

    preflight_memory(&tasks);

    let driver = BatchDriver::new(&policy, codec);
    Ok(driver.run_scanned(tasks, &scan.unreadable, reporter))
}
