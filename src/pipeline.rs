use crate::config::PipelineOptions;
use crate::constants::{FAILED_PREFIX, SKIP_PREFIX, SUMMARY_PREFIX, WORKING_PREFIX};
use crate::detector::{classify, Staleness};
use crate::discovery::discover;
use crate::error::{CompressionError, Result};
use crate::fingerprint::Fingerprint;
use crate::ledger::{FingerprintRecord, Ledger, LedgerStatus};
use crate::processing::{transform, SkipReason, TransformOutcome, TransformReport};
use crate::utils::{format_megabytes, reduction_percent, relative_key};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Counts and totals for one pass over the tree.
#[derive(Debug)]
pub struct RunSummary {
    pub total: usize,
    pub compressed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Bytes of the transformed files before and after this run.
    pub bytes_before: u64,
    pub bytes_after: u64,
    pub failures: Vec<(String, String)>,
    pub elapsed: Duration,
    pub ledger_path: PathBuf,
    /// Set when the ledger could not be written back. Files transformed in
    /// this run stay transformed and will be retried next time.
    pub ledger_error: Option<CompressionError>,
}

impl RunSummary {
    fn new(total: usize, ledger_path: PathBuf) -> Self {
        Self {
            total,
            compressed: 0,
            skipped: 0,
            failed: 0,
            bytes_before: 0,
            bytes_after: 0,
            failures: Vec::new(),
            elapsed: Duration::ZERO,
            ledger_path,
            ledger_error: None,
        }
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        reduction_percent(self.bytes_before, self.bytes_after)
    }

    pub fn print(&self) {
        crate::info!("\n{} Compression Summary:", SUMMARY_PREFIX);
        crate::info!("  ✓ Compressed: {}", self.compressed);
        crate::info!("  ⊘ Skipped: {}", self.skipped);
        if self.failed > 0 {
            crate::info!("  ✗ Failed: {}", self.failed);
        }
        if self.compressed > 0 {
            crate::info!(
                "  🎯 Saved: {} -> {} ({:.1}% reduction)",
                format_megabytes(self.bytes_before),
                format_megabytes(self.bytes_after),
                self.overall_reduction_percent()
            );
        }
        crate::verbose!("Total time: {:?}", self.elapsed);
        match &self.ledger_error {
            None => crate::info!("\n✓ Metadata saved to {}", self.ledger_path.display()),
            Some(e) => crate::error!("Metadata not saved: {}", e),
        }
    }
}

/// One file's classification, as reported by [`scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub key: String,
    pub path: PathBuf,
    pub staleness: Staleness,
}

/// Classifies every candidate without touching the filesystem.
pub fn scan(root: &Path, options: &PipelineOptions) -> Result<Vec<ScanEntry>> {
    let ledger_path = Ledger::location(root);
    let (ledger, status) = Ledger::load_or_default(&ledger_path);
    report_ledger_status(&ledger_path, &status);

    let entries = discover(root, &options.excludes)?
        .into_iter()
        .map(|path| {
            let key = relative_key(root, &path);
            let staleness = classify(&path, &key, &ledger);
            ScanEntry {
                key,
                path,
                staleness,
            }
        })
        .collect();
    Ok(entries)
}

/// Runs one full pass: load ledger, discover, classify, transform stale
/// files in discovery order, record successes and persist the ledger.
///
/// Only an unusable root is fatal. Per-file failures are counted and the
/// pass continues; a ledger write failure is reported in the summary.
pub fn run(root: &Path, options: &PipelineOptions) -> Result<RunSummary> {
    let start_time = Instant::now();
    let ledger_path = Ledger::location(root);
    let (ledger, status) = Ledger::load_or_default(&ledger_path);
    report_ledger_status(&ledger_path, &status);

    let image_files = discover(root, &options.excludes)?;
    crate::info!("Found {} images to process\n", image_files.len());

    let (ledger, mut summary) = process_all(root, &image_files, ledger, options, ledger_path);

    if let Err(e) = ledger.save(&summary.ledger_path) {
        crate::error!("Failed to save metadata: {}", e);
        summary.ledger_error = Some(e);
    }

    summary.elapsed = start_time.elapsed();
    Ok(summary)
}

/// The per-file loop. Takes the ledger by value and hands it back updated.
fn process_all(
    root: &Path,
    image_files: &[PathBuf],
    mut ledger: Ledger,
    options: &PipelineOptions,
    ledger_path: PathBuf,
) -> (Ledger, RunSummary) {
    let mut summary = RunSummary::new(image_files.len(), ledger_path);

    for path in image_files {
        let key = relative_key(root, path);
        let staleness = classify(path, &key, &ledger);
        if !staleness.is_stale() {
            crate::info!("{} Skipping {} (already compressed)", SKIP_PREFIX, key);
            summary.skipped += 1;
            continue;
        }

        crate::info!("{} Compressing {}...", WORKING_PREFIX, key);
        crate::verbose!("{} is stale: {}", key, staleness);

        match transform(path, options) {
            TransformOutcome::Transformed(report) => match Fingerprint::from_path(path) {
                Ok(fingerprint) => {
                    log_transformed(&report);
                    summary.compressed += 1;
                    summary.bytes_before += report.original_size;
                    summary.bytes_after += report.compressed_size;
                    ledger.record(key, record_for(fingerprint, &report));
                }
                Err(e) => {
                    // Without a fingerprint the next run must redo this file.
                    crate::error!("  {} Failed to fingerprint {}: {}", FAILED_PREFIX, key, e);
                    summary.failed += 1;
                    summary.failures.push((key, e.to_string()));
                }
            },
            TransformOutcome::Skipped(SkipReason::Vanished) => {
                crate::warn!("  {} disappeared before it could be compressed", key);
                summary.skipped += 1;
            }
            TransformOutcome::Failed(e) => {
                crate::error!("  {} Failed to compress {}: {}", FAILED_PREFIX, key, e);
                summary.failed += 1;
                summary.failures.push((key, e.to_string()));
            }
        }
    }

    (ledger, summary)
}

fn record_for(fingerprint: Fingerprint, report: &TransformReport) -> FingerprintRecord {
    FingerprintRecord {
        fingerprint,
        compressed: true,
        compressed_at: Utc::now(),
        original_size: report.original_size,
        compressed_size: report.compressed_size,
        dimensions: report.dimensions,
        quality: report.quality,
    }
}

fn log_transformed(report: &TransformReport) {
    crate::info!(
        "  ✓ Compressed from {} to {} ({:.1}% reduction)",
        format_megabytes(report.original_size),
        format_megabytes(report.compressed_size),
        report.reduction_percent()
    );
    if report.was_resized() {
        crate::verbose!(
            "Resized {} -> {} ({})",
            report.original_dimensions,
            report.dimensions,
            report.format
        );
    }
}

fn report_ledger_status(path: &Path, status: &LedgerStatus) {
    match status {
        LedgerStatus::Loaded => crate::verbose!("Loaded metadata from {}", path.display()),
        LedgerStatus::Missing => crate::verbose!("No metadata at {}; starting fresh", path.display()),
        LedgerStatus::Corrupt(reason) => {
            crate::warn!("Failed to load metadata file: {}", reason)
        }
    }
}
