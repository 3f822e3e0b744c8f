//! Copies the processed tree to a distribution directory.
//!
//! Every regular file is copied with its relative layout, except the files
//! the pipeline itself owns (backups and the ledger).

use crate::constants::PROGRESS_BAR_TEMPLATE;
use crate::discovery::{is_pipeline_artifact, validate_root};
use crate::error::{CompressionError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub files_copied: usize,
    pub bytes_copied: u64,
    pub artifacts_skipped: usize,
}

fn progress_bar(len: u64) -> ProgressBar {
    if crate::logger::is_quiet() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    match ProgressStyle::default_bar().template(PROGRESS_BAR_TEMPLATE) {
        Ok(style) => pb.set_style(style.progress_chars("#>-")),
        Err(_) => pb.set_style(ProgressStyle::default_bar()),
    }
    pb
}

/// Copies `root` into `dest`, skipping backups and the ledger.
///
/// When `dest` lives inside `root` it is not copied into itself.
pub fn export_tree(root: &Path, dest: &Path) -> Result<ExportSummary> {
    validate_root(root)?;
    fs::create_dir_all(dest)?;

    let root = root.canonicalize()?;
    let dest = dest.canonicalize()?;
    if dest == root {
        return Err(CompressionError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "export destination must differ from the root",
        )));
    }

    let mut files: Vec<(PathBuf, PathBuf)> = Vec::new();
    let mut summary = ExportSummary::default();
    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.path() != dest.as_path());

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if is_pipeline_artifact(&entry.file_name().to_string_lossy()) {
            summary.artifacts_skipped += 1;
            continue;
        }
        let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
        files.push((entry.path().to_path_buf(), dest.join(relative)));
    }

    let pb = progress_bar(files.len() as u64);
    for (source, target) in &files {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        summary.bytes_copied += fs::copy(source, target)?;
        summary.files_copied += 1;
        pb.inc(1);
    }
    pb.finish_and_clear();

    crate::info!(
        "✓ Copied {} files to {} ({} pipeline files left behind)",
        summary.files_copied,
        dest.display(),
        summary.artifacts_skipped
    );
    Ok(summary)
}
