use crate::constants::{BACKUP_SUFFIX, LEDGER_FILE_NAME};
use crate::error::{CompressionError, Result};
use crate::formats::ImageKind;
use crate::utils::relative_key;
use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// True for files the pipeline itself writes into the tree: backups and the
/// ledger. Anything that copies the tree elsewhere must skip these too.
pub fn is_pipeline_artifact(file_name: &str) -> bool {
    file_name.ends_with(BACKUP_SUFFIX) || file_name == LEDGER_FILE_NAME
}

/// Whether a file name is an allow-listed image that is not an artifact.
pub fn is_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    !is_pipeline_artifact(&name) && ImageKind::from_path(path).is_some()
}

/// Fails with the right error when `root` cannot be walked at all.
pub fn validate_root(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(CompressionError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(CompressionError::RootNotDirectory(root.to_path_buf()));
    }
    Ok(())
}

/// Recursively collects candidate images under `root`, sorted by file name
/// within each directory so runs are reproducible.
///
/// `excludes` are matched against the `/`-separated path relative to `root`.
pub fn discover(root: &Path, excludes: &[Pattern]) -> Result<Vec<PathBuf>> {
    validate_root(root)?;

    let mut image_files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !is_candidate(path) {
            continue;
        }

        if !excludes.is_empty() {
            let key = relative_key(root, path);
            if excludes.iter().any(|pattern| pattern.matches(&key)) {
                crate::verbose!("Excluded {}", key);
                continue;
            }
        }

        image_files.push(path.to_path_buf());
    }

    Ok(image_files)
}
