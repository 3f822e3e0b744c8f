//! Small helpers shared by the pipeline stages.

use crate::constants::BACKUP_SUFFIX;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Format a byte count in megabytes with two decimals (e.g. "1.25MB").
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2}MB", bytes as f64 / 1024.0 / 1024.0)
}

/// Size reduction as a percentage, `(1 - new/old) * 100`.
///
/// Negative when the file grew. An empty original yields 0.
pub fn reduction_percent(original_size: u64, new_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    (1.0 - new_size as f64 / original_size as f64) * 100.0
}

/// Ledger key for `path`: relative to `root`, always `/`-separated.
///
/// Falls back to the full path when `path` is not under `root`.
pub fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// `photo.jpg` -> `photo.jpg.original`, next to the original.
pub fn backup_path(path: &Path) -> PathBuf {
    append_to_file_name(path, BACKUP_SUFFIX)
}

/// Hidden temp-file prefix for a sibling of `path`, e.g. `.photo.jpg.`
pub fn temp_prefix(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(".{}.", name)
}

fn append_to_file_name(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_megabytes() {
        assert_eq!(format_megabytes(0), "0.00MB");
        assert_eq!(format_megabytes(1024 * 1024), "1.00MB");
        assert_eq!(format_megabytes(1536 * 1024), "1.50MB");
    }

    #[test]
    fn test_reduction_percent() {
        assert_eq!(reduction_percent(1000, 800), 20.0);
        assert_eq!(reduction_percent(1000, 1200), -20.0);
        assert_eq!(reduction_percent(1000, 1000), 0.0);
        assert_eq!(reduction_percent(0, 500), 0.0);
    }

    #[test]
    fn test_relative_key_uses_forward_slashes() {
        let root = Path::new("/srv/imgs");
        let path = root.join("gallery").join("2024").join("a.jpg");
        assert_eq!(relative_key(root, &path), "gallery/2024/a.jpg");
        assert_eq!(relative_key(root, &root.join("b.png")), "b.png");
    }

    #[test]
    fn test_backup_path_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("/srv/imgs/a.JPG")),
            PathBuf::from("/srv/imgs/a.JPG.original")
        );
    }

    #[test]
    fn test_temp_prefix_is_hidden() {
        assert_eq!(temp_prefix(Path::new("dir/a.webp")), ".a.webp.");
    }
}
