//! Write-then-rename helpers.
//!
//! Every destructive write goes through a hidden temp sibling so readers
//! never observe a truncated file. A crash before the rename leaves the
//! destination untouched and only orphans the temp file.

use crate::constants::TEMP_SUFFIX;
use crate::error::{CompressionError, Result};
use crate::utils::temp_prefix;
use std::fs::{self, File, Permissions};
use std::io::{self, Write};
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

fn temp_sibling(path: &Path) -> Result<NamedTempFile> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let prefix = temp_prefix(path);
    let temp = Builder::new()
        .prefix(&prefix)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)?;
    Ok(temp)
}

/// Replace `path` with `bytes` via rename. `permissions` are applied to the
/// new file before it becomes visible.
pub fn replace_atomically(path: &Path, bytes: &[u8], permissions: Option<Permissions>) -> Result<()> {
    let mut temp = temp_sibling(path)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    if let Some(permissions) = permissions {
        fs::set_permissions(temp.path(), permissions)?;
    }
    temp.persist(path)
        .map_err(|e| CompressionError::Io(e.error))?;
    Ok(())
}

/// Copy `source` to `dest` unless `dest` already exists.
///
/// Returns `Ok(true)` when this call created `dest`. The copy is published
/// with a no-clobber rename, so an existing `dest` is never overwritten and
/// never observed half-written.
pub fn copy_once(source: &Path, dest: &Path) -> Result<bool> {
    if dest.exists() {
        return Ok(false);
    }

    let mut temp = temp_sibling(dest)?;
    let mut reader = File::open(source)?;
    io::copy(&mut reader, temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    fs::set_permissions(temp.path(), fs::metadata(source)?.permissions())?;

    match temp.persist_noclobber(dest) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(CompressionError::Io(e.error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn leftover_temp_files(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(TEMP_SUFFIX))
            .count()
    }

    #[test]
    fn test_replace_atomically_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.jpg");
        fs::write(&path, b"old contents").unwrap();

        replace_atomically(&path, b"new", None).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new");
        assert_eq!(leftover_temp_files(temp_dir.path()), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_replace_atomically_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.png");
        fs::write(&path, b"old").unwrap();
        fs::set_permissions(&path, Permissions::from_mode(0o644)).unwrap();
        let permissions = fs::metadata(&path).unwrap().permissions();

        replace_atomically(&path, b"new", Some(permissions)).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn test_copy_once_creates_then_refuses() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.jpg");
        let dest = temp_dir.path().join("a.jpg.original");
        fs::write(&source, b"first").unwrap();

        assert!(copy_once(&source, &dest).unwrap());
        fs::write(&source, b"second").unwrap();
        assert!(!copy_once(&source, &dest).unwrap());

        assert_eq!(fs::read(&dest).unwrap(), b"first");
        assert_eq!(leftover_temp_files(temp_dir.path()), 0);
    }

    #[test]
    fn test_copy_once_missing_source_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = copy_once(
            &temp_dir.path().join("missing.jpg"),
            &temp_dir.path().join("missing.jpg.original"),
        );
        assert!(matches!(result, Err(CompressionError::Io(_))));
        assert!(!temp_dir.path().join("missing.jpg.original").exists());
    }
}
