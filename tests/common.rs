#![allow(dead_code)]

use filetime::{set_file_mtime, FileTime};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}

/// A noisy-ish gradient so encoders have something to chew on.
pub fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 3 % 256) as u8,
            (y * 5 % 256) as u8,
            ((x ^ y) % 256) as u8,
        ])
    }))
}

pub fn write_image(path: &Path, width: u32, height: u32, format: ImageFormat) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut buf = Cursor::new(Vec::new());
    gradient(width, height).write_to(&mut buf, format).unwrap();
    fs::write(path, buf.into_inner()).unwrap();
    path.to_path_buf()
}

pub fn write_jpeg(root: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    write_image(&root.join(name), width, height, ImageFormat::Jpeg)
}

pub fn write_png(root: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    write_image(&root.join(name), width, height, ImageFormat::Png)
}

pub fn write_corrupt(root: &Path, name: &str) -> PathBuf {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, b"\xFF\xD8 truncated, not really a jpeg").unwrap();
    path
}

pub fn set_mtime(path: &Path, unix_seconds: i64) {
    set_file_mtime(path, FileTime::from_unix_time(unix_seconds, 0)).unwrap();
}

/// Every file under `root`, as sorted `/`-separated relative paths.
pub fn list_files(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

pub fn count_backups(root: &Path) -> usize {
    list_files(root)
        .iter()
        .filter(|f| f.ends_with(".original"))
        .count()
}
