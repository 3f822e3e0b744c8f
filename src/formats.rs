//! Image container handling
//!
//! Maps file extensions and sniffed content onto the three containers the
//! pipeline knows how to rewrite in place.

use crate::constants::CANDIDATE_EXTENSIONS;
use crate::error::{CompressionError, Result};
use image::ImageFormat;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Lossy JPEG, re-encoded at the configured quality
    Jpeg,
    /// PNG, re-encoded and then optimised with oxipng
    Png,
    /// Lossy WebP, re-encoded at the configured quality
    WebP,
}

impl ImageKind {
    /// Returns the kind a file name claims to be, if it is on the allow-list.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    /// Maps a sniffed content format onto a rewritable container.
    pub fn from_image_format(format: ImageFormat) -> Result<Self> {
        match format {
            ImageFormat::Jpeg => Ok(ImageKind::Jpeg),
            ImageFormat::Png => Ok(ImageKind::Png),
            ImageFormat::WebP => Ok(ImageKind::WebP),
            other => Err(CompressionError::UnsupportedFormat(format!(
                "{:?} content cannot be rewritten in place",
                other
            ))),
        }
    }

    /// Whether the encoder for this container can carry the original EXIF block.
    pub fn carries_exif(&self) -> bool {
        matches!(self, ImageKind::Jpeg)
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageKind::Jpeg => "JPEG",
            ImageKind::Png => "PNG",
            ImageKind::WebP => "WebP",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ImageKind {
    type Err = CompressionError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_lowercase();
        if !CANDIDATE_EXTENSIONS.contains(&lower.as_str()) {
            return Err(CompressionError::UnsupportedFormat(s.to_string()));
        }
        match lower.as_str() {
            "jpg" | "jpeg" => Ok(ImageKind::Jpeg),
            "png" => Ok(ImageKind::Png),
            _ => Ok(ImageKind::WebP),
        }
    }
}
