use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("PNG optimization error: {0}")]
    PngOptimization(String),

    #[error("WebP encoding error: {0}")]
    WebPEncoding(String),

    #[error("Invalid quality value: {0}. Must be between 1 and 100")]
    InvalidQuality(u8),

    #[error("Invalid maximum dimension: {0}. Must be greater than 0")]
    InvalidMaxDimension(u32),

    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Root directory not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Root is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Ledger format error: {0}")]
    LedgerFormat(#[from] serde_json::Error),

    #[error("Failed to persist ledger to {path}: {source}")]
    LedgerPersist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Metadata block too large to embed: {0} bytes")]
    MetadataTooLarge(usize),
}

pub type Result<T> = std::result::Result<T, CompressionError>;
