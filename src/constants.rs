pub const DEFAULT_QUALITY: u8 = 85;
pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

/// Largest width or height an image may keep after a run.
pub const DEFAULT_MAX_DIMENSION: u32 = 2400;

pub const BACKUP_SUFFIX: &str = ".original";
pub const LEDGER_FILE_NAME: &str = ".compression-metadata.json";
pub const TEMP_SUFFIX: &str = ".tmp";

pub const DEFAULT_ROOT: &str = "imgs";

pub const CANDIDATE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

pub const ZOPFLI_ITERATIONS: u8 = 15;
pub const LIBDEFLATER_HIGH_LEVEL: u8 = 12;
pub const LIBDEFLATER_LOW_LEVEL: u8 = 8;
pub const OXIPNG_PRESET: u8 = 4;

/// JPEG segment length is a big-endian u16 that counts its own two bytes.
pub const MAX_JPEG_SEGMENT_PAYLOAD: usize = u16::MAX as usize - 2;
pub const EXIF_HEADER: &[u8] = b"Exif\0\0";

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

// Common output message prefixes
pub const SKIP_PREFIX: &str = "✓";
pub const WORKING_PREFIX: &str = "⚙";
pub const BACKUP_PREFIX: &str = "📦";
pub const SUMMARY_PREFIX: &str = "📊";
pub const FAILED_PREFIX: &str = "✗";
