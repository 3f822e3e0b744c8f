//! Cheap change-detection key built from file size and modification time.
//!
//! Two different contents with the same size and mtime collide; that is
//! accepted in exchange for never reading file bodies during detection.

use crate::error::{CompressionError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs::{self, Metadata};
use std::path::Path;
use std::str::FromStr;
use std::time::UNIX_EPOCH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub size: u64,
    /// Modification time in whole milliseconds since the Unix epoch.
    pub modified_ms: u64,
}

impl Fingerprint {
    pub fn new(size: u64, modified_ms: u64) -> Self {
        Self { size, modified_ms }
    }

    pub fn from_metadata(metadata: &Metadata) -> Result<Self> {
        let modified = metadata.modified()?;
        // Times before the epoch clamp to zero; they only need to be stable.
        let modified_ms = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Ok(Self::new(metadata.len(), modified_ms))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_metadata(&fs::metadata(path)?)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.size, self.modified_ms)
    }
}

impl FromStr for Fingerprint {
    type Err = CompressionError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            CompressionError::UnsupportedFormat(format!("malformed fingerprint '{}'", s))
        };
        let (size, modified) = s.split_once('-').ok_or_else(invalid)?;
        let size = size.parse::<u64>().map_err(|_| invalid())?;
        // Ledgers written by other tools may carry fractional milliseconds.
        let modified_ms = match modified.parse::<u64>() {
            Ok(ms) => ms,
            Err(_) => {
                let ms = modified.parse::<f64>().map_err(|_| invalid())?;
                if !ms.is_finite() || ms < 0.0 {
                    return Err(invalid());
                }
                ms.trunc() as u64
            }
        };
        Ok(Self::new(size, modified_ms))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_display_and_parse() {
        let fp = Fingerprint::new(2048, 1_700_000_000_123);
        assert_eq!(fp.to_string(), "2048-1700000000123");
        assert_eq!("2048-1700000000123".parse::<Fingerprint>().unwrap(), fp);
    }

    #[test]
    fn test_parse_truncates_fractional_millis() {
        let fp: Fingerprint = "2048-1700000000123.789".parse().unwrap();
        assert_eq!(fp, Fingerprint::new(2048, 1_700_000_000_123));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Fingerprint>().is_err());
        assert!("abc-123".parse::<Fingerprint>().is_err());
        assert!("12-".parse::<Fingerprint>().is_err());
        assert!("12--5".parse::<Fingerprint>().is_err());
    }

    #[test]
    fn test_from_path_tracks_size_and_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.jpg");
        File::create(&path).unwrap().write_all(b"12345").unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(1_600_000_000, 250_000_000)).unwrap();

        let fp = Fingerprint::from_path(&path).unwrap();
        assert_eq!(fp, Fingerprint::new(5, 1_600_000_000_250));

        set_file_mtime(&path, FileTime::from_unix_time(1_600_000_001, 0)).unwrap();
        assert_ne!(Fingerprint::from_path(&path).unwrap(), fp);
    }

    #[test]
    fn test_serde_as_string() {
        let fp = Fingerprint::new(1, 2);
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, "\"1-2\"");
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }
}
