//! Persistent provenance ledger: root-relative path -> last outcome.
//!
//! The whole ledger is one pretty-printed JSON object so it stays readable
//! and diff-friendly under version control. Keys are sorted.

use crate::atomic::replace_atomically;
use crate::constants::LEDGER_FILE_NAME;
use crate::error::{CompressionError, Result};
use crate::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Dimensions {
    type Err = CompressionError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CompressionError::UnsupportedFormat(format!("malformed dimensions '{}'", s));
        let (width, height) = s.split_once('x').ok_or_else(invalid)?;
        Ok(Self::new(
            width.trim().parse().map_err(|_| invalid())?,
            height.trim().parse().map_err(|_| invalid())?,
        ))
    }
}

impl Serialize for Dimensions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dimensions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One ledger entry. Only ever written after a successful transform, so
/// `compressed == true` implies a backup exists next to the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintRecord {
    /// Fingerprint of the file as it was left on disk after the transform.
    #[serde(rename = "hash")]
    pub fingerprint: Fingerprint,
    pub compressed: bool,
    pub compressed_at: DateTime<Utc>,
    pub original_size: u64,
    pub compressed_size: u64,
    pub dimensions: Dimensions,
    pub quality: u8,
}

/// How a ledger load went. Anything but `Loaded` means "start from empty".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerStatus {
    Loaded,
    Missing,
    Corrupt(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ledger {
    records: BTreeMap<String, FingerprintRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where the ledger for `root` lives.
    pub fn location(root: &Path) -> PathBuf {
        root.join(LEDGER_FILE_NAME)
    }

    /// `Ok(None)` when the file does not exist, an error when it cannot be
    /// read or is not a JSON object.
    ///
    /// Individual records that do not parse are dropped with a warning; those
    /// files count as untracked and get redone on the next run.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(Self::from_json(&contents)?))
    }

    fn from_json(contents: &str) -> Result<Self> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(contents)?;
        let mut records = BTreeMap::new();
        for (key, value) in raw {
            match serde_json::from_value::<FingerprintRecord>(value) {
                Ok(record) => {
                    records.insert(key, record);
                }
                Err(e) => crate::warn!("Ignoring unreadable metadata for {}: {}", key, e),
            }
        }
        Ok(Self { records })
    }

    /// Lenient load used by runs: a missing or unreadable ledger is an
    /// empty one.
    pub fn load_or_default(path: &Path) -> (Self, LedgerStatus) {
        match Self::load(path) {
            Ok(Some(ledger)) => (ledger, LedgerStatus::Loaded),
            Ok(None) => (Self::new(), LedgerStatus::Missing),
            Err(e) => (Self::new(), LedgerStatus::Corrupt(e.to_string())),
        }
    }

    /// Whole-file overwrite through a temp sibling and rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        let persist_error = |source: io::Error| CompressionError::LedgerPersist {
            path: path.to_path_buf(),
            source,
        };

        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');

        let permissions = fs::metadata(path).ok().map(|m| m.permissions());
        replace_atomically(path, json.as_bytes(), permissions).map_err(|e| match e {
            CompressionError::Io(source) => persist_error(source),
            other => other,
        })
    }

    pub fn get(&self, key: &str) -> Option<&FingerprintRecord> {
        self.records.get(key)
    }

    /// Overwrites any previous record for `key`.
    pub fn record(&mut self, key: impl Into<String>, record: FingerprintRecord) {
        self.records.insert(key.into(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
