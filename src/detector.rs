use crate::fingerprint::Fingerprint;
use crate::ledger::Ledger;
use std::fmt;
use std::path::Path;

/// Why a file does or does not need another transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// No ledger record for the path yet
    Untracked,
    /// Size or mtime moved since the recorded transform, or metadata is unreadable
    Changed,
    /// A record exists but the last transform did not succeed
    PreviouslyFailed,
    /// Matches its record; nothing to do
    Current,
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        !matches!(self, Staleness::Current)
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Staleness::Untracked => "not in ledger",
            Staleness::Changed => "changed on disk",
            Staleness::PreviouslyFailed => "previous attempt failed",
            Staleness::Current => "up to date",
        };
        write!(f, "{}", reason)
    }
}

/// Compares the live fingerprint of `path` against the ledger entry at `key`.
///
/// Never fails: a file whose metadata cannot be read is reported as
/// `Changed` and the transform step deals with it.
pub fn classify(path: &Path, key: &str, ledger: &Ledger) -> Staleness {
    let Some(record) = ledger.get(key) else {
        return Staleness::Untracked;
    };

    match Fingerprint::from_path(path) {
        Ok(current) if current != record.fingerprint => Staleness::Changed,
        Err(_) => Staleness::Changed,
        Ok(_) if !record.compressed => Staleness::PreviouslyFailed,
        Ok(_) => Staleness::Current,
    }
}

pub fn needs_transform(path: &Path, key: &str, ledger: &Ledger) -> bool {
    classify(path, key, ledger).is_stale()
}
