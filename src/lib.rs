pub mod atomic;
pub mod cli;
pub mod config;
pub mod constants;
pub mod detector;
pub mod discovery;
pub mod error;
pub mod export;
pub mod fingerprint;
pub mod formats;
pub mod ledger;
pub mod logger;
pub mod metadata;
pub mod pipeline;
pub mod processing;
pub mod utils;

pub use config::PipelineOptions;
pub use detector::{classify, needs_transform, Staleness};
pub use discovery::{discover, is_candidate, is_pipeline_artifact};
pub use error::{CompressionError, Result};
pub use export::{export_tree, ExportSummary};
pub use fingerprint::Fingerprint;
pub use formats::ImageKind;
pub use ledger::{Dimensions, FingerprintRecord, Ledger, LedgerStatus};
pub use pipeline::{run, scan, RunSummary, ScanEntry};
pub use processing::{target_dimensions, transform, SkipReason, TransformOutcome, TransformReport};
