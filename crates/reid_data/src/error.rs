//! Error taxonomy for the re-identification data pipeline.
//!
//! Every fallible operation in this crate returns `anyhow::Result`, with context
//! attached at each layer. The failures that callers are expected to react to are
//! raised as a [`ReidDataError`] so they can be recovered from the error chain:
//!
//! ```ignore
//! match ReidLoaders::new(config) {
//!     Err(e) if matches!(ReidDataError::find(&e), Some(ReidDataError::UnknownDataset { .. })) => { ... }
//!     other => { ... }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReidDataError {
    /// No samples were found for a requested split (wrong path, empty folder...).
    #[error("no samples found for split '{split}'")]
    EmptyDataset { split: String },

    /// Sampling parameters that cannot form a single batch.
    #[error("invalid sampling parameters p={p}, k={k}: {reason}")]
    InvalidSamplingParams { p: usize, k: usize, reason: String },

    #[error("invalid batch size {batch_size}: must be at least 1")]
    InvalidBatchSize { batch_size: usize },

    /// Dataset identifier outside of the supported benchmarks.
    #[error("unknown dataset '{name}' (expected one of: market, duke, msmt)")]
    UnknownDataset { name: String },

    /// One sample could not be read, decoded or transformed.
    #[error("failed to load sample {}: {reason}", .path.display())]
    SampleLoad { path: PathBuf, reason: String },
}

impl ReidDataError {
    /// Finds the first `ReidDataError` in an `anyhow` error chain.
    pub fn find(error: &anyhow::Error) -> Option<&ReidDataError> {
        error
            .chain()
            .find_map(|cause| cause.downcast_ref::<ReidDataError>())
    }

    pub(crate) fn empty(split: impl Into<String>) -> Self {
        Self::EmptyDataset {
            split: split.into(),
        }
    }
}
