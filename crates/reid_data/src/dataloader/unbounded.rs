//! src/dataloader/unbounded.rs
//!
//! Endless batch stream for iteration-based training.

use crate::error::ReidDataError;
use crate::minibatch::MiniBatch;
use anyhow::Result;

use super::loader::BatchLoader;
use super::source::BatchSource;

enum IterState {
    Running(BatchSource),
    Exhausted,
}

/// Wraps a [`BatchLoader`] so that batches never run out.
///
/// When the current pass is exhausted a new epoch is started (fresh sampling
/// plan, fresh workers) and its first batch is returned; callers never observe
/// end-of-data. Each restart is logged and counted.
///
/// A pass that yields no batch at all (e.g. fewer identities than `p` after
/// filtering) is reported as `EmptyDataset` rather than looping forever.
///
/// Implements `Iterator` and always returns `Some`.
pub struct UnboundedIterator {
    loader: BatchLoader,
    state: IterState,
    rollovers: usize,
    passes: usize,
}

impl UnboundedIterator {
    pub(crate) fn new(loader: BatchLoader) -> Self {
        Self {
            loader,
            state: IterState::Exhausted,
            rollovers: 0,
            passes: 0,
        }
    }

    /// Returns the next batch, starting a new pass if the current one is done.
    ///
    /// Errors from individual batches are returned as-is; the following call
    /// continues with the next batch of the same pass.
    pub fn next_batch(&mut self) -> Result<MiniBatch> {
        if let IterState::Running(source) = &mut self.state {
            if let Some(result) = source.next() {
                return result;
            }
        }
        self.state = IterState::Exhausted;

        let mut source = self.loader.iter()?;
        let Some(first) = source.next() else {
            return Err(ReidDataError::empty(format!(
                "{} (epoch {} has no batches)",
                self.loader.dataset().name(),
                source.epoch()
            ))
            .into());
        };

        if self.passes > 0 {
            self.rollovers += 1;
            log::info!(
                "dataset '{}': pass exhausted, restarting at epoch {} (rollover {})",
                self.loader.dataset().name(),
                source.epoch(),
                self.rollovers
            );
        }
        self.passes += 1;
        self.state = IterState::Running(source);
        first
    }

    /// Epoch of the pass currently being consumed (0 before the first batch).
    pub fn epoch(&self) -> usize {
        match &self.state {
            IterState::Running(source) => source.epoch(),
            IterState::Exhausted => self.loader.epoch().saturating_sub(1),
        }
    }

    /// Number of times a pass was exhausted and restarted.
    pub fn rollovers(&self) -> usize {
        self.rollovers
    }

    pub fn loader(&self) -> &BatchLoader {
        &self.loader
    }
}

impl Iterator for UnboundedIterator {
    type Item = Result<MiniBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_batch())
    }
}
