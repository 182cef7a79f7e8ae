//! src/dataloader/source.rs
//!
//! One finite pass over a batch plan.
//!
//! # Variants
//! - Inline: batches are loaded on the calling thread when requested.
//! - Parallel: a fresh worker pool loads up to `num_workers * prefetch_factor`
//!   batches ahead. Batch `i` goes to worker `i % num_workers`; results arriving
//!   out of order wait in a reorder buffer so the caller always sees plan order.
//!
//! Dropping a source mid-pass shuts its workers down and discards queued batches.

use crate::dataset::ReidDataset;
use crate::minibatch::MiniBatch;
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::time::Duration;

use super::config::LoaderConfig;
use super::workers::pool::WorkerPool;
use super::workers::{load_batch_task, spawn_batch_workers, BatchOutput, BatchTask};

/// Finite iterator over the batches of one epoch.
///
/// Yields `Result<MiniBatch>`; a failing batch is reported as `Err` and the pass
/// continues with the next batch. Returns `None` forever once the plan is done.
pub struct BatchSource {
    dataset: ReidDataset,
    plan: Vec<Vec<usize>>,
    epoch: usize,
    base_seed: u64,
    next_to_yield: usize,
    finished: bool,
    parallel: Option<ParallelState>,
}

struct ParallelState {
    pool: WorkerPool<BatchTask, BatchOutput>,
    next_to_send: usize,
    max_in_flight: usize,
    timeout: Duration,
    pending: BTreeMap<usize, Result<MiniBatch>>,
}

impl BatchSource {
    pub(crate) fn new(
        dataset: ReidDataset,
        plan: Vec<Vec<usize>>,
        epoch: usize,
        base_seed: u64,
        config: &LoaderConfig,
    ) -> Result<Self> {
        let parallel = if config.num_workers > 0 && !plan.is_empty() {
            let num_workers = config.num_workers.min(plan.len());
            let pool = spawn_batch_workers(
                &dataset,
                num_workers,
                config.prefetch_factor,
                config.worker_timeout,
            )?;
            Some(ParallelState {
                pool,
                next_to_send: 0,
                max_in_flight: num_workers * config.prefetch_factor,
                timeout: config.timeout,
                pending: BTreeMap::new(),
            })
        } else {
            None
        };

        log::debug!(
            "dataset '{}': epoch {} pass with {} batches",
            dataset.name(),
            epoch,
            plan.len()
        );

        Ok(Self {
            dataset,
            plan,
            epoch,
            base_seed,
            next_to_yield: 0,
            finished: false,
            parallel,
        })
    }

    /// Number of batches in this pass.
    pub fn num_batches(&self) -> usize {
        self.plan.len()
    }

    /// Batches not yet yielded.
    pub fn remaining(&self) -> usize {
        self.plan.len() - self.next_to_yield
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }

    fn task(&self, sequence: usize) -> BatchTask {
        BatchTask {
            sequence,
            positions: self.plan[sequence].clone(),
            epoch: self.epoch,
            base_seed: self.base_seed,
        }
    }

    fn next_inline(&mut self) -> Result<MiniBatch> {
        let sequence = self.next_to_yield;
        load_batch_task(&self.dataset, &self.task(sequence))
            .with_context(|| format!("Failed to load batch {} of epoch {}", sequence, self.epoch))
    }

    /// Outer error: the pool failed (send, timeout, disconnect).
    /// Inner result: the batch as loaded by a worker.
    fn next_parallel(&mut self) -> Result<Result<MiniBatch>> {
        let epoch = self.epoch;
        let wanted = self.next_to_yield;
        let Some(state) = self.parallel.as_mut() else {
            return Err(anyhow!("Worker pool is gone"));
        };

        // Keep the window of in-flight batches full
        while state.next_to_send < self.plan.len()
            && state.next_to_send - wanted < state.max_in_flight
        {
            let sequence = state.next_to_send;
            let task = BatchTask {
                sequence,
                positions: self.plan[sequence].clone(),
                epoch,
                base_seed: self.base_seed,
            };
            state.pool.send_to(sequence % state.pool.num_workers(), task)?;
            state.next_to_send += 1;
        }

        loop {
            if let Some(result) = state.pending.remove(&wanted) {
                return Ok(result);
            }
            let (sequence, result) = state
                .pool
                .recv_timeout(state.timeout)
                .with_context(|| format!("Waiting for batch {} of epoch {}", wanted, epoch))?;
            state.pending.insert(sequence, result);
        }
    }

    fn stop(&mut self) {
        self.finished = true;
        // Joins the workers now rather than when the source is dropped
        self.parallel = None;
    }
}

impl Iterator for BatchSource {
    type Item = Result<MiniBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.next_to_yield >= self.plan.len() {
            self.stop();
            return None;
        }

        let result = if self.parallel.is_some() {
            match self.next_parallel() {
                Ok(result) => result,
                Err(err) => {
                    self.stop();
                    return Some(Err(err));
                }
            }
        } else {
            self.next_inline()
        };

        self.next_to_yield += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            let remaining = self.remaining();
            (remaining, Some(remaining))
        }
    }
}

impl ExactSizeIterator for BatchSource {}

impl std::iter::FusedIterator for BatchSource {}
