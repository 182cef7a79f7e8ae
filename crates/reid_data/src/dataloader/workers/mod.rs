//! Worker management for parallel batch loading.
//!
//! - `pool`: generic worker pool
//! - this module: the batch-loading task and the worker loop run by each thread
//!
//! Workers share the dataset via `Arc`-backed clones, receive a batch's positions
//! together with its sequence number, and send back `(sequence, Result<MiniBatch>)`.
//! The consumer restores plan order from the sequence numbers.

pub(crate) mod pool;

use crate::dataset::ReidDataset;
use crate::minibatch::MiniBatch;
use anyhow::{Context, Result};
use crossbeam_channel::RecvTimeoutError;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::dataloader::common::thread::{init_batch_rng, WORKER_ID};
use pool::WorkerPool;

/// One batch to load.
#[derive(Debug)]
pub(crate) struct BatchTask {
    /// Position of the batch in the epoch's plan.
    pub(crate) sequence: usize,
    pub(crate) positions: Vec<usize>,
    pub(crate) epoch: usize,
    pub(crate) base_seed: u64,
}

pub(crate) type BatchOutput = (usize, Result<MiniBatch>);

/// Loads one batch on the current thread under its own seeded RNG.
pub(crate) fn load_batch_task(dataset: &ReidDataset, task: &BatchTask) -> Result<MiniBatch> {
    init_batch_rng(task.base_seed, task.epoch, task.sequence);
    dataset.load_batch(&task.positions)
}

/// Spawns a pool whose workers load `BatchTask`s from `dataset`.
pub(crate) fn spawn_batch_workers(
    dataset: &ReidDataset,
    num_workers: usize,
    prefetch_factor: usize,
    poll_interval: Duration,
) -> Result<WorkerPool<BatchTask, BatchOutput>> {
    let dataset = dataset.clone();
    WorkerPool::new(
        num_workers,
        prefetch_factor,
        move |task_rx, output_tx, shutdown| {
            let worker_id = WORKER_ID.with(|id| *id.borrow());

            loop {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }

                let task = match task_rx.recv_timeout(poll_interval) {
                    Ok(task) => task,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                };

                let result = load_batch_task(&dataset, &task).with_context(|| {
                    format!(
                        "Worker {} failed on batch {} of epoch {}",
                        worker_id, task.sequence, task.epoch
                    )
                });

                if output_tx.send((task.sequence, result)).is_err() {
                    break;
                }
            }
            log::debug!("dataloader worker {} stopped", worker_id);
        },
    )
    .context("Failed to start dataloader workers")
}
