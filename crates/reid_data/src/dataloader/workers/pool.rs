//! Worker pool for parallel batch loading.
//!
//! # Key features
//! - Bounded channels prevent memory bloat
//! - Tasks are routed to a specific worker (per-worker channels)
//! - Graceful shutdown on drop, even with results still queued
//! - Thread-local worker IDs for debugging

use anyhow::{anyhow, ensure, Context, Result};
use crossbeam_channel::{bounded, never, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::dataloader::common::thread::WORKER_ID;

/// Thread pool for parallel data loading.
///
/// Manages worker lifecycle and communication through bounded channels:
/// - Task channels: Main thread -> Worker `i` (work distribution)
/// - Output channel: Workers -> Main thread (result collection)
/// - Shutdown flag: Enables graceful termination
///
/// # Type Parameters
/// - `Task`: Work items sent to workers
/// - `Output`: Results returned from workers
pub(crate) struct WorkerPool<Task, Output> {
    workers: Vec<thread::JoinHandle<()>>,
    task_txs: Vec<Sender<Task>>,
    output_rx: Receiver<Output>,
    shutdown: Arc<AtomicBool>,
}

impl<Task, Output> WorkerPool<Task, Output>
where
    Task: Send + 'static,
    Output: Send + 'static,
{
    /// Spawns `num_workers` threads running `worker_fn`.
    ///
    /// Each worker owns a task queue of `buffer_size`; the shared output queue
    /// holds `buffer_size * num_workers` results.
    pub(crate) fn new<F>(num_workers: usize, buffer_size: usize, worker_fn: F) -> Result<Self>
    where
        F: Fn(Receiver<Task>, Sender<Output>, Arc<AtomicBool>) + Send + Sync + 'static,
    {
        ensure!(
            num_workers > 0,
            "Cannot create WorkerPool with 0 workers. \
            Either set num_workers > 0 or load on the calling thread."
        );
        ensure!(
            buffer_size > 0,
            "Cannot create WorkerPool with buffer_size 0. \
            Buffer size must be > 0 to prevent deadlocks."
        );

        let (output_tx, output_rx) = bounded(buffer_size * num_workers);
        let shutdown = Arc::new(AtomicBool::new(false));
        let worker_fn = Arc::new(worker_fn);

        let mut pool = Self {
            workers: Vec::with_capacity(num_workers),
            task_txs: Vec::with_capacity(num_workers),
            output_rx,
            shutdown,
        };

        for worker_id in 0..num_workers {
            let (task_tx, task_rx) = bounded(buffer_size);
            let output_tx = output_tx.clone();
            let shutdown = pool.shutdown.clone();
            let worker_fn = worker_fn.clone();

            // On failure `pool` is dropped here, which stops the workers already spawned
            let handle = thread::Builder::new()
                .name(format!("dataloader-worker-{}", worker_id))
                .spawn(move || {
                    WORKER_ID.with(|id| *id.borrow_mut() = worker_id);
                    worker_fn(task_rx, output_tx, shutdown);
                })
                .with_context(|| format!("Failed to spawn worker thread {}", worker_id))?;

            pool.task_txs.push(task_tx);
            pool.workers.push(handle);
        }

        Ok(pool)
    }
}

impl<Task, Output> WorkerPool<Task, Output> {
    pub(crate) fn num_workers(&self) -> usize {
        self.task_txs.len()
    }

    /// Queues `task` on worker `worker_id`, blocking while its queue is full.
    pub(crate) fn send_to(&self, worker_id: usize, task: Task) -> Result<()> {
        let tx = self
            .task_txs
            .get(worker_id)
            .ok_or_else(|| anyhow!("No worker with id {}", worker_id))?;
        tx.send(task)
            .map_err(|_| anyhow!("Worker {} channel closed", worker_id))
    }

    /// Receives the next finished result in completion order.
    pub(crate) fn recv_timeout(&self, timeout: Duration) -> Result<Output> {
        self.output_rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => anyhow!(
                "Worker timeout after {:?} - possible deadlock or slow data loading",
                timeout
            ),
            RecvTimeoutError::Disconnected => {
                anyhow!("Worker channel disconnected - workers may have crashed")
            }
        })
    }
}

impl<Task, Output> Drop for WorkerPool<Task, Output> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // Closing the task queues wakes idle workers
        self.task_txs.clear();

        // Workers blocked on a full output queue see a disconnected channel
        drop(std::mem::replace(&mut self.output_rx, never()));

        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn echo_pool(num_workers: usize, buffer: usize) -> Result<WorkerPool<u32, (usize, u32)>> {
        WorkerPool::new(num_workers, buffer, |task_rx, output_tx, shutdown| {
            let worker_id = WORKER_ID.with(|id| *id.borrow());
            while !shutdown.load(Ordering::Relaxed) {
                match task_rx.recv_timeout(Duration::from_millis(10)) {
                    Ok(task) => {
                        if output_tx.send((worker_id, task * 10)).is_err() {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })
    }

    #[test]
    fn routes_tasks_to_the_requested_worker() -> Result<()> {
        let pool = echo_pool(3, 2)?;
        assert_eq!(pool.num_workers(), 3);
        for task in 0..6u32 {
            pool.send_to(task as usize % 3, task)?;
        }

        let mut seen = HashSet::new();
        for _ in 0..6 {
            let (worker_id, value) = pool.recv_timeout(Duration::from_secs(5))?;
            assert_eq!(worker_id, (value / 10) as usize % 3);
            seen.insert(value);
        }
        assert_eq!(seen.len(), 6);
        Ok(())
    }

    #[test]
    fn rejects_invalid_sizes() {
        assert!(echo_pool(0, 2).is_err());
        assert!(echo_pool(2, 0).is_err());
    }

    #[test]
    fn drop_with_unread_results_does_not_hang() -> Result<()> {
        let pool = echo_pool(2, 1)?;
        // More results than the output queue holds; nobody reads them
        for task in 0..2u32 {
            pool.send_to(0, task)?;
            pool.send_to(1, task)?;
        }
        drop(pool);
        Ok(())
    }

    #[test]
    fn unknown_worker_id_is_an_error() -> Result<()> {
        let pool = echo_pool(1, 1)?;
        assert!(pool.send_to(4, 1).is_err());
        Ok(())
    }
}
