//! src/dataloader/mod.rs
//!
//! Batch loading: turns a `ReidDataset` and a batch sampler into a stream of
//! `MiniBatch`es, optionally in parallel.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌─────────────┐
//!                 │ ReidDataset │ (samples + transform)
//!                 └──────┬──────┘
//!                        │
//!                        ↓
//!                 ┌──────────────┐
//!                 │ BatchSampler │ (one plan per epoch)
//!                 └──────┬───────┘
//!                        │ Vec<Vec<usize>>
//!                        ↓
//!                 ┌──────────────┐
//!                 │ BatchLoader  │ ←───── LoaderConfig (workers, prefetch, seed)
//!                 └──────┬───────┘
//!                        │ iter()
//!                        ↓
//!                 ┌──────────────┐
//!                 │ BatchSource  │ finite pass, plan order
//!                 └──────┬───────┘
//!                        │ [Worker Threads] (optional)
//!                        ↓
//!               ┌───────────────────┐
//!               │ UnboundedIterator │ restarts passes on exhaustion
//!               └───────────────────┘
//! ```
//!
//! # Module Structure
//!
//! ```text
//! src/dataloader/
//! ├── mod.rs          # Public API exports
//! ├── config.rs       # LoaderConfig and builder
//! ├── loader.rs       # BatchLoader constructors
//! ├── source.rs       # BatchSource (one pass, inline or parallel)
//! ├── unbounded.rs    # UnboundedIterator
//! ├── workers/
//! │   ├── mod.rs      # Batch task and worker loop
//! │   └── pool.rs     # Generic `WorkerPool<Task, Output>`
//! └── common/
//!     └── thread.rs   # Thread-local worker ID and batch RNG
//! ```
//!
//! # Memory Usage
//! - `num_workers = 0`: O(batch_size)
//! - `num_workers > 0`: O(num_workers x prefetch_factor x batch_size)

mod common;
mod config;
mod loader;
mod source;
mod unbounded;
mod workers;

pub use config::{LoaderConfig, LoaderConfigBuilder};
pub use loader::BatchLoader;
pub use source::BatchSource;
pub use unbounded::UnboundedIterator;

pub use common::thread::{
    init_batch_rng, worker_gen_bool, worker_gen_range, worker_shuffle, WORKER_ID,
};
