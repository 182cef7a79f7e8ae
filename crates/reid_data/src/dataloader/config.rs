//! src/dataloader/config.rs
//!
//! Worker-pool settings for `BatchLoader`.
//!
//! Example:
//! ```ignore
//! let config = LoaderConfig::builder()
//!     .num_workers(8)
//!     .prefetch_factor(2)
//!     .seed(42)
//!     .build();
//! ```
//!
//! # Performance considerations:
//! - `num_workers`: More workers can improve throughput but increase memory usage
//! - `prefetch_factor`: Higher values reduce GPU starvation but use more memory

use anyhow::{ensure, Result};
use std::time::Duration;

/// Configuration for `BatchLoader`
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of parallel workers (0 = batches are loaded on the calling thread)
    pub num_workers: usize,
    /// Number of batches in flight per worker (must be >0 when using workers)
    pub prefetch_factor: usize,
    /// Seed for the sampling plan and random transforms. `None` draws one at
    /// loader construction and logs it.
    pub seed: Option<u64>,
    /// Maximum time to wait for the next batch from workers.
    /// If exceeded, the pass reports an error (assuming workers are stuck). Default: 30s
    pub timeout: Duration,
    /// How often idle workers check for the shutdown signal.
    /// Not an error timeout - just a polling interval. Default: 100ms.
    pub worker_timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            num_workers: 0,
            prefetch_factor: 2,
            seed: None,
            timeout: Duration::from_secs(30),
            worker_timeout: Duration::from_millis(100),
        }
    }
}

impl LoaderConfig {
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::default()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(
            self.num_workers == 0 || self.prefetch_factor > 0,
            "Prefetch factor must be > 0 when using {} workers",
            self.num_workers
        );
        ensure!(!self.timeout.is_zero(), "Batch timeout must be non-zero");
        ensure!(
            !self.worker_timeout.is_zero(),
            "Worker polling interval must be non-zero"
        );
        Ok(())
    }
}

/// Builder for LoaderConfig with method chaining
#[derive(Default)]
pub struct LoaderConfigBuilder {
    config: LoaderConfig,
}

impl LoaderConfigBuilder {
    /// Set the number of workers
    pub fn num_workers(mut self, workers: usize) -> Self {
        self.config.num_workers = workers;
        self
    }

    /// Set the prefetch factor.
    /// Higher values help prevent GPU starvation but use more memory.
    pub fn prefetch_factor(mut self, factor: usize) -> Self {
        self.config.prefetch_factor = factor;
        self
    }

    /// Set the random seed for reproducible loading.
    ///
    /// When set, this seed controls:
    /// - The sampling plan of every epoch
    /// - Random transforms in workers
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Same as [`seed`](Self::seed) but accepts an optional value.
    pub fn maybe_seed(mut self, seed: Option<u64>) -> Self {
        self.config.seed = seed;
        self
    }

    /// Set the timeout for receiving a batch.
    ///
    /// - Too low: May fail batches during legitimate heavy processing
    /// - Too high: Delays detection of stuck workers.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the worker polling interval
    pub fn worker_timeout(mut self, worker_timeout: Duration) -> Self {
        self.config.worker_timeout = worker_timeout;
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> LoaderConfig {
        self.config
    }
}
