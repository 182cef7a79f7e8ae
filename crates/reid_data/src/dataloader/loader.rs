//! src/dataloader/loader.rs
//!
//! `BatchLoader` constructors for the different batching strategies.
//!
//! # Constructor Overview
//! - `identity_balanced()` - P identities × K instances per batch (metric learning)
//! - `random()` - uniform shuffle, incomplete tail kept
//! - `sequential()` - dataset order, tail kept (query/gallery evaluation)
//! - `with_batch_sampler()` - any user-provided batch sampler
//!
//! # Seed Coordination
//!
//! One seed drives both the sampling plan (seed and epoch) and the random
//! transforms (seed, epoch and batch index), each on its own RNG stream. When `LoaderConfig::seed` is `None`
//! a seed is drawn once at construction and logged so the run can be replayed.

use crate::dataset::ReidDataset;
use crate::error::ReidDataError;
use crate::sampler::{
    BatchSampler, IdentityBalancedSampler, RandomSampler, Sampler, SequentialSampler,
};
use anyhow::{Context, Result};
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::config::LoaderConfig;
use super::source::BatchSource;
use super::unbounded::UnboundedIterator;

type BoxedBatchSampler = Box<dyn Sampler<Item = Vec<usize>>>;

/// Coordinates a dataset, a batch sampler and the worker settings.
///
/// Each call to [`iter`](Self::iter) starts a new epoch: the epoch counter is
/// advanced, the sampler produces a fresh plan and a [`BatchSource`] walks it.
///
/// # Thread safety:
/// - `BatchLoader` is `Send + Sync`
/// - a `BatchSource` is consumed by a single thread
pub struct BatchLoader {
    dataset: ReidDataset,
    batch_sampler: BoxedBatchSampler,
    config: LoaderConfig,
    current_epoch: AtomicUsize,
    runtime_seed: u64,
}

impl std::fmt::Debug for BatchLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchLoader")
            .field("dataset", &self.dataset)
            .field("config", &self.config)
            .field("epoch", &self.epoch())
            .field("seed", &self.runtime_seed)
            .finish_non_exhaustive()
    }
}

impl BatchLoader {
    /// Identity-balanced training loader.
    ///
    /// Every batch holds `p` distinct identities with `k` samples each (after the
    /// clamping policy of [`IdentityBalancedSampler`]).
    ///
    /// # Example
    /// ```ignore
    /// let config = LoaderConfig::builder().num_workers(8).seed(42).build();
    /// let loader = BatchLoader::identity_balanced(train, 16, 4, config)?;
    /// let mut batches = loader.into_unbounded();
    /// let batch = batches.next_batch()?; // 64 images
    /// ```
    pub fn identity_balanced(
        dataset: ReidDataset,
        p: usize,
        k: usize,
        config: LoaderConfig,
    ) -> Result<Self> {
        let seed = resolve_seed(&config, dataset.name());
        let index = dataset.index()?;
        let sampler = IdentityBalancedSampler::new(index, p, k, seed).with_context(|| {
            format!(
                "Failed to build identity-balanced sampler for '{}'",
                dataset.name()
            )
        })?;
        let batch_size = sampler.batch_size();
        let batch_sampler = BatchSampler::new(sampler, batch_size, true)?;
        Self::build(dataset, Box::new(batch_sampler), config, seed)
    }

    /// Uniformly shuffled loader; the incomplete last batch is kept.
    pub fn random(dataset: ReidDataset, batch_size: usize, config: LoaderConfig) -> Result<Self> {
        check_batch_size(batch_size)?;
        let seed = resolve_seed(&config, dataset.name());
        let sampler = RandomSampler::new(dataset.len(), seed)?;
        let batch_sampler = BatchSampler::new(sampler, batch_size, false)?;
        Self::build(dataset, Box::new(batch_sampler), config, seed)
    }

    /// Loader in dataset order; every pass yields the same batches.
    pub fn sequential(
        dataset: ReidDataset,
        batch_size: usize,
        config: LoaderConfig,
    ) -> Result<Self> {
        check_batch_size(batch_size)?;
        let seed = resolve_seed(&config, dataset.name());
        let sampler = SequentialSampler::new(dataset.len());
        let batch_sampler = BatchSampler::new(sampler, batch_size, false)?;
        Self::build(dataset, Box::new(batch_sampler), config, seed)
    }

    /// Loader driven by a custom batch sampler.
    ///
    /// The sampler is responsible for its own seeding; `config.seed` still seeds
    /// the random transforms.
    pub fn with_batch_sampler(
        dataset: ReidDataset,
        batch_sampler: impl Sampler<Item = Vec<usize>> + 'static,
        config: LoaderConfig,
    ) -> Result<Self> {
        let seed = resolve_seed(&config, dataset.name());
        Self::build(dataset, Box::new(batch_sampler), config, seed)
    }

    fn build(
        dataset: ReidDataset,
        batch_sampler: BoxedBatchSampler,
        config: LoaderConfig,
        runtime_seed: u64,
    ) -> Result<Self> {
        config
            .validate()
            .with_context(|| format!("Invalid loader config for '{}'", dataset.name()))?;
        Ok(Self {
            dataset,
            batch_sampler,
            config,
            current_epoch: AtomicUsize::new(0),
            runtime_seed,
        })
    }

    /// Starts the next epoch and returns its finite batch source.
    pub fn iter(&self) -> Result<BatchSource> {
        let epoch = self.current_epoch.fetch_add(1, Ordering::Relaxed);
        self.iter_epoch(epoch)
    }

    /// Batch source for a specific epoch, without advancing the counter.
    pub fn iter_epoch(&self, epoch: usize) -> Result<BatchSource> {
        let plan: Vec<Vec<usize>> = self.batch_sampler.iter(epoch).collect();
        BatchSource::new(
            self.dataset.clone(),
            plan,
            epoch,
            self.runtime_seed,
            &self.config,
        )
        .with_context(|| {
            format!(
                "Failed to start epoch {} for '{}'",
                epoch,
                self.dataset.name()
            )
        })
    }

    /// Wraps the loader into an iterator that never runs out of batches.
    pub fn into_unbounded(self) -> UnboundedIterator {
        UnboundedIterator::new(self)
    }

    /// Number of epochs started so far.
    pub fn epoch(&self) -> usize {
        self.current_epoch.load(Ordering::Relaxed)
    }

    pub fn seed(&self) -> u64 {
        self.runtime_seed
    }

    pub fn dataset(&self) -> &ReidDataset {
        &self.dataset
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }
}

fn check_batch_size(batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(ReidDataError::InvalidBatchSize { batch_size }.into());
    }
    Ok(())
}

fn resolve_seed(config: &LoaderConfig, dataset_name: &str) -> u64 {
    match config.seed {
        Some(seed) => seed,
        None => {
            let seed = rand::rng().random();
            log::info!(
                "no seed configured for '{}'; using randomly drawn seed {}",
                dataset_name,
                seed
            );
            seed
        }
    }
}
