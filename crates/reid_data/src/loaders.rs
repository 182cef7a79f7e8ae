//! src/loaders.rs
//!
//! Builds every loader a ReID training run needs from one `ReidConfig`:
//! - an endless identity-balanced training stream (P × K batches)
//! - query and gallery loaders in a fixed order for evaluation

use crate::config::ReidConfig;
use crate::dataloader::{BatchLoader, UnboundedIterator};
use crate::dataset::ReidDataset;
use crate::datasets::{DatasetKind, DatasetSplits, ExtractOptions, Split};
use crate::transforms::{from_path, test_pipeline, train_pipeline};
use anyhow::{Context, Result};
use std::path::Path;

/// Training and evaluation loaders for one configuration.
///
/// # Example
/// ```ignore
/// let mut loaders = ReidLoaders::new(ReidConfig::from_json_file("reid.json")?)?;
/// for step in 0..max_steps {
///     let batch = loaders.train_iter().next_batch()?;
///     // forward/backward on batch.images, batch.labels
/// }
/// for batch in loaders.query_loader().iter()? {
///     let batch = batch?;
/// }
/// ```
pub struct ReidLoaders {
    config: ReidConfig,
    train_kind: DatasetKind,
    test_kind: DatasetKind,
    train: ReidDataset,
    train_iter: UnboundedIterator,
    query_loader: BatchLoader,
    gallery_loader: BatchLoader,
}

impl ReidLoaders {
    /// Extracts the configured splits and builds all loaders.
    ///
    /// Dataset names are validated before any filesystem access; an unknown name
    /// is an `UnknownDataset` error. A split without samples is `EmptyDataset`.
    pub fn new(config: ReidConfig) -> Result<Self> {
        let train_kind = config
            .train_dataset
            .parse::<DatasetKind>()
            .context("Invalid train_dataset")?;
        let test_kind = config
            .test_dataset
            .parse::<DatasetKind>()
            .context("Invalid test_dataset")?;

        let splits = Self::extract_splits(&config, train_kind, test_kind)?;

        let train_transform = from_path(train_pipeline(
            config.image_size,
            config.use_colorjitor,
            config.use_rea,
        )?);
        let train = ReidDataset::new(
            format!("{}/{}", train_kind, Split::Train),
            splits.train,
            train_transform,
        )?;
        let train_iter = BatchLoader::identity_balanced(
            train.clone(),
            config.p,
            config.k,
            config.loader_config(),
        )?
        .into_unbounded();

        let test_transform = from_path(test_pipeline(config.image_size)?);
        let query = ReidDataset::new(
            format!("{}/{}", test_kind, Split::Query),
            splits.query,
            test_transform.clone(),
        )?;
        let gallery = ReidDataset::new(
            format!("{}/{}", test_kind, Split::Gallery),
            splits.gallery,
            test_transform,
        )?;
        let query_loader =
            BatchLoader::sequential(query, config.eval_batch_size, config.loader_config())?;
        let gallery_loader =
            BatchLoader::sequential(gallery, config.eval_batch_size, config.loader_config())?;

        log::info!(
            "train on {} ({} images, {} identities, p={} k={}), test on {}",
            train_kind,
            train.len(),
            train.num_identities(),
            config.p,
            config.k,
            test_kind
        );

        Ok(Self {
            config,
            train_kind,
            test_kind,
            train,
            train_iter,
            query_loader,
            gallery_loader,
        })
    }

    fn root(config: &ReidConfig, kind: DatasetKind) -> &Path {
        match kind {
            DatasetKind::Market => &config.market_path,
            DatasetKind::Duke => &config.duke_path,
            DatasetKind::Msmt => &config.msmt_path,
        }
    }

    /// Training samples are relabelled and grouped; query and gallery keep raw
    /// identities. One benchmark for both sides is extracted in a single pass.
    fn extract_splits(
        config: &ReidConfig,
        train_kind: DatasetKind,
        test_kind: DatasetKind,
    ) -> Result<DatasetSplits> {
        let train_options = ExtractOptions {
            reorder: true,
            combine_all: config.combine_all,
        };
        if train_kind == test_kind {
            return train_kind
                .extractor()
                .extract_splits(Self::root(config, train_kind), &train_options)
                .with_context(|| format!("Failed to extract {} samples", train_kind));
        }

        let raw = ExtractOptions {
            reorder: false,
            ..train_options
        };
        let extract = |kind: DatasetKind, split: Split, options: &ExtractOptions| {
            kind.extractor()
                .extract(Self::root(config, kind), split, options)
                .with_context(|| format!("Failed to extract {} {} samples", kind, split))
        };
        Ok(DatasetSplits {
            train: extract(train_kind, Split::Train, &train_options)?,
            query: extract(test_kind, Split::Query, &raw)?,
            gallery: extract(test_kind, Split::Gallery, &raw)?,
        })
    }

    /// The endless identity-balanced training stream.
    pub fn train_iter(&mut self) -> &mut UnboundedIterator {
        &mut self.train_iter
    }

    /// An endless uniformly shuffled stream over the same training samples and
    /// augmentations, for training without identity balancing.
    pub fn random_train_iter(&self, batch_size: usize) -> Result<UnboundedIterator> {
        Ok(BatchLoader::random(self.train.clone(), batch_size, self.config.loader_config())?
            .into_unbounded())
    }

    pub fn query_loader(&self) -> &BatchLoader {
        &self.query_loader
    }

    pub fn gallery_loader(&self) -> &BatchLoader {
        &self.gallery_loader
    }

    /// Number of classes the training labels range over.
    pub fn num_train_identities(&self) -> usize {
        self.train.num_identities()
    }

    pub fn train_samples(&self) -> &ReidDataset {
        &self.train
    }

    pub fn train_dataset(&self) -> DatasetKind {
        self.train_kind
    }

    pub fn test_dataset(&self) -> DatasetKind {
        self.test_kind
    }

    pub fn config(&self) -> &ReidConfig {
        &self.config
    }
}
