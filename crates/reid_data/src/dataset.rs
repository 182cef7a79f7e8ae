use crate::error::ReidDataError;
use crate::index::SampleIndex;
use crate::minibatch::MiniBatch;
use crate::sample::{ImageSample, Sample};
use crate::transforms::SampleTransform;
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;

/// An immutable split of a ReID benchmark together with its preprocessing.
///
/// Samples are stored in contiguous memory behind an `Arc<[Sample]>`, and the
/// transform sits behind an `Arc`, so:
/// - cloning only bumps two reference counts
/// - worker threads read the same records concurrently (`Send + Sync`)
///
/// Positions (`0..len()`) are the currency of samplers and loaders.
#[derive(Clone)]
pub struct ReidDataset {
    name: String,
    samples: Arc<[Sample]>,
    transform: SampleTransform,
}

impl std::fmt::Debug for ReidDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReidDataset")
            .field("name", &self.name)
            .field("len", &self.samples.len())
            .finish_non_exhaustive()
    }
}

impl ReidDataset {
    /// Creates a dataset; an empty sample list is an `EmptyDataset` error naming `name`.
    pub fn new(name: impl Into<String>, samples: Vec<Sample>, transform: SampleTransform) -> Result<Self> {
        let name = name.into();
        if samples.is_empty() {
            return Err(ReidDataError::empty(name).into());
        }
        Ok(Self {
            name,
            samples: samples.into(),
            transform,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn get(&self, position: usize) -> Option<&Sample> {
        self.samples.get(position)
    }

    /// Builds the identity index over this dataset's samples.
    pub fn index(&self) -> Result<SampleIndex> {
        SampleIndex::build(&self.samples)
            .with_context(|| format!("Failed to index dataset '{}'", self.name))
    }

    /// Number of distinct identities.
    pub fn num_identities(&self) -> usize {
        let mut identities: Vec<i64> = self.samples.iter().map(|s| s.identity).collect();
        identities.sort_unstable();
        identities.dedup();
        identities.len()
    }

    /// Reads and transforms one sample.
    ///
    /// Any failure (missing file, decode error, transform error) is reported as
    /// `ReidDataError::SampleLoad` naming the sample's path.
    pub fn load(&self, position: usize) -> Result<ImageSample> {
        let sample = self.samples.get(position).ok_or_else(|| {
            anyhow!(
                "Position {} is out of bounds for dataset '{}' of size {}",
                position,
                self.name,
                self.samples.len()
            )
        })?;

        let image = self
            .transform
            .apply(sample.path.clone())
            .map_err(|err| ReidDataError::SampleLoad {
                path: sample.path.clone(),
                reason: format!("{:#}", err),
            })?;

        Ok(ImageSample {
            image,
            identity: sample.identity,
            camera: sample.camera,
            path: sample.path.clone(),
        })
    }

    /// Loads `positions` in order and collates them into one batch.
    /// A single failing sample fails the whole batch.
    pub fn load_batch(&self, positions: &[usize]) -> Result<MiniBatch> {
        let samples = positions
            .iter()
            .map(|&position| self.load(position))
            .collect::<Result<Vec<_>>>()?;
        MiniBatch::collate(&samples)
    }
}
