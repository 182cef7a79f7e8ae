pub mod config;
pub mod dataloader;
pub mod dataset;
pub mod datasets;
pub mod error;
pub mod index;
pub mod loaders;
pub mod minibatch;
pub mod readers;
pub mod sample;
pub mod sampler;
pub mod transforms;

pub use config::{ReidConfig, ReidConfigBuilder};
pub use dataloader::{BatchLoader, BatchSource, LoaderConfig, UnboundedIterator};
pub use dataset::ReidDataset;
pub use datasets::{DatasetKind, ExtractOptions, SampleExtractor, Split};
pub use error::ReidDataError;
pub use index::SampleIndex;
pub use loaders::ReidLoaders;
pub use minibatch::MiniBatch;
pub use sample::{ImageSample, Sample};
pub use sampler::{
    plan_with_rng, BatchSampler, IdentityBalancedSampler, RandomSampler, Sampler,
    SequentialSampler,
};
pub use transforms::Transform;
