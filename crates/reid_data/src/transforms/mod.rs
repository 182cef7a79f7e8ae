pub mod core;
pub mod pipelines;
pub mod vision;

pub use core::{Chain, Transform};
pub use pipelines::{from_path, test_pipeline, train_pipeline, SampleTransform};
