use std::path::{Path, PathBuf};
use tch::Tensor;

/// A single raw record produced by a dataset extractor.
///
/// - `path`: location of the image on disk
/// - `identity`: person label. Training splits are relabeled to `[0, num_identities)`;
///   query/gallery splits keep the benchmark's raw ids (Market junk images use `-1`).
/// - `camera`: camera id, not used for sampling but kept for evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sample {
    pub path: PathBuf,
    pub identity: i64,
    pub camera: i64,
}

impl Sample {
    pub fn new(path: impl Into<PathBuf>, identity: i64, camera: i64) -> Self {
        Self {
            path: path.into(),
            identity,
            camera,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A `Sample` after its image went through the transform pipeline.
///
/// `image` is usually a `[C, H, W]` float tensor. The remaining fields are
/// copied from the source record so a batch can be traced back to disk.
#[derive(Debug)]
pub struct ImageSample {
    pub image: Tensor,
    pub identity: i64,
    pub camera: i64,
    pub path: PathBuf,
}

impl Clone for ImageSample {
    fn clone(&self) -> Self {
        Self {
            image: self.image.shallow_clone(),
            identity: self.identity,
            camera: self.camera,
            path: self.path.clone(),
        }
    }
}
