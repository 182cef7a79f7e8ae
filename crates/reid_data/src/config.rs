//! src/config.rs
//!
//! Run configuration for `ReidLoaders`.
//!
//! Built either in code:
//! ```ignore
//! let config = ReidConfig::builder()
//!     .market_path("/data/Market-1501")
//!     .train_dataset("market")
//!     .test_dataset("market")
//!     .p(16)
//!     .k(4)
//!     .build();
//! ```
//! or from JSON, where every field is optional:
//! ```json
//! { "market_path": "/data/Market-1501", "train_dataset": "market", "image_size": [256, 128] }
//! ```
//!
//! Dataset names stay plain strings here and are validated by `ReidLoaders::new`.

use crate::dataloader::LoaderConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReidConfig {
    /// `(height, width)` of every output image
    pub image_size: (u32, u32),
    /// Color jitter in the training pipeline
    pub use_colorjitor: bool,
    /// Random erasing in the training pipeline
    pub use_rea: bool,
    pub market_path: PathBuf,
    pub duke_path: PathBuf,
    pub msmt_path: PathBuf,
    /// MSMT17 only: train on train + val + query + gallery
    pub combine_all: bool,
    pub train_dataset: String,
    pub test_dataset: String,
    /// Identities per training batch
    pub p: usize,
    /// Images per identity per training batch
    pub k: usize,
    /// Loader threads per loader (0 = load on the calling thread)
    pub num_workers: usize,
    pub prefetch_factor: usize,
    /// Batch size of the query and gallery loaders
    pub eval_batch_size: usize,
    /// Seed for sampling plans and augmentations; drawn at random when absent
    pub seed: Option<u64>,
}

impl Default for ReidConfig {
    fn default() -> Self {
        Self {
            image_size: (256, 128),
            use_colorjitor: false,
            use_rea: false,
            market_path: PathBuf::from("Market-1501"),
            duke_path: PathBuf::from("DukeMTMC-reID"),
            msmt_path: PathBuf::from("MSMT17"),
            combine_all: false,
            train_dataset: "market".to_string(),
            test_dataset: "market".to_string(),
            p: 16,
            k: 4,
            num_workers: 8,
            prefetch_factor: 2,
            eval_batch_size: 128,
            seed: None,
        }
    }
}

impl ReidConfig {
    pub fn builder() -> ReidConfigBuilder {
        ReidConfigBuilder::default()
    }

    /// Reads a JSON file; missing fields take their default value.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Worker settings shared by every loader built from this config.
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig::builder()
            .num_workers(self.num_workers)
            .prefetch_factor(self.prefetch_factor)
            .maybe_seed(self.seed)
            .build()
    }
}

/// Builder for ReidConfig with method chaining
#[derive(Default)]
pub struct ReidConfigBuilder {
    config: ReidConfig,
}

impl ReidConfigBuilder {
    /// Output size as `(height, width)`
    pub fn image_size(mut self, height: u32, width: u32) -> Self {
        self.config.image_size = (height, width);
        self
    }

    pub fn use_colorjitor(mut self, enabled: bool) -> Self {
        self.config.use_colorjitor = enabled;
        self
    }

    pub fn use_rea(mut self, enabled: bool) -> Self {
        self.config.use_rea = enabled;
        self
    }

    pub fn market_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.market_path = path.into();
        self
    }

    pub fn duke_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.duke_path = path.into();
        self
    }

    pub fn msmt_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.msmt_path = path.into();
        self
    }

    pub fn combine_all(mut self, enabled: bool) -> Self {
        self.config.combine_all = enabled;
        self
    }

    pub fn train_dataset(mut self, name: impl Into<String>) -> Self {
        self.config.train_dataset = name.into();
        self
    }

    pub fn test_dataset(mut self, name: impl Into<String>) -> Self {
        self.config.test_dataset = name.into();
        self
    }

    pub fn p(mut self, p: usize) -> Self {
        self.config.p = p;
        self
    }

    pub fn k(mut self, k: usize) -> Self {
        self.config.k = k;
        self
    }

    pub fn num_workers(mut self, workers: usize) -> Self {
        self.config.num_workers = workers;
        self
    }

    pub fn prefetch_factor(mut self, factor: usize) -> Self {
        self.config.prefetch_factor = factor;
        self
    }

    pub fn eval_batch_size(mut self, size: usize) -> Self {
        self.config.eval_batch_size = size;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn build(self) -> ReidConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn json_fields_override_defaults() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"{{ "msmt_path": "/data/MSMT17", "train_dataset": "msmt", "combine_all": true,
                 "image_size": [384, 128], "p": 8, "seed": 3 }}"#
        )?;

        let config = ReidConfig::from_json_file(file.path())?;
        assert_eq!(config.msmt_path, PathBuf::from("/data/MSMT17"));
        assert_eq!(config.train_dataset, "msmt");
        assert!(config.combine_all);
        assert_eq!(config.image_size, (384, 128));
        assert_eq!(config.p, 8);
        assert_eq!(config.k, 4);
        assert_eq!(config.eval_batch_size, 128);
        assert_eq!(config.seed, Some(3));
        Ok(())
    }

    #[test]
    fn invalid_json_names_the_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "{{ \"p\": \"sixteen\" }}")?;
        let err = ReidConfig::from_json_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
        Ok(())
    }

    #[test]
    fn builder_and_loader_config() {
        let config = ReidConfig::builder()
            .image_size(128, 64)
            .num_workers(0)
            .prefetch_factor(4)
            .seed(11)
            .build();
        assert_eq!(config.image_size, (128, 64));

        let loader = config.loader_config();
        assert_eq!(loader.num_workers, 0);
        assert_eq!(loader.prefetch_factor, 4);
        assert_eq!(loader.seed, Some(11));
    }
}
