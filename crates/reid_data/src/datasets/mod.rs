//! Per-benchmark sample extractors.
//!
//! Each supported benchmark is a [`DatasetKind`] variant mapped to a
//! [`SampleExtractor`] that turns an on-disk layout into ordered `Sample` records.
//!
//! ```text
//! datasets/
//! ├── bounding_box.rs → Market-1501, DukeMTMC-reID (identity/camera in file names)
//! └── msmt.rs         → MSMT17 (list files)
//! ```
//!
//! # Example
//! ```ignore
//! let kind: DatasetKind = "market".parse()?;
//! let splits = kind.extractor().extract_splits(Path::new("/data/Market-1501"), &ExtractOptions::default())?;
//! ```

pub mod bounding_box;
pub mod msmt;

pub use bounding_box::{DukeMtmcReid, Market1501};
pub use msmt::Msmt17;

use crate::error::ReidDataError;
use crate::sample::Sample;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Supported re-identification benchmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Market,
    Duke,
    Msmt,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 3] = [DatasetKind::Market, DatasetKind::Duke, DatasetKind::Msmt];

    pub fn name(&self) -> &'static str {
        match self {
            DatasetKind::Market => "market",
            DatasetKind::Duke => "duke",
            DatasetKind::Msmt => "msmt",
        }
    }

    /// The extractor that understands this benchmark's layout.
    pub fn extractor(&self) -> Box<dyn SampleExtractor> {
        match self {
            DatasetKind::Market => Box::new(Market1501),
            DatasetKind::Duke => Box::new(DukeMtmcReid),
            DatasetKind::Msmt => Box::new(Msmt17),
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatasetKind {
    type Err = ReidDataError;

    /// Case-insensitive; also accepts the full benchmark names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market" | "market1501" | "market-1501" => Ok(DatasetKind::Market),
            "duke" | "dukemtmc" | "dukemtmc-reid" => Ok(DatasetKind::Duke),
            "msmt" | "msmt17" => Ok(DatasetKind::Msmt),
            _ => Err(ReidDataError::UnknownDataset {
                name: s.to_string(),
            }),
        }
    }
}

/// A benchmark split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Query,
    Gallery,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Split::Train => "train",
            Split::Query => "query",
            Split::Gallery => "gallery",
        })
    }
}

/// Extraction switches.
///
/// - `reorder`: relabel identities to `0..n` (ascending by raw id) and group the
///   samples by identity. Otherwise raw ids are kept in file-name order.
/// - `combine_all`: for MSMT17, train on train + val + query + gallery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    pub reorder: bool,
    pub combine_all: bool,
}

/// The three splits of one benchmark.
#[derive(Debug, Clone, Default)]
pub struct DatasetSplits {
    pub train: Vec<Sample>,
    pub query: Vec<Sample>,
    pub gallery: Vec<Sample>,
}

/// Turns a benchmark's on-disk layout into ordered samples.
///
/// An empty result is not an error here; a split directory that does not exist
/// is reported as `EmptyDataset`.
pub trait SampleExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, root: &Path, split: Split, options: &ExtractOptions) -> Result<Vec<Sample>>;

    /// Train with `options`, query and gallery with raw identities.
    fn extract_splits(&self, root: &Path, options: &ExtractOptions) -> Result<DatasetSplits> {
        let raw = ExtractOptions {
            reorder: false,
            ..*options
        };
        Ok(DatasetSplits {
            train: self.extract(root, Split::Train, options)?,
            query: self.extract(root, Split::Query, &raw)?,
            gallery: self.extract(root, Split::Gallery, &raw)?,
        })
    }
}

/// Relabels identities to `0..n` in ascending raw order and groups samples by
/// identity, keeping the relative order inside each identity.
pub fn relabel_and_group(samples: Vec<Sample>) -> Vec<Sample> {
    let mut groups: BTreeMap<i64, Vec<Sample>> = BTreeMap::new();
    for sample in samples {
        groups.entry(sample.identity).or_default().push(sample);
    }
    groups
        .into_values()
        .enumerate()
        .flat_map(|(label, group)| {
            group.into_iter().map(move |sample| Sample {
                identity: label as i64,
                ..sample
            })
        })
        .collect()
}

pub(crate) fn log_summary(dataset: &str, split: Split, samples: &[Sample]) {
    let mut identities: Vec<i64> = samples.iter().map(|s| s.identity).collect();
    identities.sort_unstable();
    identities.dedup();
    log::info!(
        "{}/{}: {} images, {} identities",
        dataset,
        split,
        samples.len(),
        identities.len()
    );
}

pub(crate) fn missing_split(dataset: &str, split: Split, path: &Path) -> anyhow::Error {
    ReidDataError::empty(format!("{}/{} ({} not found)", dataset, split, path.display())).into()
}
