//! Filesystem readers used by the dataset extractors.

pub mod image_dir;
pub mod list_file;

pub use image_dir::ImageDirSource;
pub use list_file::{ListEntry, ListFileSource};

use anyhow::Result;

/// A source of records read lazily from disk.
///
/// Every item is a `Result` so a single unreadable entry can be reported with
/// its location without aborting the whole scan up front.
pub trait DataSource<T>: Send + Sync {
    fn stream(&self) -> Result<Box<dyn Iterator<Item = Result<T>> + Send>>;
}
