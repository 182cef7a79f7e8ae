use super::DataSource;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Streams image file paths from a directory, with optional recursion and
/// extension filtering. Only paths are produced; image bytes are read later by
/// the transform pipeline.
///
/// Entries are visited in file-name order, so two scans of the same directory
/// always produce the same sequence.
///
/// # Example
/// ```ignore
/// let source = ImageDirSource::new("Market-1501/query", &["jpg"], false);
/// for path in source.stream()? {
///     let path = path?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ImageDirSource {
    dir_path: PathBuf,
    extensions: Vec<String>,
    recurse: bool,
}

impl ImageDirSource {
    /// Creates a new image directory source.
    ///
    /// # Arguments
    /// - `dir_path`: Directory to scan.
    /// - `extensions`: File extensions to include (e.g., `["jpg", "png"]`). Case-insensitive.
    /// - `recurse`: If `true`, scans subdirectories recursively.
    pub fn new(dir_path: impl Into<PathBuf>, extensions: &[&str], recurse: bool) -> Self {
        Self {
            dir_path: dir_path.into(),
            extensions: extensions.iter().map(|s| s.to_lowercase()).collect(),
            recurse,
        }
    }

    /// Collects all matching paths.
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        self.stream()?
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Failed to scan {}", self.dir_path.display()))
    }
}

impl DataSource<PathBuf> for ImageDirSource {
    fn stream(&self) -> Result<Box<dyn Iterator<Item = Result<PathBuf>> + Send>> {
        // Early validation: ensure the directory exists and is indeed a directory.
        let dir_metadata = fs::metadata(&self.dir_path)
            .with_context(|| format!("Failed to access directory: {}", self.dir_path.display()))?;
        if !dir_metadata.is_dir() {
            bail!("Path is not a directory: {}", self.dir_path.display());
        }

        let mut walker = WalkDir::new(&self.dir_path)
            .min_depth(1)
            .sort_by_file_name();
        if !self.recurse {
            walker = walker.max_depth(1);
        }

        let extensions = self.extensions.clone();
        let iter = walker.into_iter().filter_map(move |entry| match entry {
            Ok(entry) if entry.file_type().is_file() => {
                let extension_matches = entry
                    .path()
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| extensions.contains(&e.to_lowercase()));
                extension_matches.then(|| Ok(entry.into_path()))
            }
            Ok(_) => None, // Directories and symlinks
            Err(e) => Some(Err(e).context("Failed to read directory entry")),
        });
        Ok(Box::new(iter))
    }
}
