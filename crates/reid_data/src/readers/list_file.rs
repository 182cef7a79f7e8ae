use super::DataSource;
use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

/// One `relative/path.jpg <identity>` line of an image list file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub relative_path: PathBuf,
    pub identity: i64,
}

/// Reads image list files line by line. Skips blank lines.
///
/// Each line holds a path relative to the image root and an integer identity,
/// separated by whitespace. A malformed line is an error naming the file and
/// line number.
///
/// # Example
/// ```ignore
/// let source = ListFileSource::new("MSMT17/list_train.txt");
/// for entry in source.stream()? {
///     let ListEntry { relative_path, identity } = entry?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ListFileSource {
    path: PathBuf,
}

impl ListFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse_line(text: &str) -> Result<ListEntry> {
        let mut fields = text.split_whitespace();
        let relative_path = fields.next().ok_or_else(|| anyhow!("missing image path"))?;
        let identity = fields
            .next()
            .ok_or_else(|| anyhow!("missing identity"))?
            .parse::<i64>()
            .context("identity is not an integer")?;
        Ok(ListEntry {
            relative_path: PathBuf::from(relative_path),
            identity,
        })
    }
}

impl DataSource<ListEntry> for ListFileSource {
    fn stream(&self) -> Result<Box<dyn Iterator<Item = Result<ListEntry>> + Send>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open list file: {}", self.path.display()))?;

        let path = self.path.clone();
        let iter = BufReader::new(file)
            .lines()
            .enumerate()
            .filter_map(move |(line_num, line)| match line {
                Ok(text) if text.trim().is_empty() => None, // Skip blank lines
                Ok(text) => Some(Self::parse_line(&text).with_context(|| {
                    format!("{}:{}: malformed line '{}'", path.display(), line_num + 1, text)
                })),
                Err(e) => Some(Err(e).with_context(|| {
                    format!("Error reading {} line {}", path.display(), line_num + 1)
                })),
            });
        Ok(Box::new(iter))
    }
}
