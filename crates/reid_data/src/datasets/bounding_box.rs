//! Market-1501 and DukeMTMC-reID.
//!
//! Both benchmarks share the same layout and naming scheme:
//!
//! ```text
//! <root>/bounding_box_train/0002_c1s1_000451_03.jpg   (Market)
//! <root>/query/0005_c2_f0046985.jpg                   (Duke)
//! <root>/bounding_box_test/-1_c3s2_000100_02.jpg      (junk, identity -1)
//! ```
//!
//! The identity is the integer before the first `_`; the camera is the number
//! following the `c` of the second field. Camera ids are kept as written (1-based).

use super::{log_summary, missing_split, relabel_and_group, ExtractOptions, SampleExtractor, Split};
use crate::readers::ImageDirSource;
use crate::sample::Sample;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Market-1501 extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Market1501;

/// DukeMTMC-reID extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct DukeMtmcReid;

impl SampleExtractor for Market1501 {
    fn name(&self) -> &'static str {
        "market"
    }

    fn extract(&self, root: &Path, split: Split, options: &ExtractOptions) -> Result<Vec<Sample>> {
        extract_split(self.name(), root, split, options)
    }
}

impl SampleExtractor for DukeMtmcReid {
    fn name(&self) -> &'static str {
        "duke"
    }

    fn extract(&self, root: &Path, split: Split, options: &ExtractOptions) -> Result<Vec<Sample>> {
        extract_split(self.name(), root, split, options)
    }
}

fn split_dir(root: &Path, split: Split) -> PathBuf {
    root.join(match split {
        Split::Train => "bounding_box_train",
        Split::Query => "query",
        Split::Gallery => "bounding_box_test",
    })
}

/// `0002_c1s1_000451_03.jpg` -> `(2, 1)`, `-1_c3_f00.jpg` -> `(-1, 3)`.
pub fn parse_bounding_box_name(file_name: &str) -> Option<(i64, i64)> {
    let mut fields = file_name.split('_');
    let identity = fields.next()?.parse::<i64>().ok()?;
    let camera_field = fields.next()?.strip_prefix('c')?;
    let digits_end = camera_field
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(camera_field.len());
    let camera = camera_field[..digits_end].parse::<i64>().ok()?;
    Some((identity, camera))
}

fn extract_split(
    dataset: &str,
    root: &Path,
    split: Split,
    options: &ExtractOptions,
) -> Result<Vec<Sample>> {
    let dir = split_dir(root, split);
    if !dir.is_dir() {
        return Err(missing_split(dataset, split, &dir));
    }

    let paths = ImageDirSource::new(&dir, &["jpg"], false)
        .scan()
        .with_context(|| format!("Failed to list {}/{}", dataset, split))?;

    let mut samples = Vec::with_capacity(paths.len());
    for path in paths {
        let parsed = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(parse_bounding_box_name);
        match parsed {
            Some((identity, camera)) => samples.push(Sample::new(path, identity, camera)),
            None => log::warn!(
                "{}/{}: skipping {} (name does not match <id>_c<camera>_...)",
                dataset,
                split,
                path.display()
            ),
        }
    }

    if options.reorder {
        samples = relabel_and_group(samples);
    }
    log_summary(dataset, split, &samples);
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReidDataError;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn parses_market_and_duke_names() {
        assert_eq!(parse_bounding_box_name("0002_c1s1_000451_03.jpg"), Some((2, 1)));
        assert_eq!(parse_bounding_box_name("1501_c6s4_001877_02.jpg"), Some((1501, 6)));
        assert_eq!(parse_bounding_box_name("-1_c3s2_000100_02.jpg"), Some((-1, 3)));
        assert_eq!(parse_bounding_box_name("0000_c5s3_000001_00.jpg"), Some((0, 5)));
        assert_eq!(parse_bounding_box_name("0005_c2_f0046985.jpg"), Some((5, 2)));
        assert_eq!(parse_bounding_box_name("Thumbs.db"), None);
        assert_eq!(parse_bounding_box_name("0005_x2_f0046985.jpg"), None);
    }

    fn touch_all(dir: &Path, names: &[&str]) -> Result<()> {
        fs::create_dir_all(dir)?;
        for name in names {
            File::create(dir.join(name))?;
        }
        Ok(())
    }

    #[test]
    fn reorder_relabels_train_split() -> Result<()> {
        let root = tempdir()?;
        touch_all(
            &root.path().join("bounding_box_train"),
            &[
                "0007_c1s1_000001_00.jpg",
                "0002_c2s1_000002_00.jpg",
                "0007_c3s1_000003_00.jpg",
                "notes.txt",
                "garbage.jpg",
            ],
        )?;

        let options = ExtractOptions {
            reorder: true,
            ..Default::default()
        };
        let samples = Market1501.extract(root.path(), Split::Train, &options)?;
        let summary: Vec<_> = samples.iter().map(|s| (s.identity, s.camera)).collect();
        assert_eq!(summary, vec![(0, 2), (1, 1), (1, 3)]);
        Ok(())
    }

    #[test]
    fn query_keeps_raw_identities_in_name_order() -> Result<()> {
        let root = tempdir()?;
        touch_all(
            &root.path().join("query"),
            &["0005_c2_f0046985.jpg", "0001_c1_f0000001.jpg", "-1_c4_f0000002.jpg"],
        )?;

        let samples = DukeMtmcReid.extract(root.path(), Split::Query, &ExtractOptions::default())?;
        let identities: Vec<_> = samples.iter().map(|s| s.identity).collect();
        assert_eq!(identities, vec![-1, 1, 5]);
        assert!(samples[0].path.ends_with("query/-1_c4_f0000002.jpg"));
        Ok(())
    }

    #[test]
    fn missing_directory_is_empty_dataset() -> Result<()> {
        let root = tempdir()?;
        let err = Market1501
            .extract(root.path(), Split::Gallery, &ExtractOptions::default())
            .unwrap_err();
        assert!(matches!(
            ReidDataError::find(&err),
            Some(ReidDataError::EmptyDataset { .. })
        ));
        Ok(())
    }
}
