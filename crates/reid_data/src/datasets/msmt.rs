//! MSMT17.
//!
//! ```text
//! <root>/train/0000/0000_011_01_0303morning_0015_0.jpg
//! <root>/test/...
//! <root>/list_train.txt     relative/path.jpg <identity>
//! <root>/list_val.txt
//! <root>/list_query.txt
//! <root>/list_gallery.txt
//! ```
//!
//! Train and val images live under `train/`, query and gallery under `test/`.
//! The camera is the third `_` field of the file name minus one (0-based).
//! Query and gallery identities are shifted past the training identities so the
//! two ranges never collide.

use super::{
    log_summary, missing_split, relabel_and_group, DatasetSplits, ExtractOptions,
    SampleExtractor, Split,
};
use crate::readers::{DataSource, ListEntry, ListFileSource};
use crate::sample::Sample;
use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::path::Path;

/// MSMT17 extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Msmt17;

const NAME: &str = "msmt";

/// `0000_011_01_0303morning_0015_0.jpg` -> camera `0`.
pub fn parse_msmt_camera(file_name: &str) -> Option<i64> {
    let camera = file_name.split('_').nth(2)?.parse::<i64>().ok()?;
    Some(camera - 1)
}

fn read_list(root: &Path, list_name: &str, image_dir: &str, split: Split) -> Result<Vec<Sample>> {
    let list_path = root.join(list_name);
    if !list_path.is_file() {
        return Err(missing_split(NAME, split, &list_path));
    }

    let image_root = root.join(image_dir);
    ListFileSource::new(&list_path)
        .stream()?
        .map(|entry| -> Result<Sample> {
            let ListEntry {
                relative_path,
                identity,
            } = entry?;
            let camera = relative_path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(parse_msmt_camera)
                .ok_or_else(|| {
                    anyhow!(
                        "cannot read camera id from {} in {}",
                        relative_path.display(),
                        list_path.display()
                    )
                })?;
            Ok(Sample::new(image_root.join(relative_path), identity, camera))
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Failed to read {}", list_path.display()))
}

fn count_identities(samples: &[Sample]) -> i64 {
    samples
        .iter()
        .map(|s| s.identity)
        .collect::<HashSet<_>>()
        .len() as i64
}

/// Train and val lists, both under `train/`.
fn read_train(root: &Path) -> Result<Vec<Sample>> {
    let mut train = read_list(root, "list_train.txt", "train", Split::Train)?;
    train.extend(read_list(root, "list_val.txt", "train", Split::Train)?);
    Ok(train)
}

/// `list_<split>.txt` under `test/`, identities shifted by `offset`.
fn read_test(root: &Path, split: Split, offset: i64) -> Result<Vec<Sample>> {
    let mut samples = read_list(root, &format!("list_{}.txt", split), "test", split)?;
    samples.iter_mut().for_each(|s| s.identity += offset);
    Ok(samples)
}

fn finish_train(
    mut train: Vec<Sample>,
    query: &[Sample],
    gallery: &[Sample],
    options: &ExtractOptions,
) -> Vec<Sample> {
    if options.combine_all {
        train.extend_from_slice(query);
        train.extend_from_slice(gallery);
    }
    if options.reorder {
        train = relabel_and_group(train);
    }
    train
}

impl SampleExtractor for Msmt17 {
    fn name(&self) -> &'static str {
        NAME
    }

    /// Reads only the lists `split` depends on. Query and gallery still need the
    /// training lists for the identity offset.
    fn extract(&self, root: &Path, split: Split, options: &ExtractOptions) -> Result<Vec<Sample>> {
        let train = read_train(root)?;
        let offset = count_identities(&train);
        let samples = match split {
            Split::Train if options.combine_all => {
                let query = read_test(root, Split::Query, offset)?;
                let gallery = read_test(root, Split::Gallery, offset)?;
                finish_train(train, &query, &gallery, options)
            }
            Split::Train => finish_train(train, &[], &[], options),
            Split::Query | Split::Gallery => read_test(root, split, offset)?,
        };
        log_summary(NAME, split, &samples);
        Ok(samples)
    }

    /// Every list is read once.
    fn extract_splits(&self, root: &Path, options: &ExtractOptions) -> Result<DatasetSplits> {
        let train = read_train(root)?;
        let offset = count_identities(&train);
        let query = read_test(root, Split::Query, offset)?;
        let gallery = read_test(root, Split::Gallery, offset)?;
        let train = finish_train(train, &query, &gallery, options);

        log_summary(NAME, Split::Train, &train);
        log_summary(NAME, Split::Query, &query);
        log_summary(NAME, Split::Gallery, &gallery);
        Ok(DatasetSplits {
            train,
            query,
            gallery,
        })
    }
}
