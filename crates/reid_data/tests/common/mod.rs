#![allow(dead_code)]

use anyhow::{anyhow, Context, Result};
use image::{Rgb, RgbImage};
use reid_data::dataloader::worker_gen_range;
use reid_data::transforms::Transform;
use reid_data::{MiniBatch, ReidConfig, ReidConfigBuilder, ReidDataset, Sample};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tch::Tensor;

/// Writes a small solid-color JPEG, creating parent directories.
pub fn write_jpg(path: &Path, shade: u8) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    RgbImage::from_pixel(16, 32, Rgb([shade, 255 - shade, 128]))
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Market-1501 layout. Raw identity `i + 1` gets `train_counts[i]` training images,
/// one query image and two gallery images. The gallery also holds one junk (`-1`) image.
pub fn market_tree(root: &Path, train_counts: &[usize]) -> Result<()> {
    for (i, &count) in train_counts.iter().enumerate() {
        let id = i + 1;
        let shade = (id * 20) as u8;
        for n in 0..count {
            let name = format!("{:04}_c{}s1_{:06}_00.jpg", id, n % 6 + 1, n);
            write_jpg(&root.join("bounding_box_train").join(name), shade)?;
        }
        let name = format!("{:04}_c1s2_000000_00.jpg", id);
        write_jpg(&root.join("query").join(name), shade)?;
        for n in 0..2 {
            let name = format!("{:04}_c{}s3_{:06}_00.jpg", id, n + 2, n);
            write_jpg(&root.join("bounding_box_test").join(name), shade)?;
        }
    }
    write_jpg(&root.join("bounding_box_test").join("-1_c1s1_000000_00.jpg"), 0)
}

/// DukeMTMC-reID layout, same shape as [`market_tree`] with Duke file names.
pub fn duke_tree(root: &Path, train_counts: &[usize]) -> Result<()> {
    for (i, &count) in train_counts.iter().enumerate() {
        let id = i + 1;
        let shade = (id * 30) as u8;
        for n in 0..count {
            let name = format!("{:04}_c{}_f{:07}.jpg", id, n % 8 + 1, n);
            write_jpg(&root.join("bounding_box_train").join(name), shade)?;
        }
        let name = format!("{:04}_c1_f0000000.jpg", id);
        write_jpg(&root.join("query").join(name), shade)?;
        for n in 0..2 {
            let name = format!("{:04}_c{}_f{:07}.jpg", id, n + 2, n);
            write_jpg(&root.join("bounding_box_test").join(name), shade)?;
        }
    }
    Ok(())
}

fn msmt_name(id: usize, n: usize) -> String {
    format!("{:04}/{:04}_{:03}_{:02}_0303morning_{:04}_0.jpg", id, id, n, n % 15 + 1, n)
}

/// MSMT17 layout. Identity `i` gets `train_counts[i]` images under `train/`, the last
/// one listed in `list_val.txt`. Test identities `0..n` get one query and two gallery
/// images under `test/`.
pub fn msmt_tree(root: &Path, train_counts: &[usize]) -> Result<()> {
    let mut train_list = String::new();
    let mut val_list = String::new();
    let mut query_list = String::new();
    let mut gallery_list = String::new();

    for (id, &count) in train_counts.iter().enumerate() {
        for n in 0..count {
            let name = msmt_name(id, n);
            write_jpg(&root.join("train").join(&name), (id * 25) as u8)?;
            let list = if n + 1 == count { &mut val_list } else { &mut train_list };
            list.push_str(&format!("{} {}\n", name, id));
        }
        for n in 0..3 {
            let name = msmt_name(id, n);
            write_jpg(&root.join("test").join(&name), (id * 25) as u8)?;
            let list = if n == 0 { &mut query_list } else { &mut gallery_list };
            list.push_str(&format!("{} {}\n", name, id));
        }
    }

    fs::write(root.join("list_train.txt"), train_list)?;
    fs::write(root.join("list_val.txt"), val_list)?;
    fs::write(root.join("list_query.txt"), query_list)?;
    fs::write(root.join("list_gallery.txt"), gallery_list)?;
    Ok(())
}

/// Small, deterministic single-threaded settings over a Market tree at `root`.
pub fn market_config(root: &Path) -> ReidConfigBuilder {
    ReidConfig::builder()
        .market_path(root)
        .train_dataset("market")
        .test_dataset("market")
        .image_size(32, 16)
        .p(2)
        .k(2)
        .num_workers(0)
        .eval_batch_size(3)
        .seed(7)
}

/// Encodes the number in `<n>.jpg` and one draw from the batch RNG as `[n, draw]`.
/// Any other file name fails.
pub struct PositionTransform;

impl Transform<PathBuf, Tensor> for PositionTransform {
    fn apply(&self, path: PathBuf) -> Result<Tensor> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("no file stem"))?;
        let position: f64 = stem
            .parse()
            .with_context(|| format!("unreadable image '{}'", stem))?;
        let draw: i64 = worker_gen_range(0..1_000_000);
        Ok(Tensor::from_slice(&[position, draw as f64]))
    }
}

/// In-memory dataset where identity `i` owns `counts[i]` consecutive positions.
pub fn synthetic_dataset(counts: &[usize]) -> Result<ReidDataset> {
    let mut samples = Vec::new();
    for (identity, &count) in counts.iter().enumerate() {
        for _ in 0..count {
            let position = samples.len();
            samples.push(Sample::new(format!("{}.jpg", position), identity as i64, 1));
        }
    }
    synthetic_dataset_from(samples)
}

pub fn synthetic_dataset_from(samples: Vec<Sample>) -> Result<ReidDataset> {
    ReidDataset::new("synthetic", samples, Arc::new(PositionTransform))
}

/// `(position, draw)` for every row of a batch built from [`PositionTransform`].
pub fn rows(batch: &MiniBatch) -> Vec<(i64, i64)> {
    (0..batch.batch_size() as i64)
        .map(|i| {
            (
                batch.images.double_value(&[i, 0]) as i64,
                batch.images.double_value(&[i, 1]) as i64,
            )
        })
        .collect()
}
