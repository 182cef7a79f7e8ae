use crate::sample::ImageSample;
use anyhow::{bail, Result};
use std::path::PathBuf;
use tch::{Device, Tensor};

/// A batch of transformed samples ready for the model.
///
/// All fields are aligned by position: row `i` of `images` belongs to
/// `labels[i]`, `cameras[i]` and `paths[i]`.
///
/// - `images`: `[batch_size, C, H, W]`
/// - `labels`: `[batch_size]` identities (`Int64`)
/// - `cameras`: `[batch_size]` camera ids (`Int64`)
#[derive(Debug)]
pub struct MiniBatch {
    pub images: Tensor,
    pub labels: Tensor,
    pub cameras: Tensor,
    pub paths: Vec<PathBuf>,
}

impl MiniBatch {
    /// Stacks transformed samples along a new batch dimension (dim 0).
    ///
    /// Every image must have the same shape; there is no padding here, so
    /// the transform pipeline is responsible for producing fixed-size tensors.
    pub fn collate(samples: &[ImageSample]) -> Result<Self> {
        if samples.is_empty() {
            bail!("Cannot collate empty sample list");
        }

        let reference_shape = samples[0].image.size();
        for (i, sample) in samples.iter().enumerate().skip(1) {
            if sample.image.size() != reference_shape {
                bail!(
                    "Shape mismatch in sample {} ({}): expected {:?}, got {:?}",
                    i,
                    sample.path.display(),
                    reference_shape,
                    sample.image.size()
                );
            }
        }

        let images: Vec<&Tensor> = samples.iter().map(|s| &s.image).collect();
        let labels: Vec<i64> = samples.iter().map(|s| s.identity).collect();
        let cameras: Vec<i64> = samples.iter().map(|s| s.camera).collect();

        Ok(Self {
            images: Tensor::stack(&images, 0),
            labels: Tensor::from_slice(&labels),
            cameras: Tensor::from_slice(&cameras),
            paths: samples.iter().map(|s| s.path.clone()).collect(),
        })
    }

    /// Returns the number of samples in the batch.
    pub fn batch_size(&self) -> usize {
        self.paths.len()
    }

    /// Identity labels as plain integers.
    pub fn identities(&self) -> Vec<i64> {
        (0..self.batch_size() as i64)
            .map(|i| self.labels.int64_value(&[i]))
            .collect()
    }

    /// Camera ids as plain integers.
    pub fn camera_ids(&self) -> Vec<i64> {
        (0..self.batch_size() as i64)
            .map(|i| self.cameras.int64_value(&[i]))
            .collect()
    }

    /// Transfers the tensors to the target device (CPU/GPU).
    pub fn to_device(&self, device: Device) -> Self {
        Self {
            images: self.images.to_device(device),
            labels: self.labels.to_device(device),
            cameras: self.cameras.to_device(device),
            paths: self.paths.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Kind;

    fn make_sample(identity: i64, shape: &[i64]) -> ImageSample {
        ImageSample {
            image: Tensor::full(shape, identity as f64, (Kind::Float, Device::Cpu)),
            identity,
            camera: identity % 3,
            path: PathBuf::from(format!("{:04}.jpg", identity)),
        }
    }

    #[test]
    fn collate_keeps_positional_order() -> Result<()> {
        let samples = vec![
            make_sample(4, &[3, 8, 4]),
            make_sample(1, &[3, 8, 4]),
            make_sample(9, &[3, 8, 4]),
        ];
        let batch = MiniBatch::collate(&samples)?;

        assert_eq!(batch.batch_size(), 3);
        assert_eq!(batch.images.size(), vec![3, 3, 8, 4]);
        assert_eq!(batch.identities(), vec![4, 1, 9]);
        assert_eq!(batch.camera_ids(), vec![1, 1, 0]);
        assert_eq!(batch.images.double_value(&[2, 0, 0, 0]), 9.0);
        assert_eq!(batch.paths[1], PathBuf::from("0001.jpg"));
        Ok(())
    }

    #[test]
    fn collate_rejects_empty_and_mismatched_shapes() {
        assert!(MiniBatch::collate(&[]).is_err());

        let samples = vec![make_sample(0, &[3, 8, 4]), make_sample(1, &[3, 4, 4])];
        let err = MiniBatch::collate(&samples).unwrap_err();
        assert!(err.to_string().contains("Shape mismatch"));
    }

    #[test]
    fn to_device_keeps_metadata() -> Result<()> {
        let batch = MiniBatch::collate(&[make_sample(2, &[3, 2, 2])])?;
        let moved = batch.to_device(Device::Cpu);
        assert_eq!(moved.paths, batch.paths);
        assert_eq!(moved.identities(), vec![2]);
        Ok(())
    }
}
