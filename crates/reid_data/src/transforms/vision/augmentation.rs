use crate::dataloader::{worker_gen_bool, worker_gen_range};
use crate::transforms::Transform;
use anyhow::{ensure, Context, Result};
use image::DynamicImage;
use tch::Tensor;

// ============================================================================
// RandomHorizontalFlip
// ============================================================================

/// Randomly flips images horizontally during training.
///
/// # Example
/// ```ignore
/// let flip = RandomHorizontalFlip::new(0.5)?; // 50% flip chance
/// let augmented = flip.apply(image)?;
/// ```
#[derive(Debug)]
pub struct RandomHorizontalFlip {
    p: f64,
}

impl RandomHorizontalFlip {
    pub fn new(p: f64) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&p),
            "Probability must be in [0.0, 1.0] range (got {})",
            p
        );
        Ok(Self { p })
    }
}

impl Transform<DynamicImage, DynamicImage> for RandomHorizontalFlip {
    fn apply(&self, img: DynamicImage) -> Result<DynamicImage> {
        Ok(if worker_gen_bool(self.p) {
            img.fliph()
        } else {
            img
        })
    }
}

// ============================================================================
// RandomErasing
// ============================================================================

/// Random erasing on a normalized `[C, H, W]` tensor.
///
/// With probability `p`, a rectangle covering a random fraction of the image in
/// `[min_area, max_area]`, with aspect ratio in `[min_aspect, 1 / min_aspect]`, is
/// overwritten channel-wise with `mean`. Up to 100 placements are tried; if none
/// fits the image is returned untouched.
#[derive(Debug)]
pub struct RandomErasing {
    p: f64,
    min_area: f64,
    max_area: f64,
    min_aspect: f64,
    mean: Vec<f64>,
}

impl RandomErasing {
    const MAX_ATTEMPTS: usize = 100;

    pub fn new(p: f64, mean: &[f64]) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&p),
            "Probability must be in [0.0, 1.0] range (got {})",
            p
        );
        ensure!(!mean.is_empty(), "Erasing mean cannot be empty");
        Ok(Self {
            p,
            min_area: 0.02,
            max_area: 0.4,
            min_aspect: 0.3,
            mean: mean.to_vec(),
        })
    }

    /// `p = 0.5`, erased pixels set to the ImageNet mean.
    pub fn imagenet() -> Self {
        Self {
            p: 0.5,
            min_area: 0.02,
            max_area: 0.4,
            min_aspect: 0.3,
            mean: vec![0.485, 0.456, 0.406],
        }
    }
}

impl Transform<Tensor, Tensor> for RandomErasing {
    fn apply(&self, tensor: Tensor) -> Result<Tensor> {
        let (num_channels, height, width) = tensor
            .size3()
            .context("Input must be 3D tensor [C, H, W]")?;
        ensure!(
            num_channels as usize == self.mean.len(),
            "Channel count mismatch: input has {} channels but erasing mean has {}",
            num_channels,
            self.mean.len()
        );

        if !worker_gen_bool(self.p) {
            return Ok(tensor);
        }

        let area = (height * width) as f64;
        for _ in 0..Self::MAX_ATTEMPTS {
            let target_area = worker_gen_range(self.min_area..self.max_area) * area;
            let aspect = worker_gen_range(self.min_aspect..1.0 / self.min_aspect);

            let h = (target_area * aspect).sqrt().round() as i64;
            let w = (target_area / aspect).sqrt().round() as i64;
            if h == 0 || w == 0 || h >= height || w >= width {
                continue;
            }

            let top = worker_gen_range(0..=height - h);
            let left = worker_gen_range(0..=width - w);
            let erased = tensor.copy();
            for (c, &value) in self.mean.iter().enumerate() {
                let _ = erased
                    .narrow(0, c as i64, 1)
                    .narrow(1, top, h)
                    .narrow(2, left, w)
                    .fill_(value);
            }
            return Ok(erased);
        }
        Ok(tensor)
    }
}
