use crate::dataloader::{worker_gen_range, worker_shuffle};
use crate::transforms::Transform;
use anyhow::{ensure, Context, Result};
use image::{DynamicImage, RgbImage};
use tch::Tensor;

// ============================================================================
// ColorJitter
// ============================================================================

/// Randomly changes brightness, contrast and saturation.
///
/// Each strength `s` draws a factor uniformly from `[max(0, 1 - s), 1 + s]`;
/// a strength of 0 disables that adjustment. Every call applies the adjustments
/// in a random order; the order is drawn before the factors.
///
/// ```text
/// brightness: v' = v * f
/// contrast:   v' = (v - mean_gray) * f + mean_gray
/// saturation: v' = (v - gray(pixel)) * f + gray(pixel)
/// ```
#[derive(Debug)]
pub struct ColorJitter {
    brightness: f32,
    contrast: f32,
    saturation: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Adjustment {
    Brightness,
    Contrast,
    Saturation,
}

impl ColorJitter {
    pub fn new(brightness: f32, contrast: f32, saturation: f32) -> Result<Self> {
        for (name, value) in [
            ("brightness", brightness),
            ("contrast", contrast),
            ("saturation", saturation),
        ] {
            ensure!(
                value >= 0.0 && value.is_finite(),
                "ColorJitter {} must be a non-negative number (got {})",
                name,
                value
            );
        }
        Ok(Self {
            brightness,
            contrast,
            saturation,
        })
    }

    /// Strengths used for ReID training crops (brightness 0.25, contrast 0.15, saturation 0.25).
    pub fn reid() -> Self {
        Self {
            brightness: 0.25,
            contrast: 0.15,
            saturation: 0.25,
        }
    }

    fn draw_order() -> [Adjustment; 3] {
        let mut order = [
            Adjustment::Brightness,
            Adjustment::Contrast,
            Adjustment::Saturation,
        ];
        worker_shuffle(&mut order);
        order
    }

    fn strength(&self, adjustment: Adjustment) -> f32 {
        match adjustment {
            Adjustment::Brightness => self.brightness,
            Adjustment::Contrast => self.contrast,
            Adjustment::Saturation => self.saturation,
        }
    }

    fn draw_factor(strength: f32) -> Option<f32> {
        if strength == 0.0 {
            return None;
        }
        Some(worker_gen_range((1.0 - strength).max(0.0)..=1.0 + strength))
    }

    fn gray(pixel: &[f32]) -> f32 {
        0.299 * pixel[0] + 0.587 * pixel[1] + 0.114 * pixel[2]
    }

    /// `pixels` is interleaved RGB in `[0, 255]`.
    fn adjust(pixels: &mut [f32], adjustment: Adjustment, factor: f32) {
        match adjustment {
            Adjustment::Brightness => {
                pixels.iter_mut().for_each(|v| *v = (*v * factor).clamp(0.0, 255.0));
            }
            Adjustment::Contrast => {
                let num_pixels = (pixels.len() / 3).max(1) as f32;
                let mean_gray = pixels.chunks_exact(3).map(Self::gray).sum::<f32>() / num_pixels;
                pixels
                    .iter_mut()
                    .for_each(|v| *v = ((*v - mean_gray) * factor + mean_gray).clamp(0.0, 255.0));
            }
            Adjustment::Saturation => {
                for pixel in pixels.chunks_exact_mut(3) {
                    let gray = Self::gray(pixel);
                    pixel
                        .iter_mut()
                        .for_each(|v| *v = ((*v - gray) * factor + gray).clamp(0.0, 255.0));
                }
            }
        }
    }
}

impl Transform<DynamicImage, DynamicImage> for ColorJitter {
    fn apply(&self, img: DynamicImage) -> Result<DynamicImage> {
        if self.brightness == 0.0 && self.contrast == 0.0 && self.saturation == 0.0 {
            return Ok(img);
        }
        let steps: Vec<(Adjustment, f32)> = Self::draw_order()
            .into_iter()
            .filter_map(|adjustment| {
                Self::draw_factor(self.strength(adjustment)).map(|factor| (adjustment, factor))
            })
            .collect();

        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        let mut pixels: Vec<f32> = rgb.as_raw().iter().map(|&v| v as f32).collect();
        for (adjustment, factor) in steps {
            Self::adjust(&mut pixels, adjustment, factor);
        }

        let raw: Vec<u8> = pixels.into_iter().map(|v| v.round() as u8).collect();
        let jittered = RgbImage::from_raw(width, height, raw)
            .context("ColorJitter produced a buffer that does not match the image size")?;
        Ok(DynamicImage::ImageRgb8(jittered))
    }
}

// ============================================================================
// Normalize
// ============================================================================

/// Normalizes tensors using channel-wise statistics.
///
/// ```text
/// output[c,h,w] = (input[c,h,w] - mean[c]) / std[c]
/// ```
///
/// # Example
/// ```ignore
/// let norm = Normalize::imagenet();
/// let normalized = norm.apply(tensor)?;
/// ```
#[derive(Debug)]
pub struct Normalize {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl Normalize {
    pub fn new(mean: &[f32], std: &[f32]) -> Result<Self> {
        ensure!(!mean.is_empty(), "Normalization mean cannot be empty");
        ensure!(
            mean.len() == std.len(),
            "The mean and standard deviation for normalization must match in dimension \
            (mean has {}, std has {})",
            mean.len(),
            std.len()
        );
        ensure!(
            std.iter().all(|&s| s != 0.0),
            "Normalization std must be non-zero"
        );
        Ok(Self {
            mean: mean.to_vec(),
            std: std.to_vec(),
        })
    }

    /// ImageNet standard normalization (RGB)
    pub fn imagenet() -> Self {
        Self {
            mean: vec![0.485, 0.456, 0.406],
            std: vec![0.229, 0.224, 0.225],
        }
    }
}

impl Transform<Tensor, Tensor> for Normalize {
    fn apply(&self, tensor: Tensor) -> Result<Tensor> {
        let (num_channels, _height, _width) = tensor
            .size3()
            .context("Input must be 3D tensor [C, H, W]")?;

        ensure!(
            num_channels as usize == self.mean.len(),
            "Channel count mismatch: input has {} channels but normalization expects {}",
            num_channels,
            self.mean.len()
        );

        let mean_t = Tensor::from_slice(&self.mean)
            .reshape([num_channels, 1, 1])
            .to_kind(tensor.kind());
        let std_t = Tensor::from_slice(&self.std)
            .reshape([num_channels, 1, 1])
            .to_kind(tensor.kind());

        Ok((tensor - mean_t) / std_t)
    }
}
