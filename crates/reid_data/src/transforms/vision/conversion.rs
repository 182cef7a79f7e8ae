use crate::transforms::Transform;
use anyhow::{ensure, Context, Result};
use image::{DynamicImage, GenericImageView};
use tch::{Kind, Tensor};

// ============================================================================
// ToTensor
// ============================================================================

/// Converts an image to a `[3, H, W]` f32 tensor in the [0.0, 1.0] range.
///
/// Grayscale, RGBA and other color types are converted to RGB first, so every
/// crop yields three channels regardless of how it was stored on disk.
///
/// # Example
/// ```ignore
/// let tensor = ToTensor.apply(image)?;
/// ```
#[derive(Debug)]
pub struct ToTensor;

impl Transform<DynamicImage, Tensor> for ToTensor {
    fn apply(&self, img: DynamicImage) -> Result<Tensor> {
        let (width, height) = img.dimensions();
        ensure!(
            width > 0 && height > 0,
            "Image dimensions must be positive (got {}x{})",
            width,
            height
        );

        let rgb = match img {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => other.to_rgb8(),
        };

        // HWC bytes -> CHW
        Tensor::from_slice(rgb.as_raw())
            .reshape([height as i64, width as i64, 3])
            .permute([2, 0, 1])
            .to_kind(Kind::Float)
            .f_div_scalar(255.0)
            .context("Failed to normalize tensor values")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn test_to_tensor_layout() -> Result<()> {
        let mut img = RgbImage::new(2, 3);
        img.put_pixel(1, 2, Rgb([255, 0, 51]));
        let tensor = ToTensor.apply(DynamicImage::ImageRgb8(img))?;

        assert_eq!(tensor.size(), vec![3, 3, 2]); // CHW
        assert_eq!(tensor.kind(), Kind::Float);
        assert_eq!(tensor.double_value(&[0, 2, 1]), 1.0);
        assert_eq!(tensor.double_value(&[1, 2, 1]), 0.0);
        assert!((tensor.double_value(&[2, 2, 1]) - 0.2).abs() < 1e-6);
        assert_eq!(tensor.double_value(&[0, 0, 0]), 0.0);
        Ok(())
    }

    #[test]
    fn test_grayscale_becomes_three_channels() -> Result<()> {
        let img = GrayImage::from_pixel(4, 5, Luma([128]));
        let tensor = ToTensor.apply(DynamicImage::ImageLuma8(img))?;
        assert_eq!(tensor.size(), vec![3, 5, 4]);
        Ok(())
    }
}
