use crate::dataloader::worker_gen_range;
use crate::transforms::Transform;
use anyhow::{ensure, Result};
use image::{imageops, imageops::FilterType, DynamicImage, GenericImageView, RgbImage};

// ============================================================================
// Resize
// ============================================================================

/// Resizes an image to exactly `width x height`, ignoring the aspect ratio.
///
/// Person crops are tall and narrow, and every crop must come out with the same
/// shape so batches can be stacked.
///
/// # Filter Types
/// - `Nearest`: Nearest neighbour, fastest
/// - `Triangle`: Bilinear filter, good all-round default
/// - `CatmullRom`: Bicubic sharpening
/// - `Gaussian`: Blurring/smoothing
/// - `Lanczos3`: Lanczos with window 3, highest quality re-sampling but slowest.
///
/// # Examples
/// ``` ignore
/// # use image::imageops::FilterType;
/// let resize = Resize::new(128, 256, FilterType::CatmullRom)?;
/// let resized = resize.apply(img)?; // 128 wide, 256 high
/// ```
#[derive(Debug)]
pub struct Resize {
    width: u32,
    height: u32,
    filter: FilterType,
}

impl Resize {
    pub fn new(width: u32, height: u32, filter: FilterType) -> Result<Self> {
        ensure!(
            width > 0 && height > 0,
            "Image dimensions must be positive after resizing (got {}x{})",
            width,
            height
        );
        Ok(Self {
            width,
            height,
            filter,
        })
    }

    /// Bicubic resize, the interpolation used for ReID crops.
    pub fn bicubic(width: u32, height: u32) -> Result<Self> {
        Self::new(width, height, FilterType::CatmullRom)
    }
}

impl Transform<DynamicImage, DynamicImage> for Resize {
    fn apply(&self, img: DynamicImage) -> Result<DynamicImage> {
        if img.dimensions() == (self.width, self.height) {
            return Ok(img);
        }
        Ok(img.resize_exact(self.width, self.height, self.filter))
    }
}

// ============================================================================
// Pad
// ============================================================================

/// Adds a constant black border of `padding` pixels on every side.
///
/// Combined with [`RandomCrop`] back to the original size, this jitters the
/// position of the person inside the frame.
#[derive(Debug)]
pub struct Pad {
    padding: u32,
}

impl Pad {
    pub fn new(padding: u32) -> Self {
        Self { padding }
    }
}

impl Transform<DynamicImage, DynamicImage> for Pad {
    fn apply(&self, img: DynamicImage) -> Result<DynamicImage> {
        if self.padding == 0 {
            return Ok(img);
        }
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        let mut canvas = RgbImage::new(width + 2 * self.padding, height + 2 * self.padding);
        imageops::replace(&mut canvas, &rgb, self.padding as i64, self.padding as i64);
        Ok(DynamicImage::ImageRgb8(canvas))
    }
}

// ============================================================================
// RandomCrop
// ============================================================================

/// Crops a `width x height` window at a uniformly random offset.
///
/// Offsets come from the batch RNG, so a seeded loader reproduces its crops.
/// Fails if the input is smaller than the window.
#[derive(Debug)]
pub struct RandomCrop {
    width: u32,
    height: u32,
}

impl RandomCrop {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        ensure!(
            width > 0 && height > 0,
            "Crop dimensions must be positive (got {}x{})",
            width,
            height
        );
        Ok(Self { width, height })
    }
}

impl Transform<DynamicImage, DynamicImage> for RandomCrop {
    fn apply(&self, img: DynamicImage) -> Result<DynamicImage> {
        let (width, height) = img.dimensions();
        ensure!(
            width >= self.width && height >= self.height,
            "Cannot crop {}x{} out of a {}x{} image",
            self.width,
            self.height,
            width,
            height
        );

        let x = worker_gen_range(0..=width - self.width);
        let y = worker_gen_range(0..=height - self.height);
        Ok(img.crop_imm(x, y, self.width, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataloader::init_batch_rng;
    use image::{Rgb, RgbImage};

    fn test_gradient_image(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let r = (x * 255 / width) as u8;
                let g = (y * 255 / height) as u8;
                img.put_pixel(x, y, Rgb([r, g, 128]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_resize_is_exact() -> Result<()> {
        let img = test_gradient_image(64, 200);
        let resized = Resize::bicubic(32, 64)?.apply(img)?;
        assert_eq!(resized.dimensions(), (32, 64));
        Ok(())
    }

    #[test]
    fn test_resize_rejects_zero_dimension() {
        assert!(Resize::new(0, 10, FilterType::Nearest).is_err());
    }

    #[test]
    fn test_pad_adds_black_border() -> Result<()> {
        let img = test_gradient_image(4, 6);
        let padded = Pad::new(2).apply(img)?.to_rgb8();
        assert_eq!(padded.dimensions(), (8, 10));
        assert_eq!(padded.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(padded.get_pixel(7, 9), &Rgb([0, 0, 0]));
        assert_eq!(padded.get_pixel(2, 2)[2], 128);
        Ok(())
    }

    #[test]
    fn test_random_crop_size_and_determinism() -> Result<()> {
        let crop = RandomCrop::new(8, 16)?;
        let img = test_gradient_image(28, 36);

        init_batch_rng(42, 0, 0);
        let first = crop.apply(img.clone())?;
        init_batch_rng(42, 0, 0);
        let second = crop.apply(img)?;

        assert_eq!(first.dimensions(), (8, 16));
        assert_eq!(first.as_bytes(), second.as_bytes());
        Ok(())
    }

    #[test]
    fn test_random_crop_rejects_small_input() -> Result<()> {
        let crop = RandomCrop::new(8, 16)?;
        assert!(crop.apply(test_gradient_image(4, 4)).is_err());
        Ok(())
    }
}
