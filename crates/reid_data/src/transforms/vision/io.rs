use crate::transforms::Transform;
use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::PathBuf;

// ============================================================================
// LoadImage
// ============================================================================

/// Loads images from file paths.
///
/// Reads the whole file through a buffered reader and decodes it with the format
/// guessed from its content, so a mislabeled extension still decodes. Content that
/// matches no known signature falls back to the format named by the extension.
///
/// # Input/Output
/// - **Input**: `PathBuf` - File path to image
/// - **Output**: `DynamicImage` - Loaded image ready for processing
///
/// # Example
/// ```ignore
/// let pipeline = LoadImage::new().then(ToTensor);
/// let tensor = pipeline.apply(PathBuf::from("0002_c1s1_000451_03.jpg"))?;
/// ```
#[derive(Debug, Clone)]
pub struct LoadImage {
    buffer_size: usize,
}

impl Default for LoadImage {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadImage {
    /// Creates a new image loader with an 8KB read buffer.
    pub fn new() -> Self {
        Self { buffer_size: 8192 }
    }
}

impl Transform<PathBuf, DynamicImage> for LoadImage {
    fn apply(&self, path: PathBuf) -> Result<DynamicImage> {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open image: {}", path.display()))?;

        let file_size = file.metadata().map(|m| m.len() as usize).unwrap_or(0);
        let mut reader = BufReader::with_capacity(self.buffer_size, file);
        let mut buffer = Vec::with_capacity(file_size);
        reader
            .read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read image: {}", path.display()))?;

        let mut reader = ImageReader::new(Cursor::new(buffer))
            .with_guessed_format()
            .with_context(|| format!("Failed to detect image format: {}", path.display()))?;
        if reader.format().is_none() {
            if let Ok(format) = ImageFormat::from_path(&path) {
                log::debug!(
                    "{}: unrecognized content, decoding as {:?} from the extension",
                    path.display(),
                    format
                );
                reader.set_format(format);
            }
        }
        reader
            .decode()
            .with_context(|| format!("Failed to decode image: {}", path.display()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};
    use tempfile::NamedTempFile;

    fn create_test_image() -> Result<NamedTempFile> {
        let mut test_img = RgbImage::new(3, 3);
        test_img.put_pixel(0, 0, Rgb([255, 0, 0]));
        test_img.put_pixel(1, 1, Rgb([0, 255, 0]));
        test_img.put_pixel(2, 2, Rgb([0, 0, 255]));

        let temp_file = NamedTempFile::with_suffix(".png")?;
        test_img.save(temp_file.path())?;
        Ok(temp_file)
    }

    #[test]
    fn test_load_image() -> Result<()> {
        let temp_file = create_test_image()?;
        let loaded_image = LoadImage::new().apply(temp_file.path().to_path_buf())?;

        assert_eq!(loaded_image.dimensions(), (3, 3));
        let rgb = loaded_image.to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(rgb.get_pixel(1, 1), &Rgb([0, 255, 0]));
        assert_eq!(rgb.get_pixel(2, 2), &Rgb([0, 0, 255]));
        Ok(())
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = LoadImage::new()
            .apply(PathBuf::from("nonexistent_0001_c1.jpg"))
            .unwrap_err();
        assert!(err.to_string().contains("nonexistent_0001_c1.jpg"));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() -> Result<()> {
        let temp_file = NamedTempFile::with_suffix(".jpg")?;
        std::fs::write(temp_file.path(), b"definitely not a jpeg")?;
        assert!(LoadImage::new().apply(temp_file.path().to_path_buf()).is_err());
        Ok(())
    }
}
