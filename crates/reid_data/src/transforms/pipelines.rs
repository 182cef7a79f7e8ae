//! Ready-made preprocessing pipelines for person crops.
//!
//! `image_size` is `(height, width)` throughout, e.g. `(256, 128)`.

use crate::transforms::vision::{
    ColorJitter, LoadImage, Normalize, Pad, RandomCrop, RandomErasing, RandomHorizontalFlip,
    Resize, ToTensor,
};
use crate::transforms::Transform;
use anyhow::Result;
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use tch::Tensor;

/// A full path-to-tensor pipeline shared by every loader thread.
pub type SampleTransform = Arc<dyn Transform<PathBuf, Tensor>>;

/// Border added before the random crop.
pub const TRAIN_PADDING: u32 = 10;

/// Training augmentation:
///
/// ```text
/// resize (bicubic) -> flip (0.5) -> pad (10) -> random crop (image_size)
///   -> [color jitter] -> to tensor -> normalize (ImageNet) -> [random erasing]
/// ```
pub fn train_pipeline(
    image_size: (u32, u32),
    color_jitter: bool,
    random_erasing: bool,
) -> Result<impl Transform<DynamicImage, Tensor>> {
    let (height, width) = image_size;
    Ok(Resize::bicubic(width, height)?
        .then(RandomHorizontalFlip::new(0.5)?)
        .then(Pad::new(TRAIN_PADDING))
        .then(RandomCrop::new(width, height)?)
        .then(color_jitter.then(ColorJitter::reid))
        .then(ToTensor)
        .then(Normalize::imagenet())
        .then(random_erasing.then(RandomErasing::imagenet)))
}

/// Evaluation preprocessing: resize (bicubic) -> to tensor -> normalize (ImageNet).
pub fn test_pipeline(image_size: (u32, u32)) -> Result<impl Transform<DynamicImage, Tensor>> {
    let (height, width) = image_size;
    Ok(Resize::bicubic(width, height)?
        .then(ToTensor)
        .then(Normalize::imagenet()))
}

/// Prepends image loading to an image pipeline.
pub fn from_path<T>(image_transform: T) -> SampleTransform
where
    T: Transform<DynamicImage, Tensor> + 'static,
{
    Arc::new(LoadImage::new().then(image_transform))
}
