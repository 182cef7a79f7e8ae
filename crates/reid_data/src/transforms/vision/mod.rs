//! Vision transforms for person-crop preprocessing and augmentation.
//!
//! ```text
//! transforms/vision/
//! ├── geometric.rs     → Spatial transformations (resize, pad, random crop)
//! ├── photometric.rs   → Color and appearance (color jitter, normalize)
//! ├── conversion.rs    → Format conversions (image → tensor)
//! ├── augmentation.rs  → Flip and random erasing
//! └── io.rs            → Image loading
//! ```
//!
//! ```ignore
//! use crate::transforms::Transform;
//! use crate::transforms::vision::{Resize, ToTensor, Normalize};
//!
//! let pipeline = Resize::bicubic(128, 256)?
//!     .then(ToTensor)
//!     .then(Normalize::imagenet());
//! ```

pub mod augmentation;
pub mod conversion;
pub mod geometric;
pub mod io;
pub mod photometric;

pub use augmentation::{RandomErasing, RandomHorizontalFlip};
pub use conversion::ToTensor;
pub use geometric::{Pad, RandomCrop, Resize};
pub use io::LoadImage;
pub use photometric::{ColorJitter, Normalize};
