//! Image decoding and transform pipelines for the classifier.
//!
//! Two pipelines share one configuration:
//!
//! - **Deterministic**: exact resize to the target side, RGB conversion,
//!   ImageNet normalization. Used for validation, test, and inference.
//! - **Augmented**: the deterministic pipeline plus random horizontal
//!   flip, small rotation, and brightness/contrast jitter. Used for
//!   training only; randomness comes from a caller-supplied rng so runs
//!   stay reproducible.
//!
//! # Contract
//!
//! For any decodable image of any size, both pipelines produce a
//! [`TensorImage`] of shape `(3, side, side)` whose values are
//! `(x/255 - mean) / std` with the fixed ImageNet constants.
//!
//! # Example
//!
//! ```
//! use ml_preprocess::TransformConfig;
//!
//! let transform = TransformConfig::default();
//! let img = image::DynamicImage::new_rgb8(100, 60);
//! let tensor = transform.apply(&img);
//!
//! assert_eq!(tensor.shape(), [3, 224, 224]);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod augment;
mod error;
mod transform;

pub use augment::Augmentation;
pub use error::{PreprocessError, Result};
pub use transform::{
    IMAGENET_MEAN, IMAGENET_STD, TensorImage, TransformConfig, decode_image, load_image,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        Augmentation, IMAGENET_MEAN, IMAGENET_STD, PreprocessError, TensorImage, TransformConfig,
        decode_image, load_image,
    };
}
