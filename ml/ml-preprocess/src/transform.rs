//! Resize/normalize pipelines producing CHW float tensors.

use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbImage};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::augment::Augmentation;
use crate::error::{PreprocessError, Result};

/// ImageNet per-channel mean, RGB order.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet per-channel standard deviation, RGB order.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decodes arbitrary image bytes into an RGB-capable image.
///
/// The format is sniffed from the bytes, so mislabeled uploads still
/// decode when their content is a real image.
///
/// # Errors
///
/// Returns [`PreprocessError::Decode`] for malformed or unsupported input.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PreprocessError::decode(e.to_string()))?
        .decode()
        .map_err(|e| PreprocessError::decode(e.to_string()))
}

/// Loads and decodes an image file from disk.
///
/// # Errors
///
/// Returns [`PreprocessError::ReadFile`] if the file cannot be opened and
/// [`PreprocessError::Decode`] if its contents are not an image.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let reader = ImageReader::open(path)
        .map_err(|e| PreprocessError::read_file(path.display().to_string(), e.to_string()))?;
    reader
        .decode()
        .map_err(|e| PreprocessError::decode(format!("{}: {e}", path.display())))
}

/// A normalized image in CHW layout.
///
/// `data[c * side * side + y * side + x]` holds channel `c` of pixel
/// `(x, y)`; values are ImageNet-normalized floats.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorImage {
    data: Vec<f32>,
    side: usize,
}

impl TensorImage {
    /// Shape as `[channels, height, width]`.
    #[must_use]
    pub const fn shape(&self) -> [usize; 3] {
        [3, self.side, self.side]
    }

    /// Side length in pixels.
    #[must_use]
    pub const fn side(&self) -> usize {
        self.side
    }

    /// The normalized values in CHW order.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Consumes the tensor, returning the CHW buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

/// Configuration shared by the deterministic and augmented pipelines.
///
/// # Example
///
/// ```
/// use ml_preprocess::{Augmentation, TransformConfig};
///
/// let train = TransformConfig::default().with_augmentation(Augmentation::default());
/// let eval = train.deterministic();
///
/// assert!(train.is_augmented());
/// assert!(!eval.is_augmented());
/// assert_eq!(eval.side(), train.side());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    side: u32,
    augment: Option<Augmentation>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            side: 224,
            augment: None,
        }
    }
}

impl TransformConfig {
    /// Creates a deterministic transform with the given target side.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::InvalidConfig`] for a zero side.
    pub fn new(side: u32) -> Result<Self> {
        if side == 0 {
            return Err(PreprocessError::invalid_config("side must be > 0"));
        }
        Ok(Self { side, augment: None })
    }

    /// Attaches an augmentation stage for training.
    #[must_use]
    pub fn with_augmentation(mut self, augment: Augmentation) -> Self {
        self.augment = Some(augment);
        self
    }

    /// Derives the deterministic variant of this transform.
    ///
    /// The augmentation stage is stripped; resize target and
    /// normalization stay exactly as configured. Validation, test, and
    /// inference transforms are derived from the training one this way.
    #[must_use]
    pub fn deterministic(&self) -> Self {
        Self {
            side: self.side,
            augment: None,
        }
    }

    /// Returns `true` if an augmentation stage is configured.
    #[must_use]
    pub const fn is_augmented(&self) -> bool {
        self.augment.is_some()
    }

    /// Target side length in pixels.
    #[must_use]
    pub const fn side(&self) -> u32 {
        self.side
    }

    /// Runs the deterministic pipeline: resize, RGB, normalize.
    ///
    /// Any configured augmentation is ignored; use
    /// [`TransformConfig::apply_augmented`] during training.
    #[must_use]
    pub fn apply(&self, img: &DynamicImage) -> TensorImage {
        let rgb = self.resize_rgb(img);
        self.normalize(&rgb)
    }

    /// Runs the full training pipeline, including augmentation when
    /// configured.
    #[must_use]
    pub fn apply_augmented<R: Rng>(&self, img: &DynamicImage, rng: &mut R) -> TensorImage {
        let rgb = self.resize_rgb(img);
        let rgb = match &self.augment {
            Some(augment) => augment.apply(rgb, rng),
            None => rgb,
        };
        self.normalize(&rgb)
    }

    fn resize_rgb(&self, img: &DynamicImage) -> RgbImage {
        img.resize_exact(self.side, self.side, FilterType::Triangle)
            .to_rgb8()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn normalize(&self, rgb: &RgbImage) -> TensorImage {
        let side = self.side as usize;
        let hw = side * side;
        let mut data = vec![0.0f32; 3 * hw];
        for (i, pixel) in rgb.pixels().enumerate() {
            for c in 0..3 {
                data[c * hw + i] =
                    (f32::from(pixel[c]) / 255.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            }
        }
        TensorImage { data, side }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn solid_image(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        let mut img = RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = Rgb(color);
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn apply_yields_fixed_shape_for_any_input_size() {
        let transform = TransformConfig::default();
        for (w, h) in [(10, 10), (100, 60), (640, 480), (224, 224), (3, 500)] {
            let tensor = transform.apply(&solid_image(w, h, [12, 200, 88]));
            assert_eq!(tensor.shape(), [3, 224, 224]);
            assert_eq!(tensor.data().len(), 3 * 224 * 224);
        }
    }

    #[test]
    fn apply_values_within_normalized_bounds() {
        let transform = TransformConfig::default();
        for color in [[0, 0, 0], [255, 255, 255], [255, 0, 128]] {
            let tensor = transform.apply(&solid_image(64, 64, color));
            assert!(
                tensor.data().iter().all(|v| v.abs() <= 3.0),
                "extreme pixels must stay within +/-3 after normalization"
            );
        }
    }

    #[test]
    fn apply_normalizes_exactly() {
        let transform = TransformConfig::default();
        let tensor = transform.apply(&solid_image(32, 32, [255, 255, 255]));

        let hw = 224 * 224;
        for c in 0..3 {
            let expected = (1.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            assert!((tensor.data()[c * hw] - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, PreprocessError::Decode(_)));
    }

    #[test]
    fn decode_accepts_png_bytes() {
        let img = solid_image(8, 8, [1, 2, 3]);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.width(), 8);
    }

    #[test]
    fn config_rejects_zero_side() {
        assert!(TransformConfig::new(0).is_err());
    }

    #[test]
    fn deterministic_strips_augmentation_only() {
        let train = TransformConfig::new(224)
            .unwrap()
            .with_augmentation(Augmentation::default());
        let eval = train.deterministic();

        assert!(!eval.is_augmented());
        assert_eq!(eval.side(), 224);
    }

    #[test]
    fn augmented_pipeline_keeps_contract() {
        let transform = TransformConfig::default().with_augmentation(Augmentation::default());
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let tensor = transform.apply_augmented(&solid_image(300, 200, [90, 40, 170]), &mut rng);
        assert_eq!(tensor.shape(), [3, 224, 224]);
        assert!(tensor.data().iter().all(|v| v.abs() <= 3.0));
    }

    #[test]
    fn augmented_pipeline_reproducible_for_same_seed() {
        let transform = TransformConfig::default().with_augmentation(Augmentation::default());
        let img = solid_image(120, 90, [200, 100, 50]);

        let mut rng_a = ChaCha8Rng::seed_from_u64(42);
        let mut rng_b = ChaCha8Rng::seed_from_u64(42);
        let a = transform.apply_augmented(&img, &mut rng_a);
        let b = transform.apply_augmented(&img, &mut rng_b);

        assert_eq!(a, b);
    }

    #[test]
    fn config_serialization() {
        let config = TransformConfig::default().with_augmentation(Augmentation::default());
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TransformConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
