//! Randomized training-time augmentation.

use image::{Rgb, RgbImage};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Randomized augmentation applied to training images.
///
/// Mirrors the classic classification recipe: random horizontal flip,
/// a small rotation, and brightness/contrast jitter. All randomness comes
/// from the rng passed to [`Augmentation::apply`], so a seeded training
/// run replays the exact same augmentations.
///
/// # Example
///
/// ```
/// use ml_preprocess::Augmentation;
///
/// let augment = Augmentation::default();
/// assert!((augment.flip_probability - 0.5).abs() < 1e-6);
/// assert!((augment.max_rotation_degrees - 10.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Augmentation {
    /// Probability of a horizontal flip.
    pub flip_probability: f64,

    /// Maximum rotation, in degrees; the angle is drawn uniformly from
    /// `[-max, max]`.
    pub max_rotation_degrees: f32,

    /// Brightness jitter: pixels are scaled by a factor drawn from
    /// `[1 - j, 1 + j]`.
    pub brightness_jitter: f32,

    /// Contrast jitter: pixel distance from the image's mean luma is
    /// scaled by a factor drawn from `[1 - j, 1 + j]`.
    pub contrast_jitter: f32,
}

impl Default for Augmentation {
    fn default() -> Self {
        Self {
            flip_probability: 0.5,
            max_rotation_degrees: 10.0,
            brightness_jitter: 0.2,
            contrast_jitter: 0.2,
        }
    }
}

impl Augmentation {
    /// Validates the configuration.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.flip_probability)
            && self.max_rotation_degrees >= 0.0
            && (0.0..1.0).contains(&self.brightness_jitter)
            && (0.0..1.0).contains(&self.contrast_jitter)
    }

    /// Applies the augmentation stages to an RGB image.
    ///
    /// Stage order is flip, rotate, brightness, contrast. Disabled stages
    /// (zero probability/jitter) draw nothing from the rng.
    #[must_use]
    pub fn apply<R: Rng>(&self, img: RgbImage, rng: &mut R) -> RgbImage {
        let mut out = img;

        if self.flip_probability > 0.0 && rng.gen_bool(self.flip_probability) {
            out = image::imageops::flip_horizontal(&out);
        }

        if self.max_rotation_degrees > 0.0 {
            let angle = rng.gen_range(-self.max_rotation_degrees..=self.max_rotation_degrees);
            out = rotate_bilinear(&out, angle.to_radians());
        }

        if self.brightness_jitter > 0.0 {
            let factor = rng.gen_range(1.0 - self.brightness_jitter..=1.0 + self.brightness_jitter);
            scale_brightness(&mut out, factor);
        }

        if self.contrast_jitter > 0.0 {
            let factor = rng.gen_range(1.0 - self.contrast_jitter..=1.0 + self.contrast_jitter);
            scale_contrast(&mut out, factor);
        }

        out
    }
}

/// Rotates around the image center with bilinear sampling.
///
/// Pixels mapping outside the source are black, matching the usual
/// zero-fill of classification augmentation.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
fn rotate_bilinear(src: &RgbImage, radians: f32) -> RgbImage {
    let (width, height) = src.dimensions();
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let (sin, cos) = radians.sin_cos();

    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        // Inverse mapping: where in the source does this output pixel come from?
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        let sx = cos * dx + sin * dy + cx - 0.5;
        let sy = -sin * dx + cos * dy + cy - 0.5;

        *pixel = sample_bilinear(src, sx, sy);
    }
    out
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn sample_bilinear(src: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (width, height) = src.dimensions();
    if x < -1.0 || y < -1.0 || x > width as f32 || y > height as f32 {
        return Rgb([0, 0, 0]);
    }

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let fetch = |px: f32, py: f32| -> [f32; 3] {
        if px < 0.0 || py < 0.0 || px >= width as f32 || py >= height as f32 {
            [0.0, 0.0, 0.0]
        } else {
            let p = src.get_pixel(px as u32, py as u32);
            [f32::from(p[0]), f32::from(p[1]), f32::from(p[2])]
        }
    };

    let p00 = fetch(x0, y0);
    let p10 = fetch(x0 + 1.0, y0);
    let p01 = fetch(x0, y0 + 1.0);
    let p11 = fetch(x0 + 1.0, y0 + 1.0);

    let mut rgb = [0u8; 3];
    for c in 0..3 {
        let top = p00[c] * (1.0 - fx) + p10[c] * fx;
        let bottom = p01[c] * (1.0 - fx) + p11[c] * fx;
        rgb[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(rgb)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_brightness(img: &mut RgbImage, factor: f32) {
    for pixel in img.pixels_mut() {
        for c in 0..3 {
            pixel[c] = (f32::from(pixel[c]) * factor).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Scales pixel distance from the mean luma, the standard contrast jitter.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn scale_contrast(img: &mut RgbImage, factor: f32) {
    let mut luma_sum = 0.0f64;
    for pixel in img.pixels() {
        luma_sum += f64::from(
            0.299 * f32::from(pixel[0]) + 0.587 * f32::from(pixel[1]) + 0.114 * f32::from(pixel[2]),
        );
    }
    let pixel_count = (img.width() * img.height()).max(1);
    let mean = (luma_sum / f64::from(pixel_count)) as f32;

    for pixel in img.pixels_mut() {
        for c in 0..3 {
            let value = (f32::from(pixel[c]) - mean) * factor + mean;
            pixel[c] = value.round().clamp(0.0, 255.0) as u8;
        }
    }
}
