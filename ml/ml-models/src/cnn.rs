//! Convolutional classifier architecture.

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d, Relu};
use burn::prelude::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Configuration for [`CatDogCnn`].
///
/// Training and serving both build their model through this factory so
/// the architectures can never drift apart.
///
/// # Example
///
/// ```
/// use ml_models::CatDogCnnConfig;
///
/// let config = CatDogCnnConfig::default();
/// assert_eq!(config.num_classes, 2);
/// assert_eq!(config.image_size, 224);
/// assert!(config.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CatDogCnnConfig {
    /// Number of output classes.
    pub num_classes: usize,

    /// Width of the fully-connected hidden layer.
    pub hidden: usize,

    /// Dropout probability applied before the classification head.
    pub dropout: f64,

    /// Expected input side length in pixels (square RGB input).
    pub image_size: usize,
}

impl Default for CatDogCnnConfig {
    fn default() -> Self {
        Self {
            num_classes: 2,
            hidden: 512,
            dropout: 0.5,
            image_size: 224,
        }
    }
}

impl CatDogCnnConfig {
    /// Creates a configuration with the given class count.
    #[must_use]
    pub const fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            hidden: 512,
            dropout: 0.5,
            image_size: 224,
        }
    }

    /// Sets the hidden layer width.
    #[must_use]
    pub const fn with_hidden(mut self, hidden: usize) -> Self {
        self.hidden = hidden;
        self
    }

    /// Sets the dropout probability.
    #[must_use]
    pub const fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    /// Validates the configuration.
    ///
    /// The input must survive three halving pool stages, so the side has
    /// to be at least 8 pixels.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.num_classes > 0
            && self.hidden > 0
            && (0.0..1.0).contains(&self.dropout)
            && self.image_size >= 8
    }

    /// Side length of the feature map after the three pool stages.
    #[must_use]
    pub const fn feature_side(&self) -> usize {
        self.image_size / 2 / 2 / 2
    }

    /// Initialises the model on the given device.
    #[must_use]
    pub fn init<B: Backend>(&self, device: &B::Device) -> CatDogCnn<B> {
        let padding = || PaddingConfig2d::Explicit(1, 1);
        let flat_dim = 128 * self.feature_side() * self.feature_side();

        CatDogCnn {
            conv1: Conv2dConfig::new([3, 32], [3, 3])
                .with_padding(padding())
                .init(device),
            conv2: Conv2dConfig::new([32, 64], [3, 3])
                .with_padding(padding())
                .init(device),
            conv3: Conv2dConfig::new([64, 128], [3, 3])
                .with_padding(padding())
                .init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            fc1: LinearConfig::new(flat_dim, self.hidden).init(device),
            fc2: LinearConfig::new(self.hidden, self.num_classes).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            activation: Relu::new(),
            num_classes: self.num_classes,
            image_size: self.image_size,
        }
    }
}

/// Convolutional classifier for square RGB images.
///
/// Architecture: three `conv 3x3 (pad 1) -> ReLU -> maxpool 2x2` blocks
/// (32/64/128 channels), flatten, a hidden fully-connected layer with
/// dropout, and a linear head producing one logit per class.
///
/// Dropout only fires on autodiff backends, so the same module is
/// deterministic at inference time.
#[derive(Debug, Module)]
pub struct CatDogCnn<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    pool: MaxPool2d,
    fc1: Linear<B>,
    fc2: Linear<B>,
    dropout: Dropout,
    activation: Relu,
    num_classes: usize,
    image_size: usize,
}

impl<B: Backend> CatDogCnn<B> {
    /// Number of output classes.
    #[must_use]
    pub const fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Expected input side length in pixels.
    #[must_use]
    pub const fn image_size(&self) -> usize {
        self.image_size
    }

    /// Runs the forward pass.
    ///
    /// # Arguments
    ///
    /// - `images`: Input of shape `[batch, 3, side, side]`
    ///
    /// # Returns
    ///
    /// Logits of shape `[batch, num_classes]` (not probabilities).
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.pool.forward(self.activation.forward(self.conv1.forward(images)));
        let x = self.pool.forward(self.activation.forward(self.conv2.forward(x)));
        let x = self.pool.forward(self.activation.forward(self.conv3.forward(x)));

        let x = x.flatten(1, 3);
        let x = self.dropout.forward(self.activation.forward(self.fc1.forward(x)));
        self.fc2.forward(x)
    }

    /// Validates the input shape, then runs the forward pass.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeMismatch`] unless the input is
    /// `[batch, 3, side, side]` for this model's configured side.
    pub fn forward_checked(&self, images: Tensor<B, 4>) -> Result<Tensor<B, 2>> {
        let dims = images.dims();
        if dims[1] != 3 || dims[2] != self.image_size || dims[3] != self.image_size {
            return Err(ModelError::shape_mismatch(3, self.image_size, dims));
        }
        Ok(self.forward(images))
    }
}
