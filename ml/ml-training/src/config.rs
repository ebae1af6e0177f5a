//! Training configuration.

use serde::{Deserialize, Serialize};

use ml_dataset::SplitFractions;
use ml_models::CatDogCnnConfig;

/// Configuration for a training run.
///
/// # Example
///
/// ```
/// use ml_training::TrainingConfig;
///
/// let config = TrainingConfig::default();
/// assert_eq!(config.epochs, 10);
/// assert_eq!(config.batch_size, 32);
/// assert!(config.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of training epochs.
    pub epochs: usize,

    /// Batch size.
    pub batch_size: usize,

    /// Adam learning rate.
    pub learning_rate: f64,

    /// Seed driving the split, the per-epoch shuffles, and augmentation.
    pub seed: u64,

    /// Train/val/test fractions.
    pub fractions: SplitFractions,

    /// Early stopping patience in epochs (0 = disabled).
    pub patience: usize,

    /// Model architecture to train.
    pub model: CatDogCnnConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 32,
            learning_rate: 1e-3,
            seed: 42,
            fractions: SplitFractions::EIGHTY_TEN_TEN,
            patience: 0,
            model: CatDogCnnConfig::new(2),
        }
    }
}

impl TrainingConfig {
    /// Creates a config with the given epoch count.
    #[must_use]
    pub fn new(epochs: usize) -> Self {
        Self {
            epochs,
            ..Self::default()
        }
    }

    /// Sets the batch size.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the learning rate.
    #[must_use]
    pub const fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the early stopping patience.
    #[must_use]
    pub const fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    /// Sets the model architecture.
    #[must_use]
    pub const fn with_model(mut self, model: CatDogCnnConfig) -> Self {
        self.model = model;
        self
    }

    /// Validates the configuration.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.epochs > 0
            && self.batch_size > 0
            && self.learning_rate > 0.0
            && self.model.is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default() {
        let config = TrainingConfig::default();
        assert_eq!(config.epochs, 10);
        assert_eq!(config.batch_size, 32);
        assert!((config.learning_rate - 1e-3).abs() < 1e-12);
        assert_eq!(config.seed, 42);
        assert_eq!(config.patience, 0);
        assert!(config.is_valid());
    }

    #[test]
    fn config_builder() {
        let config = TrainingConfig::new(3)
            .with_batch_size(8)
            .with_learning_rate(1e-4)
            .with_seed(7)
            .with_patience(2);

        assert_eq!(config.epochs, 3);
        assert_eq!(config.batch_size, 8);
        assert!((config.learning_rate - 1e-4).abs() < 1e-12);
        assert_eq!(config.seed, 7);
        assert_eq!(config.patience, 2);
    }

    #[test]
    fn config_invalid() {
        assert!(!TrainingConfig::new(0).is_valid());
        assert!(!TrainingConfig::new(1).with_batch_size(0).is_valid());
        assert!(!TrainingConfig::new(1).with_learning_rate(0.0).is_valid());

        let bad_model = CatDogCnnConfig::new(0);
        assert!(!TrainingConfig::new(1).with_model(bad_model).is_valid());
    }

    #[test]
    fn config_serialization() {
        let config = TrainingConfig::new(5).with_seed(99);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TrainingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
