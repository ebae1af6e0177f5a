//! Error types for ml-training crate.

use thiserror::Error;

/// Errors that can occur during training.
#[derive(Debug, Error)]
pub enum TrainingError {
    /// Invalid training configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dataset error.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Image preprocessing error.
    #[error("preprocess error: {0}")]
    Preprocess(String),

    /// Model or checkpoint error.
    #[error("model error: {0}")]
    Model(String),

    /// Tensor data extraction failed.
    #[error("tensor error: {0}")]
    Tensor(String),

    /// Experiment tracking error.
    #[error("tracking error: {0}")]
    Tracking(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl TrainingError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates a dataset error.
    #[must_use]
    pub fn dataset(reason: impl Into<String>) -> Self {
        Self::Dataset(reason.into())
    }

    /// Creates a tensor error.
    #[must_use]
    pub fn tensor(reason: impl Into<String>) -> Self {
        Self::Tensor(reason.into())
    }

    /// Creates a tracking error.
    #[must_use]
    pub fn tracking(reason: impl Into<String>) -> Self {
        Self::Tracking(reason.into())
    }

    /// Creates an IO error.
    #[must_use]
    pub fn io(reason: impl Into<String>) -> Self {
        Self::Io(reason.into())
    }
}

impl From<std::io::Error> for TrainingError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TrainingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Tracking(err.to_string())
    }
}

impl From<ml_dataset::DatasetError> for TrainingError {
    fn from(err: ml_dataset::DatasetError) -> Self {
        Self::Dataset(err.to_string())
    }
}

impl From<ml_preprocess::PreprocessError> for TrainingError {
    fn from(err: ml_preprocess::PreprocessError) -> Self {
        Self::Preprocess(err.to_string())
    }
}

impl From<ml_models::ModelError> for TrainingError {
    fn from(err: ml_models::ModelError) -> Self {
        Self::Model(err.to_string())
    }
}

impl From<ml_types::TypesError> for TrainingError {
    fn from(err: ml_types::TypesError) -> Self {
        Self::Model(err.to_string())
    }
}

/// Result type for training operations.
pub type Result<T> = std::result::Result<T, TrainingError>;
