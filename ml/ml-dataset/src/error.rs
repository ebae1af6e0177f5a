//! Error types for ml-dataset crate.

use thiserror::Error;

/// Errors that can occur in ml-dataset operations.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset root does not exist or is not a directory.
    #[error("dataset root not found: {0}")]
    RootNotFound(String),

    /// No labeled images were found under the dataset root.
    #[error("dataset is empty: no images found under {0}")]
    EmptyDataset(String),

    /// No class subdirectories were found under the dataset root.
    #[error("no class directories under {0}")]
    NoClasses(String),

    /// Invalid split fractions.
    #[error("invalid split fractions: train={train}, val={val} (each must be > 0, sum < 1)")]
    InvalidFractions {
        /// Training fraction.
        train: f32,
        /// Validation fraction.
        val: f32,
    },

    /// Class list construction failed.
    #[error("class list error: {0}")]
    ClassList(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl DatasetError {
    /// Creates a root-not-found error.
    #[must_use]
    pub fn root_not_found(path: impl Into<String>) -> Self {
        Self::RootNotFound(path.into())
    }

    /// Creates an empty dataset error.
    #[must_use]
    pub fn empty_dataset(path: impl Into<String>) -> Self {
        Self::EmptyDataset(path.into())
    }

    /// Creates a no-classes error.
    #[must_use]
    pub fn no_classes(path: impl Into<String>) -> Self {
        Self::NoClasses(path.into())
    }

    /// Creates an invalid fractions error.
    #[must_use]
    pub const fn invalid_fractions(train: f32, val: f32) -> Self {
        Self::InvalidFractions { train, val }
    }

    /// Creates an IO error.
    #[must_use]
    pub fn io(reason: impl Into<String>) -> Self {
        Self::Io(reason.into())
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<ml_types::TypesError> for DatasetError {
    fn from(err: ml_types::TypesError) -> Self {
        Self::ClassList(err.to_string())
    }
}

/// Result type for ml-dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;
