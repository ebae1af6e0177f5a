//! Error types for ml-types crate.

use thiserror::Error;

/// Errors that can occur when working with shared classifier types.
#[derive(Debug, Error)]
pub enum TypesError {
    /// A class list must contain at least one name.
    #[error("class list is empty")]
    EmptyClassList,

    /// Class names must be unique.
    #[error("duplicate class name: {0}")]
    DuplicateClass(String),

    /// A class name contained characters the text format cannot carry.
    #[error("invalid class name {0:?}: names must be non-empty and single-line")]
    InvalidClassName(String),

    /// Probability vector length did not match the class count.
    #[error("probability count {got} does not match class count {expected}")]
    ProbabilityCountMismatch {
        /// Number of probabilities supplied.
        got: usize,
        /// Number of classes expected.
        expected: usize,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl TypesError {
    /// Creates a duplicate class error.
    #[must_use]
    pub fn duplicate_class(name: impl Into<String>) -> Self {
        Self::DuplicateClass(name.into())
    }

    /// Creates an invalid class name error.
    #[must_use]
    pub fn invalid_class_name(name: impl Into<String>) -> Self {
        Self::InvalidClassName(name.into())
    }

    /// Creates a probability count mismatch error.
    #[must_use]
    pub const fn probability_count_mismatch(got: usize, expected: usize) -> Self {
        Self::ProbabilityCountMismatch { got, expected }
    }

    /// Creates an IO error.
    #[must_use]
    pub fn io(reason: impl Into<String>) -> Self {
        Self::Io(reason.into())
    }
}

impl From<std::io::Error> for TypesError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for ml-types operations.
pub type Result<T> = std::result::Result<T, TypesError>;
