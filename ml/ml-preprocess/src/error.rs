//! Error types for ml-preprocess crate.

use thiserror::Error;

/// Errors that can occur while preprocessing images.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// The input bytes could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// An image file could not be read from disk.
    #[error("failed to read image {path}: {reason}")]
    ReadFile {
        /// Path that failed to load.
        path: String,
        /// Reason for the failure.
        reason: String,
    },

    /// Invalid transform configuration.
    #[error("invalid transform configuration: {0}")]
    InvalidConfig(String),
}

impl PreprocessError {
    /// Creates a decode error.
    #[must_use]
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode(reason.into())
    }

    /// Creates a file read error.
    #[must_use]
    pub fn read_file(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ReadFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

/// Result type for ml-preprocess operations.
pub type Result<T> = std::result::Result<T, PreprocessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_decode() {
        let err = PreprocessError::decode("truncated JPEG");
        assert!(err.to_string().contains("decode"));
        assert!(err.to_string().contains("truncated JPEG"));
    }

    #[test]
    fn error_read_file() {
        let err = PreprocessError::read_file("/data/cat.jpg", "permission denied");
        assert!(err.to_string().contains("/data/cat.jpg"));
    }

    #[test]
    fn error_invalid_config() {
        let err = PreprocessError::invalid_config("side must be > 0");
        assert!(err.to_string().contains("side"));
    }
}
