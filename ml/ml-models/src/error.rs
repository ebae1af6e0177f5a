//! Error types for ml-models crate.

use thiserror::Error;

/// Errors that can occur in model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Invalid model configuration.
    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),

    /// Input tensor shape did not match the model's expected input.
    #[error("input shape mismatch: expected [batch, {expected_channels}, {expected_side}, {expected_side}], got {got:?}")]
    ShapeMismatch {
        /// Expected channel count.
        expected_channels: usize,
        /// Expected height and width.
        expected_side: usize,
        /// The offending shape.
        got: [usize; 4],
    },

    /// Checkpoint file does not exist.
    #[error("checkpoint not found: {0}")]
    CheckpointNotFound(String),

    /// Failed to save a checkpoint.
    #[error("failed to save checkpoint {path}: {reason}")]
    SaveCheckpoint {
        /// Target path.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to load a checkpoint.
    #[error("failed to load checkpoint {path}: {reason}")]
    LoadCheckpoint {
        /// Source path.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Checkpoint format could not be determined from the path.
    #[error("unsupported checkpoint format: {0}")]
    UnsupportedFormat(String),
}

impl ModelError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates a shape mismatch error.
    #[must_use]
    pub const fn shape_mismatch(
        expected_channels: usize,
        expected_side: usize,
        got: [usize; 4],
    ) -> Self {
        Self::ShapeMismatch {
            expected_channels,
            expected_side,
            got,
        }
    }

    /// Creates a checkpoint-not-found error.
    #[must_use]
    pub fn checkpoint_not_found(path: impl Into<String>) -> Self {
        Self::CheckpointNotFound(path.into())
    }

    /// Creates a save error.
    #[must_use]
    pub fn save_checkpoint(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SaveCheckpoint {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a load error.
    #[must_use]
    pub fn load_checkpoint(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LoadCheckpoint {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unsupported format error.
    #[must_use]
    pub fn unsupported_format(path: impl Into<String>) -> Self {
        Self::UnsupportedFormat(path.into())
    }
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_config() {
        let err = ModelError::invalid_config("num_classes must be > 0");
        assert!(err.to_string().contains("num_classes"));
    }

    #[test]
    fn error_shape_mismatch() {
        let err = ModelError::shape_mismatch(3, 224, [1, 1, 64, 64]);
        let text = err.to_string();
        assert!(text.contains("224"));
        assert!(text.contains("[1, 1, 64, 64]"));
    }

    #[test]
    fn error_checkpoint_not_found() {
        let err = ModelError::checkpoint_not_found("models/model.bin");
        assert!(err.to_string().contains("models/model.bin"));
    }

    #[test]
    fn error_save_checkpoint() {
        let err = ModelError::save_checkpoint("models/model.bin", "disk full");
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn error_unsupported_format() {
        let err = ModelError::unsupported_format("model.xml");
        assert!(err.to_string().contains("model.xml"));
    }
}
