//! Error types for serve-api crate.

use thiserror::Error;

/// Errors that can occur in the inference service.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Startup failed (metrics registration, unreadable checkpoint, ...).
    #[error("startup error: {0}")]
    Startup(String),

    /// The upload could not be decoded as an image (client error).
    #[error("failed to decode image: {0}")]
    BadImage(String),

    /// Prediction failed inside the model path (server error).
    #[error("prediction failed: {0}")]
    Prediction(String),
}

impl ServeError {
    /// Creates a startup error.
    #[must_use]
    pub fn startup(reason: impl Into<String>) -> Self {
        Self::Startup(reason.into())
    }

    /// Creates a bad image error.
    #[must_use]
    pub fn bad_image(reason: impl Into<String>) -> Self {
        Self::BadImage(reason.into())
    }

    /// Creates a prediction error.
    #[must_use]
    pub fn prediction(reason: impl Into<String>) -> Self {
        Self::Prediction(reason.into())
    }

    /// Returns `true` if the error is the client's fault.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::BadImage(_))
    }
}

/// Result type for serve-api operations.
pub type Result<T> = std::result::Result<T, ServeError>;
