//! Compute backend selection.

use serde::{Deserialize, Serialize};

/// Compute backend the classifier runs on.
///
/// The inference service reports this in its health payload; the training
/// loop logs it at startup.
///
/// # Example
///
/// ```
/// use ml_models::BackendType;
///
/// assert!(BackendType::NdArray.is_cpu());
/// assert_eq!(BackendType::Wgpu.name(), "wgpu");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BackendType {
    /// CPU backend using ndarray. Always available.
    #[default]
    NdArray,

    /// GPU backend using WGPU. Compiled in with the `wgpu` feature.
    Wgpu,
}

impl BackendType {
    /// Returns `true` for the CPU backend.
    #[must_use]
    pub const fn is_cpu(&self) -> bool {
        matches!(self, Self::NdArray)
    }

    /// Returns `true` for an accelerator backend.
    #[must_use]
    pub const fn is_accelerator(&self) -> bool {
        matches!(self, Self::Wgpu)
    }

    /// Backend name as reported in health payloads and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NdArray => "ndarray",
            Self::Wgpu => "wgpu",
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The backend this build runs on: the accelerator when compiled in,
/// otherwise the CPU.
#[must_use]
pub const fn default_backend() -> BackendType {
    #[cfg(feature = "wgpu")]
    {
        BackendType::Wgpu
    }
    #[cfg(not(feature = "wgpu"))]
    {
        BackendType::NdArray
    }
}

/// Inference backend for this build.
#[cfg(not(feature = "wgpu"))]
pub type DefaultBackend = burn::backend::NdArray<f32>;

/// Inference backend for this build.
#[cfg(feature = "wgpu")]
pub type DefaultBackend = burn::backend::Wgpu;

/// Training backend for this build (inference backend plus autodiff).
pub type DefaultAutodiffBackend = burn::backend::Autodiff<DefaultBackend>;

/// Default device for [`DefaultBackend`].
#[must_use]
pub fn default_device() -> <DefaultBackend as burn::prelude::Backend>::Device {
    Default::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_classification() {
        assert!(BackendType::NdArray.is_cpu());
        assert!(!BackendType::NdArray.is_accelerator());
        assert!(BackendType::Wgpu.is_accelerator());
    }

    #[test]
    fn backend_names() {
        assert_eq!(BackendType::NdArray.name(), "ndarray");
        assert_eq!(format!("{}", BackendType::Wgpu), "wgpu");
    }

    #[test]
    fn backend_default_is_cpu() {
        assert_eq!(BackendType::default(), BackendType::NdArray);
    }

    #[test]
    fn default_backend_matches_features() {
        #[cfg(not(feature = "wgpu"))]
        assert!(default_backend().is_cpu());
        #[cfg(feature = "wgpu")]
        assert!(default_backend().is_accelerator());
    }

    #[test]
    fn backend_serialization() {
        let json = serde_json::to_string(&BackendType::NdArray).unwrap();
        let parsed: BackendType = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, BackendType::NdArray);
    }
}
