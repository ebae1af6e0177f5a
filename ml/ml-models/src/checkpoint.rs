//! Weight checkpoint persistence.

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::prelude::Backend;
use burn::record::{BinFileRecorder, FullPrecisionSettings, PrettyJsonFileRecorder, Recorder};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Supported checkpoint file formats.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use ml_models::CheckpointFormat;
///
/// let format = CheckpointFormat::from_path(Path::new("models/model.bin"));
/// assert_eq!(format, Some(CheckpointFormat::Binary));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckpointFormat {
    /// Compact binary record; the deployment format.
    #[default]
    Binary,

    /// Pretty-printed JSON record for inspection and debugging.
    Json,
}

impl CheckpointFormat {
    /// Determines the format from a file path's extension.
    ///
    /// `.bin` maps to [`CheckpointFormat::Binary`], `.json` to
    /// [`CheckpointFormat::Json`]; anything else is unknown.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("bin") => Some(Self::Binary),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }

    /// File extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Binary => "bin",
            Self::Json => "json",
        }
    }
}

/// Builds the checkpoint path for a weight file stem.
///
/// `checkpoint_path(dir, "best_model", Binary)` is `dir/best_model.bin`.
#[must_use]
pub fn checkpoint_path(dir: &Path, stem: &str, format: CheckpointFormat) -> PathBuf {
    dir.join(format!("{stem}.{}", format.extension()))
}

/// Saves model weights to `path`, inferring the format from its extension.
///
/// # Errors
///
/// Returns [`ModelError::UnsupportedFormat`] for an unknown extension and
/// [`ModelError::SaveCheckpoint`] if the recorder fails.
pub fn save_checkpoint<B, M>(model: &M, path: &Path) -> Result<()>
where
    B: Backend,
    M: Module<B>,
{
    let format = CheckpointFormat::from_path(path)
        .ok_or_else(|| ModelError::unsupported_format(path.display().to_string()))?;
    let record = model.clone().into_record();

    match format {
        CheckpointFormat::Binary => {
            let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
            recorder
                .record(record, path.to_path_buf())
                .map_err(|e| ModelError::save_checkpoint(path.display().to_string(), e.to_string()))?;
        }
        CheckpointFormat::Json => {
            let recorder = PrettyJsonFileRecorder::<FullPrecisionSettings>::new();
            recorder
                .record(record, path.to_path_buf())
                .map_err(|e| ModelError::save_checkpoint(path.display().to_string(), e.to_string()))?;
        }
    }

    Ok(())
}

/// Loads weights from `path` into `model`.
///
/// # Errors
///
/// Returns [`ModelError::CheckpointNotFound`] if the file does not exist —
/// callers that support degraded startup match on this variant —
/// [`ModelError::UnsupportedFormat`] for an unknown extension, and
/// [`ModelError::LoadCheckpoint`] if the record cannot be read (including
/// an architecture mismatch).
pub fn load_checkpoint<B, M>(model: M, path: &Path, device: &B::Device) -> Result<M>
where
    B: Backend,
    M: Module<B>,
{
    if !path.exists() {
        return Err(ModelError::checkpoint_not_found(path.display().to_string()));
    }

    let format = CheckpointFormat::from_path(path)
        .ok_or_else(|| ModelError::unsupported_format(path.display().to_string()))?;

    let loaded = match format {
        CheckpointFormat::Binary => {
            let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
            model
                .load_file(path, &recorder, device)
                .map_err(|e| ModelError::load_checkpoint(path.display().to_string(), e.to_string()))?
        }
        CheckpointFormat::Json => {
            let recorder = PrettyJsonFileRecorder::<FullPrecisionSettings>::new();
            model
                .load_file(path, &recorder, device)
                .map_err(|e| ModelError::load_checkpoint(path.display().to_string(), e.to_string()))?
        }
    };

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnn::CatDogCnnConfig;

    type TestBackend = burn::backend::NdArray<f32>;

    fn small_config() -> CatDogCnnConfig {
        CatDogCnnConfig {
            num_classes: 2,
            hidden: 8,
            dropout: 0.5,
            image_size: 16,
        }
    }

    #[test]
    fn format_from_path() {
        assert_eq!(
            CheckpointFormat::from_path(Path::new("model.bin")),
            Some(CheckpointFormat::Binary)
        );
        assert_eq!(
            CheckpointFormat::from_path(Path::new("/models/best_model.JSON")),
            Some(CheckpointFormat::Json)
        );
        assert_eq!(CheckpointFormat::from_path(Path::new("model.pth")), None);
        assert_eq!(CheckpointFormat::from_path(Path::new("model")), None);
    }

    #[test]
    fn format_default_is_binary() {
        assert_eq!(CheckpointFormat::default(), CheckpointFormat::Binary);
    }

    #[test]
    fn path_helper_appends_extension() {
        let path = checkpoint_path(Path::new("models"), "best_model", CheckpointFormat::Binary);
        assert_eq!(path, PathBuf::from("models/best_model.bin"));
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = checkpoint_path(dir.path(), "model", CheckpointFormat::Binary);
        let device = Default::default();

        let model = small_config().init::<TestBackend>(&device);
        save_checkpoint(&model, &path).unwrap();
        assert!(path.exists());

        let fresh = small_config().init::<TestBackend>(&device);
        let loaded = load_checkpoint(fresh, &path, &device).unwrap();

        // Loaded weights must reproduce the saved model's outputs.
        let input = burn::tensor::Tensor::<TestBackend, 4>::ones([1, 3, 16, 16], &device);
        let expected: Vec<f32> = model
            .forward(input.clone())
            .into_data()
            .to_vec()
            .unwrap();
        let got: Vec<f32> = loaded.forward(input).into_data().to_vec().unwrap();
        assert_eq!(expected, got);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = checkpoint_path(dir.path(), "model", CheckpointFormat::Binary);
        let device = Default::default();

        let model = small_config().init::<TestBackend>(&device);
        let err = load_checkpoint(model, &path, &device).unwrap_err();
        assert!(matches!(err, ModelError::CheckpointNotFound(_)));
    }

    #[test]
    fn save_rejects_unknown_extension() {
        let device = Default::default();
        let model = small_config().init::<TestBackend>(&device);
        let err = save_checkpoint(&model, Path::new("/tmp/model.pth")).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedFormat(_)));
    }
}
