//! CNN architecture and checkpoint persistence for the classifier.
//!
//! # Model
//!
//! - [`CatDogCnn`] - Convolutional classifier for 224x224 RGB images
//! - [`CatDogCnnConfig`] - The architecture factory shared by the
//!   training loop and the inference service
//!
//! # Checkpoints
//!
//! - [`save_checkpoint`] / [`load_checkpoint`] - Weight persistence via
//!   Burn's file recorders, format inferred from the extension
//! - [`CheckpointFormat`] - Binary (compact) or JSON (debuggable)
//!
//! # Backends
//!
//! - [`BackendType`] - Which compute backend the process runs on
//! - [`DefaultBackend`] / [`DefaultAutodiffBackend`] - Aliases selected at
//!   compile time: CPU `ndarray` by default, `wgpu` with the feature of
//!   the same name
//!
//! # Example
//!
//! ```no_run
//! use ml_models::{CatDogCnn, CatDogCnnConfig, DefaultBackend, default_device};
//!
//! let device = default_device();
//! let config = CatDogCnnConfig::default();
//! let model: CatDogCnn<DefaultBackend> = config.init(&device);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod backend;
mod checkpoint;
mod cnn;
mod error;

pub use backend::{
    BackendType, DefaultAutodiffBackend, DefaultBackend, default_backend, default_device,
};
pub use checkpoint::{CheckpointFormat, checkpoint_path, load_checkpoint, save_checkpoint};
pub use cnn::{CatDogCnn, CatDogCnnConfig};
pub use error::{ModelError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        BackendType, CatDogCnn, CatDogCnnConfig, CheckpointFormat, DefaultAutodiffBackend,
        DefaultBackend, ModelError, checkpoint_path, default_backend, default_device,
        load_checkpoint, save_checkpoint,
    };
}
