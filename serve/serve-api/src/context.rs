//! Process-lifetime application state.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use burn::prelude::{Backend, Tensor};
use tracing::{info, warn};

use ml_models::{
    BackendType, CatDogCnn, CatDogCnnConfig, CheckpointFormat, DefaultBackend, ModelError,
    checkpoint_path, default_backend, default_device, load_checkpoint,
};
use ml_preprocess::{TransformConfig, decode_image};
use ml_types::{ClassList, Prediction, softmax};

use crate::error::{Result, ServeError};
use crate::metrics::ServiceMetrics;

type Device = <DefaultBackend as Backend>::Device;

/// Shared handle to the application context.
pub type SharedContext = Arc<AppContext>;

/// Everything the request handlers need, built once at startup.
///
/// The model, class list, and transform are read-only after
/// initialization; the only mutation under load is the atomic metric
/// counters. Requests are never served before this constructor returns,
/// so handlers can rely on a fully built context.
#[derive(Debug)]
pub struct AppContext {
    model: CatDogCnn<DefaultBackend>,
    device: Device,
    backend: BackendType,
    classes: ClassList,
    transform: TransformConfig,
    metrics: ServiceMetrics,
    model_loaded: bool,
}

impl AppContext {
    /// Loads the class list and checkpoint from `model_dir` and builds
    /// the context.
    ///
    /// A missing `classes.txt` falls back to the cat/dog pair with a
    /// warning. A missing checkpoint enters degraded mode: the service
    /// still starts, serves the untrained model, and reports
    /// `model_loaded: false`.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError::Startup`] for unreadable or mismatched
    /// checkpoints and for metric registration failures.
    pub fn initialize(model_dir: &Path, model_config: CatDogCnnConfig) -> Result<Self> {
        let device = default_device();
        let backend = default_backend();
        info!(backend = %backend, "initializing inference context");

        let classes_path = model_dir.join("classes.txt");
        let classes = match ClassList::load(&classes_path) {
            Ok(classes) => classes,
            Err(e) => {
                warn!(
                    path = %classes_path.display(),
                    error = %e,
                    "class list not readable, falling back to cat/dog"
                );
                ClassList::cats_dogs()
            }
        };

        // The class list drives the output dimension; the architecture
        // factory is shared with the training loop.
        let mut model_config = model_config;
        model_config.num_classes = classes.len();
        let model: CatDogCnn<DefaultBackend> = model_config.init(&device);

        let weights_path = checkpoint_path(model_dir, "model", CheckpointFormat::Binary);
        let (model, model_loaded) = match load_checkpoint(model, &weights_path, &device) {
            Ok(model) => {
                info!(checkpoint = %weights_path.display(), "model loaded");
                (model, true)
            }
            Err(ModelError::CheckpointNotFound(path)) => {
                warn!(checkpoint = %path, "model file not found, serving untrained model");
                (model_config.init(&device), false)
            }
            Err(e) => return Err(ServeError::startup(e.to_string())),
        };

        #[allow(clippy::cast_possible_truncation)]
        let transform = TransformConfig::new(model_config.image_size as u32)
            .map_err(|e| ServeError::startup(e.to_string()))?;

        Ok(Self {
            model,
            device,
            backend,
            classes,
            transform,
            metrics: ServiceMetrics::new()?,
            model_loaded,
        })
    }

    /// Runs the full prediction pipeline on uploaded image bytes.
    ///
    /// Decode, deterministic transform, forward pass (the serving backend
    /// carries no autodiff, so no gradients are ever built), softmax,
    /// and assembly of the response with its latency measurement.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError::BadImage`] for undecodable input and
    /// [`ServeError::Prediction`] for failures inside the model path.
    pub fn predict(&self, bytes: &[u8]) -> Result<Prediction> {
        let started = Instant::now();

        let img = decode_image(bytes).map_err(|e| ServeError::bad_image(e.to_string()))?;
        let tensor = self.transform.apply(&img);
        let side = tensor.side();

        let input = Tensor::<DefaultBackend, 1>::from_floats(tensor.data(), &self.device)
            .reshape([1, 3, side, side]);
        let logits = self
            .model
            .forward_checked(input)
            .map_err(|e| ServeError::prediction(e.to_string()))?;

        let values: Vec<f32> = logits
            .into_data()
            .to_vec()
            .map_err(|e| ServeError::prediction(format!("{e:?}")))?;
        let probabilities = softmax(&values);

        Prediction::from_probabilities(&self.classes, &probabilities, started.elapsed().as_secs_f64())
            .map_err(|e| ServeError::prediction(e.to_string()))
    }

    /// Whether trained weights were loaded at startup.
    #[must_use]
    pub const fn model_loaded(&self) -> bool {
        self.model_loaded
    }

    /// The backend this process runs on.
    #[must_use]
    pub const fn backend(&self) -> BackendType {
        self.backend
    }

    /// The class list served by this process.
    #[must_use]
    pub const fn classes(&self) -> &ClassList {
        &self.classes
    }

    /// The service metrics.
    #[must_use]
    pub const fn metrics(&self) -> &ServiceMetrics {
        &self.metrics
    }
}
