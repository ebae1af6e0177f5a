//! HTTP inference service for the cats-vs-dogs classifier.
//!
//! # Application Context
//!
//! - [`AppContext`] - Model, device, class list, transform, and metrics,
//!   built once at startup and shared read-only behind an `Arc`. There is
//!   no global mutable state; request handlers receive the context by
//!   injection.
//!
//! # Endpoints
//!
//! - `GET /health` - Readiness, model-loaded flag, device, timestamp
//! - `POST /predict` - Multipart image upload, returns the prediction,
//!   confidence, per-class probabilities, and latency
//! - `GET /metrics` - Prometheus text exposition
//! - `GET /` - Service description
//!
//! # Degraded Mode
//!
//! A missing checkpoint at startup is not fatal: the service starts with
//! an untrained model, logs a warning, and reports `model_loaded: false`
//! from `/health`. Any other checkpoint failure aborts startup.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use ml_models::CatDogCnnConfig;
//! use serve_api::{AppContext, routes};
//!
//! # async fn run() -> Result<(), serve_api::ServeError> {
//! let ctx = Arc::new(AppContext::initialize(
//!     Path::new("models"),
//!     CatDogCnnConfig::default(),
//! )?);
//! warp::serve(routes(ctx)).run(([0, 0, 0, 0], 8000)).await;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod context;
mod error;
mod metrics;
mod routes;

pub use context::{AppContext, SharedContext};
pub use error::{Result, ServeError};
pub use metrics::ServiceMetrics;
pub use routes::{ApiError, HealthResponse, ServiceInfo, routes, serve};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        ApiError, AppContext, HealthResponse, Result, ServeError, ServiceInfo, ServiceMetrics,
        SharedContext, routes, serve,
    };
}
