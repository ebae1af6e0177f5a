//! HTTP route tree and request handlers.

use std::convert::Infallible;
use std::net::SocketAddr;

use bytes::BufMut;
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use warp::http::StatusCode;
use warp::multipart::{FormData, Part};
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::context::SharedContext;
use crate::error::ServeError;

/// Multipart uploads above this size are rejected by the filter.
const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

// =============================================================================
// Response types
// =============================================================================

/// Payload of `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"healthy"` once the process serves requests.
    pub status: String,

    /// Whether trained weights were loaded at startup.
    pub model_loaded: bool,

    /// Compute backend name.
    pub device: String,

    /// RFC 3339 timestamp of the health check.
    pub timestamp: String,
}

/// Payload of `GET /`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Human-readable service description.
    pub message: String,

    /// Endpoint map.
    pub endpoints: EndpointMap,
}

/// The endpoints listed by the service description.
#[derive(Debug, Serialize, Deserialize)]
pub struct EndpointMap {
    /// Health endpoint.
    pub health: String,

    /// Prediction endpoint.
    pub predict: String,

    /// Metrics endpoint.
    pub metrics: String,
}

/// Error payload returned with 4xx/5xx statuses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable cause.
    pub error: String,

    /// Stable machine-readable code.
    pub code: String,
}

// =============================================================================
// Routes
// =============================================================================

/// Builds the complete route tree.
pub fn routes(
    ctx: SharedContext,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_context(ctx.clone()))
        .and_then(handle_health);

    let predict = warp::path("predict")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::multipart::form().max_length(MAX_UPLOAD_BYTES))
        .and(with_context(ctx.clone()))
        .and_then(handle_predict);

    let metrics = warp::path("metrics")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_context(ctx.clone()))
        .and_then(handle_metrics);

    let root = warp::path::end().and(warp::get()).and_then(handle_root);

    health.or(predict).or(metrics).or(root)
}

/// Binds the service and runs until the process exits.
pub async fn serve(ctx: SharedContext, addr: SocketAddr) {
    info!(%addr, "inference service listening");
    warp::serve(routes(ctx)).run(addr).await;
}

fn with_context(
    ctx: SharedContext,
) -> impl Filter<Extract = (SharedContext,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

// =============================================================================
// Handlers
// =============================================================================

async fn handle_health(ctx: SharedContext) -> Result<Response, Infallible> {
    let payload = HealthResponse {
        status: "healthy".to_string(),
        model_loaded: ctx.model_loaded(),
        device: ctx.backend().name().to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    Ok(warp::reply::json(&payload).into_response())
}

async fn handle_predict(form: FormData, ctx: SharedContext) -> Result<Response, Infallible> {
    ctx.metrics().record_request();

    let bytes = match read_image_part(form).await {
        Ok(bytes) => bytes,
        Err(reason) => {
            return Ok(error_reply(StatusCode::BAD_REQUEST, "bad_upload", &reason));
        }
    };

    match ctx.predict(&bytes) {
        Ok(prediction) => {
            ctx.metrics()
                .record_prediction(&prediction.prediction, prediction.latency_seconds);
            info!(
                prediction = %prediction.prediction,
                confidence = prediction.confidence,
                latency_seconds = prediction.latency_seconds,
                "prediction served"
            );
            Ok(warp::reply::json(&prediction).into_response())
        }
        Err(err @ ServeError::BadImage(_)) => {
            error!(error = %err, "rejected undecodable upload");
            Ok(error_reply(
                StatusCode::BAD_REQUEST,
                "bad_image",
                &err.to_string(),
            ))
        }
        Err(err) => {
            error!(error = %err, "prediction failed");
            Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "prediction_failed",
                &err.to_string(),
            ))
        }
    }
}

async fn handle_metrics(ctx: SharedContext) -> Result<Response, Infallible> {
    let body = ctx.metrics().gather();
    Ok(warp::reply::with_header(body, "content-type", "text/plain; charset=utf-8")
        .into_response())
}

async fn handle_root() -> Result<Response, Infallible> {
    let payload = ServiceInfo {
        message: "Cats vs Dogs Classifier API".to_string(),
        endpoints: EndpointMap {
            health: "/health".to_string(),
            predict: "/predict (POST)".to_string(),
            metrics: "/metrics".to_string(),
        },
    };
    Ok(warp::reply::json(&payload).into_response())
}

/// Extracts the uploaded image bytes from the `file` part.
///
/// The part must exist and carry an `image/*` content type; everything
/// else is a client error described by the returned string.
async fn read_image_part(form: FormData) -> Result<Vec<u8>, String> {
    let parts: Vec<Part> = form
        .try_collect()
        .await
        .map_err(|e| format!("invalid multipart body: {e}"))?;

    let part = parts
        .into_iter()
        .find(|p| p.name() == "file")
        .ok_or_else(|| "missing \"file\" part".to_string())?;

    match part.content_type() {
        Some(ct) if ct.starts_with("image/") => {}
        Some(ct) => return Err(format!("file must be an image, got {ct}")),
        None => return Err("file part has no content type".to_string()),
    }

    part.stream()
        .try_fold(Vec::new(), |mut bytes, chunk| {
            bytes.put(chunk);
            async move { Ok(bytes) }
        })
        .await
        .map_err(|e| format!("failed to read upload: {e}"))
}

fn error_reply(status: StatusCode, code: &str, message: &str) -> Response {
    let body = ApiError {
        error: message.to_string(),
        code: code.to_string(),
    };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}
