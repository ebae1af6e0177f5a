//! Prometheus metrics for the inference service.

use prometheus::{Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

use crate::error::{Result, ServeError};

/// Request and prediction counters plus a latency histogram.
///
/// All counters are registered on a dedicated registry, scoped to the
/// process lifetime. Increments are atomic; the shared context clones are
/// cheap handles onto the same underlying series.
#[derive(Clone)]
pub struct ServiceMetrics {
    registry: Registry,
    requests_total: Counter,
    prediction_latency: Histogram,
    predictions_by_class: CounterVec,
}

impl ServiceMetrics {
    /// Creates and registers the metric families.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError::Startup`] if a metric cannot be created or
    /// registered (duplicate names on one registry, invalid options).
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests_total = Counter::with_opts(Opts::new(
            "prediction_requests_total",
            "Total prediction requests",
        ))
        .map_err(|e| ServeError::startup(e.to_string()))?;

        let prediction_latency = Histogram::with_opts(HistogramOpts::new(
            "prediction_latency_seconds",
            "Prediction latency",
        ))
        .map_err(|e| ServeError::startup(e.to_string()))?;

        let predictions_by_class = CounterVec::new(
            Opts::new("predictions_by_class", "Predictions by class"),
            &["class_name"],
        )
        .map_err(|e| ServeError::startup(e.to_string()))?;

        registry
            .register(Box::new(requests_total.clone()))
            .map_err(|e| ServeError::startup(e.to_string()))?;
        registry
            .register(Box::new(prediction_latency.clone()))
            .map_err(|e| ServeError::startup(e.to_string()))?;
        registry
            .register(Box::new(predictions_by_class.clone()))
            .map_err(|e| ServeError::startup(e.to_string()))?;

        Ok(Self {
            registry,
            requests_total,
            prediction_latency,
            predictions_by_class,
        })
    }

    /// Counts an incoming prediction request.
    pub fn record_request(&self) {
        self.requests_total.inc();
    }

    /// Counts a completed prediction and observes its latency.
    pub fn record_prediction(&self, class_name: &str, latency_secs: f64) {
        self.predictions_by_class
            .with_label_values(&[class_name])
            .inc();
        self.prediction_latency.observe(latency_secs);
    }

    /// Renders the registry in Prometheus text exposition format.
    #[must_use]
    pub fn gather(&self) -> String {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        if encoder.encode(&families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl std::fmt::Debug for ServiceMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceMetrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_exposition_contains_families() {
        let metrics = ServiceMetrics::new().unwrap();
        metrics.record_request();
        metrics.record_prediction("cat", 0.012);

        let output = metrics.gather();
        assert!(output.contains("prediction_requests_total 1"));
        assert!(output.contains("prediction_latency_seconds"));
        assert!(output.contains("predictions_by_class{class_name=\"cat\"} 1"));
    }

    #[test]
    fn metrics_counters_accumulate() {
        let metrics = ServiceMetrics::new().unwrap();
        metrics.record_request();
        metrics.record_request();
        metrics.record_prediction("dog", 0.005);
        metrics.record_prediction("dog", 0.007);

        let output = metrics.gather();
        assert!(output.contains("prediction_requests_total 2"));
        assert!(output.contains("predictions_by_class{class_name=\"dog\"} 2"));
    }

    #[test]
    fn metrics_clones_share_series() {
        let metrics = ServiceMetrics::new().unwrap();
        let clone = metrics.clone();
        clone.record_request();

        assert!(metrics.gather().contains("prediction_requests_total 1"));
    }
}
