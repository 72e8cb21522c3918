//! Observability infrastructure for the style service
//!
//! Provides:
//! - Prometheus metrics: inference latency, predictions by style, failure
//!   counters, and the loaded model
//! - Structured JSON logging with tracing

use crate::models::LearningStyle;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    inference_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    validation_failures: IntCounter,
    inference_errors: IntCounter,
    persist_failures: IntCounter,
    model_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            inference_latency_seconds: register_histogram!(
                "style_service_inference_latency_seconds",
                "Time spent encoding and classifying one record",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register inference_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "style_service_predictions_total",
                "Predictions served, by predicted learning style",
                &["style"]
            )
            .expect("Failed to register predictions_total"),

            validation_failures: register_int_counter!(
                "style_service_validation_failures_total",
                "Requests rejected by record validation"
            )
            .expect("Failed to register validation_failures"),

            inference_errors: register_int_counter!(
                "style_service_inference_errors_total",
                "Requests that failed during inference"
            )
            .expect("Failed to register inference_errors"),

            persist_failures: register_int_counter!(
                "style_service_persist_failures_total",
                "Predictions that could not be written to the store"
            )
            .expect("Failed to register persist_failures"),

            model_info: register_gauge_vec!(
                "style_service_model_info",
                "Loaded classifier, valued at its held-out accuracy",
                &["seed", "run"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new)
    }

    pub fn observe_inference_latency(&self, duration_secs: f64) {
        self.inner().inference_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self, style: LearningStyle) {
        self.inner()
            .predictions_total
            .with_label_values(&[style.name()])
            .inc();
    }

    pub fn inc_validation_failures(&self) {
        self.inner().validation_failures.inc();
    }

    pub fn inc_inference_errors(&self) {
        self.inner().inference_errors.inc();
    }

    pub fn inc_persist_failures(&self) {
        self.inner().persist_failures.inc();
    }

    /// Publish the loaded model, replacing any previous one
    pub fn set_model_info(&self, seed: u64, run: usize, accuracy: f64) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[&seed.to_string(), &run.to_string()])
            .set(accuracy);
    }
}

/// Structured logger for service and training events
#[derive(Clone)]
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn log_startup(&self, version: &str, seed: u64, accuracy: f64, persistence: &str) {
        info!(
            event = "service_started",
            service = %self.service_name,
            service_version = %version,
            model_seed = seed,
            model_accuracy = accuracy,
            persistence = %persistence,
            "Style service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service_name,
            reason = %reason,
            "Style service shutting down"
        );
    }

    pub fn log_prediction(&self, style: LearningStyle, confidence: f64, latency_secs: f64) {
        info!(
            event = "prediction_generated",
            service = %self.service_name,
            predicted_style = %style,
            confidence = confidence,
            latency_ms = latency_secs * 1000.0,
            "Generated learning style prediction"
        );
    }

    pub fn log_persist_failure(&self, prediction_id: &str, error: &str) {
        warn!(
            event = "prediction_persist_failed",
            service = %self.service_name,
            prediction_id = %prediction_id,
            error = %error,
            "Failed to persist prediction, response unaffected"
        );
    }

    pub fn log_training_run(&self, run: usize, seed: u64, accuracy: f64, is_best: bool) {
        info!(
            event = "training_run_completed",
            service = %self.service_name,
            run = run,
            seed = seed,
            accuracy = accuracy,
            is_best = is_best,
            "Training run completed"
        );
    }

    pub fn log_training_completed(
        &self,
        best_run: usize,
        best_seed: u64,
        best_accuracy: f64,
        train_rows: usize,
        test_rows: usize,
    ) {
        info!(
            event = "training_completed",
            service = %self.service_name,
            best_run = best_run,
            best_seed = best_seed,
            best_accuracy = best_accuracy,
            train_rows = train_rows,
            test_rows = test_rows,
            "Training completed, best model selected"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style_count(metrics: &ServiceMetrics, style: LearningStyle) -> u64 {
        metrics
            .inner()
            .predictions_total
            .with_label_values(&[style.name()])
            .get()
    }

    #[test]
    fn test_handles_share_counters() {
        let metrics = ServiceMetrics::new();
        let second = ServiceMetrics::new();
        let visual = style_count(&metrics, LearningStyle::Visual);
        let reading = style_count(&metrics, LearningStyle::ReadingWriting);
        let validation = metrics.inner().validation_failures.get();
        let latency_samples = metrics.inner().inference_latency_seconds.get_sample_count();

        metrics.inc_predictions(LearningStyle::Visual);
        second.inc_predictions(LearningStyle::Visual);
        second.inc_predictions(LearningStyle::ReadingWriting);
        second.inc_validation_failures();
        metrics.observe_inference_latency(0.002);

        assert!(style_count(&metrics, LearningStyle::Visual) >= visual + 2);
        assert!(style_count(&second, LearningStyle::ReadingWriting) > reading);
        assert!(metrics.inner().validation_failures.get() > validation);
        assert!(second.inner().inference_latency_seconds.get_sample_count() > latency_samples);
    }

    #[test]
    fn test_model_info_keeps_one_series() {
        let metrics = ServiceMetrics::new();
        metrics.set_model_info(44, 2, 0.75);
        metrics.set_model_info(43, 1, 0.5);

        let family = prometheus::gather()
            .into_iter()
            .find(|family| family.get_name() == "style_service_model_info")
            .expect("model info is registered");
        let series = family.get_metric();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].get_gauge().get_value(), 0.5);

        let labels: Vec<(&str, &str)> = series[0]
            .get_label()
            .iter()
            .map(|pair| (pair.get_name(), pair.get_value()))
            .collect();
        assert!(labels.contains(&("seed", "43")));
        assert!(labels.contains(&("run", "1")));

        let names: Vec<String> = prometheus::gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"style_service_inference_latency_seconds".to_string()));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("learning-style-api");
        assert_eq!(logger.service_name(), "learning-style-api");
        logger.log_training_run(1, 43, 0.5, true);
    }
}
