//! Observability infrastructure for the premium predictor
//!
//! Provides:
//! - Prometheus metrics (inference latency, prediction and advisor counters)
//! - Named structured log events with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

static GLOBAL_METRICS: OnceLock<PipelineMetricsInner> = OnceLock::new();

struct PipelineMetricsInner {
    inference_latency_seconds: Histogram,
    predictions_completed: IntCounterVec,
    prediction_errors: IntCounterVec,
    advisor_attempts: IntCounter,
    advisor_failures: IntCounter,
    advisor_fallbacks: IntCounter,
    model_version_info: GaugeVec,
}

impl PipelineMetricsInner {
    fn new() -> Self {
        Self {
            inference_latency_seconds: register_histogram!(
                "premium_inference_latency_seconds",
                "Time spent loading and running the regression model",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register inference_latency_seconds"),

            predictions_completed: register_int_counter_vec!(
                "premium_predictions_total",
                "Completed predictions by advice source",
                &["advice_source"]
            )
            .expect("Failed to register predictions_total"),

            prediction_errors: register_int_counter_vec!(
                "premium_prediction_errors_total",
                "Failed prediction requests by error kind",
                &["kind"]
            )
            .expect("Failed to register prediction_errors_total"),

            advisor_attempts: register_int_counter!(
                "premium_advisor_attempts_total",
                "Calls made to the text-generation service"
            )
            .expect("Failed to register advisor_attempts_total"),

            advisor_failures: register_int_counter!(
                "premium_advisor_failures_total",
                "Failed calls to the text-generation service"
            )
            .expect("Failed to register advisor_failures_total"),

            advisor_fallbacks: register_int_counter!(
                "premium_advisor_fallbacks_total",
                "Requests answered with rule-based fallback advice"
            )
            .expect("Failed to register advisor_fallbacks_total"),

            model_version_info: register_gauge_vec!(
                "premium_model_version_info",
                "Information about the most recently used model artifact",
                &["version"]
            )
            .expect("Failed to register model_version_info"),
        }
    }
}

/// Handle to the process-wide pipeline metrics
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct PipelineMetrics {
    _private: (),
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PipelineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PipelineMetricsInner {
        GLOBAL_METRICS.get_or_init(PipelineMetricsInner::new)
    }

    pub fn observe_inference_latency(&self, duration_secs: f64) {
        self.inner().inference_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self, advice_source: &str) {
        self.inner()
            .predictions_completed
            .with_label_values(&[advice_source])
            .inc();
    }

    pub fn inc_prediction_errors(&self, kind: &str) {
        self.inner().prediction_errors.with_label_values(&[kind]).inc();
    }

    pub fn inc_advisor_attempts(&self) {
        self.inner().advisor_attempts.inc();
    }

    pub fn inc_advisor_failures(&self) {
        self.inner().advisor_failures.inc();
    }

    pub fn inc_advisor_fallbacks(&self) {
        self.inner().advisor_fallbacks.inc();
    }

    pub fn set_model_version(&self, version: &str) {
        self.inner().model_version_info.reset();
        self.inner()
            .model_version_info
            .with_label_values(&[version])
            .set(1.0);
    }
}

/// Structured logger for pipeline events
///
/// Every log-worthy signal the pipeline raises goes through here so event
/// names and field sets stay consistent.
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl Default for StructuredLogger {
    fn default() -> Self {
        Self::new("premium-predictor")
    }
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_prediction(
        &self,
        predicted_cost: f64,
        advice_source: &str,
        model_version: &str,
        advisor_attempts: u32,
    ) {
        info!(
            event = "prediction_completed",
            service = %self.service,
            predicted_cost = predicted_cost,
            advice_source = %advice_source,
            model_version = %model_version,
            advisor_attempts = advisor_attempts,
            "Generated premium prediction"
        );
    }

    /// Validation failures are the user's to fix; model failures are operational
    pub fn log_prediction_failed(&self, stage: &str, error: &dyn std::error::Error, user_error: bool) {
        if user_error {
            info!(
                event = "prediction_rejected",
                service = %self.service,
                stage = %stage,
                error = %error,
                "Rejected invalid submission"
            );
        } else {
            error!(
                event = "prediction_failed",
                service = %self.service,
                stage = %stage,
                error = %error,
                "Prediction failed"
            );
        }
    }

    pub fn log_model_loaded(&self, path: &str, version: &str, features: usize) {
        info!(
            event = "model_loaded",
            service = %self.service,
            path = %path,
            model_version = %version,
            features = features,
            "Model artifact loaded"
        );
    }

    pub fn log_columns_filled(&self, model_version: &str, filled: &[String]) {
        warn!(
            event = "columns_filled",
            service = %self.service,
            model_version = %model_version,
            filled = ?filled,
            "Model expects features missing from the record, filled with 0"
        );
    }

    pub fn log_advisor_attempt_failed(&self, attempt: u32, max_attempts: u32, cause: &str) {
        warn!(
            event = "advisor_attempt_failed",
            service = %self.service,
            attempt = attempt,
            max_attempts = max_attempts,
            cause = %cause,
            "Text generation attempt failed"
        );
    }

    pub fn log_advisor_fallback(&self, attempts: u32, cancelled: bool) {
        info!(
            event = "advisor_fallback",
            service = %self.service,
            attempts = attempts,
            cancelled = cancelled,
            "Using fallback advice generation"
        );
    }

    pub fn log_startup(&self, version: &str, model_path: &str) {
        info!(
            event = "server_started",
            service = %self.service,
            server_version = %version,
            model_path = %model_path,
            "Premium predictor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            service = %self.service,
            reason = %reason,
            "Premium predictor shutting down"
        );
    }
}
