//! Point-estimate prediction from a feature record

use super::{align_columns, load_model, ModelCache, RegressionModel};
use crate::error::ModelError;
use crate::models::{FeatureRecord, PredictionResult};
use crate::observability::{PipelineMetrics, StructuredLogger};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Inference slower than this logs a warning
pub const SLOW_INFERENCE_MS: u128 = 50;

/// A prediction together with the artifact that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub prediction: PredictionResult,
    pub model_version: String,
}

/// Loads a model and runs one aligned inference.
///
/// With a cache the model is loaded once per path; without one every call
/// reloads from disk. Both paths return identical estimates.
#[derive(Clone)]
pub struct ModelPredictor {
    cache: Option<Arc<ModelCache>>,
    metrics: PipelineMetrics,
    logger: StructuredLogger,
}

impl Default for ModelPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelPredictor {
    /// Reload the artifact on every prediction
    pub fn new() -> Self {
        Self {
            cache: None,
            metrics: PipelineMetrics::new(),
            logger: StructuredLogger::default(),
        }
    }

    /// Memoize loaded artifacts in `cache`
    pub fn with_cache(cache: Arc<ModelCache>) -> Self {
        Self {
            cache: Some(cache),
            ..Self::new()
        }
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Load (or fetch from the cache) the model at `model_path`
    pub fn model(&self, model_path: &Path) -> Result<Arc<dyn RegressionModel>, ModelError> {
        match &self.cache {
            Some(cache) => cache.get_or_load(model_path),
            None => load_model(model_path),
        }
    }

    /// Load the model at `model_path` and predict a cost for `record`
    pub fn predict(&self, model_path: &Path, record: FeatureRecord) -> Result<Estimate, ModelError> {
        let start = Instant::now();
        let model = self.model(model_path)?;
        let estimate = self.predict_with(model.as_ref(), record)?;

        let elapsed = start.elapsed();
        self.metrics.observe_inference_latency(elapsed.as_secs_f64());
        self.metrics.set_model_version(&estimate.model_version);
        if elapsed.as_millis() > SLOW_INFERENCE_MS {
            warn!(
                elapsed_ms = elapsed.as_millis(),
                "Inference exceeded {}ms target", SLOW_INFERENCE_MS
            );
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(estimate)
    }

    /// Align `record` to an already-loaded model and run inference
    pub fn predict_with(
        &self,
        model: &dyn RegressionModel,
        record: FeatureRecord,
    ) -> Result<Estimate, ModelError> {
        let (inputs, filled) = align_columns(record, model.feature_names())?;
        if !filled.is_empty() {
            self.logger.log_columns_filled(model.version(), &filled);
        }

        let raw = model.predict(&inputs)?;
        if !raw.is_finite() {
            return Err(ModelError::prediction(format!(
                "model produced a non-finite value ({})",
                raw
            )));
        }
        let cost = if raw < 0.0 {
            warn!(raw_cost = raw, "Model predicted a negative cost, clamping to 0");
            0.0
        } else {
            raw
        };

        Ok(Estimate {
            prediction: PredictionResult { cost },
            model_version: model.version().to_string(),
        })
    }
}
