//! End-to-end prediction pipeline
//!
//! `Validating -> Predicting -> Advising -> Done`. A failure in validation
//! or prediction ends the run in `Failed` before any advice is requested;
//! advising itself cannot fail.

use crate::advice::{CancelSignal, GenerativeAdvisor};
use crate::error::{ModelError, PipelineError, Result};
use crate::health::{components, HealthRegistry};
use crate::models::{
    round_to_cents, AdviceRequest, AdviceSource, FeatureRecord, FinalOutcome, PredictionResult,
    RawSubmission,
};
use crate::observability::{PipelineMetrics, StructuredLogger};
use crate::predictor::{FeatureVectorBuilder, ModelPredictor};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stages a pipeline run passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    Predicting,
    Advising,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Validating => "validating",
            PipelineStage::Predicting => "predicting",
            PipelineStage::Advising => "advising",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Composes feature building, prediction and advice
#[derive(Clone)]
pub struct PredictionPipeline {
    model_path: PathBuf,
    builder: FeatureVectorBuilder,
    predictor: ModelPredictor,
    advisor: GenerativeAdvisor,
    metrics: PipelineMetrics,
    logger: StructuredLogger,
    health: Option<HealthRegistry>,
}

impl PredictionPipeline {
    pub fn new(model_path: impl Into<PathBuf>, predictor: ModelPredictor, advisor: GenerativeAdvisor) -> Self {
        Self {
            model_path: model_path.into(),
            builder: FeatureVectorBuilder::new(),
            predictor,
            advisor,
            metrics: PipelineMetrics::new(),
            logger: StructuredLogger::default(),
            health: None,
        }
    }

    /// Report model and advisor outcomes to `health`
    pub fn with_health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub async fn run(&self, raw: &RawSubmission) -> Result<FinalOutcome> {
        self.run_with_cancel(raw, &CancelSignal::never()).await
    }

    /// Run the pipeline; `cancel` only shortens the advice retry loop
    pub async fn run_with_cancel(&self, raw: &RawSubmission, cancel: &CancelSignal) -> Result<FinalOutcome> {
        let mut stage = PipelineStage::Validating;
        debug!(stage = %stage, "Pipeline stage");
        let profile = match self.builder.build_profile(raw) {
            Ok(profile) => profile,
            Err(e) => return Err(self.fail(stage, e.into())),
        };

        stage = PipelineStage::Predicting;
        debug!(stage = %stage, "Pipeline stage");
        let record = FeatureRecord::from_profile(&profile);
        let predictor = self.predictor.clone();
        let model_path = self.model_path.clone();
        // Artifact loading and inference are CPU and disk bound
        let predicted = tokio::task::spawn_blocking(move || predictor.predict(&model_path, record))
            .await
            .unwrap_or_else(|e| Err(ModelError::prediction(format!("inference task failed: {}", e))));
        let estimate = match predicted {
            Ok(estimate) => estimate,
            Err(e) => {
                if matches!(e, ModelError::Load { .. }) {
                    self.report(components::MODEL, Some(e.to_string())).await;
                }
                return Err(self.fail(stage, e.into()));
            }
        };
        self.report(components::MODEL, None).await;

        stage = PipelineStage::Advising;
        debug!(stage = %stage, "Pipeline stage");
        let predicted_cost = round_to_cents(estimate.prediction.cost);
        let request = AdviceRequest::new(profile, PredictionResult { cost: predicted_cost });
        let advice = self.advisor.advise_with_cancel(&request, cancel).await;
        match advice.source {
            AdviceSource::Generated => self.report(components::ADVISOR, None).await,
            AdviceSource::Fallback => {
                self.report(
                    components::ADVISOR,
                    Some(format!("Fell back to rule-based advice after {} attempts", advice.attempts)),
                )
                .await
            }
        }

        stage = PipelineStage::Done;
        debug!(stage = %stage, "Pipeline stage");
        let outcome = FinalOutcome {
            predicted_cost,
            advice_text: advice.text,
            advice_source: advice.source,
            model_version: estimate.model_version,
        };

        self.metrics.inc_predictions(outcome.advice_source.as_str());
        self.logger.log_prediction(
            outcome.predicted_cost,
            outcome.advice_source.as_str(),
            &outcome.model_version,
            advice.attempts,
        );
        Ok(outcome)
    }

    /// `problem` marks the model unhealthy but the advisor only degraded
    async fn report(&self, component: &str, problem: Option<String>) {
        let Some(health) = &self.health else {
            return;
        };
        match problem {
            None => health.set_healthy(component).await,
            Some(message) if component == components::MODEL => {
                health.set_unhealthy(component, message).await
            }
            Some(message) => health.set_degraded(component, message).await,
        }
    }

    fn fail(&self, stage: PipelineStage, error: PipelineError) -> PipelineError {
        debug!(stage = %PipelineStage::Failed, failed_in = %stage, "Pipeline stage");
        let kind = match &error {
            PipelineError::Validation(_) => "validation",
            PipelineError::Model(ModelError::Load { .. }) => "model_load",
            PipelineError::Model(ModelError::Prediction { .. }) => "prediction",
        };
        self.metrics.inc_prediction_errors(kind);
        self.logger
            .log_prediction_failed(&stage.to_string(), &error, error.is_validation());
        error
    }
}
