//! Insurance premium prediction library
//!
//! This crate provides:
//! - Feature encoding of raw form submissions
//! - Regression inference over ONNX or linear model artifacts
//! - Rule-based and generated advice with bounded retries
//! - The end-to-end prediction pipeline, health and observability

pub mod advice;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod predictor;

pub use error::{AdvisorFailure, ModelError, PipelineError, ValidationError, GENERIC_FAILURE_MESSAGE};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{PipelineMetrics, StructuredLogger};
pub use pipeline::{PipelineStage, PredictionPipeline};
