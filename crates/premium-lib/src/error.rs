//! Error types for the prediction pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Message shown to users for any model-side failure
pub const GENERIC_FAILURE_MESSAGE: &str = "Prediction failed";

/// Rejected user input; the user must resubmit
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid value for {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Failures while loading or running the regression model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to load model from {path:?}: {cause}")]
    Load { path: PathBuf, cause: String },

    #[error("Prediction error: {cause}")]
    Prediction { cause: String },
}

impl ModelError {
    pub fn load(path: impl Into<PathBuf>, cause: impl ToString) -> Self {
        ModelError::Load {
            path: path.into(),
            cause: cause.to_string(),
        }
    }

    pub fn prediction(cause: impl ToString) -> Self {
        ModelError::Prediction {
            cause: cause.to_string(),
        }
    }
}

/// A single failed call to the text-generation service.
///
/// Never reaches users; the advisor absorbs it into fallback advice.
#[derive(Error, Debug)]
pub enum AdvisorFailure {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Service returned no text")]
    EmptyResponse,

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Terminal failure of a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl PipelineError {
    /// Message safe to display to the submitting user
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Validation(e) => e.to_string(),
            PipelineError::Model(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
