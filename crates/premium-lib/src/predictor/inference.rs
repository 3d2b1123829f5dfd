//! Model artifact loading and inference
//!
//! Two artifact formats are supported, selected by file extension:
//! - `.onnx`: a regressor exported to ONNX (e.g. via skl2onnx), run with
//!   tract. The expected feature order is read from the `feature_names`
//!   metadata property (comma-separated) and defaults to the canonical six.
//! - `.json`: a linear model `{feature_names, coefficients, intercept}`.

use super::RegressionModel;
use crate::error::ModelError;
use crate::models::FEATURE_NAMES;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tract_onnx::prelude::*;
use tracing::debug;

/// ONNX metadata key holding the comma-separated input feature names
pub const FEATURE_NAMES_METADATA_KEY: &str = "feature_names";

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Load a regression model from disk
pub fn load_model(path: &Path) -> Result<Arc<dyn RegressionModel>, ModelError> {
    let bytes = std::fs::read(path).map_err(|e| ModelError::load(path, e))?;
    let version = artifact_version(path, &bytes);
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let model: Arc<dyn RegressionModel> = match extension.as_deref() {
        Some("onnx") => Arc::new(
            OnnxRegressor::from_bytes(&bytes, version)
                .map_err(|e| ModelError::load(path, format!("{:#}", e)))?,
        ),
        Some("json") => Arc::new(
            LinearRegressor::from_bytes(&bytes, version)
                .map_err(|e| ModelError::load(path, format!("{:#}", e)))?,
        ),
        other => {
            return Err(ModelError::load(
                path,
                format!("unsupported model format {:?}", other.unwrap_or("")),
            ))
        }
    };

    debug!(
        path = %path.display(),
        version = %model.version(),
        features = model.feature_names().len(),
        "Model artifact loaded"
    );
    Ok(model)
}

/// `<file stem>@<first 12 hex chars of sha256>`
fn artifact_version(path: &Path, bytes: &[u8]) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model");
    let digest = hex::encode(Sha256::digest(bytes));
    format!("{}@{}", stem, &digest[..12])
}

fn canonical_feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
}

/// ONNX regressor run through tract
pub struct OnnxRegressor {
    model: TractModel,
    feature_names: Vec<String>,
    version: String,
}

impl OnnxRegressor {
    /// Parse, optimize and plan an ONNX model from bytes
    pub fn from_bytes(model_bytes: &[u8], version: impl Into<String>) -> Result<Self> {
        let onnx = tract_onnx::onnx();
        let proto = onnx
            .proto_model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?;

        let feature_names = proto
            .metadata_props
            .iter()
            .find(|prop| prop.key == FEATURE_NAMES_METADATA_KEY)
            .map(|prop| parse_feature_list(&prop.value))
            .filter(|names| !names.is_empty())
            .unwrap_or_else(canonical_feature_names);

        let model = onnx
            .model_for_proto_model(&proto)
            .context("Failed to build ONNX graph")?
            .with_input_fact(0, f32::fact([1, feature_names.len()]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;

        Ok(Self {
            model,
            feature_names,
            version: version.into(),
        })
    }

    fn run(&self, inputs: &[f32]) -> Result<f64> {
        let input: Tensor =
            tract_ndarray::Array2::from_shape_vec((1, inputs.len()), inputs.to_vec())?.into();
        let result = self.model.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;
        let output = output.cast_to::<f32>()?;
        let view = output.to_array_view::<f32>()?;
        match view.iter().next() {
            Some(value) => Ok(f64::from(*value)),
            None => bail!("Model produced an empty output tensor"),
        }
    }
}

impl RegressionModel for OnnxRegressor {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, inputs: &[f32]) -> Result<f64, ModelError> {
        if inputs.len() != self.feature_names.len() {
            return Err(ModelError::prediction(format!(
                "expected {} features, got {}",
                self.feature_names.len(),
                inputs.len()
            )));
        }
        self.run(inputs)
            .map_err(|e| ModelError::prediction(format!("{:#}", e)))
    }

    fn version(&self) -> &str {
        &self.version
    }
}

fn parse_feature_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Serialized form of a linear regression model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// Ordinary linear regressor: `intercept + sum(coef_i * x_i)`
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    artifact: LinearArtifact,
    version: String,
}

impl LinearRegressor {
    pub fn from_artifact(artifact: LinearArtifact, version: impl Into<String>) -> Result<Self> {
        if artifact.feature_names.is_empty() {
            bail!("Linear model declares no features");
        }
        if artifact.coefficients.len() != artifact.feature_names.len() {
            bail!(
                "Linear model has {} coefficients for {} features",
                artifact.coefficients.len(),
                artifact.feature_names.len()
            );
        }
        Ok(Self {
            artifact,
            version: version.into(),
        })
    }

    pub fn from_bytes(bytes: &[u8], version: impl Into<String>) -> Result<Self> {
        let artifact: LinearArtifact =
            serde_json::from_slice(bytes).context("Failed to parse linear model")?;
        Self::from_artifact(artifact, version)
    }
}

impl RegressionModel for LinearRegressor {
    fn feature_names(&self) -> &[String] {
        &self.artifact.feature_names
    }

    fn predict(&self, inputs: &[f32]) -> Result<f64, ModelError> {
        if inputs.len() != self.artifact.coefficients.len() {
            return Err(ModelError::prediction(format!(
                "expected {} features, got {}",
                self.artifact.coefficients.len(),
                inputs.len()
            )));
        }
        let value = self
            .artifact
            .coefficients
            .iter()
            .zip(inputs)
            .fold(self.artifact.intercept, |acc, (coef, x)| acc + coef * f64::from(*x));
        Ok(value)
    }

    fn version(&self) -> &str {
        &self.version
    }
}
