//! Premium prediction engine

mod cache;
mod columns;
mod estimate;
mod features;
mod inference;

pub use cache::ModelCache;
pub use columns::{align_columns, fill_missing_columns, select_columns, MISSING_FEATURE_DEFAULT};
pub use estimate::{Estimate, ModelPredictor, SLOW_INFERENCE_MS};
pub use features::{region_or_default, sex_or_default, smoker_or_default, FeatureVectorBuilder};
pub use inference::{load_model, LinearArtifact, LinearRegressor, OnnxRegressor};

use crate::error::ModelError;

/// A loaded regression estimator
pub trait RegressionModel: Send + Sync {
    /// Input feature names in the order `predict` expects them
    fn feature_names(&self) -> &[String];

    /// Run inference on one row of aligned feature values
    fn predict(&self, inputs: &[f32]) -> Result<f64, ModelError>;

    /// Identifier of the artifact this model was loaded from
    fn version(&self) -> &str;
}
