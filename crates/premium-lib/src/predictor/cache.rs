//! Read-mostly memoization of loaded models keyed by artifact path

use super::{load_model, RegressionModel};
use crate::error::ModelError;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Cache of loaded models.
///
/// Purely an optimization: a cached model behaves exactly like a fresh load
/// of the same artifact. Failed loads are never cached.
#[derive(Default)]
pub struct ModelCache {
    models: DashMap<PathBuf, Arc<dyn RegressionModel>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached model for `path`, loading it on first use
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<dyn RegressionModel>, ModelError> {
        if let Some(model) = self.models.get(path) {
            return Ok(model.value().clone());
        }

        let model = load_model(path)?;
        debug!(path = %path.display(), version = %model.version(), "Caching model");
        // Concurrent first loads may race; the first insert wins
        let entry = self
            .models
            .entry(path.to_path_buf())
            .or_insert_with(|| model.clone());
        Ok(entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(dir: &tempfile::TempDir, intercept: f64) -> PathBuf {
        let path = dir.path().join("model.json");
        let body = format!(
            r#"{{"feature_names": ["age"], "coefficients": [10.0], "intercept": {}}}"#,
            intercept
        );
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_second_lookup_hits_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = artifact(&dir, 100.0);
        let cache = ModelCache::new();

        let first = cache.get_or_load(&path).unwrap();
        let second = cache.get_or_load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cached_model_outlives_artifact_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = artifact(&dir, 100.0);
        let cache = ModelCache::new();
        assert_eq!(cache.get_or_load(&path).unwrap().predict(&[1.0]).unwrap(), 110.0);

        artifact(&dir, 200.0);
        assert_eq!(cache.get_or_load(&path).unwrap().predict(&[1.0]).unwrap(), 110.0);
        assert_eq!(load_model(&path).unwrap().predict(&[1.0]).unwrap(), 210.0);
    }

    #[test]
    fn test_failed_load_not_cached() {
        let cache = ModelCache::new();
        assert!(cache.get_or_load(Path::new("/nonexistent/model.json")).is_err());
        assert!(cache.is_empty());
    }
}
