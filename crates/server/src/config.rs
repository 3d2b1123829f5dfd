//! Server configuration

use anyhow::{bail, Context, Result};
use premium_lib::advice::{GeminiConfig, RetryPolicy, DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings file read when `PREMIUM_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "params.yaml";

/// Environment variable holding the text-generation API key
pub const API_KEY_VAR: &str = "API_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Path of the serialized regression model
    #[serde(default = "default_model_path")]
    pub webapp_model_dir: PathBuf,

    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default = "default_genai_endpoint")]
    pub genai_endpoint: String,

    #[serde(default = "default_genai_model")]
    pub genai_model: String,

    #[serde(default = "default_max_attempts")]
    pub advice_max_attempts: u32,

    #[serde(default = "default_backoff_ms")]
    pub advice_backoff_ms: u64,

    #[serde(default = "default_genai_timeout")]
    pub genai_timeout_secs: u64,

    /// Keep loaded models in memory across requests
    #[serde(default = "default_cache_models")]
    pub cache_models: bool,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("saved_models/model.onnx")
}

fn default_api_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(8080)
}

fn default_genai_endpoint() -> String {
    DEFAULT_GEMINI_ENDPOINT.to_string()
}

fn default_genai_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_genai_timeout() -> u64 {
    30
}

fn default_cache_models() -> bool {
    true
}

impl AppConfig {
    /// Load from the settings file (if present) overlaid with `PREMIUM_*` variables
    pub fn load() -> Result<Self> {
        let path = std::env::var("PREMIUM_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("PREMIUM").try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        config
            .try_deserialize()
            .context("Invalid server configuration")
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.advice_max_attempts,
            Duration::from_millis(self.advice_backoff_ms),
        )
        .with_attempt_timeout(Duration::from_secs(self.genai_timeout_secs))
    }

    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            endpoint: self.genai_endpoint.clone(),
            model: self.genai_model.clone(),
            timeout: Duration::from_secs(self.genai_timeout_secs),
        }
    }
}

/// Load `.env` from the working directory (or a parent) into the process
/// environment. Returns the file used, if any; only a missing file is ignored.
pub fn load_dotenv() -> Result<Option<PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e).context("Failed to read .env file"),
    }
}

/// Like [`load_dotenv`] for an explicit file; returns whether it existed
pub fn load_dotenv_from(path: &Path) -> Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Read the text-generation credential; the server refuses to start without it
pub fn load_api_key() -> Result<String> {
    match std::env::var(API_KEY_VAR) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        Ok(_) => bail!("{} is set but empty", API_KEY_VAR),
        Err(_) => bail!("{} must be set to reach the text-generation service", API_KEY_VAR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = AppConfig::load_from(Path::new("/nonexistent/params.yaml")).unwrap();
        assert_eq!(config.webapp_model_dir, PathBuf::from("saved_models/model.onnx"));
        assert_eq!(config.genai_model, "gemini-1.5-flash");
        assert_eq!(config.advice_max_attempts, 3);
        assert!(config.cache_models);

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, Duration::from_secs(1));
    }

    #[test]
    fn test_reads_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "webapp_model_dir: models/premium.json").unwrap();
        writeln!(file, "advice_max_attempts: 5").unwrap();
        writeln!(file, "advice_backoff_ms: 250").unwrap();
        writeln!(file, "cache_models: false").unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.webapp_model_dir, PathBuf::from("models/premium.json"));
        assert!(!config.cache_models);

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff, Duration::from_millis(250));
    }

    #[test]
    fn test_dotenv_missing_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!load_dotenv_from(&dir.path().join(".env")).unwrap());
    }

    #[test]
    fn test_dotenv_file_populates_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "PREMIUM_DOTENV_TEST_KEY=from-dotenv\n").unwrap();

        assert!(load_dotenv_from(&path).unwrap());
        assert_eq!(
            std::env::var("PREMIUM_DOTENV_TEST_KEY").as_deref(),
            Ok("from-dotenv")
        );
    }

    #[test]
    fn test_dotenv_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "NOT A VALID LINE\n").unwrap();

        assert!(load_dotenv_from(&path).is_err());
    }

    #[test]
    fn test_gemini_settings() {
        let config = AppConfig::load_from(Path::new("/nonexistent/params.yaml")).unwrap();
        let gemini = config.gemini();
        assert_eq!(gemini.endpoint, DEFAULT_GEMINI_ENDPOINT);
        assert_eq!(gemini.timeout, Duration::from_secs(30));
    }
}
