//! Premium server - insurance premium prediction service
//!
//! Serves `POST /predict` plus health and metrics endpoints.

use anyhow::{Context, Result};
use premium_lib::{
    advice::{GeminiClient, GenerativeAdvisor},
    health::{components, HealthRegistry},
    observability::StructuredLogger,
    predictor::{ModelCache, ModelPredictor},
    PredictionPipeline,
};
use premium_server::{
    api,
    config::{self, AppConfig},
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    match config::load_dotenv()? {
        Some(path) => info!(path = %path.display(), "Loaded environment file"),
        None => debug!("No .env file found"),
    }

    let config = AppConfig::load().context("Failed to load configuration")?;
    let api_key = config::load_api_key().context("Missing text-generation credential")?;
    info!(
        model_path = %config.webapp_model_dir.display(),
        port = config.api_port,
        cache_models = config.cache_models,
        "Server configured"
    );

    let logger = StructuredLogger::new("premium-server");
    logger.log_startup(SERVER_VERSION, &config.webapp_model_dir.display().to_string());

    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL).await;
    health_registry.register(components::ADVISOR).await;

    let predictor = if config.cache_models {
        ModelPredictor::with_cache(Arc::new(ModelCache::new()))
    } else {
        ModelPredictor::new()
    }
    .with_logger(logger.clone());

    // Load the artifact once so readiness reflects it before the first request
    match predictor.model(&config.webapp_model_dir) {
        Ok(model) => logger.log_model_loaded(
            &config.webapp_model_dir.display().to_string(),
            model.version(),
            model.feature_names().len(),
        ),
        Err(e) => {
            warn!(error = %e, "Startup model load failed, predictions will fail until it loads");
            health_registry
                .set_unhealthy(components::MODEL, e.to_string())
                .await;
        }
    }

    let generator = GeminiClient::new(api_key, config.gemini())
        .context("Failed to build text-generation client")?;
    let advisor = GenerativeAdvisor::new(Arc::new(generator), config.retry_policy());

    let pipeline = PredictionPipeline::new(config.webapp_model_dir.clone(), predictor, advisor)
        .with_health(health_registry.clone())
        .with_logger(logger.clone());

    let app_state = Arc::new(api::AppState::new(pipeline, health_registry.clone()));
    health_registry.set_ready(true).await;

    api::serve(config.api_port, app_state, shutdown_signal())
        .await
        .context("API server failed")?;

    logger.log_shutdown("SIGINT received");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
