//! Integration tests for the premium server API

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use premium_lib::{
    advice::{GenerativeAdvisor, RetryPolicy, TextGenerator, UNAVAILABLE_NOTICE},
    health::{components, HealthRegistry},
    predictor::{LinearArtifact, ModelPredictor},
    AdvisorFailure, PredictionPipeline,
};
use premium_server::api::{create_router, AppState};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct FixedGenerator(Option<&'static str>);

#[async_trait]
impl TextGenerator for FixedGenerator {
    async fn generate_content(&self, _prompt: &str) -> Result<String, AdvisorFailure> {
        self.0
            .map(str::to_string)
            .ok_or(AdvisorFailure::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
    }
}

fn write_model(dir: &Path, intercept: f64) -> PathBuf {
    let artifact = LinearArtifact {
        feature_names: ["age", "sex", "bmi", "children", "smoker", "region"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        coefficients: vec![0.0; 6],
        intercept,
    };
    let path = dir.join("model.json");
    std::fs::write(&path, serde_json::to_vec(&artifact).unwrap()).unwrap();
    path
}

async fn setup_test_app(model_path: PathBuf, reply: Option<&'static str>) -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL).await;
    health_registry.register(components::ADVISOR).await;

    let advisor = GenerativeAdvisor::new(
        Arc::new(FixedGenerator(reply)),
        RetryPolicy::new(2, Duration::from_millis(1)),
    );
    let pipeline = PredictionPipeline::new(model_path, ModelPredictor::new(), advisor)
        .with_health(health_registry.clone());

    let state = Arc::new(AppState::new(pipeline, health_registry));
    (create_router(state.clone()), state)
}

fn predict_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_predict_returns_generated_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = setup_test_app(write_model(dir.path(), 9500.0), Some("  Keep it up.  ")).await;

    let response = app
        .oneshot(predict_request(json!({
            "age": 45, "sex": "male", "bmi": 29, "children": 3,
            "smoker": "no", "region": "NorthEast"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let outcome = json_body(response).await;
    assert_eq!(outcome["predicted_cost"], 9500.0);
    assert_eq!(outcome["advice_text"], "Keep it up.");
    assert_eq!(outcome["advice_source"], "generated");
}

#[tokio::test]
async fn test_predict_accepts_string_fields() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = setup_test_app(write_model(dir.path(), 1234.5), Some("ok")).await;

    let response = app
        .oneshot(predict_request(json!({
            "age": "33", "sex": "female", "bmi": "21.4", "children": "0",
            "smoker": "no", "region": "SouthWest"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["predicted_cost"], 1234.5);
}

#[tokio::test]
async fn test_predict_falls_back_and_degrades_advisor() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = setup_test_app(write_model(dir.path(), 9500.0), None).await;

    let response = app
        .oneshot(predict_request(json!({
            "age": "45", "sex": "male", "bmi": "29", "children": "3",
            "smoker": "no", "region": "NorthEast"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let outcome = json_body(response).await;
    assert_eq!(outcome["advice_source"], "fallback");
    assert!(outcome["advice_text"]
        .as_str()
        .unwrap()
        .starts_with(UNAVAILABLE_NOTICE));

    let health = state.health_registry.health().await;
    assert_eq!(
        health.components[components::ADVISOR].status,
        premium_lib::ComponentStatus::Degraded
    );
}

#[tokio::test]
async fn test_predict_rejects_invalid_field() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = setup_test_app(write_model(dir.path(), 9500.0), Some("unused")).await;

    let response = app
        .oneshot(predict_request(json!({
            "age": "45", "sex": "male", "bmi": "heavy", "children": "3",
            "smoker": "no", "region": "NorthEast"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["field"], "bmi");
    assert!(body["error"].as_str().unwrap().contains("bmi"));
}

#[tokio::test]
async fn test_predict_hides_model_failure() {
    let (app, state) = setup_test_app(PathBuf::from("/nonexistent/model.onnx"), Some("unused")).await;

    let response = app
        .oneshot(predict_request(json!({
            "age": "45", "sex": "male", "bmi": "29", "children": "3",
            "smoker": "no", "region": "NorthEast"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await, json!({"error": "Prediction failed"}));

    state.health_registry.set_ready(true).await;
    assert!(!state.health_registry.readiness().await.ready);
}

#[tokio::test]
async fn test_predict_rejects_malformed_body() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = setup_test_app(write_model(dir.path(), 9500.0), Some("unused")).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn test_healthz_returns_ok_when_degraded() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = setup_test_app(write_model(dir.path(), 9500.0), None).await;

    state
        .health_registry
        .set_degraded(components::ADVISOR, "Falling back")
        .await;

    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "degraded");
}

#[tokio::test]
async fn test_healthz_returns_unavailable_when_model_unhealthy() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = setup_test_app(write_model(dir.path(), 9500.0), None).await;

    state
        .health_registry
        .set_unhealthy(components::MODEL, "artifact missing")
        .await;

    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_readyz_tracks_readiness() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = setup_test_app(write_model(dir.path(), 9500.0), None).await;

    let response = app.clone().oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    state.health_registry.set_ready(true).await;
    let response = app.oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["ready"], true);
}

#[tokio::test]
async fn test_metrics_exposes_prediction_counters() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = setup_test_app(write_model(dir.path(), 9500.0), Some("ok")).await;

    let response = app
        .clone()
        .oneshot(predict_request(json!({
            "age": "45", "sex": "male", "bmi": "29", "children": "3",
            "smoker": "no", "region": "NorthEast"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("premium_predictions_total"));
    assert!(text.contains("premium_inference_latency_seconds"));
}
