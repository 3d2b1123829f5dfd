//! API client for the premium prediction server

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use url::Url;

/// Non-2xx reply from the server
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server rejected a submitted field
    #[error("Invalid {field}: {message}")]
    Invalid { field: String, message: String },

    #[error("API error ({status}): {message}")]
    Status { status: StatusCode, message: String },
}

pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(90))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    pub async fn predict(&self, request: &PredictRequest) -> Result<PredictionOutcome> {
        let url = self.base_url.join("predict").context("Invalid path")?;
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response, &[]).await
    }

    /// Component health; a 503 still carries a report
    pub async fn health(&self) -> Result<HealthReport> {
        self.get("healthz", &[StatusCode::SERVICE_UNAVAILABLE]).await
    }

    pub async fn readiness(&self) -> Result<Readiness> {
        self.get("readyz", &[StatusCode::SERVICE_UNAVAILABLE]).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, accept: &[StatusCode]) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response, accept).await
    }

    /// Decode a success body, or turn the server's error body into an [`ApiError`]
    async fn parse<T: DeserializeOwned>(response: Response, accept: &[StatusCode]) -> Result<T> {
        let status = response.status();
        if status.is_success() || accept.contains(&status) {
            return response.json().await.context("Failed to parse response");
        }

        let body = response.text().await.unwrap_or_default();
        let error = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(ErrorResponse {
                error,
                field: Some(field),
            }) => ApiError::Invalid {
                field,
                message: error,
            },
            Ok(ErrorResponse { error, field: None }) => ApiError::Status {
                status,
                message: error,
            },
            Err(_) => ApiError::Status {
                status,
                message: body,
            },
        };
        Err(error.into())
    }
}

// API request and response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub age: String,
    pub sex: String,
    pub bmi: String,
    pub children: String,
    pub smoker: String,
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionOutcome {
    pub predicted_cost: f64,
    pub advice_text: String,
    pub advice_source: String,
    pub model_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub components: BTreeMap<String, ComponentReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentReport {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub checked_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Readiness {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, routing::get, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn request() -> PredictRequest {
        PredictRequest {
            age: "45".into(),
            sex: "male".into(),
            bmi: "29".into(),
            children: "3".into(),
            smoker: "no".into(),
            region: "NorthEast".into(),
        }
    }

    #[tokio::test]
    async fn test_predict_posts_fields() {
        let app = Router::new().route(
            "/predict",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["region"], "NorthEast");
                Json(json!({
                    "predicted_cost": 9500.0,
                    "advice_text": "Stay active.",
                    "advice_source": "generated",
                    "model_version": "model@abc"
                }))
            }),
        );
        let client = ApiClient::new(&serve(app).await).unwrap();

        let outcome = client.predict(&request()).await.unwrap();
        assert_eq!(outcome.predicted_cost, 9500.0);
        assert_eq!(outcome.advice_source, "generated");
    }

    #[tokio::test]
    async fn test_validation_error_names_field() {
        let app = Router::new().route(
            "/predict",
            post(|| async {
                (
                    AxumStatus::UNPROCESSABLE_ENTITY,
                    Json(json!({"error": "Invalid value for bmi: not a number", "field": "bmi"})),
                )
            }),
        );
        let client = ApiClient::new(&serve(app).await).unwrap();

        let err = client.predict(&request()).await.unwrap_err();
        match err.downcast_ref::<ApiError>() {
            Some(ApiError::Invalid { field, .. }) => assert_eq!(field, "bmi"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_keeps_message() {
        let app = Router::new().route(
            "/predict",
            post(|| async {
                (
                    AxumStatus::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Prediction failed"})),
                )
            }),
        );
        let client = ApiClient::new(&serve(app).await).unwrap();

        let err = client.predict(&request()).await.unwrap_err();
        assert!(err.to_string().contains("Prediction failed"));
    }

    #[tokio::test]
    async fn test_unhealthy_report_is_returned() {
        let app = Router::new().route(
            "/healthz",
            get(|| async {
                (
                    AxumStatus::SERVICE_UNAVAILABLE,
                    Json(json!({
                        "status": "unhealthy",
                        "components": {
                            "model": {
                                "status": "unhealthy",
                                "message": "artifact missing",
                                "checked_at": "2024-01-01T00:00:00Z"
                            }
                        }
                    })),
                )
            }),
        );
        let client = ApiClient::new(&serve(app).await).unwrap();

        let report = client.health().await.unwrap();
        assert_eq!(report.status, "unhealthy");
        assert_eq!(
            report.components["model"].message.as_deref(),
            Some("artifact missing")
        );
    }
}
