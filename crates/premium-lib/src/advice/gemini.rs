//! Client for the Generative Language `generateContent` API

use super::TextGenerator;
use crate::error::AdvisorFailure;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Connection settings for [`GeminiClient`]
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL, e.g. "https://generativelanguage.googleapis.com/v1beta/"
    pub endpoint: String,
    pub model: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Text generator backed by a Gemini model
pub struct GeminiClient {
    http_client: Client,
    url: Url,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, config: GeminiConfig) -> Result<Self, AdvisorFailure> {
        let http_client = Client::builder().timeout(config.timeout).build()?;

        let mut endpoint = config.endpoint;
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        let url = Url::parse(&endpoint)
            .and_then(|base| base.join(&format!("models/{}:generateContent", config.model)))
            .map_err(|e| AdvisorFailure::Malformed(format!("invalid endpoint: {}", e)))?;

        Ok(Self {
            http_client,
            url,
            api_key: api_key.into(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_content(&self, prompt: &str) -> Result<String, AdvisorFailure> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .http_client
            .post(self.url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorFailure::Status { status, body });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AdvisorFailure::Malformed(e.to_string()))?;

        body.first_text().ok_or(AdvisorFailure::EmptyResponse)
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, if any
    fn first_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}
