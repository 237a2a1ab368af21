//! HTTP client for the Gemini `generateContent` endpoint.
//!
//! The client is an explicitly constructed value. Components that need model
//! access receive it as `Arc<dyn GenerativeBackend>`, which keeps them
//! testable against a mock server or an in-memory backend.
//!
//! # API Reference
//!
//! - Endpoint: `POST {base}/v1beta/models/{model}:generateContent`
//! - Auth: `x-goog-api-key` header
//! - Body: JSON `GenerateContentRequest`

use std::time::Instant;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, error};

use super::config::{API_KEY_HEADER, GEMINI_API_BASE_URL};
use super::messages::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};

// =============================================================================
// Error Types
// =============================================================================

/// Errors returned by generative backends.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// API key rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Quota or rate limit hit
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Any other non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be parsed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for backend operations.
pub type GeminiResult<T> = Result<T, GeminiError>;

// =============================================================================
// Backend Trait
// =============================================================================

/// Text, image and speech generation.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Run one `generateContent` call against `model`.
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse>;
}

// =============================================================================
// Gemini Client
// =============================================================================

/// Connection settings for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiClientConfig {
    pub api_key: String,
    pub base_url: String,
}

impl GeminiClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: GEMINI_API_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// reqwest backed [`GenerativeBackend`].
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiClient {
    pub fn new(config: GeminiClientConfig) -> GeminiResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(GeminiError::InvalidConfiguration(
                "API key is required".to_string(),
            ));
        }
        url::Url::parse(&config.base_url).map_err(|e| {
            GeminiError::InvalidConfiguration(format!("invalid base URL '{}': {e}", config.base_url))
        })?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| GeminiError::InvalidConfiguration(e.to_string()))?;

        Ok(Self {
            http,
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of the `generateContent` method for `model`.
    pub fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

/// Map a non-success status and its body to an error.
fn status_error(status: StatusCode, body: &str) -> GeminiError {
    let message = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GeminiError::AuthenticationFailed(message)
        }
        StatusCode::TOO_MANY_REQUESTS => GeminiError::RateLimitExceeded(message),
        _ => GeminiError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse> {
        let started = Instant::now();
        let response = self
            .http
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| GeminiError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GeminiError::Network(e.to_string()))?;

        if !status.is_success() {
            let err = status_error(status, &body);
            error!("Gemini request to {} failed: {}", model, err);
            return Err(err);
        }

        debug!(
            "Gemini {} responded in {}ms ({} bytes)",
            model,
            started.elapsed().as_millis(),
            body.len()
        );

        serde_json::from_str(&body).map_err(|e| GeminiError::InvalidResponse(e.to_string()))
    }
}
