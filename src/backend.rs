//! Generation Backend
//!
//! The external, rate-limited service that synthesizes recipe text and images.
//! The orchestrator only calls it; every call may fail or run long.

use crate::config::BackendConfig;
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Text and image generation capabilities.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Free-text completion for `prompt`. The text is expected, not guaranteed,
    /// to contain a JSON payload.
    async fn generate_content(&self, prompt: &str) -> Result<String, ApiError>;

    /// Generate one image and return its URL.
    async fn generate_image(&self, prompt: &str) -> Result<String, ApiError>;
}

// OpenAI-compatible gateway request/response structures
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    response_format: &'static str,
}

#[derive(Deserialize)]
struct ImageGenerationResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
}

// Map transport-level failures to the error taxonomy
fn map_http_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::TimeoutError(format!("Backend request timed out: {}", error))
    } else if let Some(status) = error.status() {
        map_status(status, error.to_string())
    } else if error.is_connect() {
        ApiError::BackendError(format!("Connection error: {}", error))
    } else {
        ApiError::BackendError(format!("HTTP error: {}", error))
    }
}

fn map_status(status: StatusCode, detail: String) -> ApiError {
    match status.as_u16() {
        401 | 403 => ApiError::BackendAuthFailed(format!("Authentication failed: {}", detail)),
        429 => ApiError::BackendRateLimit(format!("Rate limit exceeded: {}", detail)),
        _ => ApiError::BackendError(format!("Request failed with status {}: {}", status, detail)),
    }
}

/// Client for an OpenAI-compatible AI gateway.
pub struct GatewayBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    content_model: String,
    image_model: String,
    max_tokens: u32,
}

impl GatewayBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            content_model: config.content_model.clone(),
            image_model: config.image_model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, ApiError> {
        self.api_key.as_deref().ok_or_else(|| {
            ApiError::ConfigError(
                "Backend API key not configured (set AI_GATEWAY_API_KEY or backend.api_key)"
                    .to_string(),
            )
        })
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let api_key = self.api_key()?;
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status(status, error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::BackendError(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl GenerationBackend for GatewayBackend {
    async fn generate_content(&self, prompt: &str) -> Result<String, ApiError> {
        let request = ChatCompletionRequest {
            model: &self.content_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
        };

        let completion: ChatCompletionResponse =
            self.post_json("chat/completions", &request).await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ApiError::BackendError("No choices in response".to_string()))?;

        debug!(
            model = %self.content_model,
            response_chars = content.chars().count(),
            "Content completion received"
        );
        Ok(content)
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, ApiError> {
        let request = ImageGenerationRequest {
            model: &self.image_model,
            prompt,
            response_format: "url",
        };

        let generated: ImageGenerationResponse =
            self.post_json("images/generations", &request).await?;
        generated
            .data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .ok_or_else(|| ApiError::BackendError("No image URL in response".to_string()))
    }
}
