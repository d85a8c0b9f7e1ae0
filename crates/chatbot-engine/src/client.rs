//! Remote text generation.
//!
//! [`TextGenerator`] is the single operation the conversation needs from the
//! model service: generate text from a prompt. [`GeminiClient`] implements it
//! over the Gemini `generateContent` REST endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::response::GenerateResult;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Maximum length of an error body kept in [`GenerateError::Api`].
const MAX_ERROR_BODY: usize = 300;

/// Something that can turn a prompt into a generation result.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short name shown in the UI (usually the model id).
    fn name(&self) -> &str;

    /// Generate a reply for `prompt`. `Ok(None)` means the service answered
    /// with no result at all.
    async fn generate(&self, prompt: &str) -> Result<Option<GenerateResult>, GenerateError>;
}

/// Errors from a single generation call.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The request never got an HTTP response.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body could not be read or decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Errors constructing a client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No API key in the config or the environment.
    #[error("no API key configured (set GEMINI_API_KEY or api_key in the config file)")]
    MissingApiKey,

    /// The HTTP client could not be built.
    #[error("could not build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl GeminiClient {
    /// Build a client from configuration.
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ClientError::MissingApiKey)?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        info!(model = %config.model, "generation client initialized");

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.to_string(),
        })
    }

    /// Endpoint URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn request_body(prompt: &str) -> GenerateContentRequest<'_> {
        GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<Option<GenerateResult>, GenerateError> {
        debug!(model = %self.model, chars = prompt.chars().count(), "sending generateContent");

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&Self::request_body(prompt))
            .send()
            .await
            .map_err(GenerateError::Transport)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerateError::Decode(e.to_string()))?;

        if !status.is_success() {
            return Err(GenerateError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        debug!(status = status.as_u16(), bytes = body.len(), "generateContent answered");

        if body.trim().is_empty() {
            return Ok(None);
        }
        let value: Value =
            serde_json::from_str(&body).map_err(|e| GenerateError::Decode(e.to_string()))?;
        Ok(GenerateResult::from_json(value))
    }
}

/// Build the generation client for `config`.
///
/// Initialization failure is logged and yields `None`, which the controller
/// treats as a permanently unavailable model.
pub fn connect(config: &Config) -> Option<Arc<dyn TextGenerator>> {
    match GeminiClient::new(config) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!("could not initialize generation client: {e}");
            None
        }
    }
}

/// Pull `error.message` out of an API error body, or fall back to the body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY).collect())
}
