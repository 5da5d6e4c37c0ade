//! Gemini `generateContent` client.

use crate::gemini::dto::{ErrorEnvelope, GeminiRequest, GeminiResponse};
use async_trait::async_trait;
use reqwest::Client;
use shotlist_error::{GenerationError, GenerationErrorKind};
use shotlist_interface::{GenerateRequest, GenerationBackend};
use shotlist_retry::ModelConfig;
use tracing::{debug, instrument, warn};

/// Gemini REST client.
///
/// Sends one request per call and returns the raw reply text. Retrying is
/// left to the caller.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: Option<f32>,
}

impl GeminiClient {
    /// Creates a client from configuration, reading the API key from the
    /// environment variable named by `api_key_env`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationErrorKind::MissingApiKey`] if the variable is unset
    /// or empty.
    #[instrument(skip_all, fields(model = %config.name()))]
    pub fn from_config(config: &ModelConfig) -> Result<Self, GenerationError> {
        let api_key = std::env::var(config.api_key_env())
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                GenerationError::new(GenerationErrorKind::MissingApiKey(
                    config.api_key_env().clone(),
                ))
            })?;

        Ok(Self::with_api_key(api_key, config))
    }

    /// Creates a client with an explicit API key.
    pub fn with_api_key(api_key: impl Into<String>, config: &ModelConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: config.base_url().trim_end_matches('/').to_string(),
            model: config.name().clone(),
            temperature: *config.temperature(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Map a non-2xx reply to a [`GenerationError`].
///
/// Bodies carrying a `RESOURCE_EXHAUSTED` status become
/// [`GenerationErrorKind::QuotaExhausted`] regardless of HTTP status;
/// everything else keeps its status code.
pub fn classify_error(status: u16, body: &str) -> GenerationError {
    let (api_status, message) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.status, envelope.error.message),
        Err(_) => (String::new(), body.trim().to_string()),
    };

    if api_status == "RESOURCE_EXHAUSTED" {
        return GenerationError::new(GenerationErrorKind::QuotaExhausted(message));
    }

    GenerationError::new(GenerationErrorKind::Http {
        status_code: status,
        message,
    })
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    #[instrument(skip(self, request), fields(model = %self.model, media = request.media().len()))]
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerationError> {
        let body = GeminiRequest::from_request(request, self.temperature);
        debug!(url = %self.endpoint(), "Sending Gemini request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                GenerationError::new(GenerationErrorKind::Transport(format!(
                    "Request failed: {}",
                    e
                )))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let err = classify_error(status.as_u16(), &error_text);
            warn!(status = status.as_u16(), error = %err.kind, "Gemini request failed");
            return Err(err);
        }

        let reply: GeminiResponse = response.json().await.map_err(|e| {
            GenerationError::new(GenerationErrorKind::Transport(format!(
                "Failed to read response: {}",
                e
            )))
        })?;

        if let Some(reason) = reply.block_reason() {
            return Err(GenerationError::new(GenerationErrorKind::Blocked(
                reason.to_string(),
            )));
        }

        reply
            .text()
            .ok_or_else(|| GenerationError::new(GenerationErrorKind::EmptyResponse))
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
