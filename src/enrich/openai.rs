//! OpenAI-compatible chat-completions client
//!
//! One `POST {base_url}/chat/completions` per request. The response length is
//! capped by `max_tokens` on our side, and every call carries its own timeout.

use super::client::{EnrichmentClient, EnrichmentRequest, ServiceError};
use crate::config::EnrichmentSettings;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("litreview/", env!("CARGO_PKG_VERSION"));

/// Longest response body echoed back inside an error.
const ERROR_BODY_LIMIT: usize = 200;

/// Enrichment client backed by an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct ChatCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    system_prompt: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl ChatCompletionClient {
    pub fn new(settings: &EnrichmentSettings, api_key: impl Into<String>) -> Result<Self, ServiceError> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: settings.model.clone(),
            system_prompt: settings.system_prompt.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, request: &EnrichmentRequest) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": self.system_prompt },
                { "role": "user", "content": request.prompt },
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "n": 1,
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> ServiceError {
        if err.is_timeout() {
            ServiceError::Timeout(self.timeout)
        } else {
            ServiceError::Network(err.to_string())
        }
    }
}

/// Pull the first choice's message text out of a completion response.
fn completion_text(body: &Value) -> Result<String, ServiceError> {
    let choice = body
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| ServiceError::InvalidResponse("no choices in response".to_string()))?;

    if choice.get("finish_reason").and_then(|f| f.as_str()) == Some("length") {
        debug!("completion stopped at max_tokens");
    }

    choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|text| text.trim().to_string())
        .ok_or_else(|| ServiceError::InvalidResponse("no message content in choice".to_string()))
}

fn truncate(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

#[async_trait]
impl EnrichmentClient for ChatCompletionClient {
    async fn enrich(&self, request: &EnrichmentRequest) -> Result<String, ServiceError> {
        debug!(endpoint = %self.endpoint, model = %self.model, title = %request.title, "sending completion request");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        let json: Value = serde_json::from_str(&body)
            .map_err(|e| ServiceError::InvalidResponse(format!("invalid JSON: {}", e)))?;

        completion_text(&json)
    }
}
