//! Enrichment client: the one call per record to a text-generation service
//!
//! Defines the client trait and request/error types. Two implementations:
//! - `ChatCompletionClient`: OpenAI-compatible HTTP endpoint (production)
//! - `MockClient`: returns preconfigured responses per record title (testing)

use crate::record::Record;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Instruction prepended to every record rendering.
pub const DEFAULT_INSTRUCTION: &str = "For the article described below, give one sentence for each of the \
following: summary, hypotheses, methods, findings. If no abstract is provided, estimate from what is \
openly known about the authors and their work. Do not restate the article details. Format your output \
as a JSON object with the keys \"summary\", \"hypotheses\", \"methods\" and \"findings\".";

/// One enrichment call's input, derived from a record and the instruction.
///
/// Built per record and dropped once the call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentRequest {
    /// Title of the source record (for routing and logs)
    pub title: String,
    /// Full prompt text: instruction, blank line, rendered fields
    pub prompt: String,
}

impl EnrichmentRequest {
    pub fn for_record(record: &Record, instruction: &str) -> Self {
        Self {
            title: record.title.clone(),
            prompt: format!("{}\n\n{}", instruction, record.render_fields()),
        }
    }
}

/// Errors from a single enrichment call.
///
/// Never escapes a pool worker: each one becomes that record's
/// `EnrichmentResult::Failure`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("enrichment service unavailable: {0}")]
    Unavailable(String),
    #[error("request failed: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Client trait for the enrichment service.
///
/// Abstracts over transport (HTTP, mock) so the worker pool does not depend
/// on how the service is reached.
#[async_trait]
pub trait EnrichmentClient: Send + Sync {
    /// Send one request and return the service's raw text output.
    async fn enrich(&self, request: &EnrichmentRequest) -> Result<String, ServiceError>;
}

/// Mock client for testing. Returns preconfigured responses by record title.
#[derive(Debug, Default)]
pub struct MockClient {
    available: bool,
    responses: HashMap<String, Result<String, ServiceError>>,
    fallback: Option<String>,
}

impl MockClient {
    /// Create a mock client that answers registered titles.
    pub fn available() -> Self {
        Self {
            available: true,
            ..Self::default()
        }
    }

    /// Create a mock client whose every call fails.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Register the raw text returned for a record title.
    pub fn with_response(mut self, title: impl Into<String>, text: impl Into<String>) -> Self {
        self.responses.insert(title.into(), Ok(text.into()));
        self
    }

    /// Register a failure for a record title.
    pub fn with_failure(mut self, title: impl Into<String>, error: ServiceError) -> Self {
        self.responses.insert(title.into(), Err(error));
        self
    }

    /// Text returned for titles with no registered response.
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }
}

#[async_trait]
impl EnrichmentClient for MockClient {
    async fn enrich(&self, request: &EnrichmentRequest) -> Result<String, ServiceError> {
        if !self.available {
            return Err(ServiceError::Unavailable(
                "mock client configured as unavailable".to_string(),
            ));
        }

        match self.responses.get(&request.title) {
            Some(result) => result.clone(),
            None => self.fallback.clone().ok_or_else(|| {
                ServiceError::InvalidResponse(format!(
                    "no mock response for record '{}'",
                    request.title
                ))
            }),
        }
    }
}

/// Helper to build a structured JSON answer for testing.
pub fn mock_answer(summary: &str, hypotheses: &str, methods: &str, findings: &str) -> String {
    serde_json::json!({
        "summary": summary,
        "hypotheses": hypotheses,
        "methods": methods,
        "findings": findings,
    })
    .to_string()
}
