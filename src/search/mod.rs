//! Literature search: Elsevier Scopus query and record extraction
//!
//! The search runs once, before any enrichment, and its failure is fatal to
//! the run. Extraction from the response is lenient: individual entries
//! never fail, they just take default values.

use crate::config::SearchSettings;
use crate::record::Record;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the search stage.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Network(String),

    #[error("search API request failed with status code {status}")]
    Status { status: u16, body: String },

    #[error("invalid search response: {0}")]
    InvalidResponse(String),

    #[error("cannot access search response file {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What to search for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub count: u32,
    pub subject: Option<String>,
}

impl SearchQuery {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            count: 10,
            subject: None,
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Restrict to a subject area. Blank values mean no restriction.
    pub fn with_subject(mut self, subject: Option<String>) -> Self {
        self.subject = subject.filter(|s| !s.trim().is_empty());
        self
    }

    /// Build a query from configured defaults.
    pub fn from_settings(keyword: impl Into<String>, settings: &SearchSettings) -> Self {
        Self::new(keyword)
            .with_count(settings.count)
            .with_subject(settings.subject.clone())
    }

    /// The Scopus `query` parameter.
    pub fn query_string(&self) -> String {
        let mut query = format!("TITLE-ABS-KEY(\"{}\")", self.keyword);
        if let Some(subject) = &self.subject {
            query.push_str(&format!(" AND SUBJAREA({})", subject.trim()));
        }
        query
    }

    /// All request parameters, most-cited first.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("query", self.query_string()),
            ("count", self.count.to_string()),
            ("view", "STANDARD".to_string()),
            ("sort", "citedby-count".to_string()),
        ]
    }
}

/// Scopus search API client.
#[derive(Clone)]
pub struct ScopusClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ScopusClient {
    pub fn new(settings: &SearchSettings, api_key: impl Into<String>) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| SearchError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
            api_key: api_key.into(),
        })
    }

    /// Run the query and return the raw JSON response.
    pub async fn search_raw(&self, query: &SearchQuery) -> Result<Value, SearchError> {
        debug!(query = %query.query_string(), count = query.count, "querying Scopus");

        let response = self
            .http
            .get(&self.base_url)
            .header("Accept", "application/json")
            .header("X-ELS-APIKey", &self.api_key)
            .query(&query.params())
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))
    }

    /// Run the query and extract records.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, SearchError> {
        let raw = self.search_raw(query).await?;
        let records = records_from_response(&raw);
        info!(keyword = %query.keyword, records = records.len(), "search complete");
        Ok(records)
    }
}

/// Extract records from a Scopus response, in response order.
///
/// A missing `entry` array yields no records. Scopus marks an empty result
/// set with a single entry carrying an `error` key; such entries are skipped.
pub fn records_from_response(response: &Value) -> Vec<Record> {
    response
        .get("search-results")
        .and_then(|r| r.get("entry"))
        .and_then(|e| e.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter(|entry| entry.get("error").is_none())
                .map(Record::from_scopus_entry)
                .collect()
        })
        .unwrap_or_default()
}

/// Read a saved search response.
pub fn load_response(path: &Path) -> Result<Value, SearchError> {
    let text = std::fs::read_to_string(path).map_err(|source| SearchError::File {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text)
        .map_err(|e| SearchError::InvalidResponse(format!("{}: {}", path.display(), e)))
}

/// Save a search response for later offline runs.
pub fn save_response(path: &Path, response: &Value) -> Result<(), SearchError> {
    let text = serde_json::to_string_pretty(response)
        .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;
    std::fs::write(path, text).map_err(|source| SearchError::File {
        path: path.to_path_buf(),
        source,
    })
}
