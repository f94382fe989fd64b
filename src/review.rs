//! One literature review run: search, enrich, export.

use crate::config::{Config, Credentials};
use crate::error::LitReviewResult;
use crate::pipeline::{unenriched_rows, write_table, Pipeline, RunSummary};
use crate::record::Record;
use crate::search::{load_response, records_from_response, save_response, ScopusClient, SearchQuery};
use std::path::PathBuf;
use tracing::info;

/// What a single run should do.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub query: SearchQuery,
    /// Saved search response to use instead of querying Scopus
    pub input: Option<PathBuf>,
    /// Where to keep the raw search response
    pub save_search: Option<PathBuf>,
    /// Export base fields only, without calling the enrichment service
    pub skip_enrichment: bool,
}

impl ReviewRequest {
    pub fn new(query: SearchQuery) -> Self {
        Self {
            query,
            input: None,
            save_search: None,
            skip_enrichment: false,
        }
    }

    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(path.into());
        self
    }

    pub fn with_save_search(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_search = Some(path.into());
        self
    }

    pub fn skip_enrichment(mut self, skip: bool) -> Self {
        self.skip_enrichment = skip;
        self
    }
}

/// Run a review against the live services and export to the configured path.
///
/// Settings and credentials are checked before any request is made.
pub async fn conduct_review(
    config: &Config,
    credentials: &Credentials,
    request: &ReviewRequest,
) -> LitReviewResult<RunSummary> {
    config.validate()?;
    let pipeline = if request.skip_enrichment {
        None
    } else {
        Some(Pipeline::from_config(config, credentials)?)
    };
    conduct_review_with(pipeline.as_ref(), config, credentials, request).await
}

/// Same as [`conduct_review`], with the enrichment pipeline supplied by the
/// caller. `None` exports unenriched rows.
pub async fn conduct_review_with(
    pipeline: Option<&Pipeline>,
    config: &Config,
    credentials: &Credentials,
    request: &ReviewRequest,
) -> LitReviewResult<RunSummary> {
    let records = gather_records(config, credentials, request).await?;
    let destination = &config.pipeline.output;

    let summary = match pipeline {
        Some(pipeline) => pipeline.run(&records, destination).await?,
        None => {
            info!(records = records.len(), "enrichment skipped");
            write_table(&unenriched_rows(&records), destination)?
        }
    };
    Ok(summary)
}

async fn gather_records(
    config: &Config,
    credentials: &Credentials,
    request: &ReviewRequest,
) -> LitReviewResult<Vec<Record>> {
    let raw = match &request.input {
        Some(path) => {
            info!(path = %path.display(), "loading saved search");
            load_response(path)?
        }
        None => {
            let client = ScopusClient::new(&config.search, credentials.elsevier()?)?;
            client.search_raw(&request.query).await?
        }
    };

    if let Some(path) = &request.save_search {
        save_response(path, &raw)?;
        info!(path = %path.display(), "search response saved");
    }

    let records = records_from_response(&raw);
    info!(keyword = %request.query.keyword, records = records.len(), "records gathered");
    Ok(records)
}
