//! Enrichment pipeline
//!
//! Records → worker pool (client, then parser, per record) → rows in input
//! order → CSV export. Only export failures surface; every per-record failure
//! has already been folded into its row.

mod pool;

pub use pool::{WorkerPool, DEFAULT_CONCURRENCY};

use crate::config::{Config, Credentials};
use crate::enrich::{ChatCompletionClient, EnrichmentClient};
use crate::error::LitReviewResult;
use crate::export::{export, ExportError, OutputRow, RowOutcome};
use crate::record::Record;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Counts of how each row's enrichment turned out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub rows: usize,
    pub structured: usize,
    pub degraded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn tally(rows: &[OutputRow]) -> Self {
        let mut summary = Self {
            rows: rows.len(),
            ..Self::default()
        };
        for row in rows {
            match row.outcome {
                RowOutcome::Structured => summary.structured += 1,
                RowOutcome::Degraded(_) => summary.degraded += 1,
                RowOutcome::Failed(_) => summary.failed += 1,
                RowOutcome::Skipped => summary.skipped += 1,
            }
        }
        summary
    }
}

/// The enrichment pipeline for one run.
pub struct Pipeline {
    pool: WorkerPool,
}

impl Pipeline {
    /// Build a pipeline around an existing client.
    pub fn new(client: Arc<dyn EnrichmentClient>, config: &Config) -> Self {
        let pool = WorkerPool::new(client)
            .with_concurrency(config.pipeline.concurrency)
            .with_instruction(config.enrichment.instruction.clone());
        Self { pool }
    }

    /// Build a pipeline backed by the chat-completions service.
    ///
    /// Fails here, before any record is touched, when the OpenAI key is
    /// missing or the settings are unusable.
    pub fn from_config(config: &Config, credentials: &Credentials) -> LitReviewResult<Self> {
        config.validate()?;
        let api_key = credentials.openai()?;
        let client = ChatCompletionClient::new(&config.enrichment, api_key)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn concurrency(&self) -> usize {
        self.pool.concurrency()
    }

    /// Enrich the records; one row per record, in input order.
    pub async fn enrich(&self, records: &[Record]) -> Vec<OutputRow> {
        info!(records = records.len(), concurrency = self.pool.concurrency(), "enriching records");
        self.pool.process(records).await
    }

    /// Enrich the records and write the table to `destination`.
    pub async fn run(&self, records: &[Record], destination: &Path) -> Result<RunSummary, ExportError> {
        let rows = self.enrich(records).await;
        write_table(&rows, destination)
    }
}

/// Rows carrying only base fields, for runs without enrichment.
pub fn unenriched_rows(records: &[Record]) -> Vec<OutputRow> {
    records.iter().map(OutputRow::unenriched).collect()
}

/// Export rows and report how they turned out.
pub fn write_table(rows: &[OutputRow], destination: &Path) -> Result<RunSummary, ExportError> {
    export(rows, destination)?;
    let summary = RunSummary::tally(rows);
    info!(
        path = %destination.display(),
        rows = summary.rows,
        structured = summary.structured,
        degraded = summary.degraded,
        failed = summary.failed,
        "table exported"
    );
    Ok(summary)
}
