//! Litreview: Automated Literature Review Export
//!
//! Searches Scopus for a keyword, asks a text-generation service to summarize
//! each paper found, and writes one CSV row per paper.
//!
//! # Core Concepts
//!
//! - **Records**: bibliographic entries from the search, with "N/A" defaults
//! - **Enrichment**: summary, hypotheses, methods and findings for a record,
//!   produced by a bounded pool of concurrent service calls
//! - **Lenient degrade**: answers that cannot be interpreted yield blank
//!   columns, never a failed run
//!
//! # Example
//!
//! ```
//! use litreview::{mock_answer, Config, MockClient, Pipeline, Record};
//! use std::sync::Arc;
//!
//! let client = MockClient::available()
//!     .with_response("Soil carbon", mock_answer("s", "h", "m", "f"));
//! let pipeline = Pipeline::new(Arc::new(client), &Config::default());
//! let records = vec![Record::new("Soil carbon")];
//! // pipeline.run(&records, path).await writes one row per record
//! # let _ = (pipeline, records);
//! ```

pub mod config;
pub mod enrich;
mod error;
pub mod export;
pub mod pipeline;
pub mod record;
pub mod review;
pub mod search;

pub use config::{Config, ConfigError, Credentials};
pub use enrich::{
    mock_answer, ChatCompletionClient, EnrichmentClient, EnrichmentFields, EnrichmentRequest,
    EnrichmentResult, MockClient, ServiceError,
};
pub use error::{LitReviewError, LitReviewResult};
pub use export::{export, ExportError, OutputRow, RowOutcome, HEADER};
pub use pipeline::{Pipeline, RunSummary, WorkerPool};
pub use record::Record;
pub use review::{conduct_review, conduct_review_with, ReviewRequest};
pub use search::{ScopusClient, SearchError, SearchQuery};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
