//! Per-record enrichment: the service client and the result parser
//!
//! A record becomes an `EnrichmentRequest`, the client turns it into raw text
//! (or a `ServiceError`), and the parser turns raw text into an
//! `EnrichmentResult`. The worker pool strings these together.

mod client;
mod openai;
mod parse;
mod types;

pub use client::{
    mock_answer, EnrichmentClient, EnrichmentRequest, MockClient, ServiceError,
    DEFAULT_INSTRUCTION,
};
pub use openai::ChatCompletionClient;
pub use parse::{parse, parse_response, ParseAnomaly, ParseOutcome};
pub use types::{EnrichmentFields, EnrichmentResult};
