//! Top-level error type
//!
//! Only whole-run failures live here. Per-record enrichment failures never
//! become a `LitReviewError`; they are folded into that record's row.

use crate::config::ConfigError;
use crate::enrich::ServiceError;
use crate::export::ExportError;
use crate::search::SearchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LitReviewError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Search(#[from] SearchError),

    /// The enrichment client could not be constructed
    #[error("enrichment client setup failed: {0}")]
    Service(#[from] ServiceError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

/// Result type for whole-run operations
pub type LitReviewResult<T> = Result<T, LitReviewError>;
