//! Aggregation and export
//!
//! Merges each record with its enrichment outcome into an `OutputRow` and
//! writes the rows, in input order, as a CSV table.

mod row;
mod table;

pub use row::{OutputRow, RowOutcome};
pub use table::{export, write_rows, HEADER};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing the output table.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot write {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
