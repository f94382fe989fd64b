//! Output rows: one record merged with its enrichment outcome

use crate::enrich::{EnrichmentResult, ParseOutcome};
use crate::record::Record;

/// How a row's enrichment columns were obtained. Not written to the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// Service answered with parseable structured output
    Structured,
    /// Service answered but the output was only partly interpretable
    Degraded(String),
    /// Service call failed; enrichment columns are blank
    Failed(String),
    /// Enrichment was not requested for this run
    Skipped,
}

impl From<&ParseOutcome> for RowOutcome {
    fn from(outcome: &ParseOutcome) -> Self {
        match outcome {
            ParseOutcome::Structured(_) => Self::Structured,
            ParseOutcome::Degraded { anomaly, .. } => Self::Degraded(anomaly.to_string()),
        }
    }
}

/// The merged representation of one record, as written to the output table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub title: String,
    pub authors: String,
    pub venue: String,
    pub publication_date: String,
    /// Blank when the record has no identifier
    pub identifier: String,
    pub summary: String,
    pub hypotheses: String,
    pub methods: String,
    pub findings: String,
    pub outcome: RowOutcome,
}

impl OutputRow {
    /// Merge a record with its enrichment result.
    ///
    /// On `Failure` every enrichment column is blank.
    pub fn merge(record: &Record, result: &EnrichmentResult) -> Self {
        let mut row = Self::base(record, RowOutcome::Structured);
        match result {
            EnrichmentResult::Success(fields) => {
                let text = |f: &Option<String>| f.clone().unwrap_or_default();
                row.summary = text(&fields.summary);
                row.hypotheses = text(&fields.hypotheses);
                row.methods = text(&fields.methods);
                row.findings = text(&fields.findings);
            }
            EnrichmentResult::Failure { reason } => {
                row.outcome = RowOutcome::Failed(reason.clone());
            }
        }
        row
    }

    /// A row with base fields only, for runs that skip enrichment.
    pub fn unenriched(record: &Record) -> Self {
        Self::base(record, RowOutcome::Skipped)
    }

    pub fn with_outcome(mut self, outcome: RowOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, RowOutcome::Failed(_))
    }

    /// Cells in column order.
    pub fn cells(&self) -> [&str; 9] {
        [
            self.title.as_str(),
            self.authors.as_str(),
            self.venue.as_str(),
            self.publication_date.as_str(),
            self.identifier.as_str(),
            self.summary.as_str(),
            self.hypotheses.as_str(),
            self.methods.as_str(),
            self.findings.as_str(),
        ]
    }

    fn base(record: &Record, outcome: RowOutcome) -> Self {
        Self {
            title: record.title.clone(),
            authors: record.authors.clone(),
            venue: record.venue.clone(),
            publication_date: record.publication_date.clone(),
            identifier: record.identifier.clone().unwrap_or_default(),
            summary: String::new(),
            hypotheses: String::new(),
            methods: String::new(),
            findings: String::new(),
            outcome,
        }
    }
}
