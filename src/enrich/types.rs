//! Enrichment outcome types

/// The four structured fields an enrichment can supply.
///
/// Every field is optional: the service may answer without supplying some
/// (or any) of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentFields {
    pub summary: Option<String>,
    pub hypotheses: Option<String>,
    pub methods: Option<String>,
    pub findings: Option<String>,
}

impl EnrichmentFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_hypotheses(mut self, hypotheses: impl Into<String>) -> Self {
        self.hypotheses = Some(hypotheses.into());
        self
    }

    pub fn with_methods(mut self, methods: impl Into<String>) -> Self {
        self.methods = Some(methods.into());
        self
    }

    pub fn with_findings(mut self, findings: impl Into<String>) -> Self {
        self.findings = Some(findings.into());
        self
    }

    /// True when no field was recovered.
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.hypotheses.is_none()
            && self.methods.is_none()
            && self.findings.is_none()
    }

    /// Number of fields that carry a value.
    pub fn populated(&self) -> usize {
        [&self.summary, &self.hypotheses, &self.methods, &self.findings]
            .iter()
            .filter(|f| f.is_some())
            .count()
    }
}

/// Outcome of enriching one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentResult {
    /// The service answered. Fields may still be empty.
    Success(EnrichmentFields),
    /// The service call itself failed.
    Failure { reason: String },
}

impl EnrichmentResult {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The recovered fields, or `None` on failure.
    pub fn fields(&self) -> Option<&EnrichmentFields> {
        match self {
            Self::Success(fields) => Some(fields),
            Self::Failure { .. } => None,
        }
    }
}
