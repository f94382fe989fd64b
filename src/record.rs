//! Bibliographic records
//!
//! A `Record` is one search hit, built once from the search service's JSON
//! and read-only for the rest of the run.

/// Placeholder for a display field the search service did not supply.
pub const NOT_AVAILABLE: &str = "N/A";

/// One source document to be enriched and exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub title: String,
    /// All authors, joined upstream into one field
    pub authors: String,
    /// Publication name (journal, proceedings, ...)
    pub venue: String,
    /// Cover date exactly as the search service returned it
    pub publication_date: String,
    /// DOI when known. Never used to deduplicate.
    pub identifier: Option<String>,
}

impl Record {
    /// Create a record with every display field set to `N/A`.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            authors: NOT_AVAILABLE.to_string(),
            venue: NOT_AVAILABLE.to_string(),
            publication_date: NOT_AVAILABLE.to_string(),
            identifier: None,
        }
    }

    pub fn with_authors(mut self, authors: impl Into<String>) -> Self {
        self.authors = authors.into();
        self
    }

    pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = venue.into();
        self
    }

    pub fn with_publication_date(mut self, date: impl Into<String>) -> Self {
        self.publication_date = date.into();
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Build a record from one Scopus `search-results.entry` object.
    ///
    /// Missing display keys fall back to `N/A`; a missing DOI stays absent.
    /// Never fails: a malformed entry still yields a record.
    pub fn from_scopus_entry(entry: &serde_json::Value) -> Self {
        let field = |key: &str| {
            entry
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };

        Self {
            title: field("dc:title"),
            authors: field("dc:creator"),
            venue: field("prism:publicationName"),
            publication_date: field("prism:coverDate"),
            identifier: entry
                .get("prism:doi")
                .and_then(|v| v.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string),
        }
    }

    /// Render the record's fields as `Label: value` lines for a prompt.
    pub fn render_fields(&self) -> String {
        format!(
            "Title: {}\nAuthors: {}\nPublication Name: {}\nPublication Date: {}\nDOI: {}",
            self.title,
            self.authors,
            self.venue,
            self.publication_date,
            self.identifier.as_deref().unwrap_or(NOT_AVAILABLE),
        )
    }
}
