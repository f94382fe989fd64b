//! Common test utilities for litreview integration tests
//!
//! An instrumented enrichment client that records how many calls are in
//! flight, plus record builders.

#![allow(dead_code)]

use async_trait::async_trait;
use litreview::{mock_answer, EnrichmentClient, EnrichmentRequest, Record, ServiceError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// `n` records titled `paper-000`, `paper-001`, ...
pub fn numbered_records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            Record::new(format!("paper-{:03}", i))
                .with_authors(format!("Author {}", i))
                .with_venue("Journal of Tests")
                .with_publication_date("2024-01-01")
                .with_identifier(format!("10.1000/{}", i))
        })
        .collect()
}

pub fn titles(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.title.clone()).collect()
}

/// Summary text the gauge client answers with for `title`.
pub fn summary_for(title: &str) -> String {
    format!("summary of {}", title)
}

/// Enrichment client that tracks concurrent calls.
///
/// Delays are fixed per title at construction, so a seeded run is repeatable.
#[derive(Default)]
pub struct GaugeClient {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
}

impl GaugeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Random delay in `0..=max_ms` per record.
    pub fn with_jitter(mut self, records: &[Record], max_ms: u64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        for record in records {
            let ms = rng.gen_range(0..=max_ms);
            self.delays.insert(record.title.clone(), Duration::from_millis(ms));
        }
        self
    }

    /// Same delay for every record.
    pub fn with_delay(mut self, records: &[Record], delay: Duration) -> Self {
        for record in records {
            self.delays.insert(record.title.clone(), delay);
        }
        self
    }

    pub fn failing_on(mut self, title: impl Into<String>) -> Self {
        self.failing.insert(title.into());
        self
    }

    /// Highest number of calls observed in flight at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnrichmentClient for GaugeClient {
    async fn enrich(&self, request: &EnrichmentRequest) -> Result<String, ServiceError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&request.title) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&request.title) {
            return Err(ServiceError::Network("connection reset".to_string()));
        }
        Ok(mock_answer(
            &summary_for(&request.title),
            "hypotheses",
            "methods",
            "findings",
        ))
    }
}
