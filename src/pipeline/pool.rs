//! Bounded worker pool for per-record enrichment
//!
//! A fixed number of workers pull record indices from a shared cursor. Each
//! worker calls the client, parses the answer and reports an index-tagged row
//! to a single collector, which restores input order once every worker is done.
//!
//! The worker count is the ceiling on concurrent client calls: a worker never
//! claims its next record before its current call has returned. Dropping the
//! `process` future aborts every worker along with its in-flight call.

use crate::enrich::{
    parse_response, EnrichmentClient, EnrichmentRequest, EnrichmentResult, DEFAULT_INSTRUCTION,
};
use crate::export::{OutputRow, RowOutcome};
use crate::record::Record;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub const DEFAULT_CONCURRENCY: usize = 8;

/// Dispatches records to a fixed set of concurrent enrichment workers.
pub struct WorkerPool {
    client: Arc<dyn EnrichmentClient>,
    instruction: Arc<str>,
    concurrency: usize,
}

impl WorkerPool {
    pub fn new(client: Arc<dyn EnrichmentClient>) -> Self {
        Self {
            client,
            instruction: Arc::from(DEFAULT_INSTRUCTION),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Set the worker count. Zero is raised to one.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    /// Set the instruction placed before each record's fields.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        let instruction: String = instruction.into();
        self.instruction = Arc::from(instruction);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Enrich every record and return one row per record, in input order.
    ///
    /// Never fails: a record whose enrichment errors, panics or is never
    /// reported gets a row with blank enrichment columns.
    pub async fn process(&self, records: &[Record]) -> Vec<OutputRow> {
        let total = records.len();
        if total == 0 {
            return Vec::new();
        }

        let queue: Arc<[Record]> = Arc::from(records);
        let cursor = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, OutputRow)>();

        let worker_count = self.concurrency.min(total);
        let mut workers = JoinSet::new();
        for worker in 0..worker_count {
            let queue = queue.clone();
            let cursor = cursor.clone();
            let tx = tx.clone();
            let client = self.client.clone();
            let instruction = self.instruction.clone();

            workers.spawn(async move {
                loop {
                    let index = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some(record) = queue.get(index) else {
                        break;
                    };
                    debug!(worker, index, title = %record.title, "claimed record");
                    let row = enrich_record(&client, &instruction, record).await;
                    if tx.send((index, row)).is_err() {
                        break;
                    }
                }
            });
        }
        // Collector ends once every worker has dropped its sender.
        drop(tx);

        let mut slots: Vec<Option<OutputRow>> = (0..total).map(|_| None).collect();
        let mut completed = 0;
        while let Some((index, row)) = rx.recv().await {
            if slots[index].is_some() {
                warn!(index, "duplicate result for record ignored");
                continue;
            }
            slots[index] = Some(row);
            completed += 1;
            debug!(completed, total, "record finished");
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "enrichment worker stopped early");
            }
        }

        if completed < total {
            warn!(missing = total - completed, "some records were not processed");
        }
        info!(records = total, workers = worker_count, "enrichment finished");

        slots
            .into_iter()
            .zip(queue.iter())
            .map(|(slot, record)| {
                slot.unwrap_or_else(|| {
                    OutputRow::merge(record, &EnrichmentResult::failure("record was not processed"))
                })
            })
            .collect()
    }
}

/// Client then parser for one record. All failures end up in the row.
async fn enrich_record(
    client: &Arc<dyn EnrichmentClient>,
    instruction: &str,
    record: &Record,
) -> OutputRow {
    let request = EnrichmentRequest::for_record(record, instruction);
    let call_client = client.clone();
    // Own task so a panicking client only takes this record down. Held in a
    // JoinSet so the call is aborted if this worker is dropped.
    let mut call = JoinSet::new();
    call.spawn(async move { call_client.enrich(&request).await });

    let Some(joined) = call.join_next().await else {
        return OutputRow::merge(record, &EnrichmentResult::failure("enrichment task vanished"));
    };

    match joined {
        Ok(Ok(raw)) => {
            let outcome = parse_response(&raw);
            let kind = RowOutcome::from(&outcome);
            if let RowOutcome::Degraded(anomaly) = &kind {
                debug!(title = %record.title, %anomaly, "enrichment output degraded");
            }
            OutputRow::merge(record, &EnrichmentResult::from(outcome)).with_outcome(kind)
        }
        Ok(Err(e)) => {
            warn!(title = %record.title, error = %e, "enrichment failed");
            OutputRow::merge(record, &EnrichmentResult::failure(e.to_string()))
        }
        Err(e) => {
            warn!(title = %record.title, error = %e, "enrichment task aborted");
            OutputRow::merge(
                record,
                &EnrichmentResult::failure(format!("enrichment task aborted: {}", e)),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::{mock_answer, MockClient, ServiceError};
    use async_trait::async_trait;

    fn records(titles: &[&str]) -> Vec<Record> {
        titles.iter().map(|t| Record::new(*t)).collect()
    }

    #[tokio::test]
    async fn empty_input_produces_no_rows() {
        let pool = WorkerPool::new(Arc::new(MockClient::available()));
        assert!(pool.process(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn middle_failure_is_isolated() {
        let client = MockClient::available()
            .with_response("A", mock_answer("sA", "hA", "mA", "fA"))
            .with_failure("B", ServiceError::Network("connection refused".to_string()))
            .with_response("C", mock_answer("sC", "hC", "mC", "fC"));
        let pool = WorkerPool::new(Arc::new(client)).with_concurrency(2);

        let rows = pool.process(&records(&["A", "B", "C"])).await;

        let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["A", "B", "C"]);
        assert_eq!(rows[0].summary, "sA");
        assert_eq!(rows[0].findings, "fA");
        assert_eq!(&rows[1].cells()[5..], ["", "", "", ""]);
        assert!(rows[1].is_failed());
        assert_eq!(rows[2].methods, "mC");
        assert_eq!(rows[2].outcome, RowOutcome::Structured);
    }

    #[tokio::test]
    async fn uninterpretable_answer_keeps_base_fields() {
        let client = MockClient::available().with_response("A", "I cannot help with that.");
        let pool = WorkerPool::new(Arc::new(client));

        let rows = pool.process(&[Record::new("A").with_venue("Nature")]).await;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "A");
        assert_eq!(rows[0].venue, "Nature");
        assert_eq!(rows[0].summary, "");
        assert!(matches!(rows[0].outcome, RowOutcome::Degraded(_)));
    }

    #[test]
    fn zero_concurrency_is_raised_to_one() {
        let pool = WorkerPool::new(Arc::new(MockClient::available())).with_concurrency(0);
        assert_eq!(pool.concurrency(), 1);
    }

    struct PanickingClient;

    #[async_trait]
    impl EnrichmentClient for PanickingClient {
        async fn enrich(&self, request: &EnrichmentRequest) -> Result<String, ServiceError> {
            if request.title == "boom" {
                panic!("client bug");
            }
            Ok(mock_answer("s", "h", "m", "f"))
        }
    }

    #[tokio::test]
    async fn panicking_call_only_fails_its_own_record() {
        let pool = WorkerPool::new(Arc::new(PanickingClient)).with_concurrency(1);

        let rows = pool.process(&records(&["ok-1", "boom", "ok-2"])).await;

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].summary, "s");
        assert!(rows[1].is_failed());
        assert_eq!(rows[1].title, "boom");
        assert_eq!(rows[2].summary, "s");
    }

    struct StallingClient {
        started: Arc<AtomicUsize>,
        dropped: Arc<AtomicUsize>,
    }

    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl EnrichmentClient for StallingClient {
        async fn enrich(&self, _request: &EnrichmentRequest) -> Result<String, ServiceError> {
            let _guard = DropCounter(self.dropped.clone());
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn dropping_process_cancels_in_flight_calls() {
        let started = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicUsize::new(0));
        let client = StallingClient {
            started: started.clone(),
            dropped: dropped.clone(),
        };
        let pool = WorkerPool::new(Arc::new(client)).with_concurrency(3);
        let input = records(&["a", "b", "c", "d"]);

        let outcome =
            tokio::time::timeout(std::time::Duration::from_millis(100), pool.process(&input)).await;
        assert!(outcome.is_err());

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(started.load(Ordering::SeqCst), 3);
        assert_eq!(dropped.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn custom_instruction_reaches_the_client() {
        struct EchoClient;

        #[async_trait]
        impl EnrichmentClient for EchoClient {
            async fn enrich(&self, request: &EnrichmentRequest) -> Result<String, ServiceError> {
                Ok(format!("Summary: {}", request.prompt.lines().next().unwrap_or_default()))
            }
        }

        let pool = WorkerPool::new(Arc::new(EchoClient)).with_instruction("Be brief.");
        let rows = pool.process(&records(&["A"])).await;
        assert_eq!(rows[0].summary, "Be brief.");
    }
}
