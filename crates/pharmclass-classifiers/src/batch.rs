//! Batch classification driver
//!
//! Classifies many records with bounded concurrency and hands each finished
//! result to a [`ResultSink`]. One failing record never aborts the batch:
//! model errors are counted by kind and the run continues.

use std::time::Instant;

use futures::stream::{self, StreamExt};
use pharmclass_core::ProductRecord;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::client::ErrorKind;
use crate::service::ClassifierService;
use crate::sink::ResultSink;

/// Counters for a finished batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Records submitted
    pub total: usize,

    /// Records classified and stored
    pub classified: usize,

    /// Stored records flagged for review
    pub needs_review: usize,

    /// Records lost to retryable model errors
    pub retryable_errors: usize,

    /// Records lost to terminal model errors
    pub terminal_errors: usize,

    /// Results the sink failed to store
    pub sink_errors: usize,
}

impl BatchSummary {
    /// Records that did not end up stored
    pub fn failed(&self) -> usize {
        self.retryable_errors + self.terminal_errors + self.sink_errors
    }
}

/// Classify `records` and store every result in `sink`.
///
/// At most `concurrency` model calls are in flight; results reach the sink
/// in input order.
pub async fn run_batch(
    service: &ClassifierService,
    records: Vec<ProductRecord>,
    sink: &mut dyn ResultSink,
    concurrency: usize,
) -> BatchSummary {
    let mut summary = BatchSummary {
        total: records.len(),
        ..BatchSummary::default()
    };

    info!(
        total = summary.total,
        concurrency,
        "Starting batch classification"
    );

    let mut outcomes = stream::iter(records)
        .map(|record| async move {
            let started = Instant::now();
            let outcome = service.classify(&record).await;
            (record, outcome, started.elapsed())
        })
        .buffered(concurrency.max(1));

    while let Some((record, outcome, elapsed)) = outcomes.next().await {
        metrics::histogram!("pharmclass_classification_latency_ms")
            .record(elapsed.as_secs_f64() * 1000.0);

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                match e.kind() {
                    ErrorKind::Retryable => {
                        summary.retryable_errors += 1;
                        metrics::counter!("pharmclass_classifications_total", "outcome" => "retryable_error")
                            .increment(1);
                        warn!(sku = %record.name, id = ?record.external_id, error = %e, "Retryable model error");
                    }
                    ErrorKind::Terminal => {
                        summary.terminal_errors += 1;
                        metrics::counter!("pharmclass_classifications_total", "outcome" => "terminal_error")
                            .increment(1);
                        error!(sku = %record.name, id = ?record.external_id, error = %e, "Model error");
                    }
                }
                continue;
            }
        };

        if let Err(e) = sink.store(&record, &result) {
            summary.sink_errors += 1;
            error!(sku = %record.name, id = ?record.external_id, error = %e, "Failed to store result");
            continue;
        }

        summary.classified += 1;
        let outcome = if result.needs_review {
            summary.needs_review += 1;
            "needs_review"
        } else {
            "classified"
        };
        metrics::counter!("pharmclass_classifications_total", "outcome" => outcome).increment(1);
    }

    if let Err(e) = sink.flush() {
        error!(error = %e, "Failed to flush result sink");
    }

    info!(
        total = summary.total,
        classified = summary.classified,
        needs_review = summary.needs_review,
        retryable_errors = summary.retryable_errors,
        terminal_errors = summary.terminal_errors,
        sink_errors = summary.sink_errors,
        "Batch classification finished"
    );

    summary
}
