//! Sequential indicator submission.

use crate::api::{AccessToken, IndicatorApi, SubmitOutcome};
use crate::indicator::{Indicator, IndicatorType};
use std::fmt;
use tracing::{error, info, warn};

/// Per-type tally of submission results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub kind: IndicatorType,
    pub created: usize,
    pub already_exists: usize,
    pub rejected: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchReport {
    pub fn new(kind: IndicatorType) -> Self {
        Self {
            kind,
            created: 0,
            already_exists: 0,
            rejected: 0,
            failed: 0,
            skipped: 0,
        }
    }

    /// Number of values seen, including skipped ones.
    pub fn total(&self) -> usize {
        self.created + self.already_exists + self.rejected + self.failed + self.skipped
    }

    /// Values that did not reach the platform or were refused by it.
    pub fn failures(&self) -> usize {
        self.rejected + self.failed + self.skipped
    }

    fn record(&mut self, outcome: &SubmitOutcome) {
        match outcome {
            SubmitOutcome::Created => self.created += 1,
            SubmitOutcome::AlreadyExists { .. } => self.already_exists += 1,
            SubmitOutcome::Rejected { .. } => self.rejected += 1,
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<7} total={} created={} existing={} rejected={} failed={} skipped={}",
            self.kind.as_str(),
            self.total(),
            self.created,
            self.already_exists,
            self.rejected,
            self.failed,
            self.skipped
        )
    }
}

/// Submit every value of one type, one request at a time.
///
/// A failing value is logged and counted, it never stops the batch.
pub async fn submit_batch<A: IndicatorApi + ?Sized>(
    api: &A,
    token: &AccessToken,
    kind: IndicatorType,
    values: &[String],
) -> BatchReport {
    let mut report = BatchReport::new(kind);

    for raw in values {
        let indicator = match Indicator::new(kind, raw) {
            Ok(indicator) => indicator,
            Err(e) => {
                warn!(kind = %kind, error = %e, "Skipping invalid indicator");
                report.skipped += 1;
                continue;
            }
        };

        match api.create_indicator(token, &indicator).await {
            Ok(outcome) => {
                log_outcome(&indicator, &outcome);
                report.record(&outcome);
            }
            Err(e) => {
                error!(
                    kind = %kind,
                    value = indicator.value(),
                    error = %e,
                    "Failed to submit indicator"
                );
                report.failed += 1;
            }
        }
    }

    info!(
        kind = %kind,
        created = report.created,
        already_exists = report.already_exists,
        rejected = report.rejected,
        failed = report.failed,
        skipped = report.skipped,
        "Batch complete"
    );

    report
}

fn log_outcome(indicator: &Indicator, outcome: &SubmitOutcome) {
    let kind = indicator.kind();
    let value = indicator.value();

    match outcome {
        SubmitOutcome::Created => {
            info!(kind = %kind, value, action = ?indicator.action(), "Indicator blocked");
        }
        SubmitOutcome::AlreadyExists { status } => {
            warn!(kind = %kind, value, status, "Indicator already exists");
        }
        SubmitOutcome::Rejected { status, reason } => {
            warn!(kind = %kind, value, status, reason = %reason, "Indicator rejected");
        }
    }
}
