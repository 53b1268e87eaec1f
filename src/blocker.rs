//! Run orchestration: authenticate once, then submit each indicator group.

use crate::api::IndicatorApi;
use crate::indicator::IndicatorBatch;
use crate::submitter::{submit_batch, BatchReport};
use std::fmt;
use tracing::{error, info};

/// Drives one blocking run against an indicator API.
pub struct IndicatorBlocker<A> {
    api: A,
}

impl<A: IndicatorApi> IndicatorBlocker<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    #[cfg(test)]
    fn api(&self) -> &A {
        &self.api
    }

    /// Submit hashes, then domains, then IPs.
    ///
    /// Without a token nothing is submitted and the summary says so.
    pub async fn run(&self, batch: &IndicatorBatch) -> RunSummary {
        let token = match self.api.authenticate().await {
            Ok(token) => token,
            Err(e) => {
                error!(api = self.api.name(), error = %e, "Failed to get access token");
                error!("Cannot proceed without a valid access token");
                return RunSummary {
                    authenticated: false,
                    reports: Vec::new(),
                };
            }
        };

        info!(api = self.api.name(), token = %token.preview(), "Access token obtained");

        let mut reports = Vec::with_capacity(3);
        for (kind, values) in batch.groups() {
            info!(kind = %kind, count = values.len(), "Submitting indicators");
            reports.push(submit_batch(&self.api, &token, kind, values).await);
        }

        RunSummary {
            authenticated: true,
            reports,
        }
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Whether a token was obtained.
    pub authenticated: bool,
    /// One report per indicator type, in submission order.
    pub reports: Vec<BatchReport>,
}

impl RunSummary {
    pub fn created(&self) -> usize {
        self.reports.iter().map(|r| r.created).sum()
    }

    pub fn failures(&self) -> usize {
        self.reports.iter().map(|r| r.failures()).sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.authenticated {
            return write!(f, "No indicators submitted: authentication failed");
        }

        writeln!(f, "Submission summary:")?;
        for report in &self.reports {
            writeln!(f, "  {}", report)?;
        }
        write!(
            f,
            "  created={} failures={}",
            self.created(),
            self.failures()
        )
    }
}
