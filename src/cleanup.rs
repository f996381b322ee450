//! Reconciliation of jobs left with a remote footprint.
//!
//! The coordinator's outcome list says which jobs still carry a cleanup
//! obligation; the reconciler cancels them in one batched pass and removes
//! their staging collections, so nothing stays half-created server-side.

use gridspool_protocol::ServiceError;

use crate::outcome::JobOutcome;
use crate::service::{self, JobService};
use crate::staging::SharedStore;

/// Result of one reconciliation pass.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Identifiers acknowledged by the cancel call.
    pub cancelled: Vec<u64>,
    /// Collection-removal failures, one message per directory. A failed
    /// removal never blocks the remaining removals.
    pub removal_errors: Vec<String>,
}

/// Cancels half-submitted jobs and removes their staging collections.
pub struct CleanupReconciler<'a> {
    service: &'a dyn JobService,
    store: Option<SharedStore<'a>>,
}

impl<'a> CleanupReconciler<'a> {
    pub fn new(service: &'a dyn JobService) -> Self {
        Self {
            service,
            store: None,
        }
    }

    /// Also remove each cancelled job's collection from the shared store.
    pub fn with_store(mut self, store: SharedStore<'a>) -> Self {
        self.store = Some(store);
        self
    }

    /// Cancel every outcome flagged for cleanup.
    ///
    /// Idempotent and safe to call repeatedly; an empty selection performs
    /// zero remote calls.
    pub fn reconcile(&self, outcomes: &[JobOutcome]) -> Result<CleanupReport, ServiceError> {
        let ids: Vec<u64> = outcomes.iter().filter_map(JobOutcome::cleanup_id).collect();
        if ids.is_empty() {
            return Ok(CleanupReport::default());
        }

        log::info!("cancelling {} half-submitted jobs", ids.len());
        let cancelled = service::cancel_jobs_chunked(self.service, &ids)?;
        let mut report = CleanupReport {
            cancelled: cancelled.iter().map(|job| job.id).collect(),
            removal_errors: Vec::new(),
        };

        if let Some(store) = &self.store {
            for id in &report.cancelled {
                let url = store.collection_url(*id);
                match store.store().remove_collection(&url) {
                    Ok(()) => log::debug!("removed staging collection {url}"),
                    Err(err) => {
                        log::warn!("cannot remove staging collection {url}: {err}");
                        report
                            .removal_errors
                            .push(format!("error removing {url}: {err}"));
                    }
                }
            }
        }

        Ok(report)
    }
}
