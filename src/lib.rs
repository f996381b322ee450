//! gridspool: batch job submission client for a remote job-pool service.
//!
//! The library drives the multi-phase submission protocol: parse job
//! descriptions written in the attribute–value description language, create
//! remote job records, stage input files (directly to the service or through
//! a shared WebDAV store), finalize the descriptions, and reconcile anything
//! left half-created. The remote service and the store are consumed through
//! traits; in-process mocks back the test suite.

pub mod cleanup;
pub mod config;
pub mod mock;
pub mod outcome;
pub mod service;
pub mod signal;
pub mod staging;
pub mod submit;

pub use cleanup::{CleanupReconciler, CleanupReport};
pub use config::ClientConfig;
pub use outcome::{JobOutcome, SubmissionReport};
pub use service::JobService;
pub use signal::{Interrupted, InterruptGuard, InterruptState};
pub use staging::{SharedStore, StagingStore};
pub use submit::SubmissionCoordinator;
