//! Payload types for the job-pool service.
//!
//! Defines the per-job entries and results exchanged with the remote service
//! during submission (create, finalize, cancel) and the error taxonomy for
//! failed calls. The transport itself lives with the caller; this crate owns
//! only the shapes.

pub mod error;
pub mod jobs;

pub use error::ServiceError;
pub use jobs::{
    CancelledJob, CreateJob, CreatedJob, FinalizeJob, FinalizedJob, MAX_CALL_JOBS,
};
