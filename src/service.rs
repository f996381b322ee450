//! Abstraction over the remote job-pool service.
//!
//! The coordinator only depends on this trait; the REST transport behind it
//! is an external collaborator, and the test suite injects the in-process
//! mock instead.

use std::path::Path;

use gridspool_protocol::{
    CancelledJob, CreateJob, CreatedJob, FinalizeJob, FinalizedJob, ServiceError, MAX_CALL_JOBS,
};

/// Blocking client surface of the remote job-pool service.
pub trait JobService {
    /// Create job records. One result per entry, in entry order.
    fn create_jobs(&self, jobs: &[CreateJob]) -> Result<Vec<CreatedJob>, ServiceError>;

    /// Attach final description text to created jobs. One result per entry,
    /// in entry order.
    fn finalize_jobs(&self, jobs: &[FinalizeJob]) -> Result<Vec<FinalizedJob>, ServiceError>;

    /// Cancel jobs. Returns one acknowledgement per job actually cancelled.
    fn cancel_jobs(&self, ids: &[u64]) -> Result<Vec<CancelledJob>, ServiceError>;

    /// Upload one named input file directly into a job's data area.
    fn upload_file(&self, job_id: u64, name: &str, path: &Path) -> Result<(), ServiceError>;
}

/// Create jobs in groups of at most [`MAX_CALL_JOBS`] per call, concatenating
/// the per-job results in order.
pub fn create_jobs_chunked(
    service: &dyn JobService,
    jobs: &[CreateJob],
) -> Result<Vec<CreatedJob>, ServiceError> {
    let mut results = Vec::with_capacity(jobs.len());
    for chunk in jobs.chunks(MAX_CALL_JOBS) {
        log::debug!("create call carrying {} jobs", chunk.len());
        results.extend(service.create_jobs(chunk)?);
    }
    Ok(results)
}

/// Finalize jobs in groups of at most [`MAX_CALL_JOBS`] per call.
pub fn finalize_jobs_chunked(
    service: &dyn JobService,
    jobs: &[FinalizeJob],
) -> Result<Vec<FinalizedJob>, ServiceError> {
    let mut results = Vec::with_capacity(jobs.len());
    for chunk in jobs.chunks(MAX_CALL_JOBS) {
        log::debug!("finalize call carrying {} jobs", chunk.len());
        results.extend(service.finalize_jobs(chunk)?);
    }
    Ok(results)
}

/// Cancel jobs in groups of at most [`MAX_CALL_JOBS`] per call.
pub fn cancel_jobs_chunked(
    service: &dyn JobService,
    ids: &[u64],
) -> Result<Vec<CancelledJob>, ServiceError> {
    let mut results = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(MAX_CALL_JOBS) {
        log::debug!("cancel call carrying {} jobs", chunk.len());
        results.extend(service.cancel_jobs(chunk)?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockJobService;

    #[test]
    fn test_create_chunking_splits_large_sets() {
        let service = MockJobService::new();
        let jobs: Vec<CreateJob> = (0..250)
            .map(|_| CreateJob {
                clusterlist: vec!["https://cluster.example.org".to_string()],
            })
            .collect();

        let results = create_jobs_chunked(&service, &jobs).unwrap();

        assert_eq!(results.len(), 250);
        let sizes: Vec<usize> = service.create_calls().iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
    }

    #[test]
    fn test_cancel_chunking_preserves_order() {
        let service = MockJobService::new();
        let ids: Vec<u64> = (1..=150).collect();

        let results = cancel_jobs_chunked(&service, &ids).unwrap();

        let returned: Vec<u64> = results.iter().map(|job| job.id).collect();
        assert_eq!(returned, ids);
        assert_eq!(service.cancel_calls().len(), 2);
    }

    #[test]
    fn test_empty_set_makes_no_calls() {
        let service = MockJobService::new();
        let results = create_jobs_chunked(&service, &[]).unwrap();

        assert!(results.is_empty());
        assert!(service.create_calls().is_empty());
    }
}
