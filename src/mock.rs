//! In-process collaborators for tests.
//!
//! Scriptable stand-ins for the job-pool service and the WebDAV staging
//! store: they record every call, hand out deterministic identifiers and
//! names, and let tests inject call-level or per-entry failures.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use gridspool_protocol::{
    CancelledJob, CreateJob, CreatedJob, FinalizeJob, FinalizedJob, ServiceError,
};

use crate::service::JobService;
use crate::staging::StagingStore;

/// Failure injected into the next matching call.
#[derive(Debug, Clone)]
pub enum InjectedFailure {
    /// The whole call fails with a transport error.
    Transport(String),
    /// The whole call fails with a protocol error.
    Protocol { status: u16, message: String },
    /// The entry at the given offset gets a `msg` result; the rest succeed.
    Entry { index: usize, message: String },
}

impl InjectedFailure {
    fn call_error(&self) -> Option<ServiceError> {
        match self {
            InjectedFailure::Transport(message) => Some(ServiceError::transport(message.clone())),
            InjectedFailure::Protocol { status, message } => {
                Some(ServiceError::protocol(*status, message.clone()))
            }
            InjectedFailure::Entry { .. } => None,
        }
    }

    fn entry_message(&self, index: usize) -> Option<String> {
        match self {
            InjectedFailure::Entry {
                index: failing,
                message,
            } if *failing == index => Some(message.clone()),
            _ => None,
        }
    }
}

#[derive(Default)]
struct ServiceState {
    next_id: u64,
    create_calls: Vec<Vec<CreateJob>>,
    finalize_calls: Vec<Vec<FinalizeJob>>,
    cancel_calls: Vec<Vec<u64>>,
    uploads: Vec<(u64, String, PathBuf)>,
    fail_create: Option<InjectedFailure>,
    fail_finalize: Option<InjectedFailure>,
    fail_cancel: Option<InjectedFailure>,
    fail_upload: Option<String>,
}

/// Scriptable in-process job-pool service.
#[derive(Default)]
pub struct MockJobService {
    state: Mutex<ServiceState>,
}

impl MockJobService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_create(&self, failure: InjectedFailure) {
        self.state.lock().unwrap().fail_create = Some(failure);
    }

    pub fn fail_next_finalize(&self, failure: InjectedFailure) {
        self.state.lock().unwrap().fail_finalize = Some(failure);
    }

    pub fn fail_next_cancel(&self, failure: InjectedFailure) {
        self.state.lock().unwrap().fail_cancel = Some(failure);
    }

    pub fn fail_next_upload(&self, message: &str) {
        self.state.lock().unwrap().fail_upload = Some(message.to_string());
    }

    /// Every create call received, in order.
    pub fn create_calls(&self) -> Vec<Vec<CreateJob>> {
        self.state.lock().unwrap().create_calls.clone()
    }

    /// Every finalize call received, in order.
    pub fn finalize_calls(&self) -> Vec<Vec<FinalizeJob>> {
        self.state.lock().unwrap().finalize_calls.clone()
    }

    /// Every cancel call received, in order.
    pub fn cancel_calls(&self) -> Vec<Vec<u64>> {
        self.state.lock().unwrap().cancel_calls.clone()
    }

    /// Every direct upload received, in order.
    pub fn uploads(&self) -> Vec<(u64, String, PathBuf)> {
        self.state.lock().unwrap().uploads.clone()
    }

    /// Total number of remote calls of any kind.
    pub fn remote_call_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.create_calls.len()
            + state.finalize_calls.len()
            + state.cancel_calls.len()
            + state.uploads.len()
    }
}

impl JobService for MockJobService {
    fn create_jobs(&self, jobs: &[CreateJob]) -> Result<Vec<CreatedJob>, ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.create_calls.push(jobs.to_vec());
        let injected = state.fail_create.take();
        if let Some(err) = injected.as_ref().and_then(InjectedFailure::call_error) {
            return Err(err);
        }
        let mut results = Vec::with_capacity(jobs.len());
        for index in 0..jobs.len() {
            match injected.as_ref().and_then(|f| f.entry_message(index)) {
                Some(message) => results.push(CreatedJob::rejected(message)),
                None => {
                    state.next_id += 1;
                    results.push(CreatedJob::assigned(state.next_id));
                }
            }
        }
        Ok(results)
    }

    fn finalize_jobs(&self, jobs: &[FinalizeJob]) -> Result<Vec<FinalizedJob>, ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.finalize_calls.push(jobs.to_vec());
        let injected = state.fail_finalize.take();
        if let Some(err) = injected.as_ref().and_then(InjectedFailure::call_error) {
            return Err(err);
        }
        let results = jobs
            .iter()
            .enumerate()
            .map(|(index, job)| {
                match injected.as_ref().and_then(|f| f.entry_message(index)) {
                    Some(message) => FinalizedJob::rejected(message),
                    None => FinalizedJob::named(format!("job-{}", job.id)),
                }
            })
            .collect();
        Ok(results)
    }

    fn cancel_jobs(&self, ids: &[u64]) -> Result<Vec<CancelledJob>, ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.cancel_calls.push(ids.to_vec());
        let injected = state.fail_cancel.take();
        if let Some(err) = injected.as_ref().and_then(InjectedFailure::call_error) {
            return Err(err);
        }
        Ok(ids.iter().map(|&id| CancelledJob { id }).collect())
    }

    fn upload_file(&self, job_id: u64, name: &str, path: &Path) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.fail_upload.take() {
            return Err(ServiceError::transport(message));
        }
        state
            .uploads
            .push((job_id, name.to_string(), path.to_path_buf()));
        Ok(())
    }
}

#[derive(Default)]
struct StoreState {
    collections: HashSet<String>,
    created: Vec<String>,
    removed: Vec<String>,
    uploads: Vec<(String, PathBuf)>,
    fail_create: Option<String>,
    fail_upload: Option<String>,
    fail_removals: HashSet<String>,
}

type UploadHook = Box<dyn Fn() + Send>;

/// Scriptable in-process WebDAV staging store.
#[derive(Default)]
pub struct MockStagingStore {
    state: Mutex<StoreState>,
    upload_hook: Mutex<Option<UploadHook>>,
}

impl MockStagingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_collection(&self, message: &str) {
        self.state.lock().unwrap().fail_create = Some(message.to_string());
    }

    pub fn fail_next_upload(&self, message: &str) {
        self.state.lock().unwrap().fail_upload = Some(message.to_string());
    }

    /// Make every removal of the given URL fail.
    pub fn fail_removal_of(&self, url: &str) {
        self.state.lock().unwrap().fail_removals.insert(url.to_string());
    }

    /// Hook invoked at the start of every upload. Used to line up an
    /// interrupt with a precise point of the stage phase.
    pub fn on_upload(&self, hook: impl Fn() + Send + 'static) {
        *self.upload_hook.lock().unwrap() = Some(Box::new(hook));
    }

    /// Collections currently existing in the store.
    pub fn collections(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut collections: Vec<String> = state.collections.iter().cloned().collect();
        collections.sort();
        collections
    }

    /// Collection URLs created, in order.
    pub fn created(&self) -> Vec<String> {
        self.state.lock().unwrap().created.clone()
    }

    /// Collection URLs removal was attempted for, in order.
    pub fn removed(&self) -> Vec<String> {
        self.state.lock().unwrap().removed.clone()
    }

    /// Uploads received, in order.
    pub fn uploads(&self) -> Vec<(String, PathBuf)> {
        self.state.lock().unwrap().uploads.clone()
    }
}

impl StagingStore for MockStagingStore {
    fn create_collection(&self, url: &str) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.created.push(url.to_string());
        if let Some(message) = state.fail_create.take() {
            return Err(ServiceError::transport(message));
        }
        state.collections.insert(url.to_string());
        Ok(())
    }

    fn upload_file(&self, url: &str, path: &Path) -> Result<(), ServiceError> {
        if let Some(hook) = &*self.upload_hook.lock().unwrap() {
            hook();
        }
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.fail_upload.take() {
            return Err(ServiceError::transport(message));
        }
        state.uploads.push((url.to_string(), path.to_path_buf()));
        Ok(())
    }

    fn remove_collection(&self, url: &str) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.removed.push(url.to_string());
        if state.fail_removals.contains(url) {
            return Err(ServiceError::protocol(500, "removal refused"));
        }
        // Removing an absent collection still counts as success.
        state.collections.remove(url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_assigns_sequential_ids() {
        let service = MockJobService::new();
        let jobs = vec![
            CreateJob {
                clusterlist: vec!["https://cluster.example.org".to_string()],
            };
            3
        ];

        let results = service.create_jobs(&jobs).unwrap();

        let ids: Vec<u64> = results.iter().filter_map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_entry_failure_only_hits_one_entry() {
        let service = MockJobService::new();
        service.fail_next_create(InjectedFailure::Entry {
            index: 1,
            message: "no matching cluster".to_string(),
        });
        let jobs = vec![
            CreateJob {
                clusterlist: vec!["https://cluster.example.org".to_string()],
            };
            3
        ];

        let results = service.create_jobs(&jobs).unwrap();

        assert!(results[0].id.is_some());
        assert_eq!(results[1].msg.as_deref(), Some("no matching cluster"));
        assert!(results[2].id.is_some());
    }

    #[test]
    fn test_store_removal_is_idempotent() {
        let store = MockStagingStore::new();
        store.create_collection("https://dav.example.org/user/1").unwrap();

        store.remove_collection("https://dav.example.org/user/1").unwrap();
        store.remove_collection("https://dav.example.org/user/1").unwrap();

        assert!(store.collections().is_empty());
        assert_eq!(store.removed().len(), 2);
    }
}
