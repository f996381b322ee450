//! Staging of input files to the service or a shared WebDAV store.
//!
//! The store itself is an external collaborator behind [`StagingStore`];
//! this module owns the per-job URL layout and the classification of
//! input-file references into local paths and remote URLs.

use std::path::{Path, PathBuf};

use gridspool_protocol::ServiceError;
use url::Url;

/// Blocking client surface of the shared WebDAV store.
pub trait StagingStore {
    /// Create a collection (directory).
    fn create_collection(&self, url: &str) -> Result<(), ServiceError>;

    /// Upload a local file to the given URL. Implementations follow upload
    /// redirects transparently on a fresh connection.
    fn upload_file(&self, url: &str, path: &Path) -> Result<(), ServiceError>;

    /// Remove a collection and its contents. Removing an absent collection
    /// counts as success.
    fn remove_collection(&self, url: &str) -> Result<(), ServiceError>;
}

/// A staging store paired with the base URL its per-job collections live
/// under. Collections are disjoint by construction: each is named by the
/// job's identifier.
pub struct SharedStore<'a> {
    store: &'a dyn StagingStore,
    base: String,
}

impl<'a> SharedStore<'a> {
    pub fn new(store: &'a dyn StagingStore, base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { store, base }
    }

    pub fn store(&self) -> &dyn StagingStore {
        self.store
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// URL of a job's collection.
    pub fn collection_url(&self, job_id: u64) -> String {
        format!("{}/{}", self.base, job_id)
    }

    /// URL of one named file inside a job's collection.
    pub fn file_url(&self, job_id: u64, name: &str) -> String {
        format!("{}/{}/{}", self.base, job_id, name)
    }
}

/// A classified input-file reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileRef {
    /// A file on the local filesystem that needs staging.
    Local(PathBuf),
    /// Already remote; the service fetches it itself.
    Remote,
}

/// Classify an input-file reference. Anything with a non-`file` scheme or a
/// host is remote; bare paths and host-less `file:` URLs are local.
pub fn classify_source(raw: &str) -> FileRef {
    match Url::parse(raw) {
        Ok(url) => {
            if url.scheme() == "file" && url.host().is_none() {
                FileRef::Local(PathBuf::from(url.path()))
            } else {
                FileRef::Remote
            }
        }
        Err(_) => FileRef::Local(PathBuf::from(raw)),
    }
}
