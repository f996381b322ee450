//! Per-job entries and results for the submission calls.

use serde::{Deserialize, Serialize};

/// Upper bound on jobs carried by one remote call. Larger sets are split
/// into consecutive calls of at most this many entries.
pub const MAX_CALL_JOBS: usize = 100;

/// One entry of a create call: the clusters the job may be dispatched to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateJob {
    /// Candidate cluster URLs, in preference order.
    pub clusterlist: Vec<String>,
}

/// Per-job result of a create call: an assigned identifier, or a message
/// explaining why no record was created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedJob {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl CreatedJob {
    /// Result carrying an assigned identifier.
    pub fn assigned(id: u64) -> Self {
        Self {
            id: Some(id),
            msg: None,
        }
    }

    /// Result carrying an error message.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self {
            id: None,
            msg: Some(msg.into()),
        }
    }
}

/// One entry of a finalize call: the created job's identifier plus its
/// serialized description text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeJob {
    pub id: u64,
    pub desc: String,
}

/// Per-job result of a finalize call: the server-assigned display name, or a
/// message explaining the rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedJob {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl FinalizedJob {
    /// Result carrying the assigned display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            msg: None,
        }
    }

    /// Result carrying an error message.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self {
            name: None,
            msg: Some(msg.into()),
        }
    }
}

/// Acknowledgement entry from a cancel call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelledJob {
    pub id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_job_serialization_omits_absent_fields() {
        let assigned = CreatedJob::assigned(17);
        let json = serde_json::to_string(&assigned).unwrap();
        assert_eq!(json, r#"{"id":17}"#);

        let rejected = CreatedJob::rejected("no matching cluster");
        let json = serde_json::to_string(&rejected).unwrap();
        assert_eq!(json, r#"{"msg":"no matching cluster"}"#);
    }

    #[test]
    fn test_finalized_job_deserialization() {
        let named: FinalizedJob = serde_json::from_str(r#"{"name":"job-a"}"#).unwrap();
        assert_eq!(named.name.as_deref(), Some("job-a"));
        assert!(named.msg.is_none());

        let rejected: FinalizedJob = serde_json::from_str(r#"{"msg":"bad description"}"#).unwrap();
        assert_eq!(rejected.msg.as_deref(), Some("bad description"));
    }

    #[test]
    fn test_create_job_roundtrip() {
        let entry = CreateJob {
            clusterlist: vec!["https://cluster-a.example.org".to_string()],
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: CreateJob = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
