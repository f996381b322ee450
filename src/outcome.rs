//! Per-job submission outcomes and the run-level report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final outcome of one job from a submission run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobOutcome {
    /// Submission completed; the job is fully owned by the remote service.
    Submitted {
        id: u64,
        name: String,
        /// Description source the job came from.
        source: String,
    },
    /// Submission did not complete for this job.
    Failed {
        source: String,
        /// Present when the job got past the create call.
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        message: String,
        /// Whether the job left a remote footprint that must be cancelled.
        cleanup: bool,
    },
}

impl JobOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, JobOutcome::Submitted { .. })
    }

    /// Whether this outcome carries an unresolved cleanup obligation.
    pub fn needs_cleanup(&self) -> bool {
        matches!(self, JobOutcome::Failed { cleanup: true, .. })
    }

    /// Identifier to cancel, when a cleanup obligation exists.
    pub fn cleanup_id(&self) -> Option<u64> {
        match self {
            JobOutcome::Failed {
                id: Some(id),
                cleanup: true,
                ..
            } => Some(*id),
            _ => None,
        }
    }

    /// One human-readable result line.
    pub fn describe(&self) -> String {
        match self {
            JobOutcome::Submitted { id, name, .. } => {
                format!("Inserted job {name} with ID {id}")
            }
            JobOutcome::Failed {
                name: Some(name),
                message,
                ..
            } => format!("Job {name} not submitted: {message}"),
            JobOutcome::Failed {
                source, message, ..
            } => format!("Job description {source} not submitted: {message}"),
        }
    }
}

/// Ordered outcomes of one submission run.
///
/// Outcomes appear in source order, successes and failures interleaved, and
/// are returned even when the run was interrupted, so the caller always has
/// enough information to reconcile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReport {
    /// Locally generated run identifier.
    pub run_id: String,
    /// When the run started.
    pub created_at: DateTime<Utc>,
    /// Whether an interrupt cut the run short.
    pub interrupted: bool,
    pub outcomes: Vec<JobOutcome>,
}

impl SubmissionReport {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            created_at: Utc::now(),
            interrupted: false,
            outcomes: Vec::new(),
        }
    }

    pub fn submitted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_submitted()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.submitted_count()
    }

    /// Identifiers of all jobs still carrying a cleanup obligation.
    pub fn cleanup_ids(&self) -> Vec<u64> {
        self.outcomes
            .iter()
            .filter_map(JobOutcome::cleanup_id)
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitted() -> JobOutcome {
        JobOutcome::Submitted {
            id: 7,
            name: "job-7".to_string(),
            source: "jobs.gsd".to_string(),
        }
    }

    fn failed(id: Option<u64>, cleanup: bool) -> JobOutcome {
        JobOutcome::Failed {
            source: "jobs.gsd".to_string(),
            id,
            name: None,
            message: "staging failed".to_string(),
            cleanup,
        }
    }

    #[test]
    fn test_cleanup_id_requires_flag_and_identifier() {
        assert_eq!(failed(Some(9), true).cleanup_id(), Some(9));
        assert_eq!(failed(Some(9), false).cleanup_id(), None);
        assert_eq!(failed(None, true).cleanup_id(), None);
        assert_eq!(submitted().cleanup_id(), None);
    }

    #[test]
    fn test_report_counts() {
        let mut report = SubmissionReport::new("run".to_string());
        report.outcomes = vec![submitted(), failed(Some(9), true), failed(None, false)];

        assert_eq!(report.submitted_count(), 1);
        assert_eq!(report.failed_count(), 2);
        assert_eq!(report.cleanup_ids(), vec![9]);
    }

    #[test]
    fn test_describe_lines() {
        assert_eq!(submitted().describe(), "Inserted job job-7 with ID 7");
        assert_eq!(
            failed(Some(9), true).describe(),
            "Job description jobs.gsd not submitted: staging failed"
        );

        let named = JobOutcome::Failed {
            source: "jobs.gsd".to_string(),
            id: Some(9),
            name: Some("job-9".to_string()),
            message: "rejected".to_string(),
            cleanup: true,
        };
        assert_eq!(named.describe(), "Job job-9 not submitted: rejected");
    }

    #[test]
    fn test_outcome_serialization_tags_status() {
        let json = serde_json::to_string(&submitted()).unwrap();
        assert!(json.contains(r#""status":"submitted""#));

        let json = serde_json::to_string(&failed(Some(9), true)).unwrap();
        assert!(json.contains(r#""status":"failed""#));
        assert!(json.contains(r#""cleanup":true"#));
    }
}
