use serde_json::Value;

use crate::error::{HmsError, Result};

/// Lifecycle of a server-side HMS task.
///
/// `Pending` is the only non-terminal state. `Failure` means the service
/// finished the job unsuccessfully; `TransportError` means a status check
/// could not reach the service at all. The two never collapse into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Success,
    Failure,
    TransportError,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        self != JobStatus::Pending
    }
}

/// One submitted HMS task, threaded through submit, poll, and persist.
#[derive(Debug, Clone)]
pub struct Job {
    /// Identifier assigned by the submission endpoint.
    pub job_id: String,
    pub status: JobStatus,
    /// The `data` field of the final status response, present on success.
    pub payload: Option<Value>,
}

impl Job {
    pub(crate) fn pending(job_id: String) -> Self {
        Job {
            job_id,
            status: JobStatus::Pending,
            payload: None,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct SubmitReply {
    #[serde(default)]
    pub(crate) job_id: Option<String>,
}

impl SubmitReply {
    pub(crate) fn into_job(self, url: &str) -> Result<Job> {
        let job_id = self.job_id.filter(|id| !id.is_empty()).ok_or_else(|| {
            HmsError::Malformed {
                url: url.to_string(),
                detail: "submission response has no job_id".into(),
            }
        })?;
        Ok(Job::pending(job_id))
    }
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct StatusReply {
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) data: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::{JobStatus, SubmitReply};
    use crate::error::HmsError;

    #[test]
    fn test_submit_reply_with_job_id() {
        let reply: SubmitReply =
            serde_json::from_str("{\"job_id\":\"abc123\",\"status\":\"PENDING\"}").unwrap();
        let job = reply.into_job("http://example/v3/hydrology/precipitation/").unwrap();
        assert_eq!(job.job_id, "abc123");
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.payload.is_none());
    }

    #[test]
    fn test_submit_reply_without_job_id_is_malformed() {
        let reply: SubmitReply = serde_json::from_str("{}").unwrap();
        let err = reply
            .into_job("http://example/v3/hydrology/precipitation/")
            .unwrap_err();
        assert!(matches!(err, HmsError::Malformed { .. }));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(JobStatus::Success.is_terminal());
        assert!(JobStatus::Failure.is_terminal());
        assert!(JobStatus::TransportError.is_terminal());
    }
}
