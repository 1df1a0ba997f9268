use thiserror::Error;

/// Errors produced by the HMS client.
///
/// A job that the service reports as `FAILURE` is not an error: `poll`
/// returns `Ok(())` with the job in [`JobStatus::Failure`] and the caller
/// decides what to do. Everything here means the operation itself could not
/// complete.
///
/// [`JobStatus::Failure`]: crate::JobStatus::Failure
#[derive(Debug, Error)]
pub enum HmsError {
    /// The submission endpoint answered with a non-200 status.
    #[error("submission rejected: HTTP {status} for url ({url})\n{body}")]
    Submission {
        status: u16,
        url: String,
        body: String,
    },

    /// A status check answered with a non-200 status. Fatal for the poll
    /// loop; distinct from the service reporting a failed job.
    #[error("status check failed: HTTP {status} for job {job_id}")]
    Transport { status: u16, job_id: String },

    /// A response body could not be parsed or was missing an expected field.
    #[error("malformed response from {url}: {detail}")]
    Malformed { url: String, detail: String },

    /// None of the recognized geometry keys were supplied.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The poll loop was cancelled while waiting on the job.
    #[error("cancelled while waiting on job {job_id}")]
    Cancelled { job_id: String },

    /// The configured poll budget ran out before the job reached a terminal
    /// state.
    #[error("job {job_id} still pending after {polls} status checks")]
    Timeout { job_id: String, polls: usize },

    /// Connection-level HTTP failure (DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to write the result file.
    #[error("failed to write result file: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding of a request body failed.
    #[error("failed to encode request body: {0}")]
    Json(#[from] serde_json::Error),

    /// Could not read the `.hmsrc` configuration file.
    #[error("failed to read configuration file {path}: {detail}")]
    Config { path: String, detail: String },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HmsError>;
