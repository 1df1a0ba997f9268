use indicatif::ProgressBar;
use log::{info, warn};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::config::load_config;
use crate::error::{HmsError, Result};
use crate::job::{Job, JobStatus, StatusReply, SubmitReply};
use crate::request::DataRequest;
use crate::util::{status_url, submit_url};

/// Output filename used when the persist target is empty.
pub const DEFAULT_OUTPUT: &str = "hms-data.json";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Blocking client for the HMS REST API.
///
/// One instance can serve any number of queries; per-query state lives in
/// the [`Job`] value returned by [`Client::submit`] and threaded through
/// [`Client::poll`] and [`Client::persist`].
#[derive(Debug, Clone)]
pub struct Client {
    url: String,

    poll_interval: Duration,
    max_polls: Option<usize>,
    progress: bool,

    http: HttpClient,
}

impl Client {
    /// Creates a client using environment variables and/or `.hmsrc`.
    ///
    /// This is equivalent to `Client::new(None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`verify` arguments
    /// - environment variable `HMS_URL`
    /// - config file from `HMS_RC` or `.hmsrc`
    /// - the default public HMS deployment
    pub fn new(url: Option<String>, verify: Option<bool>) -> Result<Self> {
        let cfg = load_config(url, verify)?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("hmsapi-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("hmsapi-rs")),
        );

        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(60));

        if !cfg.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build()?;

        Ok(Self {
            url: cfg.url,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: None,
            progress: true,
            http,
        })
    }

    /// Overrides the delay between status checks (default 5 seconds).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Caps the number of status checks. `None` (the default) polls until
    /// the job reaches a terminal state, matching the reference clients.
    pub fn with_max_polls(mut self, max_polls: Option<usize>) -> Self {
        self.max_polls = max_polls;
        self
    }

    /// Enables or disables the waiting spinner.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Submits a request and returns the accepted job in `Pending` state.
    ///
    /// `component` is one of the HMS modules (`hydrology`, `meteorology`,
    /// `workflow`); `dataset` names the variable within it, e.g.
    /// `precipitation`.
    pub fn submit(&self, component: &str, dataset: &str, request: &DataRequest) -> Result<Job> {
        let url = submit_url(&self.url, component, dataset);
        let body = request.to_body()?;
        info!("submitting {}/{} query to {}", component, dataset, url);

        let resp = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()?;

        let status = resp.status().as_u16();
        let text = resp.text().unwrap_or_default();
        if status != 200 {
            return Err(HmsError::Submission {
                status,
                url,
                body: text,
            });
        }

        let reply: SubmitReply =
            serde_json::from_str(&text).map_err(|e| HmsError::Malformed {
                url: url.clone(),
                detail: e.to_string(),
            })?;
        let job = reply.into_job(&url)?;
        info!("job {} accepted", job.job_id);
        Ok(job)
    }

    /// Polls the job until it reaches a terminal state.
    ///
    /// Equivalent to [`Client::poll_with`] without a cancellation token.
    pub fn poll(&self, job: &mut Job) -> Result<()> {
        self.poll_with(job, None)
    }

    /// Polls the job until it reaches a terminal state, a non-200 status
    /// response arrives, the poll budget runs out, or `cancel` fires.
    ///
    /// A job the service reports as `FAILURE` ends the loop with `Ok(())`
    /// and the job in [`JobStatus::Failure`]; only the inability to talk to
    /// the service is an `Err`.
    pub fn poll_with(&self, job: &mut Job, cancel: Option<&CancelToken>) -> Result<()> {
        let spinner = if self.progress {
            let pb = ProgressBar::new_spinner();
            pb.set_message(format!("waiting on job {}", job.job_id));
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        } else {
            None
        };

        let result = self.run_poll(job, cancel, |url| {
            let resp = self.http.get(url).send()?;
            let status = resp.status().as_u16();
            let text = resp.text().unwrap_or_default();
            Ok((status, text))
        });

        if let Some(pb) = &spinner {
            pb.finish_and_clear();
        }
        result
    }

    /// The polling state machine, with the status fetch injected so tests
    /// can script response sequences.
    fn run_poll<F>(&self, job: &mut Job, cancel: Option<&CancelToken>, mut fetch: F) -> Result<()>
    where
        F: FnMut(&str) -> Result<(u16, String)>,
    {
        let url = status_url(&self.url, &job.job_id);
        let mut polls = 0usize;
        let mut last_status: Option<String> = None;

        while job.status == JobStatus::Pending {
            if let Some(max) = self.max_polls {
                if polls >= max {
                    return Err(HmsError::Timeout {
                        job_id: job.job_id.clone(),
                        polls,
                    });
                }
            }

            // The delay runs before every status check, including the first:
            // a freshly accepted job is never ready immediately.
            if self.wait(cancel) {
                return Err(HmsError::Cancelled {
                    job_id: job.job_id.clone(),
                });
            }

            let (status, text) = match fetch(&url) {
                Ok(r) => r,
                Err(e) => {
                    job.status = JobStatus::TransportError;
                    return Err(e);
                }
            };
            polls += 1;

            if status != 200 {
                job.status = JobStatus::TransportError;
                return Err(HmsError::Transport {
                    status,
                    job_id: job.job_id.clone(),
                });
            }

            let reply: StatusReply =
                serde_json::from_str(&text).map_err(|e| HmsError::Malformed {
                    url: url.clone(),
                    detail: e.to_string(),
                })?;

            if last_status.as_deref() != Some(reply.status.as_str()) {
                info!("job {} status: {}", job.job_id, reply.status);
                last_status = Some(reply.status.clone());
            }

            match reply.status.as_str() {
                "SUCCESS" => {
                    job.status = JobStatus::Success;
                    job.payload = reply.data;
                }
                "FAILURE" => {
                    warn!("job {} finished unsuccessfully", job.job_id);
                    job.status = JobStatus::Failure;
                }
                // PENDING, STARTED, and anything else the service may add
                // mean the job is still in flight.
                _ => {}
            }
        }

        Ok(())
    }

    /// Sleeps one poll interval. Returns `true` when cancellation cut the
    /// wait short.
    fn wait(&self, cancel: Option<&CancelToken>) -> bool {
        match cancel {
            Some(token) => token.wait_timeout(self.poll_interval),
            None => {
                thread::sleep(self.poll_interval);
                false
            }
        }
    }

    /// Writes the job's payload to `target`, overwriting any existing file.
    ///
    /// A job without a payload still creates (or truncates) the file and
    /// leaves it empty; callers probe the file's existence. An empty
    /// `target` falls back to [`DEFAULT_OUTPUT`].
    pub fn persist(&self, job: &Job, target: &Path) -> Result<PathBuf> {
        let target = if target.as_os_str().is_empty() {
            PathBuf::from(DEFAULT_OUTPUT)
        } else {
            target.to_path_buf()
        };

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut out = File::create(&target)?;
        if let Some(payload) = &job.payload {
            out.write_all(serde_json::to_string(payload)?.as_bytes())?;
        }
        out.flush()?;
        info!("wrote job {} result to {}", job.job_id, target.display());
        Ok(target)
    }

    /// Submits a request, polls it to completion, and — when the job
    /// succeeded and a target was given — persists the payload.
    ///
    /// The returned job carries the terminal status; a `Failure` outcome is
    /// reported through it, not as an `Err`.
    pub fn retrieve(
        &self,
        component: &str,
        dataset: &str,
        request: &DataRequest,
        target: Option<&Path>,
    ) -> Result<Job> {
        let mut job = self.submit(component, dataset, request)?;
        self.poll(&mut job)?;

        if job.status == JobStatus::Success {
            if let Some(target) = target {
                self.persist(&job, target)?;
            }
        }
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::Client;
    use crate::cancel::CancelToken;
    use crate::error::HmsError;
    use crate::job::{Job, JobStatus};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::time::Duration;

    fn test_client() -> Client {
        Client::new(Some("http://localhost:7777/hms/rest/api".into()), None)
            .unwrap()
            .with_poll_interval(Duration::from_millis(1))
            .with_progress(false)
    }

    fn scripted(responses: Vec<(u16, &str)>) -> VecDeque<(u16, String)> {
        responses
            .into_iter()
            .map(|(code, body)| (code, body.to_string()))
            .collect()
    }

    #[test]
    fn test_poll_runs_until_success() {
        let client = test_client();
        let mut job = Job::pending("j1".into());
        let mut queue = scripted(vec![
            (200, "{\"status\":\"PENDING\"}"),
            (200, "{\"status\":\"PENDING\"}"),
            (200, "{\"status\":\"SUCCESS\",\"data\":{\"x\":1}}"),
        ]);
        let mut fetches = 0usize;

        client
            .run_poll(&mut job, None, |_url| {
                fetches += 1;
                Ok(queue.pop_front().expect("script exhausted"))
            })
            .unwrap();

        assert_eq!(fetches, 3);
        assert_eq!(job.status, JobStatus::Success);
        assert_eq!(job.payload, Some(json!({"x": 1})));
    }

    #[test]
    fn test_poll_stops_on_transport_error() {
        let client = test_client();
        let mut job = Job::pending("j2".into());
        let mut queue = scripted(vec![
            (200, "{\"status\":\"PENDING\"}"),
            (503, ""),
            (200, "{\"status\":\"SUCCESS\"}"),
        ]);
        let mut fetches = 0usize;

        let err = client
            .run_poll(&mut job, None, |_url| {
                fetches += 1;
                Ok(queue.pop_front().expect("script exhausted"))
            })
            .unwrap_err();

        // no third fetch: a non-200 status response is fatal, not retried
        assert_eq!(fetches, 2);
        assert_eq!(job.status, JobStatus::TransportError);
        assert!(matches!(err, HmsError::Transport { status: 503, .. }));
    }

    #[test]
    fn test_poll_failure_is_an_outcome_not_an_error() {
        let client = test_client();
        let mut job = Job::pending("j3".into());
        let mut queue = scripted(vec![(200, "{\"status\":\"FAILURE\"}")]);
        let mut fetches = 0usize;

        client
            .run_poll(&mut job, None, |_url| {
                fetches += 1;
                Ok(queue.pop_front().expect("script exhausted"))
            })
            .unwrap();

        assert_eq!(fetches, 1);
        assert_eq!(job.status, JobStatus::Failure);
        assert!(job.payload.is_none());
    }

    #[test]
    fn test_poll_cancelled_before_first_fetch() {
        let client = test_client().with_poll_interval(Duration::from_secs(30));
        let mut job = Job::pending("j4".into());
        let token = CancelToken::new();
        token.cancel();
        let mut fetches = 0usize;

        let err = client
            .run_poll(&mut job, Some(&token), |_url| {
                fetches += 1;
                Ok((200, "{\"status\":\"SUCCESS\"}".to_string()))
            })
            .unwrap_err();

        assert_eq!(fetches, 0);
        assert_eq!(job.status, JobStatus::Pending);
        assert!(matches!(err, HmsError::Cancelled { .. }));
    }

    #[test]
    fn test_poll_budget_exhausted() {
        let client = test_client().with_max_polls(Some(2));
        let mut job = Job::pending("j5".into());
        let mut fetches = 0usize;

        let err = client
            .run_poll(&mut job, None, |_url| {
                fetches += 1;
                Ok((200, "{\"status\":\"STARTED\"}".to_string()))
            })
            .unwrap_err();

        assert_eq!(fetches, 2);
        assert!(matches!(err, HmsError::Timeout { polls: 2, .. }));
    }

    #[test]
    fn test_poll_malformed_status_body() {
        let client = test_client();
        let mut job = Job::pending("j6".into());
        let mut queue = scripted(vec![(200, "not json")]);
        let mut fetches = 0usize;

        let err = client
            .run_poll(&mut job, None, |_url| {
                fetches += 1;
                Ok(queue.pop_front().expect("script exhausted"))
            })
            .unwrap_err();

        assert_eq!(fetches, 1);
        assert!(matches!(err, HmsError::Malformed { .. }));
    }

    #[test]
    fn test_persist_writes_payload_verbatim() {
        let client = test_client();
        let job = Job {
            job_id: "j7".into(),
            status: JobStatus::Success,
            payload: Some(json!({"x": 1})),
        };
        let target = std::env::temp_dir().join(format!("hms-persist-{}.json", std::process::id()));

        let written = client.persist(&job, &target).unwrap();
        let contents = std::fs::read_to_string(&written).unwrap();
        std::fs::remove_file(&written).ok();

        assert_eq!(contents, "{\"x\":1}");
    }

    #[test]
    fn test_persist_without_payload_leaves_empty_file() {
        let client = test_client();
        let job = Job {
            job_id: "j8".into(),
            status: JobStatus::Failure,
            payload: None,
        };
        let target =
            std::env::temp_dir().join(format!("hms-persist-empty-{}.json", std::process::id()));

        let written = client.persist(&job, &target).unwrap();
        assert!(written.exists());
        assert_eq!(std::fs::metadata(&written).unwrap().len(), 0);
        std::fs::remove_file(&written).ok();
    }
}
