/// Submission endpoint for a component/dataset pair.
///
/// The v3 API requires the trailing slash; without it the server answers
/// with a redirect the POST body does not survive.
pub(crate) fn submit_url(base: &str, component: &str, dataset: &str) -> String {
    format!(
        "{}/v3/{}/{}/",
        base.trim_end_matches('/'),
        component,
        dataset
    )
}

/// Status endpoint for a submitted job.
pub(crate) fn status_url(base: &str, job_id: &str) -> String {
    format!("{}/v2/hms/data?job_id={}", base.trim_end_matches('/'), job_id)
}
