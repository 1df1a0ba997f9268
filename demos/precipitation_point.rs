use anyhow::Result;
use hmsapi::{Client, DataRequest, Geometry, JobStatus, TimeSpan};
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    // Daily NLDAS precipitation for a point near Athens, GA.
    // Run with RUST_LOG=info to watch the job status transitions.
    let client = Client::from_env()?;

    let request = DataRequest::new(
        "nldas",
        TimeSpan::new("2010-01-01", "2010-12-31"),
        Geometry::point(33.925, -83.355),
        "daily",
    );

    let job = client.retrieve(
        "hydrology",
        "precipitation",
        &request,
        Some(Path::new("hms-data.json")),
    )?;

    match job.status {
        JobStatus::Success => println!("job {} saved to hms-data.json", job.job_id),
        status => println!("job {} ended in {:?}", job.job_id, status),
    }
    Ok(())
}
