//! A small Rust client for the EPA Hydrologic Micro Services (HMS) web API.
//!
//! HMS serves hydrologic and meteorologic time series through an
//! asynchronous job API: a query is POSTed, the service answers with a
//! `job_id`, and the result is fetched by polling a status endpoint until
//! the job finishes. This crate implements that flow end to end:
//! build a [`DataRequest`], submit it, poll the job, save the payload.
//!
//! ## Quick start
//! ```no_run
//! use anyhow::Result;
//! use hmsapi::{Client, DataRequest, Geometry, TimeSpan};
//! use std::path::Path;
//!
//! fn main() -> Result<()> {
//!     let client = Client::from_env()?;
//!     let request = DataRequest::new(
//!         "nldas",
//!         TimeSpan::new("2010-01-01", "2010-12-31"),
//!         Geometry::point(33.925, -83.355),
//!         "daily",
//!     );
//!     client.retrieve(
//!         "hydrology",
//!         "precipitation",
//!         &request,
//!         Some(Path::new("hms-data.json")),
//!     )?;
//!     Ok(())
//! }
//! ```
//!
//! The base URL can also be set explicitly via [`Client::new`], the
//! `HMS_URL` environment variable, or a `.hmsrc` file; it defaults to the
//! public EPA deployment. The API itself needs no credentials.

#![forbid(unsafe_code)]

mod cancel;
mod client;
mod config;
mod error;
mod job;
mod request;
mod util;

pub use cancel::CancelToken;
pub use client::{Client, DEFAULT_OUTPUT};
pub use config::{ClientConfig, DEFAULT_URL};
pub use error::{HmsError, Result};
pub use job::{Job, JobStatus};
pub use request::{DataRequest, Geometry, Point, TimeSpan};
