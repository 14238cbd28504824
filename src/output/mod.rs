//! Output module for presenting jobs and their results
//!
//! This module handles:
//! - Plain-text reports of single jobs and job listings
//! - The JSON result document of a job

mod report;

pub use report::{format_job, format_job_list};

use serde::Serialize;

use crate::extract::Record;
use crate::jobs::{Job, JobStatus};

/// JSON document describing a job's results
#[derive(Debug, Serialize)]
pub struct ResultDocument<'a> {
    pub job_id: &'a str,
    pub url: &'a str,
    pub status: JobStatus,
    pub record_count: usize,
    pub records: &'a [Record],
}

impl<'a> ResultDocument<'a> {
    pub fn new(job: &'a Job, records: &'a [Record]) -> Self {
        Self {
            job_id: &job.id,
            url: &job.spec.url,
            status: job.status,
            record_count: records.len(),
            records,
        }
    }
}

/// Renders a job's results as pretty-printed JSON
pub fn render_results(job: &Job, records: &[Record]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ResultDocument::new(job, records))
}
