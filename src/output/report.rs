//! Plain-text reports of jobs
//!
//! These are printed by the command line front end.

use crate::jobs::Job;

/// Formats the full details of one job
///
/// # Arguments
///
/// * `job` - The job to describe
/// * `record_count` - Number of stored records, if known
///
/// # Returns
///
/// A multi-line report
pub fn format_job(job: &Job, record_count: Option<usize>) -> String {
    let mut out = String::new();

    out.push_str(&format!("Job {}\n", job.id));
    out.push_str(&format!("  URL:         {}\n", job.spec.url));
    out.push_str(&format!("  Owner:       {}\n", job.spec.owner));
    if !job.spec.description.is_empty() {
        out.push_str(&format!("  Description: {}\n", job.spec.description));
    }
    out.push_str(&format!("  Mode:        {}\n", job.spec.mode));
    if let Some(selectors) = &job.spec.selectors {
        let fields: Vec<String> = selectors
            .container()
            .map(|c| format!("container={}", c))
            .into_iter()
            .chain(selectors.fields().map(|(name, sel)| format!("{}={}", name, sel)))
            .collect();
        out.push_str(&format!("  Selectors:   {}\n", fields.join(", ")));
    }
    out.push_str(&format!("  Max pages:   {}\n", job.spec.max_pages));
    out.push_str(&format!("  Status:      {}\n", job.status));
    if let Some(error) = &job.error_message {
        out.push_str(&format!("  Error:       {}\n", error));
    }
    out.push_str(&format!("  Created:     {}\n", job.created_at.to_rfc3339()));
    if let Some(completed) = job.completed_at {
        out.push_str(&format!("  Finished:    {}\n", completed.to_rfc3339()));
        let elapsed = completed - job.created_at;
        out.push_str(&format!(
            "  Duration:    {:.2} seconds\n",
            elapsed.num_milliseconds() as f64 / 1000.0
        ));
    }
    if let Some(count) = record_count {
        out.push_str(&format!("  Records:     {}\n", count));
    }

    out
}

/// Formats one line per job, newest first as given
pub fn format_job_list(jobs: &[Job]) -> String {
    if jobs.is_empty() {
        return "No jobs found.\n".to_string();
    }

    let mut out = String::new();
    for job in jobs {
        out.push_str(&format!(
            "{}  {:<9}  {}  {}\n",
            job.id,
            job.status.to_db_string(),
            job.created_at.format("%Y-%m-%d %H:%M:%S"),
            job.spec.url
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobSpec, JobStatus, SelectorSpec};
    use chrono::{Duration, TimeZone, Utc};

    fn job() -> Job {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Job {
            id: "0123456789abcdef0123456789abcdef".to_string(),
            spec: JobSpec::new("https://shop.example/list", "u1")
                .with_selectors(
                    SelectorSpec::new()
                        .with_field("container", "div.item")
                        .with_field("title", "h2"),
                )
                .with_max_pages(2),
            status: JobStatus::Failed,
            error_message: Some("No data extracted".to_string()),
            created_at,
            completed_at: Some(created_at + Duration::milliseconds(1500)),
        }
    }

    #[test]
    fn test_format_job() {
        let report = format_job(&job(), Some(0));

        assert!(report.starts_with("Job 0123456789abcdef0123456789abcdef\n"));
        assert!(report.contains("  Mode:        explicit\n"));
        assert!(report.contains("  Selectors:   container=div.item, title=h2\n"));
        assert!(report.contains("  Status:      failed\n"));
        assert!(report.contains("  Error:       No data extracted\n"));
        assert!(report.contains("  Duration:    1.50 seconds\n"));
        assert!(report.contains("  Records:     0\n"));
    }

    #[test]
    fn test_format_job_list() {
        assert_eq!(format_job_list(&[]), "No jobs found.\n");

        let listing = format_job_list(&[job()]);
        assert_eq!(
            listing,
            "0123456789abcdef0123456789abcdef  failed     2024-05-01 12:00:00  https://shop.example/list\n"
        );
    }
}
