//! Storage traits and error types
//!
//! This module defines the trait interface for job stores and the
//! associated error types.

use thiserror::Error;

use crate::extract::Record;
use crate::jobs::{Job, JobSpec, JobStatus};

/// Number of jobs returned by a listing when no other limit applies
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Invalid status transition for job {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Corrupt row for job {job_id}: {message}")]
    Corrupt { job_id: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Job store lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for job store implementations
pub trait JobStore: Send {
    /// Stores a new job in the `queued` status
    ///
    /// Callers validate the submission first with [`JobSpec::validate`].
    fn create_job(&mut self, spec: &JobSpec) -> StorageResult<Job>;

    /// Gets a job by id
    fn get_job(&self, job_id: &str) -> StorageResult<Option<Job>>;

    /// Moves a job to a new status
    ///
    /// Only `queued -> running -> {completed | failed}` is accepted. Reaching
    /// a terminal status stamps `completed_at`.
    ///
    /// # Arguments
    ///
    /// * `job_id` - The job to update
    /// * `status` - The new status
    /// * `error_message` - Reason recorded alongside a failure
    fn set_status(
        &mut self,
        job_id: &str,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> StorageResult<()>;

    /// Stores the job's records as one result document
    fn save_results(&mut self, job_id: &str, records: &[Record]) -> StorageResult<()>;

    /// Gets the job's records, or an empty list if none were saved
    fn get_results(&self, job_id: &str) -> StorageResult<Vec<Record>>;

    /// Lists an owner's jobs, newest first
    fn list_jobs(&self, owner: &str, limit: usize) -> StorageResult<Vec<Job>>;

    /// Ids of jobs still waiting to run, oldest first
    fn queued_job_ids(&self) -> StorageResult<Vec<String>>;
}
