//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the JobStore trait.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::extract::Record;
use crate::jobs::{new_job_id, ExtractionMode, Job, JobSpec, JobStatus, SelectorSpec};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{JobStore, StorageError, StorageResult};
use crate::HarvestError;

const JOB_COLUMNS: &str = "id, owner, url, description, mode, selectors, max_pages, status, \
                           error_message, created_at, completed_at";

/// SQLite job store
pub struct SqliteJobStore {
    conn: Connection,
}

impl SqliteJobStore {
    /// Opens or creates the job database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteJobStore)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path).map_err(StorageError::from)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )
        .map_err(StorageError::from)?;

        initialize_schema(&conn).map_err(StorageError::from)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(StorageError::from)?;
        initialize_schema(&conn).map_err(StorageError::from)?;
        Ok(Self { conn })
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(job_id: &str, raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt {
            job_id: job_id.to_string(),
            message: format!("bad timestamp {:?}: {}", raw, e),
        })
}

/// Raw column values of a `jobs` row
struct JobRow {
    id: String,
    owner: String,
    url: String,
    description: String,
    mode: String,
    selectors: Option<String>,
    max_pages: u32,
    status: String,
    error_message: Option<String>,
    created_at: String,
    completed_at: Option<String>,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            url: row.get(2)?,
            description: row.get(3)?,
            mode: row.get(4)?,
            selectors: row.get(5)?,
            max_pages: row.get(6)?,
            status: row.get(7)?,
            error_message: row.get(8)?,
            created_at: row.get(9)?,
            completed_at: row.get(10)?,
        })
    }

    fn into_job(self) -> StorageResult<Job> {
        let corrupt = |message: String| StorageError::Corrupt {
            job_id: self.id.clone(),
            message,
        };

        let status = JobStatus::from_db_string(&self.status)
            .ok_or_else(|| corrupt(format!("unknown status {:?}", self.status)))?;
        let mode = self
            .mode
            .parse::<ExtractionMode>()
            .map_err(|e| corrupt(e.to_string()))?;
        let selectors = self
            .selectors
            .as_deref()
            .map(serde_json::from_str::<SelectorSpec>)
            .transpose()?;
        let created_at = parse_timestamp(&self.id, &self.created_at)?;
        let completed_at = self
            .completed_at
            .as_deref()
            .map(|raw| parse_timestamp(&self.id, raw))
            .transpose()?;

        Ok(Job {
            spec: JobSpec {
                url: self.url,
                mode,
                selectors,
                max_pages: self.max_pages,
                owner: self.owner,
                description: self.description,
            },
            id: self.id,
            status,
            error_message: self.error_message,
            created_at,
            completed_at,
        })
    }
}

impl JobStore for SqliteJobStore {
    fn create_job(&mut self, spec: &JobSpec) -> StorageResult<Job> {
        let selectors = spec
            .selectors
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let job = Job {
            id: new_job_id(),
            spec: spec.clone(),
            status: JobStatus::Queued,
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        };

        self.conn.execute(
            "INSERT INTO jobs (id, owner, url, description, mode, selectors, max_pages, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                job.id,
                spec.owner,
                spec.url,
                spec.description,
                spec.mode.as_str(),
                selectors,
                spec.max_pages,
                job.status.to_db_string(),
                timestamp(job.created_at),
            ],
        )?;

        Ok(job)
    }

    fn get_job(&self, job_id: &str) -> StorageResult<Option<Job>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM jobs WHERE id = ?1", JOB_COLUMNS),
                params![job_id],
                JobRow::from_row,
            )
            .optional()?;

        row.map(JobRow::into_job).transpose()
    }

    fn set_status(
        &mut self,
        job_id: &str,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        let current: Option<String> = self
            .conn
            .query_row(
                "SELECT status FROM jobs WHERE id = ?1",
                params![job_id],
                |row| row.get(0),
            )
            .optional()?;

        let current = current.ok_or_else(|| StorageError::JobNotFound(job_id.to_string()))?;
        let current = JobStatus::from_db_string(&current).ok_or_else(|| StorageError::Corrupt {
            job_id: job_id.to_string(),
            message: format!("unknown status {:?}", current),
        })?;

        if !current.can_transition_to(status) {
            return Err(StorageError::InvalidTransition {
                job_id: job_id.to_string(),
                from: current,
                to: status,
            });
        }

        let completed_at = status.is_terminal().then(|| timestamp(Utc::now()));

        self.conn.execute(
            "UPDATE jobs SET status = ?1, error_message = ?2, completed_at = ?3 WHERE id = ?4",
            params![status.to_db_string(), error_message, completed_at, job_id],
        )?;

        Ok(())
    }

    fn save_results(&mut self, job_id: &str, records: &[Record]) -> StorageResult<()> {
        let data = serde_json::to_string(records)?;
        let now = timestamp(Utc::now());

        let tx = self.conn.transaction()?;
        let exists: Option<i64> = tx
            .query_row("SELECT 1 FROM jobs WHERE id = ?1", params![job_id], |row| row.get(0))
            .optional()?;
        if exists.is_none() {
            return Err(StorageError::JobNotFound(job_id.to_string()));
        }

        tx.execute(
            "INSERT INTO results (job_id, data, record_count, created_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(job_id) DO UPDATE SET
                data = excluded.data,
                record_count = excluded.record_count,
                created_at = excluded.created_at",
            params![job_id, data, records.len() as i64, now],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn get_results(&self, job_id: &str) -> StorageResult<Vec<Record>> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM results WHERE job_id = ?1",
                params![job_id],
                |row| row.get(0),
            )
            .optional()?;

        match data {
            Some(data) => Ok(serde_json::from_str(&data)?),
            None => Ok(Vec::new()),
        }
    }

    fn list_jobs(&self, owner: &str, limit: usize) -> StorageResult<Vec<Job>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM jobs WHERE owner = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            JOB_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![owner, limit as i64], JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(JobRow::into_job).collect()
    }

    fn queued_job_ids(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM jobs WHERE status = ?1 ORDER BY created_at ASC, rowid ASC",
        )?;

        let ids = stmt
            .query_map(params![JobStatus::Queued.to_db_string()], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(ids)
    }
}
