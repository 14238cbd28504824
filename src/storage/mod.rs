//! Storage module for persisting jobs and their results
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Job creation, lookup and listing
//! - Enforcing the job status state machine
//! - Result document persistence

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteJobStore;
pub use traits::{JobStore, StorageError, StorageResult, DEFAULT_LIST_LIMIT};

use crate::HarvestError;

use std::path::Path;

/// Initializes or opens the job database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteJobStore)` - Successfully initialized storage
/// * `Err(HarvestError)` - Failed to initialize storage
pub fn open_store(path: &Path) -> Result<SqliteJobStore, HarvestError> {
    SqliteJobStore::new(path)
}
