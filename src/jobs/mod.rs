//! Scrape jobs
//!
//! This module contains the job data model and its lifecycle:
//! - Job submissions and their validation
//! - Selector specifications for explicit extraction
//! - The job status state machine
//! - The FIFO queue feeding the worker
//! - The worker loop that runs crawls and records outcomes

mod queue;
mod runner;
mod status;

pub use queue::{job_queue, Dequeued, JobQueue, JobReceiver};
pub use runner::{JobRunner, NO_DATA_MESSAGE};
pub use status::JobStatus;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::url::parse_seed_url;

/// Reserved selector key bounding one repeating record
pub const CONTAINER_KEY: &str = "container";

/// Default page budget for a job
pub const DEFAULT_MAX_PAGES: u32 = 1;

/// Errors raised while validating a job submission
#[derive(Debug, Error)]
pub enum JobError {
    #[error("page budget must be at least 1")]
    InvalidPageBudget,

    #[error("invalid target URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unknown extraction mode: {0}")]
    UnknownMode(String),

    #[error("invalid selectors: {0}")]
    InvalidSelectors(String),

    #[error("owner must not be empty")]
    MissingOwner,
}

/// How records are pulled out of fetched pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Layout heuristics
    #[default]
    Auto,
    /// Caller-supplied selectors
    #[serde(alias = "css")]
    Explicit,
}

impl ExtractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Explicit => "explicit",
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionMode {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "explicit" | "css" => Ok(Self::Explicit),
            other => Err(JobError::UnknownMode(other.to_string())),
        }
    }
}

/// Ordered mapping of field name to CSS selector
///
/// Serialized as a flat JSON object of strings. Field order is the order in
/// which the fields were submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorSpec {
    entries: IndexMap<String, String>,
}

impl SelectorSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the JSON wire format
    pub fn from_json(json: &str) -> Result<Self, JobError> {
        serde_json::from_str(json).map_err(|e| JobError::InvalidSelectors(e.to_string()))
    }

    pub fn with_field(mut self, name: impl Into<String>, selector: impl Into<String>) -> Self {
        self.insert(name, selector);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, selector: impl Into<String>) {
        self.entries.insert(name.into(), selector.into());
    }

    /// The container selector, if one was given
    pub fn container(&self) -> Option<&str> {
        self.entries.get(CONTAINER_KEY).map(String::as_str)
    }

    /// Field selectors in submission order, excluding the container
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter(|(name, _)| name.as_str() != CONTAINER_KEY)
            .map(|(name, selector)| (name.as_str(), selector.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A job submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub url: String,
    #[serde(default)]
    pub mode: ExtractionMode,
    #[serde(default)]
    pub selectors: Option<SelectorSpec>,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    pub owner: String,
    #[serde(default)]
    pub description: String,
}

fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}

impl JobSpec {
    /// Creates an auto-mode, single-page job
    pub fn new(url: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mode: ExtractionMode::Auto,
            selectors: None,
            max_pages: DEFAULT_MAX_PAGES,
            owner: owner.into(),
            description: String::new(),
        }
    }

    /// Switches the job to explicit mode with the given selectors
    pub fn with_selectors(mut self, selectors: SelectorSpec) -> Self {
        self.mode = ExtractionMode::Explicit;
        self.selectors = Some(selectors);
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Selectors to extract with, or None when auto extraction applies
    ///
    /// Explicit mode without selectors behaves as auto mode.
    pub fn effective_selectors(&self) -> Option<&SelectorSpec> {
        match self.mode {
            ExtractionMode::Explicit => self.selectors.as_ref().filter(|s| !s.is_empty()),
            ExtractionMode::Auto => None,
        }
    }

    /// Checks the submission before it is stored
    pub fn validate(&self) -> Result<(), JobError> {
        if self.max_pages < 1 {
            return Err(JobError::InvalidPageBudget);
        }

        if self.owner.trim().is_empty() {
            return Err(JobError::MissingOwner);
        }

        parse_seed_url(&self.url).map_err(|e| JobError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        Ok(())
    }
}

/// A persisted job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub spec: JobSpec,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Generates a new job id: 32 lowercase hex characters
pub fn new_job_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("auto".parse::<ExtractionMode>().unwrap(), ExtractionMode::Auto);
        assert_eq!("Explicit".parse::<ExtractionMode>().unwrap(), ExtractionMode::Explicit);
        assert_eq!("css".parse::<ExtractionMode>().unwrap(), ExtractionMode::Explicit);
        assert!("xpath".parse::<ExtractionMode>().is_err());

        let mode: ExtractionMode = serde_json::from_str("\"css\"").unwrap();
        assert_eq!(mode, ExtractionMode::Explicit);
    }

    #[test]
    fn test_selector_spec_keeps_order_and_splits_container() {
        let spec = SelectorSpec::from_json(
            r#"{"title": "h2", "container": "div.item", "price": ".price"}"#,
        )
        .unwrap();

        assert_eq!(spec.container(), Some("div.item"));
        assert_eq!(
            spec.fields().collect::<Vec<_>>(),
            vec![("title", "h2"), ("price", ".price")]
        );
        assert_eq!(
            serde_json::to_string(&spec).unwrap(),
            r#"{"title":"h2","container":"div.item","price":".price"}"#
        );
    }

    #[test]
    fn test_selector_spec_rejects_non_strings() {
        assert!(SelectorSpec::from_json(r#"{"title": 3}"#).is_err());
        assert!(SelectorSpec::from_json(r#"["h1"]"#).is_err());
    }

    #[test]
    fn test_explicit_without_selectors_is_auto() {
        let mut spec = JobSpec::new("https://example.com", "u1");
        spec.mode = ExtractionMode::Explicit;
        assert!(spec.effective_selectors().is_none());

        let spec = spec.with_selectors(SelectorSpec::new().with_field("title", "h1"));
        assert!(spec.effective_selectors().is_some());
    }

    #[test]
    fn test_validation() {
        assert!(JobSpec::new("https://example.com", "u1").validate().is_ok());

        let zero = JobSpec::new("https://example.com", "u1").with_max_pages(0);
        assert!(matches!(zero.validate(), Err(JobError::InvalidPageBudget)));

        let no_scheme = JobSpec::new("example.com/path", "u1");
        assert!(matches!(no_scheme.validate(), Err(JobError::InvalidUrl { .. })));

        let ftp = JobSpec::new("ftp://example.com/", "u1");
        assert!(matches!(ftp.validate(), Err(JobError::InvalidUrl { .. })));

        let anonymous = JobSpec::new("https://example.com", " ");
        assert!(matches!(anonymous.validate(), Err(JobError::MissingOwner)));
    }

    #[test]
    fn test_job_spec_defaults_from_json() {
        let spec: JobSpec =
            serde_json::from_str(r#"{"url": "https://example.com", "owner": "u1"}"#).unwrap();

        assert_eq!(spec.mode, ExtractionMode::Auto);
        assert_eq!(spec.max_pages, 1);
        assert!(spec.selectors.is_none());
    }

    #[test]
    fn test_job_ids() {
        let a = new_job_id();
        let b = new_job_id();

        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }
}
