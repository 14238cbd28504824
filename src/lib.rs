//! Sumi-Harvest: a guarded page harvester
//!
//! This crate fetches web pages on behalf of submitted jobs and turns their
//! markup into structured records. A crawl refuses seeds that robots.txt
//! disallows or that resolve to internal addresses, follows same-host
//! pagination up to a page budget, and extracts records either from caller
//! supplied selectors or from an ordered chain of layout heuristics.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod jobs;
pub mod output;
pub mod robots;
pub mod safety;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Safety violation: {0}")]
    Safety(#[from] safety::SafetyViolation),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("HTML parse error for {url}: {message}")]
    HtmlParse { url: String, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Invalid job: {0}")]
    Job(#[from] jobs::JobError),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Job task aborted: {0}")]
    Worker(String),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Sumi-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlController, CrawlOutcome};
pub use extract::{ExtractionEngine, FieldValue, Record};
pub use jobs::{ExtractionMode, Job, JobRunner, JobSpec, JobStatus, SelectorSpec};
pub use safety::SafetyGate;
