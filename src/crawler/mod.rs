//! Crawler module for guarded page crawling
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with browser-like headers and a timeout
//! - Pagination link discovery
//! - The per-crawl frontier
//! - Overall crawl coordination for a job

mod coordinator;
mod fetcher;
mod pagination;
mod state;

pub use coordinator::{CrawlController, CrawlOutcome};
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher};
pub use pagination::{PaginationDiscoverer, DEFAULT_MAX_LINKS};
pub use state::CrawlState;
