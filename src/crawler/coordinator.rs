//! Crawl controller - per-job crawl orchestration
//!
//! This module contains the crawl loop run for a single job:
//! - Gating the seed URL through the safety gate
//! - Walking the same-host frontier within the page budget
//! - Fetching, extracting and discovering pagination for every page
//! - Deciding which per-URL failures abort the crawl

use std::sync::Arc;
use std::time::Duration;

use scraper::Html;
use url::Url;

use crate::config::Config;
use crate::crawler::pagination::PaginationDiscoverer;
use crate::crawler::state::CrawlState;
use crate::crawler::{FetchedPage, Fetcher};
use crate::extract::{ExtractionEngine, Record};
use crate::jobs::{JobSpec, SelectorSpec};
use crate::safety::{Resolver, SafetyGate};
use crate::url::parse_seed_url;
use crate::HarvestError;

/// Result of a finished crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    /// Records from every successfully processed page, in crawl order
    pub records: Vec<Record>,

    /// Number of pages fetched and processed
    pub pages_fetched: u32,

    /// URLs taken from the frontier, in the order they were visited
    pub visited: Vec<Url>,
}

/// How a failure on one URL affects the rest of the crawl
#[derive(Debug)]
enum UrlFailure {
    /// Log, skip the URL and carry on
    Recoverable(HarvestError),
    /// Abort the crawl with this error
    Fatal(HarvestError),
}

impl UrlFailure {
    /// The seed is the only URL whose failure is fatal
    fn classify(error: HarvestError, is_seed: bool) -> Self {
        if is_seed {
            Self::Fatal(error)
        } else {
            Self::Recoverable(error)
        }
    }
}

/// What one successfully processed page contributed
struct PageResult {
    records: Vec<Record>,
    next_links: Vec<Url>,
}

/// Runs crawls for jobs
pub struct CrawlController {
    fetcher: Fetcher,
    gate: SafetyGate,
    engine: ExtractionEngine,
    discoverer: PaginationDiscoverer,
    request_delay: Duration,
}

impl CrawlController {
    /// Creates a controller from the configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlController)` - Ready to crawl
    /// * `Err(HarvestError)` - The HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self, HarvestError> {
        let fetcher = Fetcher::new(&config.crawler, &config.user_agent)?;

        Ok(Self {
            fetcher,
            gate: SafetyGate::new(config.user_agent.robots_agent.clone()),
            engine: ExtractionEngine::new(),
            discoverer: PaginationDiscoverer::new(config.crawler.max_pagination_links),
            request_delay: config.crawler.request_delay(),
        })
    }

    /// Replaces the resolver used by the seed address check
    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.gate = self.gate.with_resolver(resolver);
        self
    }

    /// Replaces the extraction engine
    pub fn with_engine(mut self, engine: ExtractionEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Crawls a job's seed and its same-host pagination
    ///
    /// # Arguments
    ///
    /// * `spec` - The job to crawl
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome)` - The crawl ran; its record list may be empty
    /// * `Err(HarvestError)` - The seed was refused or could not be processed
    pub async fn crawl(&self, spec: &JobSpec) -> Result<CrawlOutcome, HarvestError> {
        let seed = parse_seed_url(&spec.url)?;
        tracing::info!(
            "Starting crawl of {} ({} mode, budget {} pages)",
            seed,
            spec.mode,
            spec.max_pages
        );

        self.gate.authorize(&seed, &self.fetcher).await?;

        let selectors = spec.effective_selectors();
        let mut state = CrawlState::new(seed, spec.max_pages);

        while let Some(url) = state.next_url() {
            let is_seed = state.is_seed(&url);
            let discover = state.budget_remains_after_next();
            tracing::debug!("Processing URL: {}", url);

            match self.visit(&url, selectors, discover).await {
                Ok(page) => {
                    tracing::debug!(
                        "{} yielded {} records and {} pagination links",
                        url,
                        page.records.len(),
                        page.next_links.len()
                    );
                    state.record_page(page.records);
                    if !state.budget_exhausted() {
                        for link in page.next_links {
                            state.enqueue(link);
                        }
                    }
                }
                Err(e) => match UrlFailure::classify(e, is_seed) {
                    UrlFailure::Fatal(e) => {
                        tracing::error!("Seed {} failed: {}", url, e);
                        return Err(e);
                    }
                    UrlFailure::Recoverable(e) => {
                        tracing::warn!("Skipping {}: {}", url, e);
                        continue;
                    }
                },
            }

            if !state.budget_exhausted() && state.has_pending() && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        let outcome = state.into_outcome();
        tracing::info!(
            "Crawl finished: {} pages, {} records",
            outcome.pages_fetched,
            outcome.records.len()
        );
        Ok(outcome)
    }

    async fn visit(
        &self,
        url: &Url,
        selectors: Option<&SelectorSpec>,
        discover: bool,
    ) -> Result<PageResult, HarvestError> {
        let page = self.fetcher.fetch(url).await?;
        self.process_page(&page, selectors, discover)
    }

    /// Parses a fetched page, extracts records and finds pagination links
    ///
    /// The parsed document never outlives this call.
    fn process_page(
        &self,
        page: &FetchedPage,
        selectors: Option<&SelectorSpec>,
        discover: bool,
    ) -> Result<PageResult, HarvestError> {
        let document = Html::parse_document(&page.body);

        let records = self
            .engine
            .extract_document(&document, selectors)
            .map_err(|e| HarvestError::HtmlParse {
                url: page.url.to_string(),
                message: e.to_string(),
            })?;

        let next_links = if discover {
            self.discoverer.discover(&document, &page.url)
        } else {
            Vec::new()
        };

        Ok(PageResult {
            records,
            next_links,
        })
    }
}
