//! Per-crawl frontier and bookkeeping
//!
//! A `CrawlState` lives for one crawl only. It owns the FIFO frontier, the
//! set of visited URLs, the page counter and the records gathered so far.

use std::collections::{HashSet, VecDeque};

use url::Url;

use crate::crawler::CrawlOutcome;
use crate::extract::Record;
use crate::url::same_host;

/// Frontier and progress of a single crawl
#[derive(Debug)]
pub struct CrawlState {
    seed: Url,
    page_budget: u32,
    frontier: VecDeque<Url>,
    queued: HashSet<String>,
    visited: Vec<Url>,
    visited_set: HashSet<String>,
    pages_fetched: u32,
    records: Vec<Record>,
}

impl CrawlState {
    /// Creates a state whose frontier holds only the seed
    pub fn new(seed: Url, page_budget: u32) -> Self {
        let mut state = Self {
            seed: seed.clone(),
            page_budget,
            frontier: VecDeque::new(),
            queued: HashSet::new(),
            visited: Vec::new(),
            visited_set: HashSet::new(),
            pages_fetched: 0,
            records: Vec::new(),
        };
        state.queued.insert(seed.to_string());
        state.frontier.push_back(seed);
        state
    }

    pub fn is_seed(&self, url: &Url) -> bool {
        url == &self.seed
    }

    pub fn budget_exhausted(&self) -> bool {
        self.pages_fetched >= self.page_budget
    }

    /// Returns true if a page fetched now would leave budget for more pages
    pub fn budget_remains_after_next(&self) -> bool {
        self.pages_fetched + 1 < self.page_budget
    }

    pub fn has_pending(&self) -> bool {
        !self.frontier.is_empty()
    }

    /// Takes the next unvisited URL and marks it visited
    ///
    /// Returns None once the frontier is empty or the page budget is spent.
    pub fn next_url(&mut self) -> Option<Url> {
        while !self.budget_exhausted() {
            let url = self.frontier.pop_front()?;
            let key = url.to_string();
            self.queued.remove(&key);
            if self.visited_set.insert(key) {
                self.visited.push(url.clone());
                return Some(url);
            }
        }
        None
    }

    /// Adds a URL to the back of the frontier
    ///
    /// URLs on another host than the seed, already visited, or already
    /// queued are rejected.
    pub fn enqueue(&mut self, url: Url) -> bool {
        if !same_host(&url, &self.seed) {
            tracing::debug!("Refusing off-host URL {} for seed {}", url, self.seed);
            return false;
        }

        let key = url.to_string();
        if self.visited_set.contains(&key) || !self.queued.insert(key) {
            return false;
        }

        self.frontier.push_back(url);
        true
    }

    /// Counts a fetched page and keeps its records
    pub fn record_page(&mut self, records: Vec<Record>) {
        self.pages_fetched += 1;
        self.records.extend(records);
    }

    pub fn into_outcome(self) -> CrawlOutcome {
        CrawlOutcome {
            records: self.records,
            pages_fetched: self.pages_fetched,
            visited: self.visited,
        }
    }
}
