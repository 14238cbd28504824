//! Pagination link discovery
//!
//! Looks for "next page" links in a parsed page. Only links on the page's
//! own host are returned.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::extract::text::{compile, direct_string, selector};
use crate::url::{resolve_link, same_host};

/// Default number of pagination links returned per page
pub const DEFAULT_MAX_LINKS: usize = 5;

static CONTAINER_PATTERNS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile(&[
        "nav.pagination",
        "div.pagination",
        "ul.pagination",
        "div.pager",
        "div.page-numbers",
        "div.pages",
        "a.next",
        "a.page-link",
        r#"a[rel="next"]"#,
    ])
});

static HREF_LINK: Lazy<Option<Selector>> = Lazy::new(|| selector("a[href]"));
static ANY_LINK: Lazy<Option<Selector>> = Lazy::new(|| selector("a"));

static NEXT_KEYWORDS: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["next", "siguiente", "suivant", "»", "›", "more"]
        .iter()
        .map(|kw| Regex::new(&format!("(?i){}", regex::escape(kw))).expect("keyword pattern"))
        .collect()
});

/// Finds same-host pagination links on a page
#[derive(Debug, Clone)]
pub struct PaginationDiscoverer {
    max_links: usize,
}

impl Default for PaginationDiscoverer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINKS)
    }
}

impl PaginationDiscoverer {
    pub fn new(max_links: usize) -> Self {
        Self { max_links }
    }

    /// Discovers pagination links on a page
    ///
    /// Pagination containers are tried in order and the first one yielding a
    /// same-host link wins. Without one, the first anchor whose own text
    /// reads like "next" is used.
    ///
    /// # Arguments
    ///
    /// * `document` - The parsed page
    /// * `current_url` - The URL the page was fetched from
    ///
    /// # Returns
    ///
    /// At most `max_links` absolute URLs, in document order, without
    /// duplicates
    pub fn discover(&self, document: &Html, current_url: &Url) -> Vec<Url> {
        let mut links = self.from_containers(document, current_url);
        if links.is_empty() {
            links = self.from_keywords(document, current_url);
        }

        links.truncate(self.max_links);
        tracing::debug!("Found {} pagination links on {}", links.len(), current_url);
        links
    }

    fn from_containers(&self, document: &Html, current_url: &Url) -> Vec<Url> {
        for pattern in CONTAINER_PATTERNS.iter() {
            let mut links: Vec<Url> = Vec::new();
            for element in document.select(pattern) {
                for anchor in anchors_of(element) {
                    if let Some(link) = same_host_link(anchor, current_url) {
                        if !links.contains(&link) {
                            links.push(link);
                        }
                    }
                }
            }
            if !links.is_empty() {
                return links;
            }
        }
        Vec::new()
    }

    fn from_keywords(&self, document: &Html, current_url: &Url) -> Vec<Url> {
        let Some(any_link) = ANY_LINK.as_ref() else {
            return Vec::new();
        };

        for keyword in NEXT_KEYWORDS.iter() {
            let found = document.select(any_link).find(|anchor| {
                direct_string(*anchor).map_or(false, |text| keyword.is_match(&text))
            });
            if let Some(link) = found.and_then(|anchor| same_host_link(anchor, current_url)) {
                return vec![link];
            }
        }
        Vec::new()
    }
}

/// The element itself if it is an anchor, otherwise its nested `a[href]`
fn anchors_of(element: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    if element.value().name() == "a" {
        return vec![element];
    }
    match HREF_LINK.as_ref() {
        Some(sel) => element.select(sel).collect(),
        None => Vec::new(),
    }
}

fn same_host_link(anchor: ElementRef<'_>, current_url: &Url) -> Option<Url> {
    let href = anchor.value().attr("href")?;
    resolve_link(href, current_url).filter(|link| same_host(link, current_url))
}
