//! Robots.txt handling module
//!
//! This module fetches and evaluates the robots.txt policy of a seed's origin.
//! Policies that cannot be retrieved count as allow-all.

mod parser;

pub use parser::{product_token, ParsedRobots};

use crate::crawler::Fetcher;
use url::Url;

/// Builds the robots.txt location for the origin of `url`
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_harvest::robots::robots_url;
///
/// let url = Url::parse("https://example.com:8443/shop/list?page=2").unwrap();
/// assert_eq!(
///     robots_url(&url).unwrap().as_str(),
///     "https://example.com:8443/robots.txt"
/// );
/// ```
pub fn robots_url(url: &Url) -> Option<Url> {
    url.join("/robots.txt").ok()
}

/// Fetches robots.txt for the origin of `url`
///
/// Any failure (transport error, non-2xx status) yields an allow-all policy.
pub async fn fetch_robots(fetcher: &Fetcher, url: &Url) -> ParsedRobots {
    let Some(location) = robots_url(url) else {
        return ParsedRobots::allow_all();
    };

    match fetcher.fetch(&location).await {
        Ok(page) => {
            tracing::debug!("Fetched robots.txt from {} ({} bytes)", location, page.body.len());
            ParsedRobots::from_content(&page.body)
        }
        Err(e) => {
            tracing::debug!("No usable robots.txt at {}: {}; allowing", location, e);
            ParsedRobots::allow_all()
        }
    }
}

/// Checks if a URL is allowed by robots.txt
pub fn is_allowed(robots: &ParsedRobots, url: &str, user_agent: &str) -> bool {
    robots.is_allowed(url, user_agent)
}
