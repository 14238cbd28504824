//! URL handling module for Sumi-Harvest
//!
//! This module provides seed URL parsing, link resolution against the page a
//! link was found on, and the host comparison that keeps pagination inside
//! the seed's site.

mod domain;
mod resolve;

pub use domain::{extract_host, same_host};
pub use resolve::resolve_link;

use crate::UrlError;
use url::Url;

/// Parses a seed URL, accepting only absolute HTTP(S) URLs with a host
///
/// # Examples
///
/// ```
/// use sumi_harvest::url::parse_seed_url;
///
/// assert!(parse_seed_url("https://example.com/list").is_ok());
/// assert!(parse_seed_url("ftp://example.com/").is_err());
/// assert!(parse_seed_url("not a url").is_err());
/// ```
pub fn parse_seed_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}
