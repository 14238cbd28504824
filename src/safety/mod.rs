//! Seed URL safety gate
//!
//! Before a job fetches anything, its seed URL must pass two checks:
//!
//! 1. **Address check** - the hostname must resolve, and none of the resolved
//!    addresses may be private, loopback or link-local. Resolution failure
//!    denies.
//! 2. **Policy check** - the origin's robots.txt must allow the bot identity.
//!    A missing or unreadable robots.txt allows.
//!
//! The address check runs first so that not even the robots.txt request is
//! sent toward an internal address.
//!
//! Pagination targets are not re-checked. The crawl controller only queues
//! URLs whose host equals the seed's host (see `CrawlState::enqueue`), which
//! is the precondition that makes a single seed check sufficient.

mod address;
mod resolver;

pub use address::is_forbidden_ip;
pub use resolver::{Resolver, StaticResolver, SystemResolver};

use crate::crawler::Fetcher;
use crate::robots::{fetch_robots, is_allowed};
use std::net::IpAddr;
use std::sync::Arc;
use thiserror::Error;
use url::{Host, Url};

/// Reason a seed URL was refused
#[derive(Debug, Error)]
pub enum SafetyViolation {
    #[error("URL has no host: {url}")]
    MissingHost { url: String },

    #[error("could not resolve host {host}: {reason}")]
    Unresolvable { host: String, reason: String },

    #[error("URL points to a private or local IP address ({host} resolves to {addr})")]
    PrivateAddress { host: String, addr: IpAddr },

    #[error("robots.txt disallows scraping {url}")]
    RobotsDisallowed { url: String },
}

/// Combined robots.txt and network-address check for seed URLs
#[derive(Clone)]
pub struct SafetyGate {
    resolver: Arc<dyn Resolver>,
    robots_agent: String,
}

impl SafetyGate {
    /// Creates a gate that resolves hosts through the operating system
    pub fn new(robots_agent: impl Into<String>) -> Self {
        Self {
            resolver: Arc::new(SystemResolver),
            robots_agent: robots_agent.into(),
        }
    }

    /// Replaces the resolver used by the address check
    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Runs both checks against a seed URL
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The seed may be fetched
    /// * `Err(SafetyViolation)` - The seed must not be fetched
    pub async fn authorize(&self, url: &Url, fetcher: &Fetcher) -> Result<(), SafetyViolation> {
        self.check_address(url).await?;
        self.check_policy(url, fetcher).await?;
        tracing::debug!("Seed {} passed the safety gate", url);
        Ok(())
    }

    /// Denies URLs whose host is unresolvable or resolves to an internal address
    pub async fn check_address(&self, url: &Url) -> Result<(), SafetyViolation> {
        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            _ => {
                return Err(SafetyViolation::MissingHost {
                    url: url.to_string(),
                })
            }
        };
        let port = url.port_or_known_default().unwrap_or(80);

        let addrs = self.resolver.resolve(&host, port).await.map_err(|e| {
            SafetyViolation::Unresolvable {
                host: host.clone(),
                reason: e.to_string(),
            }
        })?;

        if addrs.is_empty() {
            return Err(SafetyViolation::Unresolvable {
                host,
                reason: "no addresses returned".to_string(),
            });
        }

        if let Some(addr) = addrs.into_iter().find(|addr| is_forbidden_ip(*addr)) {
            tracing::warn!("Refusing {}: {} resolves to {}", url, host, addr);
            return Err(SafetyViolation::PrivateAddress { host, addr });
        }

        Ok(())
    }

    /// Denies URLs the origin's robots.txt disallows for the bot identity
    pub async fn check_policy(&self, url: &Url, fetcher: &Fetcher) -> Result<(), SafetyViolation> {
        let robots = fetch_robots(fetcher, url).await;

        if !is_allowed(&robots, url.as_str(), &self.robots_agent) {
            tracing::info!("URL {} disallowed by robots.txt", url);
            return Err(SafetyViolation::RobotsDisallowed {
                url: url.to_string(),
            });
        }

        Ok(())
    }
}

impl std::fmt::Debug for SafetyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafetyGate")
            .field("robots_agent", &self.robots_agent)
            .finish_non_exhaustive()
    }
}
