use serde::Deserialize;
use std::time::Duration;

/// Robots.txt identity the safety gate evaluates policies for
pub const DEFAULT_ROBOTS_AGENT: &str = "ProScrape Bot";

/// Desktop browser identity sent with every page request
pub const DEFAULT_BROWSER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure for Sumi-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub worker: WorkerConfig,
    pub output: OutputConfig,
}

/// Crawl loop behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Timeout applied to every HTTP request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Pause between two page fetches of the same crawl (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Maximum number of pagination links taken from one page
    #[serde(rename = "max-pagination-links")]
    pub max_pagination_links: usize,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            request_delay_ms: 500,
            max_pagination_links: 5,
        }
    }
}

/// Identities presented to remote sites
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Agent name matched against robots.txt groups
    #[serde(rename = "robots-agent")]
    pub robots_agent: String,

    /// User-Agent header sent with page requests
    #[serde(rename = "browser-agent")]
    pub browser_agent: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            robots_agent: DEFAULT_ROBOTS_AGENT.to_string(),
            browser_agent: DEFAULT_BROWSER_AGENT.to_string(),
        }
    }
}

/// Job runner pacing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// How long a single dequeue waits for a job id (milliseconds)
    #[serde(rename = "dequeue-timeout-ms")]
    pub dequeue_timeout_ms: u64,

    /// Idle pause after an empty dequeue (milliseconds)
    #[serde(rename = "idle-delay-ms")]
    pub idle_delay_ms: u64,
}

impl WorkerConfig {
    pub fn dequeue_timeout(&self) -> Duration {
        Duration::from_millis(self.dequeue_timeout_ms)
    }

    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            dequeue_timeout_ms: 1000,
            idle_delay_ms: 1000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite job database
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./harvest.db".to_string(),
        }
    }
}
