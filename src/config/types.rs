use serde::Deserialize;
use std::time::Duration;

/// Default number of targets in flight at once
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: f64 = 20.0;

/// Default base delay between retry attempts in seconds
pub const DEFAULT_RETRY_BACKOFF_SECS: f64 = 1.0;

/// Returns the default user agent string (`ripple-scrape/<version>`)
pub fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// A named extraction instruction
///
/// When `attribute` is `None` the text content of each matched element is
/// extracted, otherwise the value of that attribute.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectorRule {
    /// Unique key of this rule in the extraction result
    pub name: String,

    /// CSS selector string
    #[serde(alias = "selector")]
    pub css: String,

    /// Attribute to read instead of the text content
    #[serde(default)]
    pub attribute: Option<String>,
}

impl SelectorRule {
    /// Creates a rule extracting text content
    pub fn text(name: impl Into<String>, css: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            css: css.into(),
            attribute: None,
        }
    }

    /// Creates a rule extracting an attribute value
    pub fn attribute(
        name: impl Into<String>,
        css: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            css: css.into(),
            attribute: Some(attribute.into()),
        }
    }

    /// Rules applied when none are configured: the page title and all `h1` headings
    pub fn defaults() -> Vec<Self> {
        vec![Self::text("title", "head > title"), Self::text("h1", "h1")]
    }
}

/// Structured configuration consumed by the scraping pipeline
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Maximum number of targets progressing through the pipeline at once
    pub concurrency: usize,

    /// Minimum time between two dispatches in the same rate-limit scope
    pub delay: Duration,

    /// Scope the delay per host instead of globally
    pub per_host: bool,

    /// Consult robots.txt before fetching
    pub respect_robots: bool,

    /// Per-request timeout
    pub timeout: Duration,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Ordered extraction rules
    pub selectors: Vec<SelectorRule>,

    /// Extra attempts for retryable failures (0 means exactly one attempt)
    pub retries: u32,

    /// Backoff before the first retry; doubles on each subsequent retry
    pub retry_backoff: Duration,

    /// Optional run-level deadline
    pub deadline: Option<Duration>,

    /// Re-sort records by input index before handing them off
    pub preserve_order: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            delay: Duration::ZERO,
            per_host: false,
            respect_robots: false,
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            user_agent: default_user_agent(),
            selectors: Vec::new(),
            retries: 0,
            retry_backoff: Duration::from_secs_f64(DEFAULT_RETRY_BACKOFF_SECS),
            deadline: None,
            preserve_order: true,
        }
    }
}

impl ScrapeConfig {
    /// Returns the configured rules, or the default rules if none are set
    pub fn effective_selectors(&self) -> Vec<SelectorRule> {
        if self.selectors.is_empty() {
            SelectorRule::defaults()
        } else {
            self.selectors.clone()
        }
    }
}

/// On-disk TOML configuration file
///
/// Every field is optional; missing values fall back to [`ScrapeConfig`]
/// defaults and command-line flags override whatever is set here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub scraper: ScraperSection,

    #[serde(default, rename = "selector")]
    pub selectors: Vec<SelectorRule>,
}

/// `[scraper]` table of the configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScraperSection {
    pub concurrency: Option<usize>,

    /// Seconds
    pub delay: Option<f64>,

    pub per_host: Option<bool>,

    pub respect_robots: Option<bool>,

    /// Seconds
    pub timeout: Option<f64>,

    pub user_agent: Option<String>,

    pub retries: Option<u32>,

    /// Seconds
    pub retry_backoff: Option<f64>,

    /// Seconds
    pub deadline: Option<f64>,

    pub preserve_order: Option<bool>,
}
