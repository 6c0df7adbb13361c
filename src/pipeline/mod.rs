//! Pipeline module for fetching and extracting pages
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with error classification
//! - Selector-based HTML extraction
//! - Global or per-host rate limiting
//! - Bounded-concurrency scheduling of targets

mod extractor;
mod fetcher;
mod rate_limiter;
mod scheduler;

pub use extractor::{CompiledRule, Extractor};
pub use fetcher::{build_http_client, FetchOutcome, Fetcher, MAX_REDIRECTS};
pub use rate_limiter::{RateLimiter, Scope};
pub use scheduler::Pipeline;

use crate::config::ScrapeConfig;
use crate::record::Record;
use crate::url::parse_targets;
use crate::ScrapeError;

/// Runs a complete scrape operation
///
/// This is the main entry point. It will:
/// 1. Validate the configuration and every input URL
/// 2. Build the HTTP client, extractor, rate limiter and robots.txt cache
/// 3. Process every URL under the concurrency limit
/// 4. Return one record per URL
///
/// # Arguments
///
/// * `urls` - The URLs to scrape, in order
/// * `config` - The scrape configuration
///
/// # Returns
///
/// * `Ok(Vec<Record>)` - One record per input URL
/// * `Err(ScrapeError)` - Invalid configuration or input; nothing was fetched
pub async fn scrape<S: AsRef<str>>(
    urls: &[S],
    config: ScrapeConfig,
) -> Result<Vec<Record>, ScrapeError> {
    let targets = parse_targets(urls)?;
    let pipeline = Pipeline::new(config)?;
    Ok(pipeline.run(targets).await)
}
