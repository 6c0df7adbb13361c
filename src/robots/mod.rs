//! Robots.txt handling module
//!
//! This module provides fetching, parsing and per-run caching of robots.txt
//! files. Every failure degrades to "allow": a robots.txt that cannot be
//! fetched never stops the run.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::{agent_token, ParsedRobots};

use crate::url::{robots_url, Target};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Upper bound on the time spent fetching one robots.txt
pub const ROBOTS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Answers "may our agent fetch this URL?" using cached robots.txt policies
pub struct RobotsPolicy {
    client: Client,
    user_agent: String,
    timeout: Duration,
    cache: RobotsCache,
    fetch_slots: Semaphore,
}

impl RobotsPolicy {
    /// Creates a policy with an empty cache
    ///
    /// The robots.txt fetch timeout is the smaller of `request_timeout` and
    /// [`ROBOTS_FETCH_TIMEOUT`]. At most `max_fetches` robots.txt requests
    /// are in flight at once; cached lookups never wait.
    pub fn new(
        client: Client,
        user_agent: impl Into<String>,
        request_timeout: Duration,
        max_fetches: usize,
    ) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
            timeout: request_timeout.min(ROBOTS_FETCH_TIMEOUT),
            cache: RobotsCache::new(),
            fetch_slots: Semaphore::new(max_fetches.max(1)),
        }
    }

    /// Checks if the target may be fetched
    ///
    /// The first query for a host fetches its robots.txt; later queries
    /// reuse the cached policy. Never fails.
    pub async fn is_allowed(&self, target: &Target) -> bool {
        let robots = self.policy_for(target).await;
        robots.is_allowed(target.as_str(), &self.user_agent)
    }

    /// Returns the (possibly freshly fetched) policy for the target's host
    pub async fn policy_for(&self, target: &Target) -> Arc<ParsedRobots> {
        self.cache
            .get_or_fetch(&target.host, || async {
                let Some(url) = robots_url(&target.url) else {
                    return ParsedRobots::allow_all();
                };

                // The semaphore is never closed
                let Ok(_permit) = self.fetch_slots.acquire().await else {
                    return ParsedRobots::allow_all();
                };
                let robots = fetch_robots(&self.client, &url, self.timeout).await;
                if let Some(delay) = robots.crawl_delay(&self.user_agent) {
                    tracing::debug!(
                        "robots.txt for {} requests a crawl delay of {:?}",
                        target.host,
                        delay
                    );
                }
                robots
            })
            .await
    }

    /// The underlying cache
    pub fn cache(&self) -> &RobotsCache {
        &self.cache
    }
}

/// Fetches and parses robots.txt
///
/// Only a `200 OK` body is parsed. Any other status, a network error or a
/// timeout yields [`ParsedRobots::allow_all`]; errors are logged as warnings.
pub async fn fetch_robots(client: &Client, url: &Url, timeout: Duration) -> ParsedRobots {
    tracing::debug!("Fetching robots.txt: {}", url);

    let response = match client.get(url.as_str()).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(
                "Could not fetch {} ({}); allowing all URLs for this host",
                url,
                e
            );
            return ParsedRobots::allow_all();
        }
    };

    let status = response.status();
    if status != StatusCode::OK {
        tracing::debug!("robots.txt at {} returned {}; allowing all", url, status);
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => ParsedRobots::from_content(&body),
        Err(e) => {
            tracing::warn!(
                "Could not read {} ({}); allowing all URLs for this host",
                url,
                e
            );
            ParsedRobots::allow_all()
        }
    }
}
