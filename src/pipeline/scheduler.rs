//! Pipeline scheduler - per-target orchestration and admission control
//!
//! This module drives every target through its state machine:
//! - One spawned task per target so a panic only affects that target
//! - robots.txt check before a concurrency slot is taken, so blocked URLs
//!   never occupy one (robots.txt fetches are capped at `concurrency` too)
//! - At most `concurrency` targets holding a slot (FIFO semaphore)
//! - Rate-limit wait, then fetch (with optional retry)
//! - Extraction on the blocking thread pool
//! - Optional run deadline that cancels whatever is still in flight
//!
//! Rate-limit history, the robots.txt cache and the concurrency slots belong
//! to a single run; nothing but the HTTP client and compiled rules carries
//! over between runs of one [`Pipeline`].

use crate::config::{validate, ScrapeConfig};
use crate::pipeline::extractor::Extractor;
use crate::pipeline::fetcher::{build_http_client, FetchOutcome, Fetcher};
use crate::pipeline::rate_limiter::RateLimiter;
use crate::record::{FailureKind, Record};
use crate::robots::RobotsPolicy;
use crate::state::TargetState;
use crate::url::Target;
use crate::ScrapeError;
use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// Tracks the state and attempt count of one target
#[derive(Debug)]
struct TargetProgress {
    state: TargetState,
    attempts: u32,
}

impl TargetProgress {
    fn new() -> Self {
        Self {
            state: TargetState::Pending,
            attempts: 0,
        }
    }

    /// Moves to `next`, rejecting illegal steps
    fn advance(&mut self, target: &Target, next: TargetState) -> Result<(), ScrapeError> {
        if !self.state.can_transition_to(next) {
            return Err(ScrapeError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::trace!("{}: {} -> {}", target.url, self.state, next);
        self.state = next;
        Ok(())
    }
}

/// Components shared by every run of a pipeline
struct PipelineInner {
    config: ScrapeConfig,
    client: Client,
    fetcher: Fetcher,
    extractor: Arc<Extractor>,
}

/// State owned by one run and shared by its target tasks
struct RunState {
    slots: Semaphore,
    rate_limiter: RateLimiter,
    robots: Option<RobotsPolicy>,
    deadline: Option<Instant>,
}

impl RunState {
    fn new(config: &ScrapeConfig, client: &Client) -> Self {
        // A deadline too far away to represent is no deadline at all
        let deadline = config
            .deadline
            .and_then(|d| Instant::now().checked_add(d));

        Self {
            slots: Semaphore::new(config.concurrency.max(1)),
            rate_limiter: RateLimiter::new(config.delay, config.per_host),
            robots: config.respect_robots.then(|| {
                RobotsPolicy::new(
                    client.clone(),
                    config.user_agent.clone(),
                    config.timeout,
                    config.concurrency.max(1),
                )
            }),
            deadline,
        }
    }
}

/// A configured scraping pipeline
///
/// Cloning is cheap. Each call to [`Pipeline::run`] starts with fresh
/// rate-limit history and an empty robots.txt cache.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

impl Pipeline {
    /// Creates a new pipeline
    ///
    /// # Arguments
    ///
    /// * `config` - The scrape configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Pipeline)` - Configuration is valid and the HTTP client was built
    /// * `Err(ScrapeError)` - Invalid configuration or client construction failure
    pub fn new(config: ScrapeConfig) -> Result<Self, ScrapeError> {
        validate(&config)?;

        let client = build_http_client(&config.user_agent)?;
        let extractor = Extractor::new(&config.effective_selectors())?;
        let fetcher = Fetcher::new(client.clone(), config.timeout);

        Ok(Self {
            inner: Arc::new(PipelineInner {
                config,
                client,
                fetcher,
                extractor: Arc::new(extractor),
            }),
        })
    }

    /// The configuration this pipeline runs with
    pub fn config(&self) -> &ScrapeConfig {
        &self.inner.config
    }

    /// Processes every target and returns exactly one record per target
    ///
    /// Records are sorted by input index when `preserve_order` is set,
    /// otherwise they are returned in completion order. Per-target failures
    /// are captured in the records; this never fails.
    pub async fn run(&self, targets: Vec<Target>) -> Vec<Record> {
        let config = &self.inner.config;
        let total = targets.len();
        let start_time = std::time::Instant::now();

        tracing::info!(
            "Scraping {} URLs (concurrency {}, delay {:?}{})",
            total,
            config.concurrency,
            config.delay,
            if config.per_host { " per host" } else { "" }
        );

        let run = Arc::new(RunState::new(config, &self.inner.client));

        let mut tasks: FuturesUnordered<_> = targets
            .into_iter()
            .map(|target| spawn_target(self.inner.clone(), run.clone(), target))
            .collect();

        let mut records = Vec::with_capacity(total);
        while let Some(record) = tasks.next().await {
            tracing::debug!(
                "Finished {} [{}] ({}/{})",
                record.url,
                record.state,
                records.len() + 1,
                total
            );
            records.push(record);
        }

        if config.preserve_order {
            records.sort_by_key(|record| record.index);
        }

        let ok = records.iter().filter(|record| record.is_ok()).count();
        tracing::info!(
            "Scrape completed: {}/{} URLs succeeded in {:?}",
            ok,
            total,
            start_time.elapsed()
        );

        records
    }
}

/// Runs one target in its own task; a panic becomes an `Internal` record
async fn spawn_target(inner: Arc<PipelineInner>, run: Arc<RunState>, target: Target) -> Record {
    let fallback = target.clone();
    let handle = tokio::spawn(async move { inner.process(&target, &run).await });

    match handle.await {
        Ok(record) => record,
        Err(e) => {
            tracing::error!("Task for {} failed: {}", fallback.url, e);
            Record::failed(
                &fallback,
                FailureKind::Internal,
                format!("Task failed: {}", e),
                None,
                0,
            )
        }
    }
}

impl PipelineInner {
    /// Produces the record for one target, honoring the run deadline
    async fn process(&self, target: &Target, run: &RunState) -> Record {
        let mut progress = TargetProgress::new();

        let result = match run.deadline {
            Some(deadline) if Instant::now() >= deadline => return cancelled(target, 0),
            Some(deadline) => {
                let outcome =
                    tokio::time::timeout_at(deadline, self.advance(target, run, &mut progress))
                        .await;
                match outcome {
                    Ok(result) => result,
                    Err(_) => return cancelled(target, progress.attempts),
                }
            }
            None => self.advance(target, run, &mut progress).await,
        };

        result.unwrap_or_else(|e| {
            tracing::error!("Error processing {}: {}", target.url, e);
            Record::failed(
                target,
                FailureKind::Internal,
                e.to_string(),
                None,
                progress.attempts,
            )
        })
    }

    /// Walks the target from `Pending` to a terminal state
    async fn advance(
        &self,
        target: &Target,
        run: &RunState,
        progress: &mut TargetProgress,
    ) -> Result<Record, ScrapeError> {
        let url = target.as_str();

        // The robots.txt verdict comes before taking a slot or touching the
        // rate limiter
        if let Some(robots) = &run.robots {
            progress.advance(target, TargetState::RobotsCheck)?;
            if !robots.is_allowed(target).await {
                tracing::info!("URL {} disallowed by robots.txt", url);
                progress.advance(target, TargetState::Blocked)?;
                return Ok(Record::blocked(target));
            }
        }
        progress.advance(target, TargetState::Allowed)?;

        let _slot = run.slots.acquire().await?;
        let scope = run.rate_limiter.scope_for(target);
        let mut backoff = self.config.retry_backoff;

        let (status_code, content) = loop {
            progress.advance(target, TargetState::RateLimited)?;
            run.rate_limiter.acquire(&scope).await;

            progress.advance(target, TargetState::Fetching)?;
            progress.attempts += 1;
            tracing::debug!("Fetching {} (attempt {})", url, progress.attempts);

            match self.fetcher.fetch(url).await {
                FetchOutcome::Success {
                    status_code,
                    content,
                } => {
                    progress.advance(target, TargetState::Fetched)?;
                    break (status_code, content);
                }
                FetchOutcome::Failure {
                    kind,
                    message,
                    status_code,
                } => {
                    if kind.is_retryable() && progress.attempts <= self.config.retries {
                        tracing::warn!(
                            "Fetch of {} failed ({}); retrying in {:?}",
                            url,
                            message,
                            backoff
                        );
                        tokio::time::sleep(backoff).await;
                        backoff = backoff.saturating_mul(2);
                        continue;
                    }

                    tracing::warn!("Fetch of {} failed: {}", url, message);
                    progress.advance(target, TargetState::FetchFailed)?;
                    return Ok(Record::failed(
                        target,
                        kind,
                        message,
                        status_code,
                        progress.attempts,
                    ));
                }
            }
        };

        progress.advance(target, TargetState::Extracting)?;
        let extractor = self.extractor.clone();
        let data = match tokio::task::spawn_blocking(move || extractor.extract(&content)).await {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("Extraction for {} failed: {}", url, e);
                progress.advance(target, TargetState::FetchFailed)?;
                return Ok(Record::failed(
                    target,
                    FailureKind::Internal,
                    format!("Extraction failed: {}", e),
                    Some(status_code),
                    progress.attempts,
                ));
            }
        };

        progress.advance(target, TargetState::Done)?;
        Ok(Record::success(target, status_code, data, progress.attempts))
    }
}

fn cancelled(target: &Target, attempts: u32) -> Record {
    tracing::warn!("Deadline reached before {} finished", target.url);
    Record::failed(
        target,
        FailureKind::Cancelled,
        "Run deadline reached",
        None,
        attempts,
    )
}
