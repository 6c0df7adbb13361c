//! Per-run robots.txt cache
//!
//! Entries are populated lazily on the first query for a host and never
//! invalidated for the lifetime of the cache (one run).

use crate::robots::ParsedRobots;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

type Slot = Arc<OnceCell<Arc<ParsedRobots>>>;

/// Host → parsed robots.txt policy
///
/// Each host owns a `OnceCell`, so concurrent first queries for the same
/// host trigger exactly one fetch while other hosts proceed independently.
#[derive(Debug, Default)]
pub struct RobotsCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached policy for `host`, running `fetch` to populate it
    /// if this is the first query
    pub async fn get_or_fetch<F, Fut>(&self, host: &str, fetch: F) -> Arc<ParsedRobots>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ParsedRobots>,
    {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry(host.to_string()).or_default().clone()
        };

        slot.get_or_init(|| async { Arc::new(fetch().await) })
            .await
            .clone()
    }

    /// Returns the cached policy for `host` without fetching
    pub async fn get(&self, host: &str) -> Option<Arc<ParsedRobots>> {
        let slots = self.slots.lock().await;
        slots.get(host).and_then(|slot| slot.get().cloned())
    }

    /// Number of hosts with a populated entry
    pub async fn len(&self) -> usize {
        let slots = self.slots.lock().await;
        slots.values().filter(|slot| slot.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
