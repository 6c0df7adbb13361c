//! Minimum-interval rate limiting, globally or per host
//!
//! Each scope owns an async mutex around its [`ScopeState`]. The lock is held
//! across the wait, so dispatches within one scope are serialized and spaced
//! by at least the configured delay, while different scopes never block each
//! other.

use crate::state::ScopeState;
use crate::url::Target;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{Duration, Instant};

/// Key of a rate-limit scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// One scope shared by every target
    Global,
    /// One scope per host key
    Host(String),
}

/// Spaces dispatches within each scope by at least `delay`
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    per_host: bool,
    scopes: Mutex<HashMap<Scope, Arc<AsyncMutex<ScopeState>>>>,
}

impl RateLimiter {
    pub fn new(delay: Duration, per_host: bool) -> Self {
        Self {
            delay,
            per_host,
            scopes: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the scope a target is throttled in
    pub fn scope_for(&self, target: &Target) -> Scope {
        if self.per_host {
            Scope::Host(target.host.clone())
        } else {
            Scope::Global
        }
    }

    /// Waits until a dispatch is permitted in `scope`, then records it
    ///
    /// Returns immediately when the delay is zero. Never fails.
    pub async fn acquire(&self, scope: &Scope) {
        if self.delay.is_zero() {
            return;
        }

        let state = self.scope_state(scope);
        let mut state = state.lock().await;

        if let Some(wait) = state.time_until_next_dispatch(self.delay, Instant::now()) {
            tracing::trace!("Rate limit: waiting {:?} in scope {:?}", wait, scope);
            tokio::time::sleep(wait).await;
        }

        state.record_dispatch(Instant::now());
    }

    /// Number of dispatches recorded in `scope`
    pub async fn dispatch_count(&self, scope: &Scope) -> u64 {
        let state = self.scope_state(scope);
        let count = state.lock().await.dispatch_count;
        count
    }

    fn scope_state(&self, scope: &Scope) -> Arc<AsyncMutex<ScopeState>> {
        // The map lock is only held for the lookup, never across an await
        let mut scopes = self
            .scopes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        scopes.entry(scope.clone()).or_default().clone()
    }
}
