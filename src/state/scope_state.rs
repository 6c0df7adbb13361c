use tokio::time::{Duration, Instant};

/// Tracks dispatch history for one rate-limit scope
///
/// A scope is either the single global scope or one host. The last dispatch
/// instant only ever moves forward.
#[derive(Debug, Clone, Default)]
pub struct ScopeState {
    /// Number of dispatches recorded in this scope
    pub dispatch_count: u64,

    /// Instant of the most recent dispatch
    pub last_dispatch: Option<Instant>,
}

impl ScopeState {
    /// Creates a new ScopeState with no history
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculates how long a new dispatch must wait
    ///
    /// Returns None if a dispatch can happen at `now`.
    pub fn time_until_next_dispatch(&self, delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_dispatch?;
        let elapsed = now.saturating_duration_since(last);
        (elapsed < delay).then(|| delay - elapsed)
    }

    /// Records a dispatch at `now`
    pub fn record_dispatch(&mut self, now: Instant) {
        self.dispatch_count += 1;
        self.last_dispatch = Some(match self.last_dispatch {
            Some(last) if last > now => last,
            _ => now,
        });
    }
}
