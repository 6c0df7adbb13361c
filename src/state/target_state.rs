/// Target state definitions for tracking pipeline progress
///
/// Every target walks `Pending → RobotsCheck → Allowed|Blocked → RateLimited
/// → Fetching → Fetched|FetchFailed → Extracting → Done` and stops at exactly
/// one terminal state.
use serde::Serialize;
use std::fmt;

/// Represents the current state of a target in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
    // ===== Active States =====
    /// Queued, not yet admitted to a worker slot
    Pending,

    /// Waiting for the robots.txt verdict
    RobotsCheck,

    /// robots.txt allows the URL (or robots checking is disabled)
    Allowed,

    /// Waiting for the rate limiter
    RateLimited,

    /// HTTP request in flight
    Fetching,

    /// Page body received
    Fetched,

    /// Applying selector rules
    Extracting,

    // ===== Terminal States =====
    /// Extraction finished; the record carries data
    Done,

    /// robots.txt disallows the URL; no fetch was attempted
    Blocked,

    /// The fetch failed (network, timeout, HTTP error) or the target's task died
    FetchFailed,

    /// The run deadline expired before the target finished
    Cancelled,
}

impl TargetState {
    /// Returns true if this is a terminal state (no further processing)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Done | Self::Blocked | Self::FetchFailed | Self::Cancelled
        )
    }

    /// Returns true if this is an active state
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Checks whether moving from `self` to `next` is a legal step
    ///
    /// `FetchFailed` and `Cancelled` are reachable from every active state:
    /// a target's task may die or be cut off by the deadline at any
    /// suspension point. `Fetching → RateLimited` is the retry loop.
    pub fn can_transition_to(&self, next: TargetState) -> bool {
        use TargetState::*;

        if self.is_terminal() {
            return false;
        }

        if matches!(next, FetchFailed | Cancelled) {
            return true;
        }

        matches!(
            (self, next),
            (Pending, RobotsCheck)
                | (Pending, Allowed)
                | (RobotsCheck, Allowed)
                | (RobotsCheck, Blocked)
                | (Allowed, RateLimited)
                | (RateLimited, Fetching)
                | (Fetching, Fetched)
                | (Fetching, RateLimited)
                | (Fetched, Extracting)
                | (Extracting, Done)
        )
    }

    /// Returns the lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::RobotsCheck => "robots_check",
            Self::Allowed => "allowed",
            Self::RateLimited => "rate_limited",
            Self::Fetching => "fetching",
            Self::Fetched => "fetched",
            Self::Extracting => "extracting",
            Self::Done => "done",
            Self::Blocked => "blocked",
            Self::FetchFailed => "fetch_failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns all possible target states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::RobotsCheck,
            Self::Allowed,
            Self::RateLimited,
            Self::Fetching,
            Self::Fetched,
            Self::Extracting,
            Self::Done,
            Self::Blocked,
            Self::FetchFailed,
            Self::Cancelled,
        ]
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
