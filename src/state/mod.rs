//! State module for tracking scrape progress
//!
//! # Components
//!
//! - `TargetState`: the per-target state machine (pending, fetching, done, ...)
//! - `ScopeState`: per-scope dispatch history used by the rate limiter

mod scope_state;
mod target_state;

// Re-export main types
pub use scope_state::ScopeState;
pub use target_state::TargetState;
