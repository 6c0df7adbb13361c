//! Ripple-Scrape: a polite concurrent web scraper
//!
//! This crate fetches a list of URLs under a bounded concurrency limit,
//! applies named CSS-selector extraction rules to each page, optionally
//! respects robots.txt, throttles requests globally or per host, and emits
//! exactly one ordered record per input URL.

pub mod config;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Ripple-Scrape operations
///
/// Only configuration problems, invalid input URLs and HTTP client
/// construction are fatal. Per-URL failures never surface here; they are
/// captured in the [`record::Record`] for that URL.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::TargetState,
        to: state::TargetState,
    },

    #[error("Concurrency slot unavailable: {0}")]
    Slot(#[from] tokio::sync::AcquireError),
}

/// Configuration-specific errors
///
/// All of these are detected before any network activity starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid selector rule '{name}': {message}")]
    InvalidSelector { name: String, message: String },

    #[error("Duplicate selector name: {0}")]
    DuplicateSelector(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL '{url}': {message}")]
    Parse { url: String, message: String },

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{ScrapeConfig, SelectorRule};
pub use pipeline::{scrape, Pipeline};
pub use record::{FailureKind, Outcome, Record};
pub use state::TargetState;
pub use self::url::Target;
