//! Configuration module for Ripple-Scrape
//!
//! This module handles the optional TOML configuration file, parsing of
//! `name=css[@attr]` selector arguments, and eager validation. Every
//! problem found here is a [`ConfigError`](crate::ConfigError) raised before
//! any network activity.
//!
//! # Example
//!
//! ```
//! use ripple_scrape::config::{build_config, parse_selector_arg, ScraperSection};
//!
//! let rule = parse_selector_arg("title=title").unwrap();
//! let config = build_config(None, ScraperSection::default(), vec![rule]).unwrap();
//! assert_eq!(config.selectors.len(), 1);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_user_agent, FileConfig, ScrapeConfig, ScraperSection, SelectorRule,
    DEFAULT_CONCURRENCY, DEFAULT_RETRY_BACKOFF_SECS, DEFAULT_TIMEOUT_SECS,
};

// Re-export parser functions
pub use parser::{
    build_config, compute_config_hash, load_config_with_hash, load_file_config,
    parse_file_config, parse_selector_arg,
};
pub use validation::{validate, validate_selectors};
