//! URL handling module for Ripple-Scrape
//!
//! This module turns raw input strings into validated [`Target`]s, derives
//! the host key used for rate limiting and robots.txt scoping, and loads
//! line-delimited URL lists.

mod domain;
mod list;

use crate::UrlError;

// Re-export main functions
pub use domain::{extract_host, robots_url};
pub use list::{load_url_list, parse_url_list};

/// One URL to be processed through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Position of this URL in the input sequence
    pub index: usize,

    /// The URL exactly as given in the input; records carry this string
    pub source: String,

    /// The parsed URL
    pub url: ::url::Url,

    /// Host key (`host[:port]`), see [`extract_host`]
    pub host: String,
}

impl Target {
    /// Parses and validates an input URL
    ///
    /// Only `http` and `https` URLs with a host are accepted.
    ///
    /// # Examples
    ///
    /// ```
    /// use ripple_scrape::url::Target;
    ///
    /// let target = Target::parse(0, "https://Example.test/a").unwrap();
    /// assert_eq!(target.host, "example.test");
    ///
    /// assert!(Target::parse(1, "ftp://example.test/").is_err());
    /// ```
    pub fn parse(index: usize, raw: &str) -> Result<Self, UrlError> {
        let url = ::url::Url::parse(raw.trim()).map_err(|e| UrlError::Parse {
            url: raw.to_string(),
            message: e.to_string(),
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                url.scheme()
            )));
        }

        let host = extract_host(&url).ok_or_else(|| UrlError::MissingHost(raw.to_string()))?;

        Ok(Self {
            index,
            source: raw.to_string(),
            url,
            host,
        })
    }

    /// Returns the normalized URL as a string slice
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

/// Parses an ordered list of raw URLs into targets
///
/// Fails on the first malformed URL; the run must not start with bad input.
pub fn parse_targets<S: AsRef<str>>(urls: &[S]) -> Result<Vec<Target>, UrlError> {
    urls.iter()
        .enumerate()
        .map(|(index, raw)| Target::parse(index, raw.as_ref()))
        .collect()
}
