//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the pipeline, including:
//! - Building the shared HTTP client with the configured user agent
//! - Single GET attempts bounded by the per-request timeout
//! - Error classification into [`FailureKind`]

use crate::record::FailureKind;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Maximum number of redirects followed by the client
pub const MAX_REDIRECTS: usize = 10;

/// Result of a single fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The server answered with a status below 400
    Success {
        /// HTTP status code
        status_code: u16,
        /// Page body content
        content: String,
    },

    /// The attempt failed
    Failure {
        /// Classification of the failure
        kind: FailureKind,
        /// Error description
        message: String,
        /// HTTP status code, if a response was received
        status_code: Option<u16>,
    },
}

impl FetchOutcome {
    fn failure(kind: FailureKind, message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
            status_code,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The User-Agent header sent with every request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use ripple_scrape::pipeline::build_http_client;
///
/// let client = build_http_client("ripple-scrape/0.1.0").unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs single fetch attempts against a shared client
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    /// Creates a fetcher whose requests are bounded by `timeout`
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetches a URL once
    ///
    /// # Error Classification
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Status < 400 | `Success` |
    /// | Status >= 400 | `Failure { Http(status) }` |
    /// | Timeout elapsed | `Failure { Timeout }` |
    /// | Connection/DNS/TLS error | `Failure { Network }` |
    /// | Body read error | `Failure { Network }` |
    ///
    /// The timeout covers the whole attempt, body included, and affects only
    /// this request.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).timeout(self.timeout).send().await {
            Ok(response) => response,
            Err(e) => return classify_error(&e, None),
        };

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let reason = status.canonical_reason().unwrap_or("error");
            return FetchOutcome::failure(
                FailureKind::Http(status.as_u16()),
                format!("HTTP {} {}", status.as_u16(), reason),
                Some(status.as_u16()),
            );
        }

        match response.text().await {
            Ok(content) => FetchOutcome::Success {
                status_code: status.as_u16(),
                content,
            },
            Err(e) => classify_error(&e, Some(status.as_u16())),
        }
    }
}

fn classify_error(error: &reqwest::Error, status_code: Option<u16>) -> FetchOutcome {
    if error.is_timeout() {
        FetchOutcome::failure(FailureKind::Timeout, "Request timeout", status_code)
    } else if error.is_connect() {
        FetchOutcome::failure(
            FailureKind::Network,
            format!("Connection failed: {}", error),
            status_code,
        )
    } else {
        FetchOutcome::failure(FailureKind::Network, error.to_string(), status_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(timeout: Duration) -> Fetcher {
        Fetcher::new(build_http_client("TestBot/1.0").unwrap(), timeout)
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client("TestBot/1.0").is_ok());
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>hi</p>"))
            .mount(&server)
            .await;

        let outcome = fetcher(Duration::from_secs(2))
            .fetch(&format!("{}/page", server.uri()))
            .await;

        assert_eq!(
            outcome,
            FetchOutcome::Success {
                status_code: 200,
                content: "<p>hi</p>".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let outcome = fetcher(Duration::from_secs(2))
            .fetch(&format!("{}/missing", server.uri()))
            .await;

        match outcome {
            FetchOutcome::Failure {
                kind, status_code, ..
            } => {
                assert_eq!(kind, FailureKind::Http(404));
                assert_eq!(status_code, Some(404));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let outcome = fetcher(Duration::from_millis(100))
            .fetch(&format!("{}/slow", server.uri()))
            .await;

        assert!(matches!(
            outcome,
            FetchOutcome::Failure {
                kind: FailureKind::Timeout,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let outcome = fetcher(Duration::from_secs(1))
            .fetch("http://127.0.0.1:9/")
            .await;

        assert!(matches!(
            outcome,
            FetchOutcome::Failure {
                kind: FailureKind::Network,
                status_code: None,
                ..
            }
        ));
    }
}
