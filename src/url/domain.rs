use url::Url;

/// Extracts the host key of a URL
///
/// The host is lowercased, and an explicit non-default port is kept
/// (`host:port`), so two servers on the same machine but different ports are
/// treated as different hosts for rate limiting and robots.txt.
///
/// # Returns
///
/// * `Some(String)` - The host key
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ripple_scrape::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_host(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Returns the origin used to locate `robots.txt` for a URL
/// (`scheme://host[:port]`)
pub fn robots_url(url: &Url) -> Option<Url> {
    url.host_str()?;
    let mut robots = url.clone();
    robots.set_path("/robots.txt");
    robots.set_query(None);
    robots.set_fragment(None);
    Some(robots)
}
