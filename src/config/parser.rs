use crate::config::types::{FileConfig, ScrapeConfig, ScraperSection, SelectorRule};
use crate::config::validation::{seconds_to_duration, validate};
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a TOML configuration file from the given path
///
/// The file is only parsed here; it is validated once merged with the
/// command-line overrides in [`build_config`].
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use ripple_scrape::config::load_file_config;
///
/// let file = load_file_config(Path::new("scrape.toml")).unwrap();
/// println!("{} selector rules", file.selectors.len());
/// ```
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_file_config(&content)
}

/// Parses configuration file content
pub fn parse_file_config(content: &str) -> Result<FileConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so that two runs can be matched to the same settings.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration file and returns both the parsed file and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(FileConfig, String), ConfigError> {
    let config = load_file_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Parses a selector argument of the form `name=css[@attr]`
///
/// Everything after the first `=` is the selector; if it contains `@`, the
/// part after the first `@` names the attribute to extract. An empty
/// attribute (`name=a@`) means text extraction.
///
/// # Example
///
/// ```
/// use ripple_scrape::config::parse_selector_arg;
///
/// let rule = parse_selector_arg("links=a.item@href").unwrap();
/// assert_eq!(rule.name, "links");
/// assert_eq!(rule.css, "a.item");
/// assert_eq!(rule.attribute.as_deref(), Some("href"));
/// ```
pub fn parse_selector_arg(arg: &str) -> Result<SelectorRule, ConfigError> {
    let (name, rest) = arg.split_once('=').ok_or_else(|| ConfigError::InvalidSelector {
        name: arg.to_string(),
        message: "selector must be in name=css[@attr] format".to_string(),
    })?;

    let (css, attribute) = match rest.split_once('@') {
        Some((css, attr)) => {
            let attr = attr.trim();
            (css, (!attr.is_empty()).then(|| attr.to_string()))
        }
        None => (rest, None),
    };

    Ok(SelectorRule {
        name: name.trim().to_string(),
        css: css.trim().to_string(),
        attribute,
    })
}

/// Merges file settings, command-line overrides and selector rules into a
/// validated [`ScrapeConfig`]
///
/// Precedence: `overrides` > `file` > defaults. Non-empty `cli_selectors`
/// replace the file's selector rules entirely.
pub fn build_config(
    file: Option<FileConfig>,
    overrides: ScraperSection,
    cli_selectors: Vec<SelectorRule>,
) -> Result<ScrapeConfig, ConfigError> {
    let file = file.unwrap_or_default();
    let section = merge_sections(file.scraper, overrides);
    let defaults = ScrapeConfig::default();

    let delay = match section.delay {
        Some(secs) => seconds_to_duration("delay", secs, true)?,
        None => defaults.delay,
    };
    let timeout = match section.timeout {
        Some(secs) => seconds_to_duration("timeout", secs, false)?,
        None => defaults.timeout,
    };
    let retry_backoff = match section.retry_backoff {
        Some(secs) => seconds_to_duration("retry_backoff", secs, true)?,
        None => defaults.retry_backoff,
    };
    let deadline = section
        .deadline
        .map(|secs| seconds_to_duration("deadline", secs, false))
        .transpose()?;

    let selectors = if cli_selectors.is_empty() {
        file.selectors
    } else {
        cli_selectors
    };

    let config = ScrapeConfig {
        concurrency: section.concurrency.unwrap_or(defaults.concurrency),
        delay,
        per_host: section.per_host.unwrap_or(defaults.per_host),
        respect_robots: section.respect_robots.unwrap_or(defaults.respect_robots),
        timeout,
        user_agent: section.user_agent.unwrap_or(defaults.user_agent),
        selectors,
        retries: section.retries.unwrap_or(defaults.retries),
        retry_backoff,
        deadline,
        preserve_order: section.preserve_order.unwrap_or(defaults.preserve_order),
    };

    validate(&config)?;
    Ok(config)
}

/// Field-wise merge where `over` wins whenever it is set
fn merge_sections(base: ScraperSection, over: ScraperSection) -> ScraperSection {
    ScraperSection {
        concurrency: over.concurrency.or(base.concurrency),
        delay: over.delay.or(base.delay),
        per_host: over.per_host.or(base.per_host),
        respect_robots: over.respect_robots.or(base.respect_robots),
        timeout: over.timeout.or(base.timeout),
        user_agent: over.user_agent.or(base.user_agent),
        retries: over.retries.or(base.retries),
        retry_backoff: over.retry_backoff.or(base.retry_backoff),
        deadline: over.deadline.or(base.deadline),
        preserve_order: over.preserve_order.or(base.preserve_order),
    }
}
