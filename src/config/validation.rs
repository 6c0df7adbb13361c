use crate::config::types::{ScrapeConfig, SelectorRule};
use crate::ConfigError;
use std::collections::HashSet;
use std::time::Duration;

/// Upper bound on in-flight targets
const MAX_CONCURRENCY: usize = 1000;

/// Validates the entire configuration
pub fn validate(config: &ScrapeConfig) -> Result<(), ConfigError> {
    validate_concurrency(config.concurrency)?;
    validate_user_agent(&config.user_agent)?;
    validate_selectors(&config.selectors)?;

    if config.timeout.is_zero() {
        return Err(ConfigError::Validation(
            "timeout must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

/// Converts a number of seconds from user input into a `Duration`
///
/// Rejects NaN, infinite and negative values, values too large for a
/// `Duration`, and zero unless `allow_zero`.
pub fn seconds_to_duration(
    field: &str,
    seconds: f64,
    allow_zero: bool,
) -> Result<Duration, ConfigError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a non-negative number of seconds, got {}",
            field, seconds
        )));
    }

    if !allow_zero && seconds == 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be greater than zero",
            field
        )));
    }

    Duration::try_from_secs_f64(seconds).map_err(|e| {
        ConfigError::Validation(format!("{} of {} seconds is out of range: {}", field, seconds, e))
    })
}

fn validate_concurrency(concurrency: usize) -> Result<(), ConfigError> {
    if concurrency == 0 || concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, concurrency
        )));
    }
    Ok(())
}

fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
    if user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    // Must be usable as an HTTP header value
    if user_agent.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(format!(
            "user_agent contains control characters: {:?}",
            user_agent
        )));
    }

    Ok(())
}

/// Validates selector rules: unique non-empty names, parseable CSS, and
/// non-empty attribute names
pub fn validate_selectors(rules: &[SelectorRule]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for rule in rules {
        if rule.name.is_empty() {
            return Err(ConfigError::InvalidSelector {
                name: rule.name.clone(),
                message: "name cannot be empty".to_string(),
            });
        }

        if !seen.insert(rule.name.as_str()) {
            return Err(ConfigError::DuplicateSelector(rule.name.clone()));
        }

        if rule.css.trim().is_empty() {
            return Err(ConfigError::InvalidSelector {
                name: rule.name.clone(),
                message: "CSS selector cannot be empty".to_string(),
            });
        }

        scraper::Selector::parse(&rule.css).map_err(|e| ConfigError::InvalidSelector {
            name: rule.name.clone(),
            message: format!("invalid CSS selector '{}': {:?}", rule.css, e),
        })?;

        if let Some(attribute) = &rule.attribute {
            if attribute.trim().is_empty() {
                return Err(ConfigError::InvalidSelector {
                    name: rule.name.clone(),
                    message: "attribute name cannot be empty".to_string(),
                });
            }
        }
    }

    Ok(())
}
