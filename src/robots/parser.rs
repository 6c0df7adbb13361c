//! Robots.txt parser implementation
//!
//! Permission checks are delegated to the `robotstxt` crate (a port of
//! Google's matcher); `Crawl-delay` is read separately since the matcher
//! ignores it.

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Parsed robots.txt data
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Sentinel used when robots.txt was missing or unfetchable
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// Used when robots.txt cannot be fetched, so that one unreachable
    /// robots.txt never halts the run.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Returns true if this is the allow-all sentinel
    pub fn is_allow_all(&self) -> bool {
        self.allow_all
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// `url` may be absolute or a bare path. `user_agent` may be a full
    /// User-Agent header. The matcher compares the agent it is given whole
    /// against the token of each `User-agent:` line, so only our product
    /// token (see [`agent_token`]) is passed in.
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.trim().is_empty() {
            return true;
        }

        let token = agent_token(user_agent);
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, token, url)
    }

    /// Gets the `Crawl-delay` that applies to the given user agent
    ///
    /// A group naming our agent wins over the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        if self.allow_all {
            return None;
        }

        let token = agent_token(user_agent).to_lowercase();
        let mut group_agents: Vec<String> = Vec::new();
        let mut in_agent_lines = false;
        let mut wildcard_delay = None;
        let mut agent_delay = None;

        for line in self.content.lines() {
            // Strip comments
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                // Consecutive User-agent lines share one group
                if !in_agent_lines {
                    group_agents.clear();
                }
                let agent = if value.starts_with('*') {
                    "*"
                } else {
                    agent_token(value)
                };
                group_agents.push(agent.to_lowercase());
                in_agent_lines = true;
                continue;
            }
            in_agent_lines = false;

            if key != "crawl-delay" {
                continue;
            }
            let Ok(seconds) = value.parse::<f64>() else {
                continue;
            };
            let Ok(delay) = Duration::try_from_secs_f64(seconds) else {
                continue;
            };

            if group_agents.iter().any(|ua| *ua == token) {
                agent_delay = Some(delay);
            } else if group_agents.iter().any(|ua| ua == "*") {
                wildcard_delay = Some(delay);
            }
        }

        agent_delay.or(wildcard_delay)
    }
}

/// Extracts the product token from a User-Agent string
///
/// The token stops at the first character outside `[a-zA-Z_-]`, the same
/// rule the matcher applies to `User-agent:` lines, so both sides of the
/// comparison agree: `ripple-scrape/0.1.0 (+info)` yields `ripple-scrape`
/// and `my.bot/1.0` yields `my`.
pub fn agent_token(user_agent: &str) -> &str {
    let trimmed = user_agent.trim();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '-' || c == '_'))
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}
