//! Output record types
//!
//! A [`Record`] is the single output unit produced for every input URL,
//! whether the URL was scraped, blocked by robots.txt, or failed.

use crate::state::TargetState;
use crate::url::Target;
use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// Classification of a per-target failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Connection refused/reset, DNS failure, TLS error, body read error
    Network,

    /// The per-request timeout elapsed
    Timeout,

    /// The server answered with a status >= 400
    Http(u16),

    /// robots.txt disallows the URL for our agent
    RobotsBlocked,

    /// The run deadline expired before the target finished
    Cancelled,

    /// The target's task panicked or hit an internal invariant violation
    Internal,
}

impl FailureKind {
    /// Returns true if another attempt could plausibly succeed
    ///
    /// Network errors, timeouts, HTTP 429 and 5xx are retryable; every other
    /// HTTP error is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network | Self::Timeout => true,
            Self::Http(status) => *status == 429 || (500..=599).contains(status),
            Self::RobotsBlocked | Self::Cancelled | Self::Internal => false,
        }
    }

    /// Stable label used in serialized output and statistics
    pub fn label(&self) -> String {
        match self {
            Self::Network => "network".to_string(),
            Self::Timeout => "timeout".to_string(),
            Self::Http(status) => format!("http_{}", status),
            Self::RobotsBlocked => "robots_blocked".to_string(),
            Self::Cancelled => "cancelled".to_string(),
            Self::Internal => "internal".to_string(),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network error"),
            Self::Timeout => write!(f, "timeout"),
            Self::Http(status) => write!(f, "HTTP {}", status),
            Self::RobotsBlocked => write!(f, "disallowed by robots.txt"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Internal => write!(f, "internal error"),
        }
    }
}

impl Serialize for FailureKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

/// Outcome tag of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok,
    Error,
    Blocked,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Blocked => "blocked",
        }
    }
}

/// Mapping from rule name to extracted values, in rule order
///
/// A rule that matched nothing is present with an empty sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    fields: Vec<(String, Vec<String>)>,
}

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the values for `name`, replacing any previous values
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.fields.push((name, values)),
        }
    }

    /// Returns the values extracted for `name`
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Iterates over `(name, values)` in rule order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Number of rules in the result
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, values) in &self.fields {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

/// Error details carried by a failed or blocked record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordError {
    pub kind: FailureKind,
    pub message: String,
}

/// One output row: the result of processing a single input URL
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    /// Position of the URL in the input sequence
    pub index: usize,

    /// Source URL (record identity)
    pub url: String,

    /// When the record was produced
    pub fetched_at: DateTime<Utc>,

    pub outcome: Outcome,

    /// Terminal state the target reached
    pub state: TargetState,

    /// HTTP status of the last response, if one was received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Number of fetch attempts made
    pub attempts: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ExtractionResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RecordError>,
}

impl Record {
    /// Record for a target whose page was fetched and extracted
    pub fn success(target: &Target, status_code: u16, data: ExtractionResult, attempts: u32) -> Self {
        Self {
            index: target.index,
            url: target.source.clone(),
            fetched_at: Utc::now(),
            outcome: Outcome::Ok,
            state: TargetState::Done,
            status_code: Some(status_code),
            attempts,
            data: Some(data),
            error: None,
        }
    }

    /// Record for a target disallowed by robots.txt
    pub fn blocked(target: &Target) -> Self {
        Self {
            index: target.index,
            url: target.source.clone(),
            fetched_at: Utc::now(),
            outcome: Outcome::Blocked,
            state: TargetState::Blocked,
            status_code: None,
            attempts: 0,
            data: None,
            error: Some(RecordError {
                kind: FailureKind::RobotsBlocked,
                message: "Disallowed by robots.txt".to_string(),
            }),
        }
    }

    /// Record for a target that failed or was cancelled
    pub fn failed(
        target: &Target,
        kind: FailureKind,
        message: impl Into<String>,
        status_code: Option<u16>,
        attempts: u32,
    ) -> Self {
        let state = match kind {
            FailureKind::Cancelled => TargetState::Cancelled,
            _ => TargetState::FetchFailed,
        };

        Self {
            index: target.index,
            url: target.source.clone(),
            fetched_at: Utc::now(),
            outcome: Outcome::Error,
            state,
            status_code,
            attempts,
            data: None,
            error: Some(RecordError {
                kind,
                message: message.into(),
            }),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome == Outcome::Ok
    }

    /// Human-readable failure reason, if any
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}
