//! Statistics generation from scrape records
//!
//! This module provides functionality for summarizing a run's records and
//! displaying them on the console.

use crate::record::{Outcome, Record};
use std::collections::BTreeMap;

/// Scrape statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Total number of records
    pub total: usize,

    /// Records with extracted data
    pub ok: usize,

    /// Records disallowed by robots.txt
    pub blocked: usize,

    /// Records that failed (including cancelled ones)
    pub failed: usize,

    /// Failure label (`timeout`, `http_404`, ...) and its count
    pub failures_by_kind: BTreeMap<String, usize>,
}

impl RunStatistics {
    /// Computes statistics over a set of records
    ///
    /// # Arguments
    ///
    /// * `records` - The records of one run
    pub fn from_records(records: &[Record]) -> Self {
        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };

        for record in records {
            match record.outcome {
                Outcome::Ok => stats.ok += 1,
                Outcome::Blocked => stats.blocked += 1,
                Outcome::Error => {
                    stats.failed += 1;
                    if let Some(error) = &record.error {
                        *stats.failures_by_kind.entry(error.kind.label()).or_insert(0) += 1;
                    }
                }
            }
        }

        stats
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.ok as f64 / self.total as f64) * 100.0
    }
}

/// Formats the one-line console summary of a record
///
/// `OK  <url> -> {name: count, ...}` for successes, `ERR <url> -> <reason>`
/// for failures and `BLK <url> -> <reason>` for blocked URLs.
pub fn format_record_line(record: &Record) -> String {
    match record.outcome {
        Outcome::Ok => {
            let sizes = record
                .data
                .as_ref()
                .map(|data| {
                    data.iter()
                        .map(|(name, values)| format!("{}: {}", name, values.len()))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            format!("OK  {} -> {{{}}}", record.url, sizes)
        }
        Outcome::Error => format!(
            "ERR {} -> {}",
            record.url,
            record.error_message().unwrap_or_default()
        ),
        Outcome::Blocked => format!(
            "BLK {} -> {}",
            record.url,
            record.error_message().unwrap_or_default()
        ),
    }
}

/// Prints one summary line per record to stdout
pub fn print_record_lines(records: &[Record]) {
    for record in records {
        println!("{}", format_record_line(record));
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStatistics) {
    println!();
    println!("=== Scrape Statistics ===");
    println!(
        "Total: {}  OK: {}  Blocked: {}  Failed: {}",
        stats.total, stats.ok, stats.blocked, stats.failed
    );

    if !stats.failures_by_kind.is_empty() {
        println!("Failures by kind:");
        let mut counts: Vec<_> = stats.failures_by_kind.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (kind, count) in counts {
            println!("  {}: {}", kind, count);
        }
    }

    println!(
        "Success Rate: {:.1}% ({} / {} URLs)",
        stats.success_rate(),
        stats.ok,
        stats.total
    );
}
