//! Data models for the trend analyzer.
//!
//! This module contains the core data structures passed between the
//! fetch collaborator, the aggregation engine and the report writers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Listing mode used when fetching posts from a source.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ListingMode {
    /// Newest posts first
    #[default]
    New,
    /// Highest current engagement
    Hot,
    /// Top-ranked over all time
    Top,
}

impl ListingMode {
    /// Path segment of the listing endpoint.
    pub fn path_segment(&self) -> &'static str {
        match self {
            ListingMode::New => "new",
            ListingMode::Hot => "hot",
            ListingMode::Top => "top",
        }
    }

    /// Time window query parameter, only meaningful for ranked listings.
    pub fn time_filter(&self) -> Option<&'static str> {
        match self {
            ListingMode::Top => Some("all"),
            ListingMode::New | ListingMode::Hot => None,
        }
    }
}

impl fmt::Display for ListingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// A single post as produced by the fetch collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Source-assigned post identifier.
    pub id: String,
    /// Name of the collection the post was fetched from.
    pub source: String,
    /// Creation time in UTC epoch seconds.
    pub timestamp: f64,
    /// Post title; may be empty.
    pub title: String,
    /// Absolute link to the post.
    pub permalink: String,
}

/// Ordered, duplicate-free list of source names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSet {
    names: Vec<String>,
}

impl SourceSet {
    /// Build from names in the given order, dropping blanks and repeats.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() && !set.names.iter().any(|n| n == name) {
                set.names.push(name.to_string());
            }
        }
        set
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Deterministic label used in report rows.
    pub fn label(&self) -> String {
        self.names.join(";")
    }
}

/// ISO-8601 calendar week key, formatted `YYYY-Www`.
///
/// Ordering is lexicographic on the formatted key. The year is zero-padded
/// to four digits, so this matches chronological order for years 1..=9999.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekBucket(String);

impl WeekBucket {
    pub fn new(iso_year: i32, iso_week: u32) -> Self {
        Self(format!("{:04}-W{:02}", iso_year, iso_week))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WeekBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One output row per (week, keyword) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub week: WeekBucket,
    pub sources: String,
    pub keyword: String,
    pub hits: u64,
    pub total_posts: u64,
    pub hits_per_100_posts: f64,
}

/// Headline numbers for a finished run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of posts folded into the tallies.
    pub total_posts: u64,
    /// Number of distinct week buckets.
    pub buckets: usize,
    /// Number of rows emitted.
    pub rows: usize,
    /// Total hits per keyword across all buckets, in vocabulary order.
    pub keyword_totals: Vec<(String, u64)>,
}

impl RunSummary {
    /// Keywords with at least one hit, most frequent first.
    pub fn top_keywords(&self, n: usize) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .keyword_totals
            .iter()
            .filter(|(_, hits)| *hits > 0)
            .map(|(k, hits)| (k.as_str(), *hits))
            .collect();

        // Stable sort keeps vocabulary order among ties
        ranked.sort_by_key(|(_, hits)| std::cmp::Reverse(*hits));
        ranked.truncate(n);
        ranked
    }
}
