//! Weekly keyword aggregation and statistics.
//!
//! Posts are folded into per-week keyword tallies and per-week post
//! totals, then expanded into one [`SummaryRow`] per (week, keyword)
//! pair with a hits-per-100-posts rate.

use crate::analysis::text::{keyword_hits, KeywordVocabulary};
use crate::analysis::week::to_week_bucket;
use crate::error::AnalysisError;
use crate::models::{PostRecord, RunSummary, SourceSet, SummaryRow, WeekBucket};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Per-week accumulator for one aggregation run.
#[derive(Debug, Default)]
pub struct BucketTally {
    hits: BTreeMap<WeekBucket, HashMap<String, u64>>,
    totals: BTreeMap<WeekBucket, u64>,
}

impl BucketTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one post into the tally.
    ///
    /// Fails on a timestamp that cannot be bucketed; the tally is left
    /// untouched in that case.
    pub fn add(
        &mut self,
        record: &PostRecord,
        vocabulary: &KeywordVocabulary,
    ) -> Result<(), AnalysisError> {
        let bucket =
            to_week_bucket(record.timestamp).ok_or_else(|| AnalysisError::MalformedTimestamp {
                id: record.id.clone(),
                value: record.timestamp,
            })?;

        *self.totals.entry(bucket.clone()).or_insert(0) += 1;

        let counts = self.hits.entry(bucket).or_default();
        for (keyword, n) in keyword_hits(&record.title, vocabulary.iter()) {
            *counts.entry(keyword).or_insert(0) += n;
        }

        Ok(())
    }

    /// Buckets present in the tally, in ascending order.
    pub fn buckets(&self) -> impl Iterator<Item = &WeekBucket> {
        self.totals.keys()
    }

    pub fn total_posts(&self, bucket: &WeekBucket) -> u64 {
        self.totals.get(bucket).copied().unwrap_or(0)
    }

    pub fn hits(&self, bucket: &WeekBucket, keyword: &str) -> u64 {
        self.hits
            .get(bucket)
            .and_then(|counts| counts.get(keyword))
            .copied()
            .unwrap_or(0)
    }

    /// Headline numbers taken straight from the tallies.
    ///
    /// Independent of the row expansion, so post and bucket counts stay
    /// correct when the vocabulary is empty.
    pub fn summary(&self, vocabulary: &KeywordVocabulary) -> RunSummary {
        let keyword_totals = vocabulary
            .iter()
            .map(|keyword| {
                let total = self
                    .hits
                    .values()
                    .filter_map(|counts| counts.get(keyword))
                    .sum();
                (keyword.to_string(), total)
            })
            .collect();

        RunSummary {
            total_posts: self.totals.values().sum(),
            buckets: self.totals.len(),
            rows: self.totals.len() * vocabulary.len(),
            keyword_totals,
        }
    }

    /// Expand into rows: buckets ascending, keywords in vocabulary order.
    pub fn into_rows(self, vocabulary: &KeywordVocabulary, sources: &SourceSet) -> Vec<SummaryRow> {
        let label = sources.label();
        let mut rows = Vec::with_capacity(self.totals.len() * vocabulary.len());

        for bucket in self.buckets() {
            let total = self.total_posts(bucket);
            for keyword in vocabulary.iter() {
                let hits = self.hits(bucket, keyword);
                rows.push(SummaryRow {
                    week: bucket.clone(),
                    sources: label.clone(),
                    keyword: keyword.to_string(),
                    hits,
                    total_posts: total,
                    hits_per_100_posts: hits_per_100(hits, total),
                });
            }
        }

        rows
    }
}

/// Hits per 100 posts, rounded to 4 decimals (half away from zero).
///
/// Zero posts yields 0.0.
pub fn hits_per_100(hits: u64, total_posts: u64) -> f64 {
    if total_posts == 0 {
        return 0.0;
    }
    let rate = hits as f64 / total_posts as f64 * 100.0;
    round4(rate)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Aggregate a batch of posts into weekly keyword rows.
///
/// Either the whole batch is folded or an error is returned; no partial
/// rows are produced.
#[allow(dead_code)] // Convenience wrapper
pub fn aggregate(
    records: &[PostRecord],
    vocabulary: &KeywordVocabulary,
    sources: &SourceSet,
) -> Result<Vec<SummaryRow>, AnalysisError> {
    aggregate_with_summary(records, vocabulary, sources).map(|(rows, _)| rows)
}

/// Like [`aggregate`], also returning the run's headline numbers.
pub fn aggregate_with_summary(
    records: &[PostRecord],
    vocabulary: &KeywordVocabulary,
    sources: &SourceSet,
) -> Result<(Vec<SummaryRow>, RunSummary), AnalysisError> {
    let mut tally = BucketTally::new();

    for record in records {
        tally.add(record, vocabulary)?;
    }

    debug!(
        "Folded {} posts into {} week buckets",
        records.len(),
        tally.totals.len()
    );

    let summary = tally.summary(vocabulary);
    Ok((tally.into_rows(vocabulary, sources), summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ts(y: i32, m: u32, d: u32) -> f64 {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap().timestamp() as f64
    }

    fn create_test_post(id: &str, timestamp: f64, title: &str) -> PostRecord {
        PostRecord {
            id: id.to_string(),
            source: "CarHacking".to_string(),
            timestamp,
            title: title.to_string(),
            permalink: format!("https://www.reddit.com/r/CarHacking/comments/{}/", id),
        }
    }

    fn sources() -> SourceSet {
        SourceSet::new(["CarHacking", "netsec"])
    }

    #[test]
    fn test_end_to_end_single_week() {
        // 2024-03-04 and 2024-03-06 both fall in 2024-W10
        let records = vec![
            create_test_post("a", ts(2024, 3, 4), "Sniffing UDS on a 2019 hatchback"),
            create_test_post("b", ts(2024, 3, 6), "Weekly discussion thread"),
        ];
        let vocab = KeywordVocabulary::new(["uds", "can"]);

        let rows = aggregate(&records, &vocab, &sources()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].week.as_str(), "2024-W10");
        assert_eq!(rows[0].keyword, "uds");
        assert_eq!(rows[0].hits, 1);
        assert_eq!(rows[0].total_posts, 2);
        assert_eq!(rows[0].hits_per_100_posts, 50.0);
        assert_eq!(rows[0].sources, "CarHacking;netsec");

        assert_eq!(rows[1].keyword, "can");
        assert_eq!(rows[1].hits, 0);
        assert_eq!(rows[1].total_posts, 2);
        assert_eq!(rows[1].hits_per_100_posts, 0.0);
    }

    #[test]
    fn test_empty_records() {
        let vocab = KeywordVocabulary::new(["uds"]);
        let rows = aggregate(&[], &vocab, &sources()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_empty_vocabulary_yields_no_rows() {
        let records = vec![create_test_post("a", ts(2024, 3, 4), "uds")];
        let vocab = KeywordVocabulary::new(["", "   "]);
        let rows = aggregate(&records, &vocab, &sources()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_buckets_sorted_and_keywords_in_given_order() {
        let records = vec![
            create_test_post("late", ts(2024, 3, 12), "ECU firmware dump"),
            create_test_post("early", ts(2023, 12, 31), "OTA update exploit"),
            create_test_post("mid", ts(2024, 1, 2), "ecu"),
        ];
        let vocab = KeywordVocabulary::new(["firmware", "ecu", "ota"]);

        let rows = aggregate(&records, &vocab, &sources()).unwrap();

        let weeks: Vec<&str> = rows.iter().map(|r| r.week.as_str()).collect();
        assert_eq!(
            weeks,
            vec![
                "2023-W52", "2023-W52", "2023-W52", "2024-W01", "2024-W01", "2024-W01",
                "2024-W11", "2024-W11", "2024-W11",
            ]
        );
        let keywords: Vec<&str> = rows[..3].iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(keywords, vec!["firmware", "ecu", "ota"]);
    }

    #[test]
    fn test_hits_accumulate_across_posts() {
        let records = vec![
            create_test_post("1", ts(2024, 5, 6), "CAN bus basics"),
            create_test_post("2", ts(2024, 5, 7), "can can can"),
            create_test_post("3", ts(2024, 5, 8), "Gateway ECU"),
            create_test_post("4", ts(2024, 5, 9), ""),
        ];
        let vocab = KeywordVocabulary::new(["can", "can bus", "gateway"]);

        let rows = aggregate(&records, &vocab, &sources()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!((rows[0].keyword.as_str(), rows[0].hits), ("can", 2));
        assert_eq!((rows[1].keyword.as_str(), rows[1].hits), ("can bus", 1));
        assert_eq!((rows[2].keyword.as_str(), rows[2].hits), ("gateway", 1));
        assert!(rows.iter().all(|r| r.total_posts == 4));
        assert_eq!(rows[0].hits_per_100_posts, 50.0);
        assert_eq!(rows[1].hits_per_100_posts, 25.0);
    }

    #[test]
    fn test_hit_bounds() {
        let records: Vec<PostRecord> = (0..7)
            .map(|i| {
                create_test_post(
                    &i.to_string(),
                    ts(2024, 2, 5) + i as f64 * 3600.0,
                    "can bus exploit via uds and can",
                )
            })
            .collect();
        let vocab = KeywordVocabulary::new(["can", "can bus", "uds", "exploit", "xcp"]);

        let rows = aggregate(&records, &vocab, &sources()).unwrap();

        let total = rows[0].total_posts;
        assert!(rows.iter().all(|r| r.hits <= r.total_posts));
        let sum: u64 = rows.iter().map(|r| r.hits).sum();
        assert!(sum <= total * vocab.len() as u64);
    }

    #[test]
    fn test_idempotent_and_order_invariant() {
        let records = vec![
            create_test_post("1", ts(2024, 1, 1), "UDS seed/key"),
            create_test_post("2", ts(2024, 1, 9), "CAN fuzzing"),
            create_test_post("3", ts(2024, 1, 10), "uds and can"),
            create_test_post("3", ts(2024, 1, 10), "uds and can"),
        ];
        let vocab = KeywordVocabulary::new(["uds", "can"]);

        let first = aggregate(&records, &vocab, &sources()).unwrap();
        let second = aggregate(&records, &vocab, &sources()).unwrap();
        assert_eq!(first, second);

        let mut reversed = records.clone();
        reversed.reverse();
        let permuted = aggregate(&reversed, &vocab, &sources()).unwrap();
        assert_eq!(first, permuted);

        // Duplicate IDs are counted independently
        let w02: Vec<&SummaryRow> = first.iter().filter(|r| r.week.as_str() == "2024-W02").collect();
        assert_eq!(w02[0].total_posts, 3);
        assert_eq!(w02[0].hits, 2);
    }

    #[test]
    fn test_malformed_timestamp_fails_whole_run() {
        let records = vec![
            create_test_post("ok", ts(2024, 1, 1), "uds"),
            create_test_post("bad", f64::NAN, "uds"),
        ];
        let vocab = KeywordVocabulary::new(["uds"]);

        let err = aggregate(&records, &vocab, &sources()).unwrap_err();
        match err {
            AnalysisError::MalformedTimestamp { id, .. } => assert_eq!(id, "bad"),
        }
    }

    #[test]
    fn test_far_future_timestamp_fails_whole_run() {
        let records = vec![
            create_test_post("ok", 1_709_553_600.0, "uds"),
            create_test_post("future", 3e11, "uds"),
        ];
        let vocab = KeywordVocabulary::new(["uds"]);

        let err = aggregate(&records, &vocab, &sources()).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::MalformedTimestamp {
                id: "future".to_string(),
                value: 3e11,
            }
        );
    }

    #[test]
    fn test_rate_computation() {
        assert_eq!(hits_per_100(10, 40), 25.0);
        assert_eq!(hits_per_100(0, 0), 0.0);
        assert_eq!(hits_per_100(5, 0), 0.0);
        assert_eq!(hits_per_100(1, 3), 33.3333);
        assert_eq!(hits_per_100(2, 3), 66.6667);
        assert_eq!(hits_per_100(3, 3), 100.0);
    }

    #[test]
    fn test_tally_accessors() {
        let vocab = KeywordVocabulary::new(["ota"]);
        let mut tally = BucketTally::new();
        tally
            .add(&create_test_post("1", ts(2024, 1, 1), "OTA"), &vocab)
            .unwrap();

        let bucket = WeekBucket::new(2024, 1);
        assert_eq!(tally.total_posts(&bucket), 1);
        assert_eq!(tally.hits(&bucket, "ota"), 1);
        assert_eq!(tally.hits(&WeekBucket::new(2024, 2), "ota"), 0);
        assert_eq!(tally.buckets().count(), 1);
    }

    #[test]
    fn test_summary_counts() {
        let records = vec![
            create_test_post("1", ts(2024, 1, 1), "uds"),
            create_test_post("2", ts(2024, 1, 9), "uds can"),
            create_test_post("3", ts(2024, 1, 10), "nothing"),
        ];
        let vocab = KeywordVocabulary::new(["uds", "can"]);
        let (rows, summary) = aggregate_with_summary(&records, &vocab, &sources()).unwrap();

        assert_eq!(summary.rows, rows.len());
        assert_eq!(summary.total_posts, 3);
        assert_eq!(summary.buckets, 2);
        assert_eq!(summary.rows, 4);
        assert_eq!(
            summary.keyword_totals,
            vec![("uds".to_string(), 2), ("can".to_string(), 1)]
        );
    }

    #[test]
    fn test_summary_with_empty_vocabulary() {
        let records = vec![
            create_test_post("1", ts(2024, 1, 1), "uds"),
            create_test_post("2", ts(2024, 1, 9), "can"),
        ];
        let vocab = KeywordVocabulary::new(Vec::<String>::new());

        let (rows, summary) = aggregate_with_summary(&records, &vocab, &sources()).unwrap();

        assert!(rows.is_empty());
        assert_eq!(summary.total_posts, 2);
        assert_eq!(summary.buckets, 2);
        assert_eq!(summary.rows, 0);
        assert!(summary.keyword_totals.is_empty());
    }
}
