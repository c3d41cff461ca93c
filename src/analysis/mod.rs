//! Analysis modules.
//!
//! Text normalization, week bucketing and the aggregation engine that
//! turns a batch of posts into weekly keyword rows.

pub mod aggregator;
pub mod text;
pub mod week;

pub use aggregator::aggregate_with_summary;
pub use text::KeywordVocabulary;
