//! Post collection from remote sources.
//!
//! This module defines the [`PostSource`] contract and the paced,
//! multi-source collection loop built on top of it.

pub mod reddit;

pub use reddit::{validate_source, RedditClient};

use crate::error::FetchError;
use crate::models::{ListingMode, PostRecord, SourceSet};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info};

/// A producer of post records from named collections.
#[async_trait]
pub trait PostSource {
    /// Fetch up to `limit` posts from `source` using the given listing.
    async fn fetch_listing(
        &self,
        source: &str,
        mode: ListingMode,
        limit: usize,
    ) -> Result<Vec<PostRecord>, FetchError>;
}

/// Options for a collection run.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Maximum posts per source.
    pub limit_per_source: usize,
    /// Listing to request from each source.
    pub mode: ListingMode,
    /// Pause between consecutive sources.
    pub pacing: Duration,
    /// Whether to show a progress bar.
    pub show_progress: bool,
}

/// Fetch posts from every source in order and concatenate them.
///
/// A failing source aborts the whole collection. Posts appearing in more
/// than one source are kept as separate records.
pub async fn fetch_posts<S>(
    client: &S,
    sources: &SourceSet,
    options: &FetchOptions,
) -> Result<Vec<PostRecord>, FetchError>
where
    S: PostSource + Sync + ?Sized,
{
    let progress = if options.show_progress {
        let pb = ProgressBar::new(sources.names().len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut posts = Vec::new();

    for (i, source) in sources.names().iter().enumerate() {
        if i > 0 && !options.pacing.is_zero() {
            debug!("Sleeping {:?} before next source", options.pacing);
            tokio::time::sleep(options.pacing).await;
        }

        if let Some(ref pb) = progress {
            pb.set_message(source.clone());
        }

        let batch = client
            .fetch_listing(source, options.mode, options.limit_per_source)
            .await?;
        info!("Fetched {} posts from {} ({})", batch.len(), source, options.mode);
        posts.extend(batch);

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    Ok(posts)
}
