//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::ListingMode;
use clap::Parser;
use std::path::PathBuf;

/// Trendscope - weekly keyword trends in forum post titles
///
/// Pulls recent post metadata from a set of subreddits (read-only) and
/// writes how often each keyword appears per ISO calendar week.
///
/// Examples:
///   trendscope
///   trendscope --sources CarHacking,netsec --limit 500 --listing top
///   trendscope --keywords "uds,can bus,xcp" --out trends.csv
///   trendscope --format json --out trends.json
///   trendscope --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Sources to fetch (comma-separated subreddit names)
    ///
    /// Default: cybersecurity,netsec,CarHacking,ReverseEngineering,embedded,IOTSecurity,automotive
    #[arg(long, value_name = "LIST", env = "TRENDSCOPE_SOURCES")]
    pub sources: Option<String>,

    /// Posts to fetch per source (default: 300)
    #[arg(long, value_name = "COUNT")]
    pub limit: Option<usize>,

    /// Listing to fetch from each source (default: new)
    #[arg(long, value_name = "MODE")]
    pub listing: Option<ListingMode>,

    /// Output file path (default: out.csv)
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Keywords to track (comma-separated, matched case-insensitively)
    ///
    /// Default: the built-in automotive-security vocabulary.
    #[arg(short, long, value_name = "LIST", env = "TRENDSCOPE_KEYWORDS")]
    pub keywords: Option<String>,

    /// Output format (csv, json)
    #[arg(long, default_value = "csv", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Seconds to pause between sources
    ///
    /// Overrides REDDIT_SLEEP_SECONDS and the config file.
    #[arg(long, value_name = "SECS")]
    pub sleep: Option<f64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .trendscope.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .trendscope.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated values (default)
    #[default]
    Csv,
    /// JSON array of rows
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(limit) = self.limit {
            if limit == 0 {
                return Err("Limit must be at least 1".to_string());
            }
        }

        if let Some(ref sources) = self.sources {
            if crate::config::split_list(sources).is_empty() {
                return Err("At least one source is required".to_string());
            }
        }

        if let Some(sleep) = self.sleep {
            if crate::config::pacing_from_secs(sleep).is_none() {
                return Err("Sleep must be a non-negative number of seconds".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
