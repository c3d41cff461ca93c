//! Configuration file handling.
//!
//! This module handles loading `.trendscope.toml`, merging it with CLI
//! arguments, and reading API credentials from the environment.

use crate::error::ConfigError;
use crate::models::ListingMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".trendscope.toml";

/// Keywords tracked when none are given.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "can",
    "can bus",
    "canfd",
    "uds",
    "xcp",
    "ecu",
    "bootloader",
    "ota",
    "telematics",
    "gateway",
    "immobilizer",
    "keyless",
    "reverse engineering",
    "firmware",
    "diagnostics",
    "autosar",
    "secoc",
    "vulnerability",
    "exploit",
    "malware",
];

/// Sources fetched when none are given.
pub const DEFAULT_SOURCES: &[&str] = &[
    "cybersecurity",
    "netsec",
    "CarHacking",
    "ReverseEngineering",
    "embedded",
    "IOTSecurity",
    "automotive",
];

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Fetch settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "out.csv".to_string()
}

/// Post collection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Sources to collect from, in order.
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,

    /// Posts per source.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Listing to request.
    #[serde(default)]
    pub listing: ListingMode,

    /// Pause between sources, in seconds.
    #[serde(default = "default_sleep_seconds")]
    pub sleep_seconds: f64,

    /// Retries on rate limiting or server errors.
    #[serde(default = "default_retries")]
    pub retries: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User agent sent to the API, used when `REDDIT_USER_AGENT` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            limit: default_limit(),
            listing: ListingMode::default(),
            sleep_seconds: default_sleep_seconds(),
            retries: default_retries(),
            timeout_seconds: default_timeout(),
            user_agent: None,
        }
    }
}

impl FetchConfig {
    /// Pacing delay between sources.
    ///
    /// Rejects negative, non-finite and unrepresentably large values.
    pub fn pacing(&self) -> Result<Duration, ConfigError> {
        pacing_from_secs(self.sleep_seconds).ok_or_else(|| ConfigError::InvalidValue {
            var: "sleep_seconds",
            value: self.sleep_seconds.to_string(),
        })
    }
}

/// Convert a pause in seconds to a `Duration`, if it is a usable value.
pub fn pacing_from_secs(secs: f64) -> Option<Duration> {
    if secs < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

fn default_sources() -> Vec<String> {
    DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect()
}

fn default_limit() -> usize {
    300
}

fn default_sleep_seconds() -> f64 {
    1.0
}

fn default_retries() -> usize {
    3
}

fn default_timeout() -> u64 {
    30
}

/// Keyword analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Keywords to track, in report order.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
        }
    }
}

fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref sources) = args.sources {
            self.fetch.sources = split_list(sources);
        }
        if let Some(limit) = args.limit {
            self.fetch.limit = limit;
        }
        if let Some(listing) = args.listing {
            self.fetch.listing = listing;
        }
        if let Some(sleep) = args.sleep {
            self.fetch.sleep_seconds = sleep;
        }
        if let Some(ref keywords) = args.keywords {
            self.analysis.keywords = split_list(keywords);
        }
        if let Some(ref out) = args.out {
            self.general.output = out.display().to_string();
        }
    }

    /// Apply environment overrides that are not credentials.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(sleep) = sleep_from_env()? {
            self.fetch.sleep_seconds = sleep;
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

/// Split a comma-separated list, trimming items and dropping empties.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Reddit API credentials.
#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl std::fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl RedditCredentials {
    /// Read credentials from the process environment.
    ///
    /// Loads a `.env` file from the working directory first, if present.
    /// `fallback_user_agent` is used when `REDDIT_USER_AGENT` is unset.
    pub fn from_env(fallback_user_agent: Option<&str>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok(), fallback_user_agent)
    }

    fn from_lookup<F>(lookup: F, fallback_user_agent: Option<&str>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingCredential { var })
        };

        let client_id = required("REDDIT_CLIENT_ID")?;
        let client_secret = required("REDDIT_CLIENT_SECRET")?;
        let non_blank = |v: &str| Some(v.trim().to_string()).filter(|v| !v.is_empty());
        let user_agent = lookup("REDDIT_USER_AGENT")
            .and_then(|v| non_blank(&v))
            .or_else(|| fallback_user_agent.and_then(non_blank))
            .unwrap_or_else(default_user_agent);

        Ok(Self {
            client_id,
            client_secret,
            user_agent,
        })
    }
}

fn default_user_agent() -> String {
    format!("trendscope/{} (read-only research)", env!("CARGO_PKG_VERSION"))
}

fn sleep_from_env() -> Result<Option<f64>, ConfigError> {
    parse_sleep(std::env::var("REDDIT_SLEEP_SECONDS").ok())
}

fn parse_sleep(raw: Option<String>) -> Result<Option<f64>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if pacing_from_secs(v).is_some() => Ok(Some(v)),
        _ => Err(ConfigError::InvalidValue {
            var: "REDDIT_SLEEP_SECONDS",
            value: raw,
        }),
    }
}
