//! Error types shared across the fetch, config and analysis layers.

use thiserror::Error;

/// Errors raised while assembling the run configuration.
///
/// All of these are fatal and surface before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set (or is blank).
    #[error("missing credential: {var} is not set (add it to the environment or a .env file)")]
    MissingCredential { var: &'static str },

    /// A setting is present but cannot be used.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Errors raised by the aggregation engine.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    /// A post carries a timestamp that cannot be placed in a calendar week.
    #[error("post {id} has a malformed timestamp: {value}")]
    MalformedTimestamp { id: String, value: f64 },
}

/// Errors raised by the fetch collaborator.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// Still rate limited after exhausting retries.
    #[error("rate limit exceeded")]
    RateLimited,

    /// Credentials were rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The response body did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// A source name that is not a bare subreddit name.
    #[error("invalid source name {0:?} (expected letters, digits and underscores)")]
    InvalidSource(String),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_timeout() || e.is_connect(),
            FetchError::Api { status, .. } => *status >= 500,
            FetchError::RateLimited => true,
            FetchError::Auth(_) | FetchError::Parse(_) | FetchError::InvalidSource(_) => false,
        }
    }
}
