//! Read-only Reddit listing client.
//!
//! Uses application-only OAuth (client credentials) and pages through
//! subreddit listings with the `after` cursor. Rate limiting and server
//! errors are retried with exponential backoff and jitter.

use crate::config::{FetchConfig, RedditCredentials};
use crate::error::FetchError;
use crate::fetch::PostSource;
use crate::models::{ListingMode, PostRecord};
use async_trait::async_trait;
use rand::{rng, Rng};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_URL: &str = "https://oauth.reddit.com";
const PERMALINK_BASE: &str = "https://www.reddit.com";

/// Reddit caps listing pages at 100 items.
const PAGE_SIZE: usize = 100;

/// Upper bound for a single backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: u64,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    after: Option<String>,
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: RawPost,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    id: String,
    #[serde(default)]
    subreddit: String,
    created_utc: f64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    permalink: String,
}

/// Reddit API client implementing [`PostSource`].
pub struct RedditClient {
    http: reqwest::Client,
    credentials: RedditCredentials,
    token: Mutex<Option<CachedToken>>,
    retries: usize,
    base_delay: Duration,
}

impl RedditClient {
    /// Build a client from credentials and fetch settings.
    pub fn new(credentials: RedditCredentials, config: &FetchConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(credentials.user_agent.clone())
            .build()?;

        info!("Reddit client ready (user agent: {})", credentials.user_agent);

        Ok(Self {
            http,
            credentials,
            token: Mutex::new(None),
            retries: config.retries,
            base_delay: Duration::from_secs(1),
        })
    }

    /// Return a valid bearer token, requesting a new one when expired.
    async fn access_token(&self) -> Result<String, FetchError> {
        let mut guard = self.token.lock().await;

        if let Some(ref cached) = *guard {
            if Instant::now() < cached.expires_at {
                return Ok(cached.value.clone());
            }
            debug!("Access token expired, refreshing");
        }

        let response = self
            .http
            .post(AUTH_URL)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Auth(format!("token request rejected ({})", status)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(format!("token response: {}", e)))?;

        let value = match (token.access_token, token.error) {
            (Some(value), _) => value,
            (None, Some(error)) => return Err(FetchError::Auth(error)),
            (None, None) => {
                return Err(FetchError::Auth("no access token in response".to_string()))
            }
        };

        // Refresh a minute early so a token never expires mid-request
        let lifetime = Duration::from_secs(token.expires_in.saturating_sub(60));
        *guard = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });
        debug!("Obtained access token valid for {:?}", lifetime);

        Ok(value)
    }

    /// One authenticated GET, returning the body on success.
    async fn get_once(&self, url: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS => Err(FetchError::RateLimited),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                // Force a fresh token on the next call
                *self.token.lock().await = None;
                Err(FetchError::Auth(format!("{} for {}", status, url)))
            }
            s if s.is_success() => Ok(response.text().await?),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(FetchError::Api {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    /// GET with exponential backoff on transient failures.
    async fn get_with_retry(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<String, FetchError> {
        let mut attempt = 0usize;

        loop {
            match self.get_once(url, query).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    let delay = backoff_delay(self.base_delay, attempt);
                    warn!(
                        attempt,
                        max = self.retries,
                        ?delay,
                        error = %e,
                        "request failed; backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl PostSource for RedditClient {
    async fn fetch_listing(
        &self,
        source: &str,
        mode: ListingMode,
        limit: usize,
    ) -> Result<Vec<PostRecord>, FetchError> {
        validate_source(source)?;

        let url = format!("{}/r/{}/{}", API_URL, source, mode.path_segment());
        let mut posts = Vec::new();
        let mut after: Option<String> = None;

        while posts.len() < limit {
            let page = (limit - posts.len()).min(PAGE_SIZE);
            let mut query = vec![("limit", page.to_string()), ("raw_json", "1".to_string())];
            if let Some(t) = mode.time_filter() {
                query.push(("t", t.to_string()));
            }
            if let Some(ref cursor) = after {
                query.push(("after", cursor.clone()));
            }

            let body = self.get_with_retry(&url, &query).await?;
            let (batch, next) = parse_listing(&body, source)?;
            debug!("r/{}: page of {} posts", source, batch.len());

            if batch.is_empty() {
                break;
            }
            posts.extend(batch);

            match next {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        posts.truncate(limit);
        Ok(posts)
    }
}

/// Check that `name` is a bare subreddit name, safe to place in a URL path.
pub fn validate_source(name: &str) -> Result<(), FetchError> {
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(FetchError::InvalidSource(name.to_string()))
    }
}

/// Parse a listing page into records and the next-page cursor.
fn parse_listing(body: &str, source: &str) -> Result<(Vec<PostRecord>, Option<String>), FetchError> {
    let listing: Listing = serde_json::from_str(body)
        .map_err(|e| FetchError::Parse(format!("listing for {}: {}", source, e)))?;

    let records = listing
        .data
        .children
        .into_iter()
        .map(|child| {
            let raw = child.data;
            let permalink = if raw.permalink.starts_with('/') {
                format!("{}{}", PERMALINK_BASE, raw.permalink)
            } else {
                raw.permalink
            };
            PostRecord {
                id: raw.id,
                source: if raw.subreddit.is_empty() {
                    source.to_string()
                } else {
                    raw.subreddit
                },
                timestamp: raw.created_utc,
                title: raw.title,
                permalink,
            }
        })
        .collect();

    Ok((records, listing.data.after.filter(|a| !a.is_empty())))
}

/// Delay before retry number `attempt` (1-based).
///
/// `min(base * 2^(attempt-1), 30s)` plus 0-250ms of jitter.
fn backoff_delay(base: Duration, attempt: usize) -> Duration {
    let exp = attempt.saturating_sub(1).min(16) as u32;
    let delay = base.saturating_mul(1 << exp).min(MAX_BACKOFF);
    let jitter_ms: u64 = rng().random_range(0..=250);
    delay + Duration::from_millis(jitter_ms)
}
