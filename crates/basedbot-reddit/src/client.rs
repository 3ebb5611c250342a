//! Reddit OAuth API client
//!
//! One client is shared by all workers. It is cheap to clone and safe to use
//! from several tasks at once: the HTTP pool is shared and the access token
//! sits behind an async `RwLock`.

use crate::auth::{AccessToken, TokenResponse};
use crate::config::{Credentials, StreamConfig};
use crate::error::RedditError;
use crate::listing::{check_api_response, parse_listing};
use crate::stream::{poll_stream, ListingSource};
use async_trait::async_trait;
use basedbot_core::{Forum, ForumError, ItemStream, StreamItem};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

pub const AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const API_BASE: &str = "https://oauth.reddit.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

struct Inner {
    http: reqwest::Client,
    credentials: Credentials,
    stream_config: StreamConfig,
    auth_url: String,
    api_base: String,
    token: RwLock<Option<AccessToken>>,
}

/// Authenticated Reddit client
#[derive(Clone)]
pub struct RedditClient {
    inner: Arc<Inner>,
}

impl RedditClient {
    /// Client for the public Reddit endpoints
    pub fn new(credentials: Credentials, stream_config: StreamConfig) -> Result<Self, RedditError> {
        Self::with_endpoints(credentials, stream_config, AUTH_URL, API_BASE)
    }

    /// Client for custom endpoints (e.g. a local test server)
    pub fn with_endpoints(
        credentials: Credentials,
        stream_config: StreamConfig,
        auth_url: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self, RedditError> {
        let http = reqwest::Client::builder()
            .user_agent(credentials.user_agent.clone())
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                credentials,
                stream_config,
                auth_url: auth_url.into(),
                api_base: api_base.into().trim_end_matches('/').to_string(),
                token: RwLock::new(None),
            }),
        })
    }

    /// Current bearer token, fetching a new one when missing or stale
    async fn bearer(&self) -> Result<String, RedditError> {
        if let Some(token) = self.inner.token.read().await.as_ref() {
            if token.is_fresh() {
                return Ok(token.value().to_string());
            }
        }

        let mut slot = self.inner.token.write().await;
        if let Some(token) = slot.as_ref() {
            if token.is_fresh() {
                return Ok(token.value().to_string());
            }
        }

        let token = self.fetch_token().await?;
        let value = token.value().to_string();
        *slot = Some(token);
        Ok(value)
    }

    async fn fetch_token(&self) -> Result<AccessToken, RedditError> {
        let creds = &self.inner.credentials;
        debug!(username = %creds.username, "requesting access token");

        let response = self
            .inner
            .http
            .post(&self.inner.auth_url)
            .basic_auth(&creds.client_id, Some(&creds.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", creds.username.as_str()),
                ("password", creds.password.as_str()),
            ])
            .send()
            .await?;

        let body = check_status(response).await?.text().await?;
        let token = serde_json::from_str::<TokenResponse>(&body)?.into_token()?;
        info!(username = %creds.username, "authenticated");
        Ok(token)
    }

    async fn forget_token(&self) {
        *self.inner.token.write().await = None;
    }

    /// Drop the cached token when the API rejected it, so the next call
    /// authenticates again
    async fn observe<T>(&self, result: Result<T, RedditError>) -> Result<T, RedditError> {
        if matches!(result, Err(RedditError::Unauthorized(_))) {
            self.forget_token().await;
        }
        result
    }

    /// Fetch the newest page of a listing
    pub async fn listing(&self, path: &str, limit: u32) -> Result<Vec<StreamItem>, RedditError> {
        let result = self.try_listing(path, limit).await;
        self.observe(result).await
    }

    async fn try_listing(&self, path: &str, limit: u32) -> Result<Vec<StreamItem>, RedditError> {
        let token = self.bearer().await?;
        let response = self
            .inner
            .http
            .get(format!("{}{}", self.inner.api_base, path))
            .bearer_auth(token)
            .query(&[("limit", limit), ("raw_json", 1)])
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;
        parse_listing(&body)
    }

    /// Post `text` as a reply to the thing named `thing_id`
    pub async fn comment(&self, thing_id: &str, text: &str) -> Result<(), RedditError> {
        let result = self.try_comment(thing_id, text).await;
        self.observe(result).await
    }

    async fn try_comment(&self, thing_id: &str, text: &str) -> Result<(), RedditError> {
        let token = self.bearer().await?;
        let response = self
            .inner
            .http
            .post(format!("{}/api/comment", self.inner.api_base))
            .bearer_auth(token)
            .form(&[("api_type", "json"), ("thing_id", thing_id), ("text", text)])
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;
        check_api_response(&body)
    }

    fn stream(&self, path: String) -> ItemStream {
        poll_stream(
            Arc::new(self.clone()),
            path,
            self.inner.stream_config.clone(),
        )
    }
}

#[async_trait]
impl ListingSource for RedditClient {
    async fn fetch(&self, path: &str, limit: u32) -> Result<Vec<StreamItem>, RedditError> {
        self.listing(path, limit).await
    }
}

#[async_trait]
impl Forum for RedditClient {
    async fn comment_stream(&self, forum: &str) -> Result<ItemStream, ForumError> {
        Ok(self.stream(format!("/r/{forum}/comments")))
    }

    async fn submission_stream(&self, forum: &str) -> Result<ItemStream, ForumError> {
        Ok(self.stream(format!("/r/{forum}/new")))
    }

    async fn reply(&self, item: &StreamItem, text: &str) -> Result<(), ForumError> {
        self.comment(item.id().as_str(), text)
            .await
            .map_err(ForumError::from)
    }
}

/// Map non-success statuses to errors
async fn check_status(response: Response) -> Result<Response, RedditError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            let body = response.text().await.unwrap_or_default();
            Err(RedditError::Unauthorized(format!("{status}: {body}")))
        }
        StatusCode::TOO_MANY_REQUESTS => Err(RedditError::RateLimited {
            retry_after: retry_after(response.headers()),
        }),
        _ => Err(RedditError::Status { status, url }),
    }
}

/// Seconds to wait, from `Retry-After` or Reddit's `x-ratelimit-reset`
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    [RETRY_AFTER.as_str(), "x-ratelimit-reset"]
        .iter()
        .find_map(|name| headers.get(*name)?.to_str().ok()?.trim().parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}
