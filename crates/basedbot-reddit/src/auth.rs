//! OAuth access tokens (password grant)

use crate::error::RedditError;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Refresh this long before the token actually expires
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Upper bound on the lifetime the server may grant
const MAX_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// A bearer token and when it stops being valid
#[derive(Debug, Clone)]
pub struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    /// Token valid for `lifetime`, capped at a day
    pub fn new(value: impl Into<String>, lifetime: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now
            .checked_add(lifetime.min(MAX_LIFETIME))
            .unwrap_or(now);
        Self {
            value: value.into(),
            expires_at,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Still usable, with room to spare for the request about to be made
    pub fn is_fresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN < self.expires_at
    }
}

/// Body returned by the token endpoint. Reddit reports bad credentials with
/// a 200 status and an `error` field.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<u64>,
    pub error: Option<String>,
}

impl TokenResponse {
    pub fn into_token(self) -> Result<AccessToken, RedditError> {
        if let Some(error) = self.error {
            return Err(RedditError::Unauthorized(error));
        }
        let value = self
            .access_token
            .ok_or_else(|| RedditError::Unauthorized("no access_token in response".into()))?;
        let lifetime = Duration::from_secs(self.expires_in.unwrap_or(3600));
        Ok(AccessToken::new(value, lifetime))
    }
}
