//! Reddit client errors

use basedbot_core::ForumError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RedditError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("reddit api error {code}: {message}")]
    Api { code: String, message: String },
}

impl From<RedditError> for ForumError {
    fn from(err: RedditError) -> Self {
        match err {
            RedditError::Http(e) if e.is_decode() => ForumError::Malformed(e.to_string()),
            RedditError::Http(e) => ForumError::Network(e.to_string()),
            RedditError::Status { .. } => ForumError::Network(err.to_string()),
            RedditError::Unauthorized(message) => ForumError::Auth(message),
            RedditError::RateLimited { retry_after } => ForumError::RateLimited { retry_after },
            RedditError::Decode(e) => ForumError::Malformed(e.to_string()),
            RedditError::Api { code, .. } if code == "RATELIMIT" => {
                ForumError::RateLimited { retry_after: None }
            }
            RedditError::Api { .. } => ForumError::Api(err.to_string()),
        }
    }
}
