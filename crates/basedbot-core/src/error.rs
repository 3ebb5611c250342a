//! Error types shared by forum clients and workers

use std::time::Duration;
use thiserror::Error;

/// Failure reported by a [`Forum`](crate::forum::Forum) implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForumError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited{}", .retry_after.map(|d| format!(" (retry after {}s)", d.as_secs())).unwrap_or_default())]
    RateLimited { retry_after: Option<Duration> },

    #[error("api error: {0}")]
    Api(String),

    #[error("malformed item: {0}")]
    Malformed(String),
}

/// Failure that ends one pass of a stream worker
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    #[error("failed to subscribe to stream: {0}")]
    Subscribe(#[source] ForumError),

    #[error("stream failed: {0}")]
    Stream(#[source] ForumError),

    #[error("failed to send reply: {0}")]
    Reply(#[source] ForumError),
}

impl WorkerError {
    /// The underlying forum error
    pub fn forum_error(&self) -> &ForumError {
        match self {
            Self::Subscribe(e) | Self::Stream(e) | Self::Reply(e) => e,
        }
    }
}
