//! Process configuration
//!
//! Credentials come from the environment; stream tuning has defaults.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {0} is empty")]
    Empty(&'static str),
}

/// Reddit script-app credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub const CLIENT_ID: &'static str = "CLIENT_ID";
    pub const CLIENT_SECRET: &'static str = "CLIENT_SECRET";
    pub const USER_AGENT: &'static str = "USER_AGENT";
    pub const USERNAME: &'static str = "USERNAME";
    pub const PASSWORD: &'static str = "PASSWORD";

    /// Read all five values from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read all five values through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name: &'static str| match lookup(name) {
            None => Err(ConfigError::Missing(name)),
            Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(name)),
            Some(value) => Ok(value),
        };

        Ok(Self {
            client_id: require(Self::CLIENT_ID)?,
            client_secret: require(Self::CLIENT_SECRET)?,
            user_agent: require(Self::USER_AGENT)?,
            username: require(Self::USERNAME)?,
            password: require(Self::PASSWORD)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Polling behaviour of live streams
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Items requested per listing page (Reddit caps this at 100)
    pub page_size: u32,

    /// Delay after the first poll that found nothing new
    pub min_delay: Duration,

    /// Upper bound for the idle delay, which doubles per empty poll
    pub max_delay: Duration,

    /// Drop the items already present when the stream is opened
    pub skip_existing: bool,

    /// How many recent item names are remembered for deduplication
    pub seen_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(16),
            skip_existing: false,
            seen_capacity: 301,
        }
    }
}
