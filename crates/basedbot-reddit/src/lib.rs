//! basedbot Reddit integration
//!
//! Everything that knows about Reddit and about running the process:
//! - OAuth password-grant authentication with token refresh
//! - Live comment/submission streams built by polling listings
//! - Replies through the comment endpoint
//! - Credential loading, logging setup, shutdown signals and worker wiring

pub mod auth;
pub mod bot;
pub mod client;
pub mod config;
pub mod error;
pub mod listing;
pub mod logging;
pub mod signal;
pub mod stream;

pub use bot::spawn_workers;
pub use client::RedditClient;
pub use config::{ConfigError, Credentials, StreamConfig};
pub use error::RedditError;
pub use signal::ShutdownSignal;
