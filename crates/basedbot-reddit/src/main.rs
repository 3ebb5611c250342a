//! basedbot
//!
//! Watches the live comment and post streams of one subreddit and answers
//! "based <word>" with "Based? Based on what?".
//!
//! Credentials are read from CLIENT_ID, CLIENT_SECRET, USER_AGENT, USERNAME
//! and PASSWORD. Runs until Ctrl-C or SIGTERM.

use anyhow::{Context, Result};
use basedbot_core::WorkerConfig;
use basedbot_reddit::logging::init_logging;
use basedbot_reddit::{spawn_workers, Credentials, RedditClient, ShutdownSignal, StreamConfig};
use basedbot_supervisor::{Supervisor, SupervisorConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const SUBREDDIT: &str = "4chan";

#[tokio::main]
async fn main() -> Result<()> {
    init_logging().context("failed to open log file")?;

    let credentials = Credentials::from_env().inspect_err(|e| error!(error = %e, "bad configuration"))?;
    let client = Arc::new(RedditClient::new(credentials, StreamConfig::default())?);

    let mut shutdown = ShutdownSignal::install().context("failed to install signal handlers")?;
    let mut supervisor = Supervisor::new(SupervisorConfig::default(), CancellationToken::new());

    info!(subreddit = SUBREDDIT, "starting workers");
    spawn_workers(&mut supervisor, client, SUBREDDIT, &WorkerConfig::default())?;

    let signal = shutdown
        .recv()
        .await
        .context("failed to listen for shutdown signal")?;
    info!(signal, "shutting down");
    supervisor.shutdown().await;

    Ok(())
}
