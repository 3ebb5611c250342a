//! Stream workers
//!
//! A worker subscribes to one live stream, evaluates every item with the
//! [`Matcher`] and replies to matches. Items are handled strictly one at a
//! time, in delivery order. A failure ends the current pass; restarting is
//! the caller's job (see `basedbot-supervisor`).

use crate::error::{ForumError, WorkerError};
use crate::forum::Forum;
use crate::item::{StreamItem, WorkerIdentity, REPLY_TEXT};
use crate::predicate::{Matcher, TitleScan};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What to do when a reply cannot be sent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplyFailurePolicy {
    /// End the pass with [`WorkerError::Reply`], like any stream failure
    #[default]
    Propagate,
    /// Log the failure and keep consuming the stream
    Skip,
}

/// Configuration for a stream worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Text posted in reply to every matched item
    pub reply_text: String,

    /// How post titles are scanned
    pub title_scan: TitleScan,

    /// Reaction to a failed reply
    pub reply_failure: ReplyFailurePolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            reply_text: REPLY_TEXT.to_string(),
            title_scan: TitleScan::default(),
            reply_failure: ReplyFailurePolicy::default(),
        }
    }
}

/// Counters kept across passes of one worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    seen: AtomicU64,
    matched: AtomicU64,
    replied: AtomicU64,
    reply_failures: AtomicU64,
}

impl WorkerStats {
    pub fn seen(&self) -> u64 {
        self.seen.load(Ordering::Relaxed)
    }

    pub fn matched(&self) -> u64 {
        self.matched.load(Ordering::Relaxed)
    }

    pub fn replied(&self) -> u64 {
        self.replied.load(Ordering::Relaxed)
    }

    pub fn reply_failures(&self) -> u64 {
        self.reply_failures.load(Ordering::Relaxed)
    }
}

/// Consumes one live stream of a forum
pub struct StreamWorker<F: ?Sized> {
    identity: WorkerIdentity,
    forum: Arc<F>,
    config: WorkerConfig,
    matcher: Matcher,
    stats: Arc<WorkerStats>,
}

impl<F: Forum + ?Sized> StreamWorker<F> {
    /// Create a worker with the default configuration
    pub fn new(identity: WorkerIdentity, forum: Arc<F>) -> Self {
        Self::with_config(identity, forum, WorkerConfig::default())
    }

    /// Create a worker with a custom configuration
    pub fn with_config(identity: WorkerIdentity, forum: Arc<F>, config: WorkerConfig) -> Self {
        Self {
            matcher: Matcher::new(config.title_scan),
            identity,
            forum,
            config,
            stats: Arc::new(WorkerStats::default()),
        }
    }

    pub fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    pub fn stats(&self) -> Arc<WorkerStats> {
        self.stats.clone()
    }

    /// Run one pass: subscribe, then handle items until the stream ends,
    /// `cancel` fires, or something fails.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<(), WorkerError> {
        let worker = self.identity.name();
        let forum = self.identity.forum();

        info!(worker, forum, "subscribing to {} stream", self.identity.kind());
        let mut stream = self
            .forum
            .subscribe(self.identity.kind(), forum)
            .await
            .map_err(WorkerError::Subscribe)?;

        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            let next = tokio::select! {
                () = cancel.cancelled() => return Ok(()),
                next = stream.next() => next,
            };

            let Some(item) = next else {
                warn!(worker, forum, "stream ended");
                return Ok(());
            };

            let item = item.map_err(WorkerError::Stream)?;
            self.handle(&item).await?;
        }
    }

    /// Evaluate a single item and reply if it matches. Returns whether a
    /// reply was sent.
    pub async fn handle(&self, item: &StreamItem) -> Result<bool, WorkerError> {
        let worker = self.identity.name();

        if item.kind() != self.identity.kind() {
            return Err(WorkerError::Stream(ForumError::Malformed(format!(
                "{} delivered on the {} stream",
                item,
                self.identity.kind()
            ))));
        }

        self.stats.seen.fetch_add(1, Ordering::Relaxed);
        debug!(worker, item = %item.id(), "evaluating {:?}", item.summary());

        if !self.matcher.matches(item) {
            debug!(worker, item = %item.id(), "ignored");
            return Ok(false);
        }
        self.stats.matched.fetch_add(1, Ordering::Relaxed);

        match self.forum.reply(item, &self.config.reply_text).await {
            Ok(()) => {
                self.stats.replied.fetch_add(1, Ordering::Relaxed);
                info!(worker, item = %item.id(), "replied to {:?}", item.summary());
                Ok(true)
            }
            Err(e) => {
                self.stats.reply_failures.fetch_add(1, Ordering::Relaxed);
                match self.config.reply_failure {
                    ReplyFailurePolicy::Propagate => Err(WorkerError::Reply(e)),
                    ReplyFailurePolicy::Skip => {
                        warn!(worker, item = %item.id(), error = %e, "reply failed, skipping");
                        Ok(false)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forum::MemoryForum;
    use crate::item::StreamKind;

    #[tokio::test]
    async fn test_handle_rejects_wrong_kind() {
        let forum = Arc::new(MemoryForum::new());
        let worker = StreamWorker::new(WorkerIdentity::new(StreamKind::Comments, "test"), forum);

        let err = worker
            .handle(&StreamItem::post("t3_a", "based af", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Stream(ForumError::Malformed(_))));
        assert_eq!(worker.stats().seen(), 0);
    }

    #[tokio::test]
    async fn test_run_returns_when_already_cancelled() {
        let forum = Arc::new(MemoryForum::new());
        let worker = StreamWorker::new(WorkerIdentity::new(StreamKind::Comments, "test"), forum);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(worker.run(&cancel).await.is_ok());
    }
}
