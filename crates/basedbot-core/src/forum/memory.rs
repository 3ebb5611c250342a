//! In-memory forum for testing and development

use crate::error::ForumError;
use crate::forum::{Forum, ItemStream};
use crate::item::{ItemId, StreamItem, StreamKind};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

enum Delivery {
    Item(Result<StreamItem, ForumError>),
    End,
}

/// One live stream. Every subscription reads from the same queue, so a
/// resubscribed stream continues where the previous one stopped.
struct Feed {
    tx: mpsc::UnboundedSender<Delivery>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Delivery>>>,
}

impl Feed {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    fn push(&self, delivery: Delivery) {
        // The receiver lives as long as the feed itself
        let _ = self.tx.send(delivery);
    }

    fn stream(&self) -> ItemStream {
        let rx = self.rx.clone();
        Box::pin(futures::stream::unfold(rx, |rx| async move {
            let next = rx.lock().await.recv().await;
            match next {
                Some(Delivery::Item(item)) => Some((item, rx)),
                Some(Delivery::End) | None => None,
            }
        }))
    }
}

/// A reply recorded by [`MemoryForum`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReply {
    pub item: ItemId,
    pub text: String,
}

/// In-memory forum (non-persistent)
///
/// Items and stream failures are pushed by the caller; replies are recorded.
pub struct MemoryForum {
    comments: Feed,
    submissions: Feed,
    replies: Mutex<Vec<SentReply>>,
    reply_failures: Mutex<VecDeque<ForumError>>,
    subscribe_failures: Mutex<VecDeque<ForumError>>,
    subscriptions: Mutex<Vec<(StreamKind, String)>>,
}

impl MemoryForum {
    /// Create an empty in-memory forum
    pub fn new() -> Self {
        Self {
            comments: Feed::new(),
            submissions: Feed::new(),
            replies: Mutex::new(Vec::new()),
            reply_failures: Mutex::new(VecDeque::new()),
            subscribe_failures: Mutex::new(VecDeque::new()),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    fn feed(&self, kind: StreamKind) -> &Feed {
        match kind {
            StreamKind::Comments => &self.comments,
            StreamKind::Submissions => &self.submissions,
        }
    }

    /// Deliver an item on the stream matching its kind
    pub fn publish(&self, item: StreamItem) {
        self.feed(item.kind()).push(Delivery::Item(Ok(item)));
    }

    /// Make the stream of `kind` yield an error at this point
    pub fn fail_stream(&self, kind: StreamKind, error: ForumError) {
        self.feed(kind).push(Delivery::Item(Err(error)));
    }

    /// End the current subscription to the stream of `kind`
    pub fn end_stream(&self, kind: StreamKind) {
        self.feed(kind).push(Delivery::End);
    }

    /// Fail the next reply attempt with `error`
    pub async fn fail_next_reply(&self, error: ForumError) {
        self.reply_failures.lock().await.push_back(error);
    }

    /// Fail the next subscription attempt with `error`
    pub async fn fail_next_subscribe(&self, error: ForumError) {
        self.subscribe_failures.lock().await.push_back(error);
    }

    /// Replies sent so far, in order
    pub async fn replies(&self) -> Vec<SentReply> {
        self.replies.lock().await.clone()
    }

    /// Successful subscriptions so far, in order
    pub async fn subscriptions(&self) -> Vec<(StreamKind, String)> {
        self.subscriptions.lock().await.clone()
    }

    async fn open(&self, kind: StreamKind, forum: &str) -> Result<ItemStream, ForumError> {
        if let Some(error) = self.subscribe_failures.lock().await.pop_front() {
            return Err(error);
        }
        self.subscriptions
            .lock()
            .await
            .push((kind, forum.to_string()));
        Ok(self.feed(kind).stream())
    }
}

impl Default for MemoryForum {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Forum for MemoryForum {
    async fn comment_stream(&self, forum: &str) -> Result<ItemStream, ForumError> {
        self.open(StreamKind::Comments, forum).await
    }

    async fn submission_stream(&self, forum: &str) -> Result<ItemStream, ForumError> {
        self.open(StreamKind::Submissions, forum).await
    }

    async fn reply(&self, item: &StreamItem, text: &str) -> Result<(), ForumError> {
        if let Some(error) = self.reply_failures.lock().await.pop_front() {
            return Err(error);
        }
        self.replies.lock().await.push(SentReply {
            item: item.id().clone(),
            text: text.to_string(),
        });
        Ok(())
    }
}
