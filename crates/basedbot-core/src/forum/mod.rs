//! The forum the bot talks to
//!
//! Workers only need two capabilities: subscribe to a live stream of items
//! and reply to an item. Implementations are shared between workers, so they
//! must be safe for concurrent use.

pub mod memory;

pub use memory::MemoryForum;

use crate::error::ForumError;
use crate::item::{StreamItem, StreamKind};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Lazy, endless stream of items. Not restartable: subscribe again instead.
pub type ItemStream = BoxStream<'static, Result<StreamItem, ForumError>>;

/// Forum collaborator used by stream workers
#[async_trait]
pub trait Forum: Send + Sync {
    /// Subscribe to new comments posted in `forum`
    async fn comment_stream(&self, forum: &str) -> Result<ItemStream, ForumError>;

    /// Subscribe to new posts submitted to `forum`
    async fn submission_stream(&self, forum: &str) -> Result<ItemStream, ForumError>;

    /// Post `text` as a reply to `item`
    async fn reply(&self, item: &StreamItem, text: &str) -> Result<(), ForumError>;

    /// Subscribe to the stream of the given kind
    async fn subscribe(&self, kind: StreamKind, forum: &str) -> Result<ItemStream, ForumError> {
        match kind {
            StreamKind::Comments => self.comment_stream(forum).await,
            StreamKind::Submissions => self.submission_stream(forum).await,
        }
    }
}
