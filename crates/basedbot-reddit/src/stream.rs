//! Live streams built by polling listing endpoints
//!
//! Each poll fetches the newest page, drops items already seen and yields
//! the rest oldest first. When a poll finds nothing new the next one waits,
//! with the wait doubling up to `max_delay`; new items reset it.

use crate::config::StreamConfig;
use crate::error::RedditError;
use async_trait::async_trait;
use basedbot_core::{ForumError, ItemId, ItemStream, StreamItem};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Something that returns the newest page of a listing, newest first
#[async_trait]
pub trait ListingSource: Send + Sync + 'static {
    async fn fetch(&self, path: &str, limit: u32) -> Result<Vec<StreamItem>, RedditError>;
}

/// Insertion-ordered set that forgets its oldest entries past `capacity`
#[derive(Debug)]
pub struct BoundedSet {
    capacity: usize,
    order: VecDeque<ItemId>,
    members: HashSet<ItemId>,
}

impl BoundedSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
        }
    }

    /// Add `id`; returns false if it was already present
    pub fn insert(&mut self, id: ItemId) -> bool {
        if self.members.contains(&id) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        self.order.push_back(id.clone());
        self.members.insert(id);
        true
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Deduplication and pacing state of one subscription
#[derive(Debug)]
pub struct PollState {
    config: StreamConfig,
    seen: BoundedSet,
    pending: VecDeque<StreamItem>,
    delay: Option<Duration>,
    first_page: bool,
}

impl PollState {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            seen: BoundedSet::new(config.seen_capacity.max(1)),
            config,
            pending: VecDeque::new(),
            delay: None,
            first_page: true,
        }
    }

    /// Take in a page (newest first). Returns how many items were new.
    pub fn absorb(&mut self, page: Vec<StreamItem>) -> usize {
        let skip = self.first_page && self.config.skip_existing;
        self.first_page = false;

        let mut fresh = 0;
        for item in page.into_iter().rev() {
            if !self.seen.insert(item.id().clone()) {
                continue;
            }
            fresh += 1;
            if !skip {
                self.pending.push_back(item);
            }
        }

        self.delay = if fresh == 0 {
            Some(match self.delay {
                None => self.config.min_delay,
                Some(d) => (d * 2).min(self.config.max_delay),
            })
        } else {
            None
        };
        fresh
    }

    /// Next queued item, oldest first
    pub fn pop(&mut self) -> Option<StreamItem> {
        self.pending.pop_front()
    }

    /// How long to wait before the next poll
    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }
}

/// Build a live stream over `path` of `source`
pub fn poll_stream<S: ListingSource>(source: Arc<S>, path: String, config: StreamConfig) -> ItemStream {
    let limit = config.page_size;
    let state = PollState::new(config);

    Box::pin(futures::stream::unfold(
        (source, path, state),
        move |(source, path, mut state)| async move {
            loop {
                if let Some(item) = state.pop() {
                    return Some((Ok(item), (source, path, state)));
                }
                if let Some(delay) = state.delay() {
                    tokio::time::sleep(delay).await;
                }
                match source.fetch(&path, limit).await {
                    Ok(page) => {
                        let fresh = state.absorb(page);
                        trace!(path = %path, fresh, "polled listing");
                    }
                    Err(e) => {
                        let err: ForumError = e.into();
                        return Some((Err(err), (source, path, state)));
                    }
                }
            }
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::sync::Mutex;

    fn quick_config() -> StreamConfig {
        StreamConfig {
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            ..StreamConfig::default()
        }
    }

    fn comments(ids: &[&str]) -> Vec<StreamItem> {
        ids.iter().map(|id| StreamItem::comment(*id, "text")).collect()
    }

    struct ScriptedSource {
        pages: Mutex<VecDeque<Result<Vec<StreamItem>, RedditError>>>,
    }

    #[async_trait]
    impl ListingSource for ScriptedSource {
        async fn fetch(&self, _path: &str, _limit: u32) -> Result<Vec<StreamItem>, RedditError> {
            self.pages
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    #[test]
    fn test_bounded_set_forgets_oldest() {
        let mut set = BoundedSet::new(2);
        assert!(set.insert(ItemId::new("a")));
        assert!(!set.insert(ItemId::new("a")));
        assert!(set.insert(ItemId::new("b")));
        assert!(set.insert(ItemId::new("c")));
        assert_eq!(set.len(), 2);
        assert!(!set.contains(&ItemId::new("a")));
        assert!(set.contains(&ItemId::new("c")));
    }

    #[test]
    fn test_absorb_orders_oldest_first_and_dedups() {
        let mut state = PollState::new(quick_config());
        assert_eq!(state.absorb(comments(&["t1_3", "t1_2", "t1_1"])), 3);
        assert_eq!(state.absorb(comments(&["t1_4", "t1_3", "t1_2"])), 1);

        let order: Vec<_> = std::iter::from_fn(|| state.pop())
            .map(|i| i.id().to_string())
            .collect();
        assert_eq!(order, vec!["t1_1", "t1_2", "t1_3", "t1_4"]);
    }

    #[test]
    fn test_skip_existing_drops_first_page_only() {
        let mut state = PollState::new(StreamConfig {
            skip_existing: true,
            ..quick_config()
        });
        assert_eq!(state.absorb(comments(&["t1_2", "t1_1"])), 2);
        assert!(state.pop().is_none());

        state.absorb(comments(&["t1_3", "t1_2"]));
        assert_eq!(state.pop().unwrap().id().as_str(), "t1_3");
    }

    #[test]
    fn test_idle_delay_doubles_and_resets() {
        let mut state = PollState::new(quick_config());
        assert_eq!(state.delay(), None);
        state.absorb(Vec::new());
        assert_eq!(state.delay(), Some(Duration::from_millis(1)));
        state.absorb(Vec::new());
        assert_eq!(state.delay(), Some(Duration::from_millis(2)));
        state.absorb(Vec::new());
        state.absorb(Vec::new());
        assert_eq!(state.delay(), Some(Duration::from_millis(4)));
        state.absorb(comments(&["t1_1"]));
        assert_eq!(state.delay(), None);
    }

    #[tokio::test]
    async fn test_stream_yields_across_polls_then_errors() {
        let source = Arc::new(ScriptedSource {
            pages: Mutex::new(VecDeque::from([
                Ok(comments(&["t1_2", "t1_1"])),
                Ok(Vec::new()),
                Ok(comments(&["t1_3", "t1_2"])),
                Err(RedditError::Unauthorized("expired".into())),
            ])),
        });

        let mut stream = poll_stream(source, "/r/test/comments".into(), quick_config());
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(stream.next().await.unwrap().unwrap().id().to_string());
        }
        assert_eq!(ids, vec!["t1_1", "t1_2", "t1_3"]);

        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err, ForumError::Auth("expired".into()));
    }
}
