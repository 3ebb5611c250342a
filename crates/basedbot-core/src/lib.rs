//! basedbot Core
//!
//! The pieces of the bot that do not care which forum they talk to:
//! - Stream items (comments and posts) and worker identities
//! - The "based [non-preposition]" match predicate
//! - The `Forum` collaborator trait and an in-memory implementation
//! - Stream workers that consume one live stream and reply on a match

pub mod error;
pub mod forum;
pub mod item;
pub mod predicate;
pub mod worker;

pub use error::{ForumError, WorkerError};
pub use forum::{Forum, ItemStream, MemoryForum};
pub use item::{Comment, ItemId, Post, StreamItem, StreamKind, WorkerIdentity, REPLY_TEXT};
pub use predicate::{is_based, is_post_based, Matcher, TitleScan};
pub use worker::{ReplyFailurePolicy, StreamWorker, WorkerConfig, WorkerStats};
