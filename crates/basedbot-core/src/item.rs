//! Items delivered by live forum streams
//!
//! Items are transient: received once, evaluated once, then dropped.

use std::fmt;

/// Fixed reply sent to every matched item
pub const REPLY_TEXT: &str = "Based? Based on what?";

/// Forum-assigned identifier of an item (e.g. a Reddit fullname like `t1_abc`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A comment from the live comment stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: ItemId,
    pub body: String,
}

/// A post from the live submission stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: ItemId,
    pub title: String,
    /// Self text; empty for link posts
    pub body: String,
}

/// One item received from a live stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    Comment(Comment),
    Post(Post),
}

impl StreamItem {
    /// Convenience constructor for a comment
    pub fn comment(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Comment(Comment {
            id: ItemId::new(id),
            body: body.into(),
        })
    }

    /// Convenience constructor for a post
    pub fn post(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Post(Post {
            id: ItemId::new(id),
            title: title.into(),
            body: body.into(),
        })
    }

    pub fn id(&self) -> &ItemId {
        match self {
            Self::Comment(c) => &c.id,
            Self::Post(p) => &p.id,
        }
    }

    /// The stream this kind of item comes from
    pub fn kind(&self) -> StreamKind {
        match self {
            Self::Comment(_) => StreamKind::Comments,
            Self::Post(_) => StreamKind::Submissions,
        }
    }

    /// Short text used in log lines: the comment body or the post title
    pub fn summary(&self) -> &str {
        match self {
            Self::Comment(c) => &c.body,
            Self::Post(p) => &p.title,
        }
    }
}

impl fmt::Display for StreamItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comment(c) => write!(f, "comment {} ({:?})", c.id, c.body),
            Self::Post(p) => write!(f, "post {} ({:?})", p.id, p.title),
        }
    }
}

/// Which live stream a worker consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Comments,
    Submissions,
}

impl StreamKind {
    /// Worker name used in logs and supervisor child names
    pub fn worker_name(self) -> &'static str {
        match self {
            Self::Comments => "comments",
            Self::Submissions => "posts",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.worker_name())
    }
}

/// Name and target forum of a worker, fixed for the process lifetime
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkerIdentity {
    name: String,
    kind: StreamKind,
    forum: String,
}

impl WorkerIdentity {
    /// Identity named after the stream kind (`comments` or `posts`)
    pub fn new(kind: StreamKind, forum: impl Into<String>) -> Self {
        Self {
            name: kind.worker_name().to_string(),
            kind,
            forum: forum.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn forum(&self) -> &str {
        &self.forum
    }
}

impl fmt::Display for WorkerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@r/{}", self.name, self.forum)
    }
}
