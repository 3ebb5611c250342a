//! The "based [non-preposition]" predicate
//!
//! A text matches when the word `based` is followed by another word that is
//! not one of the prepositions in [`PREPOSITIONS`]. "based af" matches,
//! "based on what" does not, and a trailing "based" never does.

use crate::item::StreamItem;

/// Words that turn "based" into an ordinary verb
pub const PREPOSITIONS: [&str; 3] = ["on", "off", "in"];

const TRIGGER: &str = "based";

/// How a post title is scanned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TitleScan {
    /// Title walked one character at a time, each position checked against
    /// the body's tokens. A single character never equals "based", so the
    /// title never matches on its own and posts match on their body only.
    #[default]
    Characters,
    /// Title scanned word by word, exactly like a comment body.
    Words,
}

/// True when `text` contains "based" followed by a non-preposition word.
///
/// Case-insensitive; words are split on whitespace. Empty text is `false`.
pub fn is_based(text: &str) -> bool {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    scan(&tokens, &tokens)
}

/// Post variant of [`is_based`]: title and body are scanned independently.
pub fn is_post_based(title: &str, body: &str, title_scan: TitleScan) -> bool {
    let body = body.to_lowercase();
    let body_tokens: Vec<&str> = body.split_whitespace().collect();

    let title = title.to_lowercase();
    let title_matches = match title_scan {
        TitleScan::Characters => {
            let chars: Vec<&str> = title
                .char_indices()
                .map(|(i, c)| &title[i..i + c.len_utf8()])
                .collect();
            scan(&chars, &body_tokens)
        }
        TitleScan::Words => {
            let tokens: Vec<&str> = title.split_whitespace().collect();
            scan(&tokens, &tokens)
        }
    };

    title_matches || scan(&body_tokens, &body_tokens)
}

/// Look for `based` in `units`; the word checked after a hit at position `i`
/// is `followers[i + 1]`.
fn scan(units: &[&str], followers: &[&str]) -> bool {
    units.iter().enumerate().any(|(i, unit)| {
        *unit == TRIGGER
            && followers
                .get(i + 1)
                .is_some_and(|next| !PREPOSITIONS.contains(next))
    })
}

/// Applies the predicate to whole stream items
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    title_scan: TitleScan,
}

impl Matcher {
    pub fn new(title_scan: TitleScan) -> Self {
        Self { title_scan }
    }

    pub fn title_scan(&self) -> TitleScan {
        self.title_scan
    }

    pub fn matches(&self, item: &StreamItem) -> bool {
        match item {
            StreamItem::Comment(comment) => is_based(&comment.body),
            StreamItem::Post(post) => is_post_based(&post.title, &post.body, self.title_scan),
        }
    }
}
