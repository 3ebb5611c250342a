//! Listing and reply response bodies

use crate::error::RedditError;
use basedbot_core::StreamItem;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    name: String,
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct LinkData {
    name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
}

/// Parse a listing page into stream items, newest first as Reddit sends
/// them. Things other than comments and links are skipped.
pub fn parse_listing(body: &str) -> Result<Vec<StreamItem>, RedditError> {
    let listing: Listing = serde_json::from_str(body)?;
    let mut items = Vec::with_capacity(listing.data.children.len());

    for thing in listing.data.children {
        match thing.kind.as_str() {
            "t1" => {
                let c: CommentData = serde_json::from_value(thing.data)?;
                items.push(StreamItem::comment(c.name, c.body));
            }
            "t3" => {
                let l: LinkData = serde_json::from_value(thing.data)?;
                items.push(StreamItem::post(l.name, l.title, l.selftext));
            }
            other => debug!(kind = other, "skipping listing entry"),
        }
    }

    Ok(items)
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    json: ApiJson,
}

#[derive(Debug, Deserialize)]
struct ApiJson {
    #[serde(default)]
    errors: Vec<Vec<Value>>,
}

/// Check the body of an `api_type=json` call for reported errors
pub fn check_api_response(body: &str) -> Result<(), RedditError> {
    let response: ApiResponse = serde_json::from_str(body)?;
    let Some(first) = response.json.errors.into_iter().next() else {
        return Ok(());
    };

    let field = |i: usize| {
        first
            .get(i)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Err(RedditError::Api {
        code: field(0),
        message: field(1),
    })
}
