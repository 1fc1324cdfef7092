//! Twitter v2 response documents and the normalized row types built from them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One response page as returned by a v2 list/search endpoint.
///
/// Item records stay untyped so a single malformed item never fails the
/// whole page; the normalizer decodes them one by one. Keys this crate does
/// not model (`errors`, `newest_id`, ...) are kept in `extra` so archived
/// pages round-trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPage {
    /// Primary items (tweets for search, users for following).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Value>>,
    /// Side tables attached by expansions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<Includes>,
    /// Page metadata with the continuation token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
    /// Any other top-level keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawPage {
    /// Continuation token for the next page, if any.
    #[must_use]
    pub fn next_token(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|meta| meta.next_token.as_deref())
    }

    /// `meta.result_count`, zero when `meta` is absent.
    #[must_use]
    pub fn result_count(&self) -> u64 {
        self.meta.as_ref().map_or(0, |meta| meta.result_count)
    }
}

/// The `includes` object of a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Includes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweets: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `meta` object of a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub result_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Render an id in canonical decimal form.
///
/// Numeric ids lose whitespace, signs and leading zeros; anything else is
/// kept trimmed. Empty input means "no id".
#[must_use]
pub fn canonical_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<u64>() {
        Ok(n) => Some(n.to_string()),
        Err(_) => Some(trimmed.to_string()),
    }
}

/// Ids arrive as strings from the API but as numbers from some exports.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(u64),
}

impl WireId {
    fn canonical(self) -> Option<String> {
        match self {
            Self::Text(s) => canonical_id(&s),
            Self::Number(n) => Some(n.to_string()),
        }
    }
}

fn required_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    WireId::deserialize(deserializer)?
        .canonical()
        .ok_or_else(|| serde::de::Error::custom("empty id"))
}

fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<WireId>::deserialize(deserializer)?.and_then(WireId::canonical))
}

// --- Wire records (decoded per item) ---

#[derive(Debug, Deserialize)]
pub(crate) struct WireTweet {
    #[serde(deserialize_with = "required_id")]
    pub id: String,
    #[serde(default, deserialize_with = "optional_id")]
    pub author_id: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub conversation_id: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub in_reply_to_user_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub public_metrics: Option<TweetMetrics>,
    /// Kept raw: entries are projected leniently, one by one.
    #[serde(default)]
    pub referenced_tweets: Option<Value>,
    #[serde(default)]
    pub entities: Option<Value>,
    #[serde(default)]
    pub attachments: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TweetMetrics {
    #[serde(default)]
    pub retweet_count: Option<u64>,
    #[serde(default)]
    pub reply_count: Option<u64>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub quote_count: Option<u64>,
}

/// One `{type, id}` entry of `referenced_tweets`.
#[derive(Debug, Deserialize)]
pub(crate) struct WireReference {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "required_id")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireUser {
    #[serde(deserialize_with = "required_id")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub public_metrics: Option<UserMetrics>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserMetrics {
    #[serde(default)]
    pub followers_count: Option<u64>,
    #[serde(default)]
    pub following_count: Option<u64>,
    #[serde(default)]
    pub tweet_count: Option<u64>,
    #[serde(default)]
    pub listed_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireMedia {
    pub media_key: String,
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

// --- Normalized rows ---

/// A tweet row with flattened metrics and projected references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweetRecord {
    pub id: String,
    pub author_id: Option<String>,
    pub conversation_id: Option<String>,
    pub in_reply_to_user_id: Option<String>,
    pub text: Option<String>,
    pub created_at: Option<String>,
    pub retweet_count: Option<u64>,
    pub reply_count: Option<u64>,
    pub like_count: Option<u64>,
    pub quote_count: Option<u64>,
    /// Raw `entities`; only the classifier looks inside.
    pub entities: Option<Value>,
    /// Keys from `attachments.media_keys`, joinable to [`MediaRecord::media_key`].
    #[serde(default)]
    pub media_keys: Vec<String>,
    pub replied_to: Option<String>,
    pub quoted: Option<String>,
    pub retweeted: Option<String>,
}

/// A user row with flattened metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub verified: bool,
    pub followers_count: Option<u64>,
    pub following_count: Option<u64>,
    pub tweet_count: Option<u64>,
    pub listed_count: Option<u64>,
}

/// A media attachment row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub media_key: String,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub url: Option<String>,
}

/// Mechanism behind an interaction edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionType {
    Retweet,
    Quote,
    Reply,
    Mention,
}

impl InteractionType {
    /// Stable numeric code used by downstream network tooling.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Retweet => 1,
            Self::Quote => 2,
            Self::Reply => 3,
            Self::Mention => 4,
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Retweet => "RETWEET",
            Self::Quote => "QUOTE",
            Self::Reply => "REPLY",
            Self::Mention => "MENTION",
        };
        f.write_str(name)
    }
}

/// Directed edge "src acted upon / mentioned tar via tweet".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEdge {
    pub src_user_id: String,
    pub tar_user_id: String,
    pub tweet_id: String,
    pub rtype: InteractionType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_id() {
        assert_eq!(canonical_id(" 00123 "), Some("123".to_string()));
        assert_eq!(canonical_id("1350000000000000000"), Some("1350000000000000000".to_string()));
        assert_eq!(canonical_id("abc"), Some("abc".to_string()));
        assert_eq!(canonical_id("   "), None);
    }

    #[test]
    fn test_numeric_ids_are_canonicalized() {
        let tweet: WireTweet = serde_json::from_value(json!({
            "id": 42,
            "author_id": "007",
            "in_reply_to_user_id": ""
        }))
        .unwrap();
        assert_eq!(tweet.id, "42");
        assert_eq!(tweet.author_id.as_deref(), Some("7"));
        assert!(tweet.in_reply_to_user_id.is_none());
    }

    #[test]
    fn test_empty_required_id_is_rejected() {
        let result = serde_json::from_value::<WireUser>(json!({ "id": "" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_page_keeps_unknown_keys() {
        let raw = json!({
            "data": [],
            "meta": { "result_count": 0, "newest_id": "9" },
            "errors": [{ "title": "Not Found Error" }]
        });
        let page: RawPage = serde_json::from_value(raw.clone()).unwrap();
        assert!(page.extra.contains_key("errors"));
        assert_eq!(page.result_count(), 0);
        assert!(page.next_token().is_none());
        assert_eq!(serde_json::to_value(&page).unwrap(), raw);
    }

    #[test]
    fn test_interaction_type_codes() {
        assert_eq!(InteractionType::Retweet.code(), 1);
        assert_eq!(InteractionType::Mention.code(), 4);
        assert_eq!(InteractionType::Quote.to_string(), "QUOTE");
        assert_eq!(
            serde_json::to_value(InteractionType::Reply).unwrap(),
            json!("REPLY")
        );
    }
}
