//! Derives interaction edges from a single tweet row.
//!
//! Retweet and quote targets are resolved through an ordered chain of author
//! indexes. The API sometimes leaves a referenced tweet out of
//! `includes.tweets` while the same tweet sits in the page's own `data`, so
//! the chain is `[referenced, primary]` and the first hit wins.

use std::collections::HashMap;

use serde_json::Value;

use crate::twitter::{canonical_id, InteractionEdge, InteractionType, TweetRecord};

/// Tweet id -> author id over one tweet table.
#[derive(Debug, Default)]
pub struct AuthorIndex<'a> {
    authors: HashMap<&'a str, &'a str>,
}

impl<'a> AuthorIndex<'a> {
    /// Index a tweet table. On duplicate ids the first row wins.
    #[must_use]
    pub fn new(tweets: &'a [TweetRecord]) -> Self {
        let mut authors = HashMap::with_capacity(tweets.len());
        for tweet in tweets {
            if let Some(author) = tweet.author_id.as_deref() {
                authors.entry(tweet.id.as_str()).or_insert(author);
            }
        }
        Self { authors }
    }

    /// Author of `tweet_id`, if this table has it.
    #[must_use]
    pub fn author_of(&self, tweet_id: &str) -> Option<&'a str> {
        self.authors.get(tweet_id).copied()
    }
}

/// Ordered list of author sources, consulted front to back.
#[derive(Debug, Default)]
pub struct AuthorLookup<'a> {
    sources: Vec<AuthorIndex<'a>>,
}

impl<'a> AuthorLookup<'a> {
    #[must_use]
    pub fn new(sources: Vec<AuthorIndex<'a>>) -> Self {
        Self { sources }
    }

    /// Author of `tweet_id` from the first source that knows it.
    #[must_use]
    pub fn resolve(&self, tweet_id: &str) -> Option<&'a str> {
        self.sources
            .iter()
            .find_map(|source| source.author_of(tweet_id))
    }
}

/// Edges implied by `tweet`, in the order retweet, quote, reply, mentions.
///
/// Total over any input: a lookup miss or a missing/malformed field simply
/// produces no edge of that type.
#[must_use]
pub fn classify(tweet: &TweetRecord, lookup: &AuthorLookup<'_>) -> Vec<InteractionEdge> {
    let Some(author) = tweet.author_id.as_deref() else {
        return Vec::new();
    };

    let edge = |src: &str, tar: &str, rtype| InteractionEdge {
        src_user_id: src.to_string(),
        tar_user_id: tar.to_string(),
        tweet_id: tweet.id.clone(),
        rtype,
    };

    let mut edges = Vec::new();

    if let Some(original) = tweet.retweeted.as_deref().and_then(|id| lookup.resolve(id)) {
        edges.push(edge(original, author, InteractionType::Retweet));
    }

    if let Some(original) = tweet.quoted.as_deref().and_then(|id| lookup.resolve(id)) {
        edges.push(edge(original, author, InteractionType::Quote));
    }

    if let Some(replied) = tweet.in_reply_to_user_id.as_deref() {
        edges.push(edge(replied, author, InteractionType::Reply));
    }

    for mentioned in mentioned_ids(tweet.entities.as_ref()) {
        edges.push(edge(author, &mentioned, InteractionType::Mention));
    }

    edges
}

/// Ids in `entities.mentions`, in source order, duplicates kept.
fn mentioned_ids(entities: Option<&Value>) -> Vec<String> {
    entities
        .and_then(|entities| entities.get("mentions"))
        .and_then(Value::as_array)
        .map(|mentions| {
            mentions
                .iter()
                .filter_map(|mention| match mention.get("id")? {
                    Value::String(id) => canonical_id(id),
                    Value::Number(id) => canonical_id(&id.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
