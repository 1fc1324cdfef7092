//! Response normalizer: one raw page in, typed tables out.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use crate::twitter::types::{WireMedia, WireReference, WireTweet, WireUser};
use crate::twitter::{InteractionEdge, MediaRecord, RawPage, TweetRecord, UserRecord};

use super::classifier::{classify, AuthorIndex, AuthorLookup};

/// A response section that was absent and replaced by an empty table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingSection {
    /// `data`
    Data,
    /// `includes.users`
    Users,
    /// `includes.media`
    Media,
    /// `includes.tweets`
    ReferencedTweets,
}

impl fmt::Display for MissingSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            Self::Data => "data",
            Self::Users => "includes.users",
            Self::Media => "includes.media",
            Self::ReferencedTweets => "includes.tweets",
        };
        f.write_str(key)
    }
}

/// Tables built from one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedPage {
    /// Tweets from `data`.
    pub tweets: Vec<TweetRecord>,
    /// Users from `includes.users`.
    pub users: Vec<UserRecord>,
    /// Media from `includes.media`.
    pub media: Vec<MediaRecord>,
    /// Tweets from `includes.tweets`.
    pub referenced: Vec<TweetRecord>,
    /// Edges derived from every tweet in `tweets`.
    pub edges: Vec<InteractionEdge>,
    /// Sections that were absent from the page.
    pub missing: Vec<MissingSection>,
    /// Items that could not be decoded and were dropped.
    pub skipped_items: usize,
}

/// Normalize a page. Pure: the page is only read and no state is kept.
#[must_use]
pub fn normalize(page: &RawPage) -> NormalizedPage {
    let mut out = NormalizedPage::default();
    let includes = page.includes.as_ref();

    if let Some(items) = section(page.data.as_deref(), MissingSection::Data, &mut out.missing) {
        out.tweets = decode_items(items, tweet_record, &mut out.skipped_items);
    }
    if let Some(items) = section(
        includes.and_then(|i| i.users.as_deref()),
        MissingSection::Users,
        &mut out.missing,
    ) {
        out.users = decode_items(items, user_record, &mut out.skipped_items);
    }
    if let Some(items) = section(
        includes.and_then(|i| i.media.as_deref()),
        MissingSection::Media,
        &mut out.missing,
    ) {
        out.media = decode_items(items, media_record, &mut out.skipped_items);
    }
    if let Some(items) = section(
        includes.and_then(|i| i.tweets.as_deref()),
        MissingSection::ReferencedTweets,
        &mut out.missing,
    ) {
        out.referenced = decode_items(items, tweet_record, &mut out.skipped_items);
    }

    out.edges = interaction_edges(&out.tweets, &out.referenced);
    out
}

/// Edges for every primary tweet, resolving targets via `[referenced, primary]`.
#[must_use]
pub fn interaction_edges(
    tweets: &[TweetRecord],
    referenced: &[TweetRecord],
) -> Vec<InteractionEdge> {
    let lookup = AuthorLookup::new(vec![AuthorIndex::new(referenced), AuthorIndex::new(tweets)]);
    tweets
        .iter()
        .flat_map(|tweet| classify(tweet, &lookup))
        .collect()
}

fn section<'a>(
    items: Option<&'a [Value]>,
    kind: MissingSection,
    missing: &mut Vec<MissingSection>,
) -> Option<&'a [Value]> {
    if items.is_none() {
        tracing::info!(section = %kind, "Response has no such section, using an empty table");
        missing.push(kind);
    }
    items
}

fn decode_items<W, R>(items: &[Value], convert: fn(W) -> R, skipped: &mut usize) -> Vec<R>
where
    W: DeserializeOwned,
{
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        match W::deserialize(item) {
            Ok(wire) => rows.push(convert(wire)),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping undecodable item");
                *skipped += 1;
            }
        }
    }
    rows
}

fn tweet_record(wire: WireTweet) -> TweetRecord {
    let metrics = wire.public_metrics.unwrap_or_default();
    let mut record = TweetRecord {
        id: wire.id,
        author_id: wire.author_id,
        conversation_id: wire.conversation_id,
        in_reply_to_user_id: wire.in_reply_to_user_id,
        text: wire.text,
        created_at: wire.created_at,
        retweet_count: metrics.retweet_count,
        reply_count: metrics.reply_count,
        like_count: metrics.like_count,
        quote_count: metrics.quote_count,
        entities: wire.entities,
        media_keys: media_keys(wire.attachments.as_ref()),
        replied_to: None,
        quoted: None,
        retweeted: None,
    };

    // Later entries of the same type overwrite earlier ones.
    let entries = wire
        .referenced_tweets
        .as_ref()
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for entry in entries {
        let Ok(reference) = WireReference::deserialize(entry) else {
            continue;
        };
        match reference.kind.as_str() {
            "replied_to" => record.replied_to = Some(reference.id),
            "quoted" => record.quoted = Some(reference.id),
            "retweeted" => record.retweeted = Some(reference.id),
            _ => {}
        }
    }

    record
}

/// Keys under `attachments.media_keys`; entries that are not strings are dropped.
fn media_keys(attachments: Option<&Value>) -> Vec<String> {
    attachments
        .and_then(|a| a.get("media_keys"))
        .and_then(Value::as_array)
        .map(|keys| {
            keys.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn user_record(wire: WireUser) -> UserRecord {
    let metrics = wire.public_metrics.unwrap_or_default();
    UserRecord {
        id: wire.id,
        username: wire.username,
        name: wire.name,
        location: wire.location,
        url: wire.url,
        verified: wire.verified.unwrap_or(false),
        followers_count: metrics.followers_count,
        following_count: metrics.following_count,
        tweet_count: metrics.tweet_count,
        listed_count: metrics.listed_count,
    }
}

fn media_record(wire: WireMedia) -> MediaRecord {
    MediaRecord {
        media_key: wire.media_key,
        media_type: wire.media_type,
        url: wire.url,
    }
}

/// Decode user items (for endpoints whose `data` holds users).
pub(crate) fn decode_users(items: &[Value], skipped: &mut usize) -> Vec<UserRecord> {
    decode_items(items, user_record, skipped)
}
