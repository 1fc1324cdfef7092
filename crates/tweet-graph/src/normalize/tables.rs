//! Owned accumulator for normalized tables.

use serde::Serialize;

use crate::twitter::{
    InteractionEdge, MediaRecord, PageConsumer, RawPage, TweetRecord, UserRecord,
};

use super::normalizer::{normalize, NormalizedPage};

/// Tables accumulated across pages. Rows are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tables {
    pub tweets: Vec<TweetRecord>,
    pub users: Vec<UserRecord>,
    pub media: Vec<MediaRecord>,
    pub referenced: Vec<TweetRecord>,
    pub edges: Vec<InteractionEdge>,
}

/// Row counts per table, for logging and summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub tweets: usize,
    pub users: usize,
    pub media: usize,
    pub referenced: usize,
    pub edges: usize,
}

impl Tables {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the rows of one normalized page.
    pub fn append(&mut self, page: NormalizedPage) {
        self.tweets.extend(page.tweets);
        self.users.extend(page.users);
        self.media.extend(page.media);
        self.referenced.extend(page.referenced);
        self.edges.extend(page.edges);
    }

    #[must_use]
    pub fn counts(&self) -> TableCounts {
        TableCounts {
            tweets: self.tweets.len(),
            users: self.users.len(),
            media: self.media.len(),
            referenced: self.referenced.len(),
            edges: self.edges.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts() == TableCounts::default()
    }
}

impl PageConsumer for Tables {
    fn consume(&mut self, page: &RawPage) -> usize {
        let normalized = normalize(page);
        let rows = normalized.tweets.len();
        self.append(normalized);
        rows
    }

    fn rows(&self) -> usize {
        self.tweets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(ids: &[&str]) -> RawPage {
        let data: Vec<_> = ids
            .iter()
            .map(|id| json!({ "id": id, "author_id": "1", "entities": { "mentions": [{ "id": "2" }] } }))
            .collect();
        serde_json::from_value(json!({
            "data": data,
            "includes": { "users": [{ "id": "1" }] },
            "meta": { "result_count": ids.len() }
        }))
        .unwrap()
    }

    #[test]
    fn test_tables_only_grow() {
        let mut tables = Tables::new();
        tables.append(normalize(&page(&["1", "2"])));
        tables.append(normalize(&page(&["3"])));
        let ids: Vec<_> = tables.tweets.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(
            tables.counts(),
            TableCounts {
                tweets: 3,
                users: 2,
                media: 0,
                referenced: 0,
                edges: 3,
            }
        );
    }

    #[test]
    fn test_consume_reports_rows() {
        let mut tables = Tables::new();
        assert!(tables.is_empty());
        assert_eq!(tables.consume(&page(&["1", "2"])), 2);
        assert_eq!(tables.rows(), 2);
        assert_eq!(tables.consume(&page(&["9"])), 1);
        assert_eq!(tables.tweets.last().map(|t| t.id.as_str()), Some("9"));
    }
}
