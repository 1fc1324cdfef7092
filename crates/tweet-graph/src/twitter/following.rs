//! Following-list accumulator.

use serde::Serialize;

use crate::normalize::decode_users;

use super::paginator::PageConsumer;
use super::types::{RawPage, UserRecord};

/// Accounts followed by one user, gathered across pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FollowingList {
    /// Followed accounts in API order.
    pub users: Vec<UserRecord>,
    /// Items that could not be decoded.
    #[serde(skip)]
    pub skipped_items: usize,
}

impl FollowingList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of the followed accounts.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.users.iter().map(|user| user.id.as_str())
    }
}

impl PageConsumer for FollowingList {
    fn consume(&mut self, page: &RawPage) -> usize {
        let Some(items) = page.data.as_deref() else {
            return 0;
        };
        let users = decode_users(items, &mut self.skipped_items);
        let added = users.len();
        self.users.extend(users);
        added
    }

    fn rows(&self) -> usize {
        self.users.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collects_users_from_data() {
        let page: RawPage = serde_json::from_value(json!({
            "data": [
                { "id": "2244994945", "name": "Twitter Dev", "username": "TwitterDev" },
                { "name": "missing id" },
                { "id": 783214, "username": "Twitter" }
            ],
            "meta": { "result_count": 3, "next_token": "DFEDBNRFT3MHCZZZ" }
        }))
        .unwrap();

        let mut list = FollowingList::new();
        assert_eq!(list.consume(&page), 2);
        assert_eq!(list.skipped_items, 1);
        assert_eq!(list.ids().collect::<Vec<_>>(), vec!["2244994945", "783214"]);
        assert_eq!(list.users[0].username.as_deref(), Some("TwitterDev"));
        assert_eq!(list.consume(&RawPage::default()), 0);
    }
}
