//! Topic filtering for change subscribers
//!
//! Every subscriber shares one broadcast channel; the filter decides which
//! change records a subscriber actually sees. Topics are collections.

use shared::message::{ChangeRecord, Collection};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicFilter {
    /// `None` = every collection
    topics: Option<HashSet<Collection>>,
}

impl TopicFilter {
    pub fn all() -> Self {
        Self { topics: None }
    }

    pub fn topics(topics: impl IntoIterator<Item = Collection>) -> Self {
        Self {
            topics: Some(topics.into_iter().collect()),
        }
    }

    pub fn matches(&self, record: &ChangeRecord) -> bool {
        match &self.topics {
            None => true,
            Some(topics) => topics.contains(&record.collection),
        }
    }
}

impl From<Collection> for TopicFilter {
    fn from(collection: Collection) -> Self {
        Self::topics([collection])
    }
}
