//! Typed search responses.

mod mapper;

pub(crate) use mapper::{map_response, map_scroll_page, map_suggest_response};

use std::collections::BTreeMap;
use std::ops::Index;

use serde::Deserialize;

use search_dsl_shared::{AggregationResult, Aggregations, Hit, HitsPage, SuggestEntry};

use crate::search::Search;

/// Shard accounting reported with every response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ShardStats {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub successful: u32,
    #[serde(default)]
    pub skipped: u32,
    #[serde(default)]
    pub failed: u32,
}

/// The typed result of executing a `Search`.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    search: Search,
    pub took: u64,
    pub timed_out: bool,
    pub shards: ShardStats,
    pub hits: HitsPage,
    pub aggregations: Aggregations,
    /// Suggestions returned alongside the hits, keyed by suggester name.
    pub suggestions: BTreeMap<String, Vec<SuggestEntry>>,
}

impl Response {
    /// The request that produced this response.
    pub fn search(&self) -> &Search {
        &self.search
    }

    /// True when no shard failed and the request did not time out.
    pub fn success(&self) -> bool {
        !self.timed_out && self.shards.failed == 0
    }

    pub fn hits(&self) -> &HitsPage {
        &self.hits
    }

    pub fn aggregation(&self, name: &str) -> Option<&AggregationResult> {
        self.aggregations.get(name)
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Hit> {
        self.hits.iter()
    }
}

impl Index<usize> for Response {
    type Output = Hit;

    fn index(&self, index: usize) -> &Hit {
        &self.hits[index]
    }
}

impl<'a> IntoIterator for &'a Response {
    type Item = &'a Hit;
    type IntoIter = std::slice::Iter<'a, Hit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

/// Result of a suggest-only request.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestResponse {
    pub took: u64,
    pub timed_out: bool,
    pub shards: ShardStats,
    pub suggestions: BTreeMap<String, Vec<SuggestEntry>>,
}

impl SuggestResponse {
    /// True when no shard failed and the request did not time out.
    pub fn success(&self) -> bool {
        !self.timed_out && self.shards.failed == 0
    }

    /// Entries of the suggester named `name`.
    pub fn get(&self, name: &str) -> Option<&[SuggestEntry]> {
        self.suggestions.get(name).map(Vec::as_slice)
    }
}
