//! Aggregation result tree.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::hit::HitsPage;

/// Result of one aggregation node.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationResult {
    /// Multi-bucket aggregation (terms, histograms, filters).
    Buckets(Buckets),
    /// Single-bucket aggregation (filter).
    Bucket(Bucket),
    /// Single-value metric; `None` when no document had the field.
    Value(Option<f64>),
    Stats(Stats),
    /// Embedded hits of a top_hits aggregation.
    TopHits(HitsPage),
}

impl AggregationResult {
    pub fn buckets(&self) -> Option<&Buckets> {
        match self {
            AggregationResult::Buckets(buckets) => Some(buckets),
            _ => None,
        }
    }

    pub fn bucket(&self) -> Option<&Bucket> {
        match self {
            AggregationResult::Bucket(bucket) => Some(bucket),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            AggregationResult::Value(value) => *value,
            _ => None,
        }
    }

    pub fn stats(&self) -> Option<&Stats> {
        match self {
            AggregationResult::Stats(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn top_hits(&self) -> Option<&HitsPage> {
        match self {
            AggregationResult::TopHits(page) => Some(page),
            _ => None,
        }
    }
}

/// Buckets of a multi-bucket aggregation, in backend order.
#[derive(Debug, Clone, PartialEq)]
pub enum Buckets {
    List(Vec<Bucket>),
    /// Named buckets, as returned by `filters` with named filters.
    Keyed(Vec<(String, Bucket)>),
}

impl Buckets {
    pub fn len(&self) -> usize {
        match self {
            Buckets::List(list) => list.len(),
            Buckets::Keyed(keyed) => keyed.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Positional access in backend order.
    pub fn get(&self, position: usize) -> Option<&Bucket> {
        match self {
            Buckets::List(list) => list.get(position),
            Buckets::Keyed(keyed) => keyed.get(position).map(|(_, bucket)| bucket),
        }
    }

    /// Lookup by bucket key (the filter name for keyed buckets).
    pub fn by_key(&self, key: &str) -> Option<&Bucket> {
        match self {
            Buckets::Keyed(keyed) => keyed
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, bucket)| bucket),
            Buckets::List(list) => list.iter().find(|bucket| bucket.key_str() == Some(key)),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &Bucket> + '_> {
        match self {
            Buckets::List(list) => Box::new(list.iter()),
            Buckets::Keyed(keyed) => Box::new(keyed.iter().map(|(_, bucket)| bucket)),
        }
    }
}

/// One bucket: its key, document count and nested aggregation results.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub key: Option<Value>,
    pub key_as_string: Option<String>,
    pub doc_count: u64,
    pub aggregations: Aggregations,
}

impl Bucket {
    /// Child aggregation result by name.
    pub fn get(&self, name: &str) -> Option<&AggregationResult> {
        self.aggregations.get(name)
    }

    /// String form of the key, preferring `key_as_string`.
    pub fn key_str(&self) -> Option<&str> {
        self.key_as_string
            .as_deref()
            .or_else(|| self.key.as_ref().and_then(Value::as_str))
    }
}

/// Result of a `stats` aggregation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Stats {
    pub count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub sum: Option<f64>,
}

/// Aggregation results keyed by the names used in the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregations(BTreeMap<String, AggregationResult>);

impl Aggregations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, result: AggregationResult) {
        self.0.insert(name.into(), result);
    }

    pub fn get(&self, name: &str) -> Option<&AggregationResult> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AggregationResult)> {
        self.0.iter().map(|(name, result)| (name.as_str(), result))
    }
}
