//! Aggregation request tree.
//!
//! An aggregation is a named node of a given kind with child aggregations.
//! The result tree produced by response mapping has exactly the same names
//! and nesting (see [`crate::aggregation_result`]).


use serde_json::{json, Map, Value};

use crate::query::Query;
use crate::sort::Sort;

/// A named aggregation with its sub-aggregations.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub name: String,
    pub kind: AggregationKind,
    pub children: Vec<Aggregation>,
}

/// Aggregation kinds understood by the builder and the result mapper.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationKind {
    /// One bucket per distinct field value.
    Terms { field: String, size: Option<u64> },
    /// Fixed-width numeric buckets.
    Histogram { field: String, interval: f64 },
    /// Calendar-aligned date buckets.
    DateHistogram {
        field: String,
        calendar_interval: String,
    },
    /// Single bucket holding documents matching the query.
    Filter(Query),
    /// One named bucket per query, in declaration order.
    Filters(Vec<(String, Query)>),
    Avg { field: String },
    Sum { field: String },
    Min { field: String },
    Max { field: String },
    Cardinality { field: String },
    ValueCount { field: String },
    /// count/min/max/avg/sum over a numeric field.
    Stats { field: String },
    /// The top matching documents of the enclosing bucket.
    TopHits { size: Option<u64>, sort: Vec<Sort> },
}

/// How the backend lays out the result of an aggregation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    BucketList,
    KeyedBuckets,
    SingleBucket,
    Value,
    Stats,
    TopHits,
}

impl AggregationKind {
    /// Name of the kind in the query DSL.
    pub fn dsl_name(&self) -> &'static str {
        match self {
            AggregationKind::Terms { .. } => "terms",
            AggregationKind::Histogram { .. } => "histogram",
            AggregationKind::DateHistogram { .. } => "date_histogram",
            AggregationKind::Filter(_) => "filter",
            AggregationKind::Filters(_) => "filters",
            AggregationKind::Avg { .. } => "avg",
            AggregationKind::Sum { .. } => "sum",
            AggregationKind::Min { .. } => "min",
            AggregationKind::Max { .. } => "max",
            AggregationKind::Cardinality { .. } => "cardinality",
            AggregationKind::ValueCount { .. } => "value_count",
            AggregationKind::Stats { .. } => "stats",
            AggregationKind::TopHits { .. } => "top_hits",
        }
    }

    pub fn result_shape(&self) -> ResultShape {
        match self {
            AggregationKind::Terms { .. }
            | AggregationKind::Histogram { .. }
            | AggregationKind::DateHistogram { .. } => ResultShape::BucketList,
            AggregationKind::Filters(_) => ResultShape::KeyedBuckets,
            AggregationKind::Filter(_) => ResultShape::SingleBucket,
            AggregationKind::Stats { .. } => ResultShape::Stats,
            AggregationKind::TopHits { .. } => ResultShape::TopHits,
            AggregationKind::Avg { .. }
            | AggregationKind::Sum { .. }
            | AggregationKind::Min { .. }
            | AggregationKind::Max { .. }
            | AggregationKind::Cardinality { .. }
            | AggregationKind::ValueCount { .. } => ResultShape::Value,
        }
    }

    /// Bucket aggregations group documents and may carry children.
    pub fn is_bucket(&self) -> bool {
        matches!(
            self.result_shape(),
            ResultShape::BucketList | ResultShape::KeyedBuckets | ResultShape::SingleBucket
        )
    }

    fn params(&self) -> Value {
        match self {
            AggregationKind::Terms { field, size } => {
                let mut params = json!({ "field": field });
                if let Some(size) = size {
                    params["size"] = json!(size);
                }
                params
            }
            AggregationKind::Histogram { field, interval } => {
                json!({ "field": field, "interval": interval })
            }
            AggregationKind::DateHistogram {
                field,
                calendar_interval,
            } => json!({ "field": field, "calendar_interval": calendar_interval }),
            AggregationKind::Filter(query) => query.to_json(),
            AggregationKind::Filters(filters) => {
                let keyed: Map<String, Value> = filters
                    .iter()
                    .map(|(key, query)| (key.clone(), query.to_json()))
                    .collect();
                json!({ "filters": keyed })
            }
            AggregationKind::Avg { field }
            | AggregationKind::Sum { field }
            | AggregationKind::Min { field }
            | AggregationKind::Max { field }
            | AggregationKind::Cardinality { field }
            | AggregationKind::ValueCount { field }
            | AggregationKind::Stats { field } => json!({ "field": field }),
            AggregationKind::TopHits { size, sort } => {
                let mut params = Map::new();
                if let Some(size) = size {
                    params.insert("size".to_string(), json!(size));
                }
                if !sort.is_empty() {
                    params.insert(
                        "sort".to_string(),
                        Value::Array(sort.iter().map(Sort::to_json).collect()),
                    );
                }
                Value::Object(params)
            }
        }
    }
}

impl Aggregation {
    pub fn new(name: impl Into<String>, kind: AggregationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn terms(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(
            name,
            AggregationKind::Terms {
                field: field.into(),
                size: None,
            },
        )
    }

    pub fn histogram(name: impl Into<String>, field: impl Into<String>, interval: f64) -> Self {
        Self::new(
            name,
            AggregationKind::Histogram {
                field: field.into(),
                interval,
            },
        )
    }

    pub fn date_histogram(
        name: impl Into<String>,
        field: impl Into<String>,
        calendar_interval: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            AggregationKind::DateHistogram {
                field: field.into(),
                calendar_interval: calendar_interval.into(),
            },
        )
    }

    pub fn filter(name: impl Into<String>, query: Query) -> Self {
        Self::new(name, AggregationKind::Filter(query))
    }

    /// Named filter buckets, e.g. `{"yes": q, "no": !q}`.
    pub fn filters<K: Into<String>>(
        name: impl Into<String>,
        filters: impl IntoIterator<Item = (K, Query)>,
    ) -> Self {
        Self::new(
            name,
            AggregationKind::Filters(
                filters
                    .into_iter()
                    .map(|(key, query)| (key.into(), query))
                    .collect(),
            ),
        )
    }

    pub fn avg(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(
            name,
            AggregationKind::Avg {
                field: field.into(),
            },
        )
    }

    pub fn sum(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(
            name,
            AggregationKind::Sum {
                field: field.into(),
            },
        )
    }

    pub fn min(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(
            name,
            AggregationKind::Min {
                field: field.into(),
            },
        )
    }

    pub fn max(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(
            name,
            AggregationKind::Max {
                field: field.into(),
            },
        )
    }

    pub fn cardinality(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(
            name,
            AggregationKind::Cardinality {
                field: field.into(),
            },
        )
    }

    pub fn value_count(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(
            name,
            AggregationKind::ValueCount {
                field: field.into(),
            },
        )
    }

    pub fn stats(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(
            name,
            AggregationKind::Stats {
                field: field.into(),
            },
        )
    }

    pub fn top_hits(name: impl Into<String>, size: u64) -> Self {
        Self::new(
            name,
            AggregationKind::TopHits {
                size: Some(size),
                sort: Vec::new(),
            },
        )
    }

    /// Limit the number of buckets (terms) or hits (top_hits).
    ///
    /// Other kinds are returned unchanged.
    pub fn size(mut self, limit: u64) -> Self {
        match &mut self.kind {
            AggregationKind::Terms { size, .. } | AggregationKind::TopHits { size, .. } => {
                *size = Some(limit)
            }
            _ => {}
        }
        self
    }

    /// Sort the hits of a top_hits aggregation.
    pub fn sort(mut self, key: Sort) -> Self {
        if let AggregationKind::TopHits { sort, .. } = &mut self.kind {
            sort.push(key);
        }
        self
    }

    /// Nest a bucket aggregation under this one.
    pub fn bucket(mut self, child: Aggregation) -> Self {
        self.children.push(child);
        self
    }

    /// Nest a metric aggregation under this one.
    pub fn metric(mut self, child: Aggregation) -> Self {
        self.children.push(child);
        self
    }

    /// The aggregation body, without its name.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert(self.kind.dsl_name().to_string(), self.kind.params());
        if !self.children.is_empty() {
            body.insert("aggs".to_string(), Self::tree_to_json(&self.children));
        }
        Value::Object(body)
    }

    /// Render a list of sibling aggregations as a name-keyed object.
    pub fn tree_to_json(aggregations: &[Aggregation]) -> Value {
        let tree: Map<String, Value> = aggregations
            .iter()
            .map(|agg| (agg.name.clone(), agg.to_json()))
            .collect();
        Value::Object(tree)
    }
}
