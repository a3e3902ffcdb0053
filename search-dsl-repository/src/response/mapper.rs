//! Mapping of raw backend JSON into typed responses.
//!
//! Aggregation results are read by walking the requested aggregation tree,
//! so every node is interpreted according to the kind that was asked for.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use search_dsl_shared::{
    Aggregation, AggregationResult, Aggregations, Bucket, Buckets, DocTypeRegistry, Hit, HitMeta,
    HitsPage, ResultShape, Stats, SuggestEntry, Total, TotalRelation,
};

use super::{Response, ShardStats, SuggestResponse};
use crate::errors::SearchError;
use crate::search::Search;

#[derive(Deserialize)]
struct RawResponse {
    #[serde(default)]
    took: u64,
    #[serde(default)]
    timed_out: bool,
    #[serde(default, rename = "_shards")]
    shards: ShardStats,
    hits: RawHits,
    #[serde(default)]
    aggregations: Option<Map<String, Value>>,
    #[serde(default)]
    suggest: BTreeMap<String, Vec<SuggestEntry>>,
}

#[derive(Deserialize)]
struct RawSuggestResponse {
    #[serde(default)]
    took: u64,
    #[serde(default)]
    timed_out: bool,
    #[serde(default, rename = "_shards")]
    shards: ShardStats,
    suggest: BTreeMap<String, Vec<SuggestEntry>>,
}

#[derive(Deserialize)]
struct RawScrollPage {
    #[serde(default, rename = "_scroll_id")]
    scroll_id: Option<String>,
    hits: RawHits,
}

#[derive(Deserialize)]
struct RawHits {
    #[serde(default)]
    total: Option<RawTotal>,
    #[serde(default)]
    max_score: Option<f64>,
    #[serde(default)]
    hits: Vec<RawHit>,
}

/// Older backends report a bare count, newer ones `{value, relation}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTotal {
    Count(u64),
    Object {
        value: u64,
        #[serde(default)]
        relation: Option<String>,
    },
}

impl From<RawTotal> for Total {
    fn from(raw: RawTotal) -> Self {
        match raw {
            RawTotal::Count(value) => Total::exact(value),
            RawTotal::Object { value, relation } => Total {
                value,
                relation: match relation.as_deref() {
                    Some("gte") => TotalRelation::Gte,
                    _ => TotalRelation::Eq,
                },
            },
        }
    }
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(default, rename = "_index")]
    index: String,
    #[serde(default, rename = "_type")]
    doc_type: Option<String>,
    #[serde(rename = "_id")]
    id: String,
    #[serde(default, rename = "_score")]
    score: Option<f64>,
    #[serde(default, rename = "_source")]
    source: Map<String, Value>,
    #[serde(default)]
    inner_hits: BTreeMap<String, RawInnerHits>,
}

#[derive(Deserialize)]
struct RawInnerHits {
    hits: RawHits,
}

fn decode<T: DeserializeOwned>(raw: &Value, what: &str) -> Result<T, SearchError> {
    T::deserialize(raw).map_err(|e| SearchError::parse(format!("Malformed {}: {}", what, e)))
}

/// Map a search response for `search`.
pub(crate) fn map_response(search: &Search, raw: &Value) -> Result<Response, SearchError> {
    let parsed: RawResponse = decode(raw, "search response")?;
    let request = search.request();

    let aggregations = match parsed.aggregations {
        Some(raw_aggs) => map_aggregations(&request.aggregations, &raw_aggs, &request.registry)?,
        None if request.aggregations.is_empty() => Aggregations::new(),
        None => {
            return Err(SearchError::parse(
                "Response has no aggregations but aggregations were requested",
            ))
        }
    };

    Ok(Response {
        search: search.detached(),
        took: parsed.took,
        timed_out: parsed.timed_out,
        shards: parsed.shards,
        hits: map_hits(parsed.hits, &request.registry, None),
        aggregations,
        suggestions: parsed.suggest,
    })
}

/// Map one scroll page into its scroll id and hits.
pub(crate) fn map_scroll_page(
    raw: &Value,
    registry: &DocTypeRegistry,
) -> Result<(Option<String>, HitsPage), SearchError> {
    let parsed: RawScrollPage = decode(raw, "scroll page")?;
    Ok((parsed.scroll_id, map_hits(parsed.hits, registry, None)))
}

pub(crate) fn map_suggest_response(raw: &Value) -> Result<SuggestResponse, SearchError> {
    let parsed: RawSuggestResponse = decode(raw, "suggest response")?;
    Ok(SuggestResponse {
        took: parsed.took,
        timed_out: parsed.timed_out,
        shards: parsed.shards,
        suggestions: parsed.suggest,
    })
}

/// `fallback_type` is used for hits that carry no `_type`, e.g. inner hits
/// keyed by a join relation name.
fn map_hits(raw: RawHits, registry: &DocTypeRegistry, fallback_type: Option<&str>) -> HitsPage {
    let total = raw
        .total
        .map(Total::from)
        .unwrap_or_else(|| Total::exact(raw.hits.len() as u64));

    HitsPage {
        total,
        max_score: raw.max_score,
        hits: raw
            .hits
            .into_iter()
            .map(|hit| map_hit(hit, registry, fallback_type))
            .collect(),
    }
}

fn map_hit(raw: RawHit, registry: &DocTypeRegistry, fallback_type: Option<&str>) -> Hit {
    let doc_type = raw
        .doc_type
        .or_else(|| fallback_type.map(str::to_string));
    let resolved = registry.resolve(doc_type.as_deref());

    let inner_hits = raw
        .inner_hits
        .into_iter()
        .map(|(relation, inner)| {
            let page = map_hits(inner.hits, registry, Some(relation.as_str()));
            (relation, page)
        })
        .collect();

    Hit::new(
        HitMeta {
            index: raw.index,
            doc_type,
            id: raw.id,
            score: raw.score,
            inner_hits,
        },
        raw.source,
        resolved,
    )
}

fn map_aggregations(
    requested: &[Aggregation],
    raw: &Map<String, Value>,
    registry: &DocTypeRegistry,
) -> Result<Aggregations, SearchError> {
    let mut results = Aggregations::new();
    for agg in requested {
        let value = raw
            .get(&agg.name)
            .ok_or_else(|| SearchError::parse(format!("Missing aggregation '{}'", agg.name)))?;
        results.insert(agg.name.clone(), map_aggregation(agg, value, registry)?);
    }
    Ok(results)
}

fn map_aggregation(
    agg: &Aggregation,
    raw: &Value,
    registry: &DocTypeRegistry,
) -> Result<AggregationResult, SearchError> {
    let result = match agg.kind.result_shape() {
        ResultShape::BucketList | ResultShape::KeyedBuckets => {
            AggregationResult::Buckets(map_buckets(agg, &raw["buckets"], registry)?)
        }
        ResultShape::SingleBucket => AggregationResult::Bucket(map_bucket(agg, raw, None, registry)?),
        ResultShape::Value => {
            let value = raw
                .get("value")
                .ok_or_else(|| SearchError::parse(format!("Aggregation '{}' has no value", agg.name)))?;
            AggregationResult::Value(value.as_f64())
        }
        ResultShape::Stats => AggregationResult::Stats(decode::<Stats>(raw, "stats aggregation")?),
        ResultShape::TopHits => {
            let hits: RawHits = decode(&raw["hits"], "top_hits aggregation")?;
            AggregationResult::TopHits(map_hits(hits, registry, None))
        }
    };
    Ok(result)
}

fn map_buckets(
    agg: &Aggregation,
    raw: &Value,
    registry: &DocTypeRegistry,
) -> Result<Buckets, SearchError> {
    match raw {
        Value::Array(items) => items
            .iter()
            .map(|item| map_bucket(agg, item, None, registry))
            .collect::<Result<Vec<_>, _>>()
            .map(Buckets::List),
        Value::Object(named) => named
            .iter()
            .map(|(key, item)| {
                let bucket = map_bucket(agg, item, Some(key.as_str()), registry)?;
                Ok((key.clone(), bucket))
            })
            .collect::<Result<Vec<_>, SearchError>>()
            .map(Buckets::Keyed),
        _ => Err(SearchError::parse(format!(
            "Aggregation '{}' has no buckets",
            agg.name
        ))),
    }
}

fn map_bucket(
    agg: &Aggregation,
    raw: &Value,
    name: Option<&str>,
    registry: &DocTypeRegistry,
) -> Result<Bucket, SearchError> {
    let fields = raw
        .as_object()
        .ok_or_else(|| SearchError::parse(format!("Malformed bucket in '{}'", agg.name)))?;
    let doc_count = fields
        .get("doc_count")
        .and_then(Value::as_u64)
        .ok_or_else(|| SearchError::parse(format!("Bucket in '{}' has no doc_count", agg.name)))?;

    Ok(Bucket {
        key: fields.get("key").cloned().or_else(|| name.map(|n| json!(n))),
        key_as_string: fields
            .get("key_as_string")
            .and_then(Value::as_str)
            .map(str::to_string),
        doc_count,
        aggregations: map_aggregations(&agg.children, fields, registry)?,
    })
}
