//! In-memory backend holding a small `git` index.
//!
//! The index stores one repository and its commits. The transport evaluates
//! the subset of the query DSL the end-to-end tests use, runs scroll cursors
//! and answers multi-search requests. Unknown indices fail the way the real
//! backend does.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;

use search_dsl::repository::{ClientConfig, SearchClient, SearchError, SearchTransport};
use search_dsl::shared::Document;

pub const INDEX: &str = "git";
pub const REPO_ID: &str = "elasticsearch-dsl-py";
pub const COMMIT_COUNT: usize = 52;
/// Commits touching the test package.
pub const TESTED_COMMITS: usize = 35;
/// Largest `stats.lines` among tested commits.
pub const MAX_TESTED_LINES: u64 = 228;

#[derive(Debug, Deserialize)]
pub struct Repository {
    pub organization: String,
    pub description: String,
    pub created_at: String,
    pub tags: Vec<String>,
}

impl Document for Repository {
    const INDEX: &'static str = "git";
    const DOC_TYPE: &'static str = "repos";
}

#[derive(Debug, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CommitStats {
    pub lines: u64,
    pub files: u64,
}

#[derive(Debug, Deserialize)]
pub struct Commit {
    pub author: Author,
    pub committed_date: String,
    pub description: String,
    pub files: Vec<String>,
    pub stats: CommitStats,
}

impl Document for Commit {
    const INDEX: &'static str = "git";
    const DOC_TYPE: &'static str = "commits";
}

#[derive(Debug, Clone)]
struct StoredDoc {
    doc_type: String,
    id: String,
    parent: Option<String>,
    source: Value,
}

impl StoredDoc {
    fn hit(&self, inner_hits: &Map<String, Value>) -> Value {
        let mut hit = json!({
            "_index": INDEX,
            "_type": self.doc_type,
            "_id": self.id,
            "_score": 1.0,
            "_source": self.source,
        });
        if !inner_hits.is_empty() {
            hit["inner_hits"] = Value::Object(inner_hits.clone());
        }
        hit
    }

    /// Values of `field`; arrays are flattened and `.raw` subfields read the
    /// underlying field.
    fn values(&self, field: &str) -> Vec<Value> {
        match field {
            "_type" => vec![json!(self.doc_type)],
            "_id" => vec![json!(self.id)],
            _ => {
                let path = field.strip_suffix(".raw").unwrap_or(field);
                let mut current = &self.source;
                for part in path.split('.') {
                    match current.get(part) {
                        Some(value) => current = value,
                        None => return Vec::new(),
                    }
                }
                match current {
                    Value::Array(items) => items.clone(),
                    Value::Null => Vec::new(),
                    other => vec![other.clone()],
                }
            }
        }
    }

    fn numbers(&self, field: &str) -> Vec<f64> {
        self.values(field).iter().filter_map(Value::as_f64).collect()
    }
}

/// Ids of every commit in the fixture, in index order.
pub fn commit_ids() -> Vec<String> {
    (0..COMMIT_COUNT).map(commit_id).collect()
}

fn commit_id(position: usize) -> String {
    format!("{:040x}", (position as u128 + 1) * 0x9e37_79b9_7f4a_7c15)
}

fn dataset() -> Vec<StoredDoc> {
    let mut docs = vec![StoredDoc {
        doc_type: "repos".to_string(),
        id: REPO_ID.to_string(),
        parent: None,
        source: json!({
            "organization": "elasticsearch",
            "description": "High level Python client for Elasticsearch",
            "created_at": "2014-03-03",
            "tags": ["search", "python", "client"],
        }),
    }];

    for position in 0..COMMIT_COUNT {
        let tested = position < TESTED_COMMITS;
        let lines = match position {
            7 => MAX_TESTED_LINES,
            p if tested => (p as u64 * 13) % 200 + 1,
            p => 300 + p as u64,
        };
        let changed_files = if tested { 4 } else { 2 };
        let files = if tested {
            json!([
                "elasticsearch_dsl",
                "elasticsearch_dsl/search.py",
                "test_elasticsearch_dsl",
                "test_elasticsearch_dsl/test_search.py",
            ])
        } else {
            json!(["elasticsearch_dsl", "elasticsearch_dsl/query.py"])
        };

        docs.push(StoredDoc {
            doc_type: "commits".to_string(),
            id: commit_id(position),
            parent: Some(REPO_ID.to_string()),
            source: json!({
                "author": { "name": "Honza Král", "email": "honza.kral@gmail.com" },
                "committed_date": format!("2014-05-{:02}T12:00:00", position % 28 + 1),
                "description": format!("Commit number {}", position),
                "files": files,
                "stats": { "lines": lines, "files": changed_files },
            }),
        });
    }
    docs
}

fn index_not_found(index: &str) -> Value {
    json!({
        "error": {
            "type": "index_not_found_exception",
            "reason": format!("no such index [{}]", index),
            "index": index,
        },
        "status": 404,
    })
}

/// First `(key, value)` of a single-entry DSL object like `{"term": {...}}`.
fn single_entry(value: &Value) -> Option<(&str, &Value)> {
    value
        .as_object()
        .and_then(|object| object.iter().next())
        .map(|(key, value)| (key.as_str(), value))
}

fn clauses(params: &Value, name: &str) -> Vec<Value> {
    match params.get(name) {
        Some(Value::Array(items)) => items.clone(),
        Some(single) => vec![single.clone()],
        None => Vec::new(),
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut current = vec![i + 1];
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current.push(substitution.min(previous[j + 1] + 1).min(current[j] + 1));
        }
        previous = current;
    }
    previous[b.len()]
}

struct Cursor {
    page_size: usize,
    total: usize,
    remaining: Vec<Value>,
}

/// Transport over the fixture dataset.
pub struct FixtureTransport {
    docs: Vec<StoredDoc>,
    cursors: Mutex<HashMap<String, Cursor>>,
    next_cursor: Mutex<u64>,
    pub searches: Mutex<usize>,
    pub msearches: Mutex<usize>,
    pub cleared: Mutex<Vec<String>>,
}

impl FixtureTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            docs: dataset(),
            cursors: Mutex::new(HashMap::new()),
            next_cursor: Mutex::new(0),
            searches: Mutex::new(0),
            msearches: Mutex::new(0),
            cleared: Mutex::new(Vec::new()),
        })
    }

    pub async fn search_count(&self) -> usize {
        *self.searches.lock().await
    }

    pub async fn open_cursors(&self) -> usize {
        self.cursors.lock().await.len()
    }

    fn check_indices(indices: &[String]) -> Result<(), Value> {
        match indices.iter().find(|index| index.as_str() != INDEX) {
            Some(missing) => Err(index_not_found(missing)),
            None => Ok(()),
        }
    }

    fn find(&self, doc_type: &str, id: &str) -> Option<&StoredDoc> {
        self.docs
            .iter()
            .find(|doc| doc.doc_type == doc_type && doc.id == id)
    }

    fn eval(&self, doc: &StoredDoc, query: &Value, inner_hits: &mut Map<String, Value>) -> bool {
        let Some((kind, params)) = single_entry(query) else {
            return true;
        };

        match kind {
            "match_all" => true,
            "match_none" => false,
            "term" => match single_entry(params) {
                Some((field, value)) => {
                    let value = value.get("value").unwrap_or(value);
                    doc.values(field).contains(value)
                }
                None => false,
            },
            "terms" => match single_entry(params) {
                Some((field, Value::Array(wanted))) => {
                    let values = doc.values(field);
                    wanted.iter().any(|value| values.contains(value))
                }
                _ => false,
            },
            "match" => match single_entry(params) {
                Some((field, text)) => {
                    let text = text.as_str().unwrap_or_default().to_lowercase();
                    doc.values(field).iter().filter_map(Value::as_str).any(|value| {
                        let value = value.to_lowercase();
                        text.split_whitespace().any(|word| value.contains(word))
                    })
                }
                None => false,
            },
            "exists" => params["field"]
                .as_str()
                .is_some_and(|field| !doc.values(field).is_empty()),
            "bool" => {
                let must = clauses(params, "must");
                let filter = clauses(params, "filter");
                let should = clauses(params, "should");
                let must_not = clauses(params, "must_not");

                if !must.iter().chain(&filter).all(|q| self.eval(doc, q, inner_hits)) {
                    return false;
                }
                let mut discarded = Map::new();
                if must_not.iter().any(|q| self.eval(doc, q, &mut discarded)) {
                    return false;
                }

                let minimum = params["minimum_should_match"].as_u64().unwrap_or(
                    if must.is_empty() && filter.is_empty() && !should.is_empty() {
                        1
                    } else {
                        0
                    },
                ) as usize;
                let matched = should
                    .iter()
                    .filter(|q| self.eval(doc, q, inner_hits))
                    .count();
                matched >= minimum
            }
            "has_parent" => {
                let parent_type = params["parent_type"].as_str().unwrap_or_default();
                let parent = doc
                    .parent
                    .as_deref()
                    .and_then(|id| self.find(parent_type, id));
                let Some(parent) = parent else {
                    return false;
                };
                if !self.eval(parent, &params["query"], &mut Map::new()) {
                    return false;
                }
                if params.get("inner_hits").is_some() {
                    inner_hits.insert(
                        parent_type.to_string(),
                        json!({ "hits": { "total": 1, "max_score": 1.0, "hits": [parent.hit(&Map::new())] } }),
                    );
                }
                true
            }
            "has_child" => {
                let child_type = params["type"].as_str().unwrap_or_default();
                let children: Vec<Value> = self
                    .docs
                    .iter()
                    .filter(|child| {
                        child.doc_type == child_type
                            && child.parent.as_deref() == Some(doc.id.as_str())
                            && self.eval(child, &params["query"], &mut Map::new())
                    })
                    .map(|child| child.hit(&Map::new()))
                    .collect();
                if children.is_empty() {
                    return false;
                }
                if params.get("inner_hits").is_some() {
                    let size = params["inner_hits"]["size"].as_u64().unwrap_or(3) as usize;
                    let total = children.len();
                    let page: Vec<Value> = children.into_iter().take(size).collect();
                    inner_hits.insert(
                        child_type.to_string(),
                        json!({ "hits": { "total": total, "max_score": 1.0, "hits": page } }),
                    );
                }
                true
            }
            _ => false,
        }
    }

    /// Matching documents in index order with their inner hits.
    fn matching(&self, query: &Value) -> Vec<(&StoredDoc, Map<String, Value>)> {
        self.docs
            .iter()
            .filter_map(|doc| {
                let mut inner_hits = Map::new();
                self.eval(doc, query, &mut inner_hits)
                    .then_some((doc, inner_hits))
            })
            .collect()
    }

    fn bucket(&self, docs: &[&StoredDoc], children: Option<&Map<String, Value>>) -> Map<String, Value> {
        let mut bucket = Map::new();
        bucket.insert("doc_count".to_string(), json!(docs.len()));
        if let Some(children) = children {
            bucket.extend(self.aggregate(children, docs));
        }
        bucket
    }

    fn aggregate(&self, aggs: &Map<String, Value>, docs: &[&StoredDoc]) -> Map<String, Value> {
        let mut results = Map::new();
        for (name, definition) in aggs {
            let children = definition.get("aggs").and_then(Value::as_object);
            let Some((kind, params)) = definition
                .as_object()
                .and_then(|object| object.iter().find(|(key, _)| key.as_str() != "aggs"))
            else {
                continue;
            };
            let field = params["field"].as_str().unwrap_or_default();

            let result = match kind.as_str() {
                "terms" => {
                    let size = params["size"].as_u64().unwrap_or(10) as usize;
                    let mut groups: BTreeMap<String, (Value, Vec<&StoredDoc>)> = BTreeMap::new();
                    for &doc in docs {
                        for value in doc.values(field) {
                            let key = value.to_string();
                            groups.entry(key).or_insert_with(|| (value, Vec::new())).1.push(doc);
                        }
                    }
                    let mut groups: Vec<(Value, Vec<&StoredDoc>)> = groups.into_values().collect();
                    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

                    let buckets: Vec<Value> = groups
                        .into_iter()
                        .take(size)
                        .map(|(key, members)| {
                            let mut bucket = self.bucket(&members, children);
                            bucket.insert("key".to_string(), key);
                            Value::Object(bucket)
                        })
                        .collect();
                    json!({ "doc_count_error_upper_bound": 0, "sum_other_doc_count": 0, "buckets": buckets })
                }
                "filters" => {
                    let filters = params["filters"].as_object().cloned().unwrap_or_default();
                    let buckets: Map<String, Value> = filters
                        .iter()
                        .map(|(key, query)| {
                            let members: Vec<&StoredDoc> = docs
                                .iter()
                                .copied()
                                .filter(|doc| self.eval(doc, query, &mut Map::new()))
                                .collect();
                            (key.clone(), Value::Object(self.bucket(&members, children)))
                        })
                        .collect();
                    json!({ "buckets": buckets })
                }
                "filter" => {
                    let members: Vec<&StoredDoc> = docs
                        .iter()
                        .copied()
                        .filter(|doc| self.eval(doc, params, &mut Map::new()))
                        .collect();
                    Value::Object(self.bucket(&members, children))
                }
                "stats" => {
                    let values: Vec<f64> = docs.iter().flat_map(|doc| doc.numbers(field)).collect();
                    if values.is_empty() {
                        json!({ "count": 0, "min": null, "max": null, "avg": null, "sum": 0.0 })
                    } else {
                        let sum: f64 = values.iter().sum();
                        json!({
                            "count": values.len(),
                            "min": values.iter().cloned().fold(f64::INFINITY, f64::min),
                            "max": values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                            "avg": sum / values.len() as f64,
                            "sum": sum,
                        })
                    }
                }
                "avg" | "sum" | "min" | "max" => {
                    let values: Vec<f64> = docs.iter().flat_map(|doc| doc.numbers(field)).collect();
                    let value = match (kind.as_str(), values.is_empty()) {
                        ("sum", _) => Some(values.iter().sum::<f64>()),
                        (_, true) => None,
                        ("avg", false) => Some(values.iter().sum::<f64>() / values.len() as f64),
                        ("min", false) => Some(values.iter().cloned().fold(f64::INFINITY, f64::min)),
                        _ => Some(values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)),
                    };
                    json!({ "value": value })
                }
                "value_count" => {
                    let count: usize = docs.iter().map(|doc| doc.values(field).len()).sum();
                    json!({ "value": count })
                }
                "cardinality" => {
                    let distinct: std::collections::BTreeSet<String> = docs
                        .iter()
                        .flat_map(|doc| doc.values(field))
                        .map(|value| value.to_string())
                        .collect();
                    json!({ "value": distinct.len() })
                }
                "top_hits" => {
                    let size = params["size"].as_u64().unwrap_or(3) as usize;
                    let hits: Vec<Value> = docs
                        .iter()
                        .take(size)
                        .map(|doc| doc.hit(&Map::new()))
                        .collect();
                    json!({ "hits": { "total": docs.len(), "max_score": 1.0, "hits": hits } })
                }
                _ => continue,
            };
            results.insert(name.clone(), result);
        }
        results
    }

    fn suggest(&self, suggesters: &Map<String, Value>) -> Map<String, Value> {
        let mut results = Map::new();
        for (name, definition) in suggesters {
            let text = definition["text"].as_str().unwrap_or_default();
            let field = definition["term"]["field"].as_str().unwrap_or_default();

            let mut frequencies: BTreeMap<String, u64> = BTreeMap::new();
            for doc in &self.docs {
                for value in doc.values(field).iter().filter_map(Value::as_str) {
                    *frequencies.entry(value.to_lowercase()).or_default() += 1;
                }
            }

            let mut offset = 0;
            let entries: Vec<Value> = text
                .split_whitespace()
                .map(|token| {
                    let start = text[offset..].find(token).map_or(offset, |i| offset + i);
                    offset = start + token.len();

                    let token = token.to_lowercase();
                    let options: Vec<Value> = frequencies
                        .iter()
                        .filter_map(|(candidate, freq)| {
                            let distance = levenshtein(&token, candidate);
                            (distance > 0 && distance <= 2).then(|| {
                                json!({
                                    "text": candidate,
                                    "score": 1.0 - distance as f64 / token.chars().count() as f64,
                                    "freq": freq,
                                })
                            })
                        })
                        .collect();
                    json!({ "text": token, "offset": start, "length": token.len(), "options": options })
                })
                .collect();
            results.insert(name.clone(), Value::Array(entries));
        }
        results
    }

    /// Execute one search body over the whole index.
    fn run(&self, body: &Value) -> Value {
        let matched = self.matching(&body["query"]);
        let from = body["from"].as_u64().unwrap_or(0) as usize;
        let size = body["size"].as_u64().unwrap_or(10) as usize;
        let hits: Vec<Value> = matched
            .iter()
            .skip(from)
            .take(size)
            .map(|(doc, inner_hits)| doc.hit(inner_hits))
            .collect();

        let mut response = json!({
            "took": 1,
            "timed_out": false,
            "_shards": { "total": 1, "successful": 1, "skipped": 0, "failed": 0 },
            "hits": {
                "total": { "value": matched.len(), "relation": "eq" },
                "max_score": 1.0,
                "hits": hits,
            },
        });

        if let Some(aggs) = body.get("aggs").and_then(Value::as_object) {
            let docs: Vec<&StoredDoc> = matched.iter().map(|(doc, _)| *doc).collect();
            response["aggregations"] = Value::Object(self.aggregate(aggs, &docs));
        }
        if let Some(suggesters) = body.get("suggest").and_then(Value::as_object) {
            response["suggest"] = Value::Object(self.suggest(suggesters));
        }
        response
    }
}

#[async_trait]
impl SearchTransport for FixtureTransport {
    async fn search(
        &self,
        indices: &[String],
        body: Value,
        scroll: Option<&str>,
    ) -> Result<Value, SearchError> {
        *self.searches.lock().await += 1;
        Self::check_indices(indices).map_err(|error| SearchError::from_error_body(404, &error))?;

        if scroll.is_none() {
            return Ok(self.run(&body));
        }

        let page_size = body["size"].as_u64().unwrap_or(10) as usize;
        let mut remaining: Vec<Value> = self
            .matching(&body["query"])
            .iter()
            .map(|(doc, inner_hits)| doc.hit(inner_hits))
            .collect();
        let total = remaining.len();
        let page: Vec<Value> = remaining.drain(..page_size.min(total)).collect();

        let scroll_id = {
            let mut next = self.next_cursor.lock().await;
            *next += 1;
            format!("cursor-{}", next)
        };
        self.cursors.lock().await.insert(
            scroll_id.clone(),
            Cursor {
                page_size,
                total,
                remaining,
            },
        );

        Ok(json!({
            "_scroll_id": scroll_id,
            "took": 1,
            "timed_out": false,
            "hits": { "total": total, "hits": page },
        }))
    }

    async fn msearch(&self, indices: &[String], lines: Vec<Value>) -> Result<Value, SearchError> {
        *self.msearches.lock().await += 1;

        let responses: Vec<Value> = lines
            .chunks(2)
            .map(|pair| {
                let targets: Vec<String> = match pair[0].get("index") {
                    Some(Value::Array(names)) => names
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                    Some(Value::String(name)) => vec![name.clone()],
                    _ => indices.to_vec(),
                };
                let body = pair.get(1).cloned().unwrap_or_else(|| json!({}));
                match Self::check_indices(&targets) {
                    Ok(()) => self.run(&body),
                    Err(error) => error,
                }
            })
            .collect();

        Ok(json!({ "took": 1, "responses": responses }))
    }

    async fn scroll(&self, scroll_id: &str, _keep_alive: &str) -> Result<Value, SearchError> {
        let mut cursors = self.cursors.lock().await;
        let cursor = cursors
            .get_mut(scroll_id)
            .ok_or_else(|| SearchError::transport(404, "No search context found"))?;

        let take = cursor.page_size.min(cursor.remaining.len());
        let page: Vec<Value> = cursor.remaining.drain(..take).collect();

        Ok(json!({
            "_scroll_id": scroll_id,
            "hits": { "total": cursor.total, "hits": page },
        }))
    }

    async fn clear_scroll(&self, scroll_id: &str) -> Result<(), SearchError> {
        self.cursors.lock().await.remove(scroll_id);
        self.cleared.lock().await.push(scroll_id.to_string());
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        Ok(true)
    }
}

/// Client over `transport` with the given configuration.
pub fn client(transport: &Arc<FixtureTransport>, config: ClientConfig) -> SearchClient {
    let transport: Arc<dyn SearchTransport> = transport.clone();
    SearchClient::with_config(transport, config)
}
