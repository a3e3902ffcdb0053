//! Query clause tree.
//!
//! Queries are plain values: building, combining, and negating them never
//! touches the network. `to_json` renders the clause into the backend's
//! query DSL.

use std::ops::{BitAnd, BitOr, Not};

use serde_json::{json, Map, Value};

/// A query clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Matches every document.
    MatchAll,
    /// Matches no document.
    MatchNone,
    /// Exact value match on a field.
    Term { field: String, value: Value },
    /// Exact match against any of several values.
    Terms { field: String, values: Vec<Value> },
    /// Analyzed full-text match.
    Match { field: String, query: String },
    /// Range bounds on a field.
    Range(RangeQuery),
    /// Field presence.
    Exists { field: String },
    /// Boolean composition.
    Bool(BoolQuery),
    /// Children whose parent matches `query`.
    HasParent {
        parent_type: String,
        query: Box<Query>,
        inner_hits: Option<InnerHits>,
    },
    /// Parents with at least one child matching `query`.
    HasChild {
        child_type: String,
        query: Box<Query>,
        inner_hits: Option<InnerHits>,
    },
    /// Documents with a nested object under `path` matching `query`.
    Nested {
        path: String,
        query: Box<Query>,
        inner_hits: Option<InnerHits>,
    },
}

impl Query {
    pub fn match_all() -> Self {
        Query::MatchAll
    }

    pub fn match_none() -> Self {
        Query::MatchNone
    }

    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn terms<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Query::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn match_text(field: impl Into<String>, query: impl Into<String>) -> Self {
        Query::Match {
            field: field.into(),
            query: query.into(),
        }
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Query::Exists {
            field: field.into(),
        }
    }

    /// Join on the parent side of a parent/child relation.
    pub fn has_parent(parent_type: impl Into<String>, query: Query) -> Self {
        Query::HasParent {
            parent_type: parent_type.into(),
            query: Box::new(query),
            inner_hits: None,
        }
    }

    /// Join on the child side of a parent/child relation.
    pub fn has_child(child_type: impl Into<String>, query: Query) -> Self {
        Query::HasChild {
            child_type: child_type.into(),
            query: Box::new(query),
            inner_hits: None,
        }
    }

    pub fn nested(path: impl Into<String>, query: Query) -> Self {
        Query::Nested {
            path: path.into(),
            query: Box::new(query),
            inner_hits: None,
        }
    }

    /// Request inner hits for a join clause.
    ///
    /// Clauses that are not joins are returned unchanged.
    pub fn with_inner_hits(self, request: InnerHits) -> Self {
        match self {
            Query::HasParent {
                parent_type, query, ..
            } => Query::HasParent {
                parent_type,
                query,
                inner_hits: Some(request),
            },
            Query::HasChild {
                child_type, query, ..
            } => Query::HasChild {
                child_type,
                query,
                inner_hits: Some(request),
            },
            Query::Nested { path, query, .. } => Query::Nested {
                path,
                query,
                inner_hits: Some(request),
            },
            other => other,
        }
    }

    /// Render the clause as query DSL.
    pub fn to_json(&self) -> Value {
        match self {
            Query::MatchAll => json!({ "match_all": {} }),
            Query::MatchNone => json!({ "match_none": {} }),
            Query::Term { field, value } => json!({ "term": { field.as_str(): value } }),
            Query::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
            Query::Match { field, query } => json!({ "match": { field.as_str(): query } }),
            Query::Range(range) => range.to_json(),
            Query::Exists { field } => json!({ "exists": { "field": field } }),
            Query::Bool(bool_query) => bool_query.to_json(),
            Query::HasParent {
                parent_type,
                query,
                inner_hits,
            } => {
                let mut body = json!({ "parent_type": parent_type, "query": query.to_json() });
                if let Some(inner) = inner_hits {
                    body["inner_hits"] = inner.to_json();
                }
                json!({ "has_parent": body })
            }
            Query::HasChild {
                child_type,
                query,
                inner_hits,
            } => {
                let mut body = json!({ "type": child_type, "query": query.to_json() });
                if let Some(inner) = inner_hits {
                    body["inner_hits"] = inner.to_json();
                }
                json!({ "has_child": body })
            }
            Query::Nested {
                path,
                query,
                inner_hits,
            } => {
                let mut body = json!({ "path": path, "query": query.to_json() });
                if let Some(inner) = inner_hits {
                    body["inner_hits"] = inner.to_json();
                }
                json!({ "nested": body })
            }
        }
    }
}

/// Boolean composition of clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<Query>,
    pub filter: Vec<Query>,
    pub should: Vec<Query>,
    pub must_not: Vec<Query>,
    pub minimum_should_match: Option<u32>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, query: Query) -> Self {
        self.must.push(query);
        self
    }

    pub fn filter(mut self, query: Query) -> Self {
        self.filter.push(query);
        self
    }

    pub fn should(mut self, query: Query) -> Self {
        self.should.push(query);
        self
    }

    pub fn must_not(mut self, query: Query) -> Self {
        self.must_not.push(query);
        self
    }

    pub fn minimum_should_match(mut self, minimum: u32) -> Self {
        self.minimum_should_match = Some(minimum);
        self
    }

    /// True when every clause has to hold (no `should` semantics involved).
    fn is_conjunction(&self) -> bool {
        self.should.is_empty() && self.minimum_should_match.is_none()
    }

    /// True when the query is a plain "any of" over `should` clauses.
    fn is_disjunction(&self) -> bool {
        self.must.is_empty()
            && self.filter.is_empty()
            && self.must_not.is_empty()
            && !self.should.is_empty()
            && matches!(self.minimum_should_match, None | Some(1))
    }

    fn is_pure_negation(&self) -> bool {
        self.must.is_empty()
            && self.filter.is_empty()
            && self.should.is_empty()
            && !self.must_not.is_empty()
    }

    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        for (key, clauses) in [
            ("must", &self.must),
            ("filter", &self.filter),
            ("should", &self.should),
            ("must_not", &self.must_not),
        ] {
            if !clauses.is_empty() {
                body.insert(
                    key.to_string(),
                    Value::Array(clauses.iter().map(Query::to_json).collect()),
                );
            }
        }
        if let Some(minimum) = self.minimum_should_match {
            body.insert("minimum_should_match".to_string(), json!(minimum));
        }
        json!({ "bool": body })
    }
}

/// Range bounds on a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    pub field: String,
    pub gt: Option<Value>,
    pub gte: Option<Value>,
    pub lt: Option<Value>,
    pub lte: Option<Value>,
}

impl RangeQuery {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            gt: None,
            gte: None,
            lt: None,
            lte: None,
        }
    }

    pub fn gt(mut self, value: impl Into<Value>) -> Self {
        self.gt = Some(value.into());
        self
    }

    pub fn gte(mut self, value: impl Into<Value>) -> Self {
        self.gte = Some(value.into());
        self
    }

    pub fn lt(mut self, value: impl Into<Value>) -> Self {
        self.lt = Some(value.into());
        self
    }

    pub fn lte(mut self, value: impl Into<Value>) -> Self {
        self.lte = Some(value.into());
        self
    }

    fn to_json(&self) -> Value {
        let mut bounds = Map::new();
        for (key, bound) in [
            ("gt", &self.gt),
            ("gte", &self.gte),
            ("lt", &self.lt),
            ("lte", &self.lte),
        ] {
            if let Some(value) = bound {
                bounds.insert(key.to_string(), value.clone());
            }
        }
        json!({ "range": { self.field.as_str(): bounds } })
    }
}

impl From<RangeQuery> for Query {
    fn from(range: RangeQuery) -> Self {
        Query::Range(range)
    }
}

impl From<BoolQuery> for Query {
    fn from(bool_query: BoolQuery) -> Self {
        Query::Bool(bool_query)
    }
}

/// Inner hits request attached to a join clause.
///
/// An empty request renders as `{}`, which asks the backend for its defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InnerHits {
    pub name: Option<String>,
    pub from: Option<u64>,
    pub size: Option<u64>,
}

impl InnerHits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.from = Some(offset);
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        if let Some(name) = &self.name {
            body.insert("name".to_string(), json!(name));
        }
        if let Some(from) = self.from {
            body.insert("from".to_string(), json!(from));
        }
        if let Some(size) = self.size {
            body.insert("size".to_string(), json!(size));
        }
        Value::Object(body)
    }
}

impl BitAnd for Query {
    type Output = Query;

    fn bitand(self, rhs: Query) -> Query {
        match (self, rhs) {
            (Query::MatchAll, other) | (other, Query::MatchAll) => other,
            (Query::Bool(mut lhs), Query::Bool(rhs))
                if lhs.is_conjunction() && rhs.is_conjunction() =>
            {
                lhs.must.extend(rhs.must);
                lhs.filter.extend(rhs.filter);
                lhs.must_not.extend(rhs.must_not);
                Query::Bool(lhs)
            }
            (Query::Bool(mut lhs), rhs) if lhs.is_conjunction() => {
                lhs.must.push(rhs);
                Query::Bool(lhs)
            }
            (lhs, rhs) => Query::Bool(BoolQuery::new().must(lhs).must(rhs)),
        }
    }
}

impl BitOr for Query {
    type Output = Query;

    fn bitor(self, rhs: Query) -> Query {
        match (self, rhs) {
            (Query::MatchAll, _) | (_, Query::MatchAll) => Query::MatchAll,
            (Query::MatchNone, other) | (other, Query::MatchNone) => other,
            (Query::Bool(mut lhs), Query::Bool(rhs))
                if lhs.is_disjunction() && rhs.is_disjunction() =>
            {
                lhs.should.extend(rhs.should);
                Query::Bool(lhs)
            }
            (Query::Bool(mut lhs), rhs) if lhs.is_disjunction() => {
                lhs.should.push(rhs);
                Query::Bool(lhs)
            }
            (lhs, rhs) => Query::Bool(
                BoolQuery::new()
                    .should(lhs)
                    .should(rhs)
                    .minimum_should_match(1),
            ),
        }
    }
}

impl Not for Query {
    type Output = Query;

    /// Logical complement: `q | !q` matches every document.
    fn not(self) -> Query {
        match self {
            Query::MatchAll => Query::MatchNone,
            Query::MatchNone => Query::MatchAll,
            Query::Bool(mut inner) if inner.is_pure_negation() => {
                if inner.must_not.len() == 1 {
                    inner.must_not.remove(0)
                } else {
                    Query::Bool(BoolQuery {
                        should: inner.must_not,
                        minimum_should_match: Some(1),
                        ..BoolQuery::default()
                    })
                }
            }
            Query::Bool(inner) if inner.is_disjunction() => Query::Bool(BoolQuery {
                must_not: inner.should,
                ..BoolQuery::default()
            }),
            other => Query::Bool(BoolQuery::new().must_not(other)),
        }
    }
}
