//! Search requests.
//!
//! A `Search` is an immutable request value. Builder methods consume the
//! request and return a new one, so a request shared between tasks never
//! changes underneath them. Executing a request caches its parsed response
//! inside the value; any builder call produces a request with an empty cache.

use std::ops::Range;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::sync::OnceCell;
use tracing::debug;

use search_dsl_shared::{
    Aggregation, BoolQuery, DocTypeRegistry, Document, HitsPage, Query, Sort, Suggester,
    SuggesterKind,
};

use crate::client::SearchClient;
use crate::errors::SearchError;
use crate::response::{self, Response, SuggestResponse};
use crate::scan::{self, Scan};

/// Everything a search request consists of, without the response cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    /// Target indices; empty means all indices.
    pub indices: Vec<String>,
    /// Declared type tags the request is scoped to.
    pub doc_types: Vec<String>,
    /// Types hits are resolved against.
    pub registry: DocTypeRegistry,
    pub query: Option<Query>,
    pub filters: Vec<Query>,
    pub aggregations: Vec<Aggregation>,
    pub suggesters: Vec<Suggester>,
    pub from: Option<u64>,
    pub size: Option<u64>,
    pub sort: Vec<Sort>,
    /// Source fields to return; `None` returns the whole source.
    pub source: Option<Vec<String>>,
}

/// A search request and, once executed, its cached response.
///
/// ```ignore
/// let search = Search::new()
///     .index("git")
///     .doc_type::<Commit>()
///     .query(Query::term("author.name.raw", "Honza Král"))
///     .aggregate(Aggregation::terms("authors", "author.name.raw").size(1));
///
/// let response = search.execute(&client).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Search {
    request: SearchRequest,
    response: OnceCell<Arc<Response>>,
}

impl PartialEq for Search {
    fn eq(&self, other: &Self) -> bool {
        self.request == other.request
    }
}

impl From<SearchRequest> for Search {
    fn from(request: SearchRequest) -> Self {
        Self::from_request(request)
    }
}

impl Search {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_request(request: SearchRequest) -> Self {
        Self {
            request,
            response: OnceCell::new(),
        }
    }

    /// Apply `change` to a copy of the request, dropping the cached response.
    fn rebuild(self, change: impl FnOnce(&mut SearchRequest)) -> Self {
        let mut request = self.request;
        change(&mut request);
        Self::from_request(request)
    }

    /// The same request without its cached response.
    pub(crate) fn detached(&self) -> Self {
        Self::from_request(self.request.clone())
    }

    pub fn request(&self) -> &SearchRequest {
        &self.request
    }

    pub fn indices(&self) -> &[String] {
        &self.request.indices
    }

    pub fn doc_types(&self) -> &[String] {
        &self.request.doc_types
    }

    pub fn registry(&self) -> &DocTypeRegistry {
        &self.request.registry
    }

    /// Add a target index.
    pub fn index(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.rebuild(|request| {
            if !request.indices.contains(&name) {
                request.indices.push(name);
            }
        })
    }

    /// Scope the request to `D` and resolve its hits to `D`.
    pub fn doc_type<D: Document>(self) -> Self {
        self.rebuild(|request| {
            request.registry.register::<D>();
            if !request.doc_types.iter().any(|tag| tag == D::DOC_TYPE) {
                request.doc_types.push(D::DOC_TYPE.to_string());
            }
        })
    }

    /// Scope the request to a type tag without registering a document type.
    ///
    /// Hits of such a request stay generic unless the tag is registered some
    /// other way.
    pub fn doc_type_name(self, doc_type: impl Into<String>) -> Self {
        let doc_type = doc_type.into();
        self.rebuild(|request| {
            if !request.doc_types.contains(&doc_type) {
                request.doc_types.push(doc_type);
            }
        })
    }

    /// Resolve hits against the types in `registry` without scoping to them.
    pub fn with_registry(self, registry: &DocTypeRegistry) -> Self {
        self.rebuild(|request| request.registry.extend(registry))
    }

    /// Set the query; a second call combines both with `&`.
    pub fn query(self, query: Query) -> Self {
        self.rebuild(|request| {
            request.query = Some(match request.query.take() {
                Some(existing) => existing & query,
                None => query,
            });
        })
    }

    /// Add a non-scoring filter clause.
    pub fn filter(self, query: Query) -> Self {
        self.rebuild(|request| request.filters.push(query))
    }

    /// Add a filter excluding documents matching `query`.
    pub fn exclude(self, query: Query) -> Self {
        self.rebuild(|request| request.filters.push(!query))
    }

    /// Add a top-level aggregation.
    pub fn aggregate(self, aggregation: Aggregation) -> Self {
        self.rebuild(|request| {
            request.aggregations.retain(|agg| agg.name != aggregation.name);
            request.aggregations.push(aggregation);
        })
    }

    /// Add a named suggester.
    pub fn suggest(self, name: impl Into<String>, text: impl Into<String>, kind: SuggesterKind) -> Self {
        let suggester = Suggester::new(name, text, kind);
        self.rebuild(|request| {
            request.suggesters.retain(|s| s.name != suggester.name);
            request.suggesters.push(suggester);
        })
    }

    /// Number of hits to skip, sent as `from`.
    pub fn offset(self, offset: u64) -> Self {
        self.rebuild(|request| request.from = Some(offset))
    }

    pub fn size(self, size: u64) -> Self {
        self.rebuild(|request| request.size = Some(size))
    }

    /// Page through results by position, e.g. `slice(0..1)` for the first hit.
    pub fn slice(self, range: Range<u64>) -> Self {
        self.rebuild(|request| {
            request.from = Some(range.start);
            request.size = Some(range.end.saturating_sub(range.start));
        })
    }

    pub fn sort(self, sort: Sort) -> Self {
        self.rebuild(|request| request.sort.push(sort))
    }

    /// Restrict the returned source to `fields`.
    pub fn source<S: Into<String>>(self, fields: impl IntoIterator<Item = S>) -> Self {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        self.rebuild(|request| request.source = Some(fields))
    }

    /// Query combined with filters and doc-type scoping.
    fn effective_query(&self) -> Option<Query> {
        let request = &self.request;
        let mut filters = request.filters.clone();
        if !request.doc_types.is_empty() {
            filters.push(Query::terms("_type", request.doc_types.iter().cloned()));
        }

        if filters.is_empty() {
            return request.query.clone();
        }

        let mut bool_query = BoolQuery::new();
        if let Some(query) = &request.query {
            bool_query = bool_query.must(query.clone());
        }
        for filter in filters {
            bool_query = bool_query.filter(filter);
        }
        Some(Query::Bool(bool_query))
    }

    fn suggest_json(&self) -> Value {
        let suggesters: Map<String, Value> = self
            .request
            .suggesters
            .iter()
            .map(|s| (s.name.clone(), s.to_json()))
            .collect();
        Value::Object(suggesters)
    }

    /// Render the request body.
    pub fn to_body(&self) -> Value {
        let request = &self.request;
        let mut body = Map::new();

        if let Some(query) = self.effective_query() {
            body.insert("query".to_string(), query.to_json());
        }
        if !request.aggregations.is_empty() {
            body.insert(
                "aggs".to_string(),
                Aggregation::tree_to_json(&request.aggregations),
            );
        }
        if !request.suggesters.is_empty() {
            body.insert("suggest".to_string(), self.suggest_json());
        }
        if let Some(from) = request.from {
            body.insert("from".to_string(), json!(from));
        }
        if let Some(size) = request.size {
            body.insert("size".to_string(), json!(size));
        }
        if !request.sort.is_empty() {
            let sort: Vec<Value> = request.sort.iter().map(Sort::to_json).collect();
            body.insert("sort".to_string(), Value::Array(sort));
        }
        if let Some(fields) = &request.source {
            body.insert("_source".to_string(), json!(fields));
        }

        Value::Object(body)
    }

    /// Body used to open a scroll: no paging offset, no aggregations or
    /// suggestions, index order unless a sort was requested.
    pub(crate) fn scan_body(&self, page_size: u64) -> Value {
        let scan = self.clone().rebuild(|request| {
            request.from = None;
            request.size = Some(page_size);
            request.aggregations.clear();
            request.suggesters.clear();
            if request.sort.is_empty() {
                request.sort.push(Sort::doc_order());
            }
        });
        scan.to_body()
    }

    /// Execute the request, caching the parsed response.
    ///
    /// Later calls return the cached response without contacting the backend.
    pub async fn execute(&self, client: &SearchClient) -> Result<&Response, SearchError> {
        let response = self
            .response
            .get_or_try_init(|| async {
                let body = self.to_body();
                debug!(indices = ?self.request.indices, body = %body, "Executing search");

                let raw = client
                    .transport()
                    .search(&self.request.indices, body, None)
                    .await?;
                let response = response::map_response(self, &raw)?;

                debug!(
                    took = response.took,
                    total = response.hits.total.value,
                    "Search executed"
                );
                Ok::<_, SearchError>(Arc::new(response))
            })
            .await?;
        Ok(response.as_ref())
    }

    /// Hits of the (cached) response.
    pub async fn hits(&self, client: &SearchClient) -> Result<&HitsPage, SearchError> {
        Ok(&self.execute(client).await?.hits)
    }

    /// The cached response, if the request has been executed.
    pub fn cached_response(&self) -> Option<&Response> {
        self.response.get().map(Arc::as_ref)
    }

    /// Execute only the suggest section of the request.
    pub async fn execute_suggest(&self, client: &SearchClient) -> Result<SuggestResponse, SearchError> {
        if self.request.suggesters.is_empty() {
            return Err(SearchError::invalid_query("No suggesters defined"));
        }

        let body = json!({ "size": 0, "suggest": self.suggest_json() });
        debug!(indices = ?self.request.indices, "Executing suggest");

        let raw = client
            .transport()
            .search(&self.request.indices, body, None)
            .await?;
        response::map_suggest_response(&raw)
    }

    /// Lazily iterate every matching hit through a scroll cursor.
    ///
    /// Each call opens a fresh cursor.
    pub fn scan(&self, client: &SearchClient) -> Scan {
        scan::scan(self, client)
    }
}

/// Searches scoped to a document type.
pub trait DocumentSearch: Document {
    /// A search over `Self::INDEX` scoped to `Self`.
    fn search() -> Search {
        Search::new().index(Self::INDEX).doc_type::<Self>()
    }
}

impl<D: Document> DocumentSearch for D {}
