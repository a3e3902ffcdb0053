//! Search transport trait definition.
//!
//! This module defines the abstract interface the client uses to talk to the
//! search backend, allowing for different implementations (OpenSearch,
//! Elasticsearch, in-memory fixtures).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchError;

/// Abstract interface for the search backend.
///
/// Implementations send already-rendered JSON bodies and return raw JSON
/// responses; mapping to typed results happens above this seam.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    /// Run a search against `indices` (all indices when empty).
    ///
    /// When `scroll` is set the backend opens a scroll context kept alive
    /// for that duration and the response carries a `_scroll_id`.
    async fn search(
        &self,
        indices: &[String],
        body: Value,
        scroll: Option<&str>,
    ) -> Result<Value, SearchError>;

    /// Run a multi-search. `lines` alternates header and body objects.
    ///
    /// The returned value holds a `responses` array with one item per
    /// request, in order; failed items carry an `error` object.
    async fn msearch(&self, indices: &[String], lines: Vec<Value>) -> Result<Value, SearchError>;

    /// Fetch the next page of an open scroll.
    async fn scroll(&self, scroll_id: &str, keep_alive: &str) -> Result<Value, SearchError>;

    /// Release a scroll context.
    async fn clear_scroll(&self, scroll_id: &str) -> Result<(), SearchError>;

    /// Check whether the backend is reachable.
    async fn health_check(&self) -> Result<bool, SearchError>;
}
