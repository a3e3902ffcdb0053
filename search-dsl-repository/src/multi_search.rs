//! Multi-search batches.
//!
//! Several searches are sent in one round trip and answered in order. The
//! caller picks the failure policy: `execute` fails the whole batch when any
//! request failed, `execute_lenient` leaves a `None` at failed positions.

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::client::SearchClient;
use crate::errors::{SearchError, SubRequestFailure};
use crate::response::{self, Response};
use crate::search::Search;

/// An ordered batch of searches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiSearch {
    indices: Vec<String>,
    searches: Vec<Search>,
}

impl MultiSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default index for searches that name none of their own.
    pub fn index(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.indices.contains(&name) {
            self.indices.push(name);
        }
        self
    }

    /// Append a search to the batch.
    pub fn add(mut self, search: Search) -> Self {
        self.searches.push(search);
        self
    }

    pub fn searches(&self) -> &[Search] {
        &self.searches
    }

    pub fn len(&self) -> usize {
        self.searches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.searches.is_empty()
    }

    /// Header and body lines of the request.
    pub fn to_lines(&self) -> Vec<Value> {
        self.searches
            .iter()
            .flat_map(|search| {
                let header = if search.indices().is_empty() {
                    json!({})
                } else {
                    json!({ "index": search.indices() })
                };
                [header, search.to_body()]
            })
            .collect()
    }

    async fn fetch(
        &self,
        client: &SearchClient,
    ) -> Result<Vec<Result<Response, SubRequestFailure>>, SearchError> {
        if self.searches.is_empty() {
            return Ok(Vec::new());
        }
        client.validate_batch_size(self.searches.len())?;

        let raw = client
            .transport()
            .msearch(&self.indices, self.to_lines())
            .await?;

        let items = raw["responses"]
            .as_array()
            .ok_or_else(|| SearchError::parse("Multi-search response has no responses"))?;
        if items.len() != self.searches.len() {
            return Err(SearchError::parse(format!(
                "Multi-search returned {} responses for {} requests",
                items.len(),
                self.searches.len()
            )));
        }

        let results: Vec<Result<Response, SubRequestFailure>> = items
            .iter()
            .zip(&self.searches)
            .enumerate()
            .map(|(position, (item, search))| {
                if item.get("error").is_some() {
                    let status = item["status"].as_u64().unwrap_or(0) as u16;
                    let reason = SearchError::from_error_body(status, item).to_string();
                    return Ok(Err(SubRequestFailure {
                        position,
                        status,
                        reason,
                    }));
                }
                response::map_response(search, item).map(Ok)
            })
            .collect::<Result<_, SearchError>>()?;

        let failed = results.iter().filter(|result| result.is_err()).count();
        info!(requests = results.len(), failed, "Multi-search executed");
        Ok(results)
    }

    /// Execute the batch; any failed request fails the whole call.
    pub async fn execute(&self, client: &SearchClient) -> Result<Vec<Response>, SearchError> {
        let results = self.fetch(client).await?;
        let total = results.len();

        let mut responses = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(response) => responses.push(response),
                Err(failure) => failures.push(failure),
            }
        }

        if !failures.is_empty() {
            return Err(SearchError::MultiSearchFailed { total, failures });
        }
        Ok(responses)
    }

    /// Execute the batch, leaving `None` where a request failed.
    pub async fn execute_lenient(
        &self,
        client: &SearchClient,
    ) -> Result<Vec<Option<Response>>, SearchError> {
        let results = self.fetch(client).await?;
        Ok(results
            .into_iter()
            .map(|result| match result {
                Ok(response) => Some(response),
                Err(failure) => {
                    warn!(
                        position = failure.position,
                        status = failure.status,
                        reason = %failure.reason,
                        "Multi-search request failed"
                    );
                    None
                }
            })
            .collect())
    }
}
