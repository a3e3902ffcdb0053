//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchTransport`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    http::{
        request::JsonBody,
        response::Response,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    ClearScrollParts, MsearchParts, OpenSearch, ScrollParts, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::config::ClientConfig;
use crate::errors::SearchError;
use crate::interfaces::SearchTransport;

/// OpenSearch client implementation.
///
/// # Example
///
/// ```ignore
/// let config = ClientConfig::new("http://localhost:9200");
/// let transport = OpenSearchClient::new(&config)?;
/// let client = SearchClient::with_config(Arc::new(transport), config);
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client for `config.url`.
    ///
    /// No request is sent; use `health_check` to verify connectivity.
    pub fn new(config: &ClientConfig) -> Result<Self, SearchError> {
        let parsed_url =
            Url::parse(&config.url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .timeout(config.request_timeout)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %config.url,
            timeout_secs = config.request_timeout.as_secs(),
            "Created OpenSearch client"
        );

        Ok(Self { client })
    }

    /// Read a response body, turning non-success statuses into errors.
    async fn read_body(response: Response) -> Result<Value, SearchError> {
        let status = response.status_code();
        let text = response
            .text()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if status.is_success() {
            return serde_json::from_str(&text)
                .map_err(|e| SearchError::parse(format!("Invalid response body: {}", e)));
        }

        error!(status = %status, body = %text, "Search request failed");
        let body = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| json!({ "error": text }));
        Err(SearchError::from_error_body(status.as_u16(), &body))
    }
}

fn index_names(indices: &[String]) -> Vec<&str> {
    indices.iter().map(String::as_str).collect()
}

#[async_trait]
impl SearchTransport for OpenSearchClient {
    #[instrument(skip(self, body))]
    async fn search(
        &self,
        indices: &[String],
        body: Value,
        scroll: Option<&str>,
    ) -> Result<Value, SearchError> {
        let names = index_names(indices);
        let parts = if names.is_empty() {
            SearchParts::None
        } else {
            SearchParts::Index(&names)
        };

        let mut request = self.client.search(parts).body(body);
        if let Some(keep_alive) = scroll {
            request = request.scroll(keep_alive);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let value = Self::read_body(response).await?;
        debug!(took = value["took"].as_u64().unwrap_or(0), "Search completed");
        Ok(value)
    }

    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    async fn msearch(&self, indices: &[String], lines: Vec<Value>) -> Result<Value, SearchError> {
        let names = index_names(indices);
        let parts = if names.is_empty() {
            MsearchParts::None
        } else {
            MsearchParts::Index(&names)
        };

        let body: Vec<JsonBody<Value>> = lines.into_iter().map(JsonBody::from).collect();

        let response = self
            .client
            .msearch(parts)
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        Self::read_body(response).await
    }

    #[instrument(skip(self, scroll_id))]
    async fn scroll(&self, scroll_id: &str, keep_alive: &str) -> Result<Value, SearchError> {
        let response = self
            .client
            .scroll(ScrollParts::None)
            .body(json!({
                "scroll": keep_alive,
                "scroll_id": scroll_id
            }))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        Self::read_body(response).await
    }

    #[instrument(skip(self, scroll_id))]
    async fn clear_scroll(&self, scroll_id: &str) -> Result<(), SearchError> {
        let response = self
            .client
            .clear_scroll(ClearScrollParts::None)
            .body(json!({ "scroll_id": [scroll_id] }))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - the context may already have expired
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Clear scroll request failed");
            return Err(SearchError::transport(status.as_u16(), error_body));
        }

        debug!("Scroll context cleared");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        Ok(response.status_code().is_success())
    }
}
