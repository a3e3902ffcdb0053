//! Search client implementation.
//!
//! The client binds a transport to its configuration. Searches, multi-search
//! batches and scans are executed through it.

use std::fmt;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::errors::SearchError;
use crate::interfaces::SearchTransport;
use crate::opensearch::OpenSearchClient;

/// The handle used to execute searches against the backend.
///
/// Cloning is cheap; clones share the transport.
#[derive(Clone)]
pub struct SearchClient {
    transport: Arc<dyn SearchTransport>,
    config: ClientConfig,
}

impl SearchClient {
    /// Create a new SearchClient with default configuration.
    pub fn new(transport: Arc<dyn SearchTransport>) -> Self {
        Self {
            transport,
            config: ClientConfig::default(),
        }
    }

    /// Create a new SearchClient with custom configuration.
    pub fn with_config(transport: Arc<dyn SearchTransport>, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    /// Create a client backed by OpenSearch at `config.url`.
    pub fn connect(config: ClientConfig) -> Result<Self, SearchError> {
        let transport = OpenSearchClient::new(&config)?;
        Ok(Self::with_config(Arc::new(transport), config))
    }

    pub fn transport(&self) -> &dyn SearchTransport {
        self.transport.as_ref()
    }

    pub(crate) fn shared_transport(&self) -> Arc<dyn SearchTransport> {
        Arc::clone(&self.transport)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Check if batch size exceeds the configured limit.
    pub(crate) fn validate_batch_size(&self, size: usize) -> Result<(), SearchError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(SearchError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }

    /// Check whether the backend is reachable.
    pub async fn health_check(&self) -> Result<bool, SearchError> {
        self.transport.health_check().await
    }
}

impl fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use tokio::sync::Mutex;

    /// Mock transport for testing
    struct MockTransport {
        pings: Arc<Mutex<usize>>,
        healthy: bool,
    }

    #[async_trait]
    impl SearchTransport for MockTransport {
        async fn search(
            &self,
            _indices: &[String],
            _body: Value,
            _scroll: Option<&str>,
        ) -> Result<Value, SearchError> {
            Ok(Value::Null)
        }

        async fn msearch(
            &self,
            _indices: &[String],
            _lines: Vec<Value>,
        ) -> Result<Value, SearchError> {
            Ok(Value::Null)
        }

        async fn scroll(&self, _scroll_id: &str, _keep_alive: &str) -> Result<Value, SearchError> {
            Ok(Value::Null)
        }

        async fn clear_scroll(&self, _scroll_id: &str) -> Result<(), SearchError> {
            Ok(())
        }

        async fn health_check(&self) -> Result<bool, SearchError> {
            *self.pings.lock().await += 1;
            Ok(self.healthy)
        }
    }

    fn mock(healthy: bool) -> (Arc<Mutex<usize>>, Arc<dyn SearchTransport>) {
        let pings = Arc::new(Mutex::new(0));
        let transport = MockTransport {
            pings: Arc::clone(&pings),
            healthy,
        };
        (pings, Arc::new(transport))
    }

    #[tokio::test]
    async fn test_health_check_delegates_to_transport() {
        let (pings, transport) = mock(true);
        let client = SearchClient::new(transport);

        assert!(client.health_check().await.unwrap());
        assert_eq!(*pings.lock().await, 1);
    }

    #[tokio::test]
    async fn test_unhealthy_backend() {
        let (_, transport) = mock(false);
        let client = SearchClient::new(transport);
        assert!(!client.health_check().await.unwrap());
    }

    #[test]
    fn test_batch_size_validation() {
        let (_, transport) = mock(true);
        let client = SearchClient::with_config(transport, ClientConfig::with_max_batch_size(2));

        assert!(client.validate_batch_size(2).is_ok());
        let err = client.validate_batch_size(3).unwrap_err();
        assert!(matches!(
            err,
            SearchError::BatchSizeExceeded {
                provided: 3,
                max: 2
            }
        ));
    }

    #[test]
    fn test_unlimited_batch_size() {
        let (_, transport) = mock(true);
        let client = SearchClient::with_config(transport, ClientConfig::unlimited());
        assert!(client.validate_batch_size(100_000).is_ok());
    }

    #[test]
    fn test_connect_rejects_invalid_url() {
        let result = SearchClient::connect(ClientConfig::new("::"));
        assert!(matches!(result, Err(SearchError::ConnectionError(_))));
    }
}
