//! Dependency initialization and wiring.

use tracing::info;

use crate::config::Settings;
use crate::AppError;
use search_dsl_repository::SearchClient;

/// Container for all initialized dependencies.
#[derive(Debug, Clone)]
pub struct Dependencies {
    /// Client bound to the configured backend.
    pub client: SearchClient,
}

impl Dependencies {
    /// Initialize all dependencies from `settings`.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(AppError)` - If the client cannot be created or the backend is unhealthy
    pub async fn new(settings: &Settings) -> Result<Self, AppError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            scan_page_size = settings.scan.page_size,
            max_batch_size = ?settings.max_batch_size,
            "Initializing dependencies"
        );

        let client = SearchClient::connect(settings.client_config())
            .map_err(|e| AppError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        Self::verified(client).await
    }

    /// Wrap an existing client after verifying the backend is reachable.
    pub async fn verified(client: SearchClient) -> Result<Self, AppError> {
        let healthy = client
            .health_check()
            .await
            .map_err(|e| AppError::config(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(AppError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");
        Ok(Self { client })
    }
}
