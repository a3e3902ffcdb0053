//! Configuration types for the SearchClient.

use std::time::Duration;

/// Options for scroll-based scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Number of hits fetched per scroll round-trip.
    pub page_size: u64,
    /// How long the backend keeps the scroll context alive between pages.
    pub keep_alive: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            page_size: 1000,
            keep_alive: "5m".to_string(),
        }
    }
}

impl ScanOptions {
    pub fn new(page_size: u64, keep_alive: impl Into<String>) -> Self {
        Self {
            page_size,
            keep_alive: keep_alive.into(),
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Configuration for the SearchClient.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL.
    pub url: String,
    /// Per-request timeout applied by the transport.
    pub request_timeout: Duration,
    /// Maximum number of requests allowed in a single multi-search batch.
    /// Set to None to disable the limit.
    pub max_batch_size: Option<usize>,
    pub scan: ScanOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            request_timeout: Duration::from_secs(30),
            max_batch_size: Some(1000),
            scan: ScanOptions::default(),
        }
    }
}

impl ClientConfig {
    /// Default configuration pointed at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Create a config with no batch size limit.
    pub fn unlimited() -> Self {
        Self {
            max_batch_size: None,
            ..Self::default()
        }
    }

    /// Create a config with a custom batch size limit.
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
            ..Self::default()
        }
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn scan(mut self, scan: ScanOptions) -> Self {
        self.scan = scan;
        self
    }
}
