//! Settings read from the environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use search_dsl_repository::{ClientConfig, ScanOptions};

use crate::AppError;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default per-request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(AppError::config(format!("Unknown LOG_FORMAT '{}'", other))),
        }
    }
}

/// Runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub opensearch_url: String,
    pub request_timeout: Duration,
    pub scan: ScanOptions,
    /// `None` disables the multi-search batch limit.
    pub max_batch_size: Option<usize>,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            opensearch_url: DEFAULT_OPENSEARCH_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            scan: client.scan,
            max_batch_size: client.max_batch_size,
            log_format: LogFormat::default(),
        }
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::config(format!("{} must be a number, got '{}'", key, value)))
}

impl Settings {
    /// Load settings from the process environment, reading `.env` first.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `SEARCH_REQUEST_TIMEOUT_SECS`: per-request timeout (default: 30)
    /// - `SEARCH_SCAN_PAGE_SIZE`: hits per scroll page (default: 1000)
    /// - `SEARCH_SCROLL_KEEP_ALIVE`: scroll context keep-alive (default: 5m)
    /// - `SEARCH_MAX_BATCH_SIZE`: multi-search limit, 0 for none (default: 1000)
    /// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
    pub fn from_env() -> Result<Self, AppError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut settings = Self::default();

        if let Some(url) = lookup("OPENSEARCH_URL") {
            settings.opensearch_url = url;
        }
        if let Some(value) = lookup("SEARCH_REQUEST_TIMEOUT_SECS") {
            settings.request_timeout =
                Duration::from_secs(parse_number("SEARCH_REQUEST_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = lookup("SEARCH_SCAN_PAGE_SIZE") {
            let page_size: u64 = parse_number("SEARCH_SCAN_PAGE_SIZE", &value)?;
            if page_size == 0 {
                return Err(AppError::config("SEARCH_SCAN_PAGE_SIZE must be positive"));
            }
            settings.scan.page_size = page_size;
        }
        if let Some(keep_alive) = lookup("SEARCH_SCROLL_KEEP_ALIVE") {
            settings.scan.keep_alive = keep_alive;
        }
        if let Some(value) = lookup("SEARCH_MAX_BATCH_SIZE") {
            let max: usize = parse_number("SEARCH_MAX_BATCH_SIZE", &value)?;
            settings.max_batch_size = (max > 0).then_some(max);
        }
        if let Some(value) = lookup("LOG_FORMAT") {
            settings.log_format = value.parse()?;
        }

        Ok(settings)
    }

    /// Client configuration derived from these settings.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            url: self.opensearch_url.clone(),
            request_timeout: self.request_timeout,
            max_batch_size: self.max_batch_size,
            scan: self.scan.clone(),
        }
    }
}
