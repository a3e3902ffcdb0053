//! # Search DSL
//!
//! Typed search requests over an OpenSearch-compatible backend.
//!
//! Requests are composed from the query model in `search_dsl_shared` and
//! executed through the `SearchClient` from `search_dsl_repository`. This
//! crate adds environment configuration, tracing setup and dependency wiring.

pub mod config;
pub mod telemetry;

pub use config::{Dependencies, LogFormat, Settings};
pub use search_dsl_repository as repository;
pub use search_dsl_shared as shared;

use thiserror::Error;

/// Errors that can occur during initialization or execution.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] search_dsl_repository::SearchError),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
