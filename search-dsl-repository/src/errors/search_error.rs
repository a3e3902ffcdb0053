//! Search error types.
//!
//! This module defines the error types that can occur while executing
//! requests against the search backend and mapping their responses.

use serde_json::Value;
use thiserror::Error;

use search_dsl_shared::DocumentError;

/// One failed position inside a multi-search batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubRequestFailure {
    /// Position of the request in the batch.
    pub position: usize,
    /// HTTP status reported for the sub-request (0 if absent).
    pub status: u16,
    /// Backend error reason.
    pub reason: String,
}

/// Errors that can occur during search operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The backend could not be reached.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The backend answered with a non-success status.
    #[error("Transport error ({status}): {reason}")]
    TransportError { status: u16, reason: String },

    /// The request targeted an index that does not exist.
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// At least one request of a strict multi-search batch failed.
    #[error("Multi-search failed: {} of {total} requests failed", .failures.len())]
    MultiSearchFailed {
        total: usize,
        failures: Vec<SubRequestFailure>,
    },

    /// The response did not have the expected shape.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The request cannot be executed as built.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A hit could not be converted into the requested document type.
    #[error("Document error: {0}")]
    DocumentError(#[from] DocumentError),

    /// Batch size exceeds configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },
}

impl SearchError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a transport error.
    pub fn transport(status: u16, reason: impl Into<String>) -> Self {
        Self::TransportError {
            status,
            reason: reason.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an invalid query error.
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// Create a batch size exceeded error.
    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }

    /// Classify an error body returned by the backend.
    ///
    /// Accepts both the structured form (`{"error": {"type", "reason", "index"}}`)
    /// and the legacy plain-string form (`{"error": "..."}`).
    pub fn from_error_body(status: u16, body: &Value) -> Self {
        let error = &body["error"];
        let reason = error["reason"]
            .as_str()
            .or_else(|| error.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("request failed with status {}", status));

        if error["type"].as_str() == Some("index_not_found_exception") {
            let index = error["index"].as_str().map(str::to_string).unwrap_or(reason);
            return Self::IndexNotFound(index);
        }

        Self::transport(status, reason)
    }

    /// True for errors caused by a missing index.
    pub fn is_index_not_found(&self) -> bool {
        matches!(self, Self::IndexNotFound(_))
    }
}
