//! # Search DSL Repository
//!
//! This crate executes search requests built from the shared query model.
//! It includes the error types, the transport interface with its OpenSearch
//! implementation, response mapping, multi-search batches and scroll scans.

pub mod client;
pub mod config;
pub mod errors;
pub mod index;
pub mod interfaces;
pub mod multi_search;
pub mod opensearch;
pub mod response;
pub mod scan;
pub mod search;

pub use client::SearchClient;
pub use config::{ClientConfig, ScanOptions};
pub use errors::{SearchError, SubRequestFailure};
pub use index::Index;
pub use interfaces::SearchTransport;
pub use multi_search::MultiSearch;
pub use opensearch::OpenSearchClient;
pub use response::{Response, ShardStats, SuggestResponse};
pub use scan::Scan;
pub use search::{DocumentSearch, Search, SearchRequest};
