//! OpenSearch implementation of the search transport.

mod client;

pub use client::OpenSearchClient;
