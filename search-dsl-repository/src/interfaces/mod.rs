//! Interfaces for the search DSL repository.

mod search_transport;

pub use search_transport::SearchTransport;
