//! Error types for the search DSL repository.

mod search_error;

pub use search_error::{SearchError, SubRequestFailure};
