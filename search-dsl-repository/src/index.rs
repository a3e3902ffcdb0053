//! Index handles holding the document types stored in an index.

use search_dsl_shared::{DocTypeRegistry, Document};

use crate::search::Search;

/// A named index and the document types registered for it.
///
/// Searches created from an index resolve hits of every registered type
/// without being scoped to any of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    name: String,
    registry: DocTypeRegistry,
}

impl Index {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: DocTypeRegistry::new(),
        }
    }

    /// Register a document type stored in this index.
    pub fn doc_type<D: Document>(mut self) -> Self {
        self.registry.register::<D>();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &DocTypeRegistry {
        &self.registry
    }

    /// A search over this index resolving hits to the registered types.
    pub fn search(&self) -> Search {
        Search::new().index(self.name.as_str()).with_registry(&self.registry)
    }
}
