//! Document types and the registry used to resolve hits back to them.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use thiserror::Error;

/// A document type stored in the search backend.
///
/// Identity of a stored document is `(INDEX, DOC_TYPE, id)`. Implementors
/// deserialize from the hit's `_source`.
///
/// ```ignore
/// #[derive(Deserialize)]
/// struct Repository {
///     organization: String,
///     tags: Vec<String>,
/// }
///
/// impl Document for Repository {
///     const INDEX: &'static str = "git";
///     const DOC_TYPE: &'static str = "repos";
/// }
/// ```
pub trait Document: DeserializeOwned + Send + Sync + 'static {
    /// Index the type lives in.
    const INDEX: &'static str;
    /// Type tag carried by every hit of this type.
    const DOC_TYPE: &'static str;

    /// Short Rust type name, used when rendering resolved hits.
    fn type_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Registry entry describing this type.
    fn entry() -> DocTypeEntry {
        DocTypeEntry {
            index: Self::INDEX,
            doc_type: Self::DOC_TYPE,
            name: Self::type_name(),
        }
    }
}

/// Registration record of one document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocTypeEntry {
    pub index: &'static str,
    pub doc_type: &'static str,
    pub name: &'static str,
}

/// Known document types, keyed by type tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocTypeRegistry {
    entries: BTreeMap<&'static str, DocTypeEntry>,
}

impl DocTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `D`. Registering the same tag twice keeps the latest entry.
    pub fn register<D: Document>(&mut self) {
        let entry = D::entry();
        self.entries.insert(entry.doc_type, entry);
    }

    pub fn with<D: Document>(mut self) -> Self {
        self.register::<D>();
        self
    }

    /// Merge another registry into this one.
    pub fn extend(&mut self, other: &DocTypeRegistry) {
        self.entries
            .extend(other.entries.iter().map(|(tag, entry)| (*tag, *entry)));
    }

    /// Look up the entry for a hit's type tag.
    ///
    /// The index a hit came from is not consulted, so hits served through an
    /// alias resolve like any other. Hits without a type tag never resolve.
    pub fn resolve(&self, doc_type: Option<&str>) -> Option<DocTypeEntry> {
        self.by_type(doc_type?)
    }

    pub fn by_type(&self, doc_type: &str) -> Option<DocTypeEntry> {
        self.entries.get(doc_type).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn doc_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

/// Errors converting a hit into a document value.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The hit resolved to a different type (or to none).
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// The `_source` did not deserialize into the requested type.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl DocumentError {
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
