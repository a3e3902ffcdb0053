//! Search hits.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use serde_json::{Map, Value};

use crate::document::{DocTypeEntry, Document, DocumentError};

/// Metadata the backend attaches to every hit.
#[derive(Debug, Clone, PartialEq)]
pub struct HitMeta {
    pub index: String,
    pub doc_type: Option<String>,
    pub id: String,
    pub score: Option<f64>,
    /// Related documents keyed by relation name.
    pub inner_hits: BTreeMap<String, HitsPage>,
}

/// A single hit: metadata, source fields and the document type it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub meta: HitMeta,
    pub source: Map<String, Value>,
    resolved: Option<DocTypeEntry>,
}

impl Hit {
    pub fn new(meta: HitMeta, source: Map<String, Value>, resolved: Option<DocTypeEntry>) -> Self {
        Self {
            meta,
            source,
            resolved,
        }
    }

    pub fn id(&self) -> &str {
        &self.meta.id
    }

    /// The registered type this hit resolved to, if any.
    pub fn resolved(&self) -> Option<DocTypeEntry> {
        self.resolved
    }

    /// True when the hit resolved to `D`.
    pub fn is<D: Document>(&self) -> bool {
        self.resolved == Some(D::entry())
    }

    /// Deserialize the source into `D`.
    ///
    /// Fails with `TypeMismatch` when the hit did not resolve to `D`.
    pub fn to_doc<D: Document>(&self) -> Result<D, DocumentError> {
        if !self.is::<D>() {
            let found = self
                .resolved
                .map(|entry| entry.name.to_string())
                .or_else(|| self.meta.doc_type.clone())
                .unwrap_or_else(|| "untyped hit".to_string());
            return Err(DocumentError::type_mismatch(D::type_name(), found));
        }
        Ok(serde_json::from_value(Value::Object(self.source.clone()))?)
    }

    /// Source field lookup; dotted paths walk into objects (`author.name`).
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.source.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn inner_hits(&self, relation: &str) -> Option<&HitsPage> {
        self.meta.inner_hits.get(relation)
    }
}

impl fmt::Display for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolved {
            Some(entry) => write!(
                f,
                "{}(index='{}', doc_type='{}', id='{}')",
                entry.name, self.meta.index, entry.doc_type, self.meta.id
            ),
            None => {
                let scope = self.meta.doc_type.as_deref().unwrap_or(self.meta.index.as_str());
                write!(f, "Hit({}/{})", scope, self.meta.id)
            }
        }
    }
}

/// Whether `Total::value` is exact or a lower bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TotalRelation {
    #[default]
    Eq,
    Gte,
}

/// Total number of matching documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Total {
    pub value: u64,
    pub relation: TotalRelation,
}

impl Total {
    pub fn exact(value: u64) -> Self {
        Self {
            value,
            relation: TotalRelation::Eq,
        }
    }
}

/// A page of hits with its total count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitsPage {
    pub total: Total,
    pub max_score: Option<f64>,
    pub hits: Vec<Hit>,
}

impl HitsPage {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Hit> {
        self.hits.iter()
    }

    pub fn first(&self) -> Option<&Hit> {
        self.hits.first()
    }

    /// Deserialize every hit into `D`, failing on the first hit of another type.
    pub fn docs<D: Document>(&self) -> Result<Vec<D>, DocumentError> {
        self.hits.iter().map(|hit| hit.to_doc::<D>()).collect()
    }
}

impl Index<usize> for HitsPage {
    type Output = Hit;

    fn index(&self, index: usize) -> &Hit {
        &self.hits[index]
    }
}

impl<'a> IntoIterator for &'a HitsPage {
    type Item = &'a Hit;
    type IntoIter = std::slice::Iter<'a, Hit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}
