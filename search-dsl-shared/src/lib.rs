//! # Search DSL Shared
//!
//! Pure data types shared by the search DSL crates: the query clause tree,
//! aggregation and suggestion requests, document type registration, and the
//! typed result values produced by response mapping. Nothing in this crate
//! performs I/O.

pub mod aggregation;
pub mod aggregation_result;
pub mod document;
pub mod hit;
pub mod query;
pub mod sort;
pub mod suggest;

pub use aggregation::{Aggregation, AggregationKind, ResultShape};
pub use aggregation_result::{AggregationResult, Aggregations, Bucket, Buckets, Stats};
pub use document::{DocTypeEntry, DocTypeRegistry, Document, DocumentError};
pub use hit::{Hit, HitMeta, HitsPage, Total, TotalRelation};
pub use query::{BoolQuery, InnerHits, Query, RangeQuery};
pub use sort::{Sort, SortOrder};
pub use suggest::{SuggestEntry, SuggestOption, Suggester, SuggesterKind};
