//! Suggestion requests and results.

use serde::Deserialize;
use serde_json::{json, Value};

/// Suggester flavours.
#[derive(Debug, Clone, PartialEq)]
pub enum SuggesterKind {
    /// Per-term spelling corrections.
    Term { field: String },
    /// Whole-phrase corrections.
    Phrase { field: String },
    /// Prefix completions over a completion field.
    Completion { field: String },
}

impl SuggesterKind {
    pub fn term(field: impl Into<String>) -> Self {
        SuggesterKind::Term {
            field: field.into(),
        }
    }

    pub fn phrase(field: impl Into<String>) -> Self {
        SuggesterKind::Phrase {
            field: field.into(),
        }
    }

    pub fn completion(field: impl Into<String>) -> Self {
        SuggesterKind::Completion {
            field: field.into(),
        }
    }
}

/// A named suggestion request.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggester {
    pub name: String,
    pub text: String,
    pub kind: SuggesterKind,
}

impl Suggester {
    pub fn new(name: impl Into<String>, text: impl Into<String>, kind: SuggesterKind) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            kind,
        }
    }

    /// The suggester body, without its name.
    pub fn to_json(&self) -> Value {
        match &self.kind {
            SuggesterKind::Term { field } => {
                json!({ "text": self.text, "term": { "field": field } })
            }
            SuggesterKind::Phrase { field } => {
                json!({ "text": self.text, "phrase": { "field": field } })
            }
            // Completion suggesters take a prefix instead of text.
            SuggesterKind::Completion { field } => {
                json!({ "prefix": self.text, "completion": { "field": field } })
            }
        }
    }
}

/// One analyzed token of the suggest text with its candidates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SuggestEntry {
    pub text: String,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub length: u64,
    #[serde(default)]
    pub options: Vec<SuggestOption>,
}

/// A suggested replacement, in backend order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SuggestOption {
    pub text: String,
    #[serde(default, alias = "_score")]
    pub score: f64,
    #[serde(default)]
    pub freq: Option<u64>,
}
