//! Searchable and returned field declarations

use serde::{Deserialize, Serialize};

/// Smallest snippet the backend will produce
pub const MIN_SNIPPET_SIZE: u32 = 20;

/// Largest snippet the backend will produce
pub const MAX_SNIPPET_SIZE: u32 = 1000;

/// A field the search text is matched against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchField {
    /// Field name in the index
    pub field: String,
    /// Optional relevance weight, left to the backend when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

impl SearchField {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }
}

/// Snippet policy for a returned field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnippetConfig {
    /// Maximum snippet length in characters
    pub size: u32,
    /// Show the raw value when no snippet was produced
    #[serde(default)]
    pub fallback: bool,
}

/// A field returned with every result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultField {
    /// Field name in the index
    pub field: String,
    /// Return the raw, untruncated value
    #[serde(default)]
    pub raw: bool,
    /// Return a highlighted snippet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<SnippetConfig>,
}

impl ResultField {
    /// A field returned as its raw value only (numbers, URLs)
    pub fn raw(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            raw: true,
            snippet: None,
        }
    }

    /// A field returned as a snippet of `size` characters
    pub fn snippet(field: impl Into<String>, size: u32, fallback: bool) -> Self {
        Self {
            field: field.into(),
            raw: false,
            snippet: Some(SnippetConfig { size, fallback }),
        }
    }

    /// Whether the raw value may be shown for this field
    pub fn shows_raw(&self) -> bool {
        self.raw || self.snippet.map(|s| s.fallback).unwrap_or(false)
    }
}
