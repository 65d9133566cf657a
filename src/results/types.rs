//! Result type definitions

use crate::search::FilterValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One returned field: the raw value and, if requested, a highlighted snippet
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    /// Raw value as stored in the index
    #[serde(default)]
    pub raw: serde_json::Value,
    /// Truncated excerpt with matches wrapped in `<em>` tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl FieldValue {
    pub fn raw(raw: impl Into<serde_json::Value>) -> Self {
        Self {
            raw: raw.into(),
            snippet: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    /// Raw value as display text, `None` for null or missing values
    pub fn raw_text(&self) -> Option<String> {
        match &self.raw {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(values) => Some(
                values
                    .iter()
                    .map(|v| match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            other => Some(other.to_string()),
        }
    }
}

/// A single matched document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultItem {
    /// Returned fields by name
    pub fields: BTreeMap<String, FieldValue>,
}

impl ResultItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// One facet bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FacetBucket {
    /// Display label (the value, or the range name)
    pub label: String,
    /// Number of matching documents
    pub count: u64,
    /// Filter selecting this bucket
    pub value: FilterValue,
}

/// Bucket counts for one configured facet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FacetResult {
    pub field: String,
    pub buckets: Vec<FacetBucket>,
}

impl FacetResult {
    pub fn empty(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            buckets: Vec::new(),
        }
    }
}

/// Paging metadata reported by the backend
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PagingInfo {
    /// Current page (1-indexed)
    pub current: u32,
    /// Requested page size
    pub size: u32,
    /// Number of pages available
    pub total_pages: u32,
}

/// Everything returned for one query
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultPage {
    pub items: Vec<ResultItem>,
    /// Total number of matching documents
    pub total_count: u64,
    /// One entry per configured facet, in configured order
    pub facets: Vec<FacetResult>,
    pub paging: PagingInfo,
}

impl ResultPage {
    /// A page with no results
    pub fn empty(current: u32, size: u32) -> Self {
        Self {
            paging: PagingInfo {
                current,
                size,
                total_pages: 0,
            },
            ..Default::default()
        }
    }

    pub fn facet(&self, field: &str) -> Option<&FacetResult> {
        self.facets.iter().find(|f| f.field == field)
    }

    /// 1-indexed position of the first item on this page, 0 when empty
    pub fn start(&self) -> u64 {
        if self.items.is_empty() {
            0
        } else {
            u64::from(self.paging.current.saturating_sub(1)) * u64::from(self.paging.size) + 1
        }
    }

    /// 1-indexed position of the last item on this page, 0 when empty
    pub fn end(&self) -> u64 {
        if self.items.is_empty() {
            0
        } else {
            self.start() + self.items.len() as u64 - 1
        }
    }
}
