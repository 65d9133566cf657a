//! Facet definitions: value facets and range facets

use serde::{Deserialize, Serialize};

/// Upper bound on distinct values the backend returns for one value facet
pub const MAX_VALUE_FACET_SIZE: u32 = 250;

/// A named numeric interval used by range facets.
///
/// `from` is inclusive and `to` exclusive; either end may be open.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RangeDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
    pub name: String,
}

impl RangeDef {
    pub fn new(from: f64, to: f64, name: impl Into<String>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            name: name.into(),
        }
    }

    /// Whether a backend bucket with these bounds denotes this interval
    pub fn matches_bounds(&self, from: Option<f64>, to: Option<f64>) -> bool {
        fn same(a: Option<f64>, b: Option<f64>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
                (None, None) => true,
                _ => false,
            }
        }
        same(self.from, from) && same(self.to, to)
    }
}

/// The two kinds of facet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FacetKind {
    /// Enumerate up to `size` distinct values with counts
    Value { size: u32 },
    /// Count matches in each configured interval, in configured order
    Range { ranges: Vec<RangeDef> },
}

/// A facet bound to one field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FacetDefinition {
    /// Field the facet counts over
    pub field: String,
    /// Heading shown above the facet
    #[serde(default)]
    pub label: String,
    /// Offer a text box that narrows the listed values
    #[serde(default)]
    pub filterable: bool,
    #[serde(flatten)]
    pub kind: FacetKind,
}

impl FacetDefinition {
    pub fn value(field: impl Into<String>, label: impl Into<String>, size: u32) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
            filterable: false,
            kind: FacetKind::Value { size },
        }
    }

    pub fn range(field: impl Into<String>, label: impl Into<String>, ranges: Vec<RangeDef>) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
            filterable: false,
            kind: FacetKind::Range { ranges },
        }
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    /// Label to display, falling back to the field name
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.field
        } else {
            &self.label
        }
    }

    /// Look up a configured interval by its name
    pub fn range_named(&self, name: &str) -> Option<&RangeDef> {
        match &self.kind {
            FacetKind::Range { ranges } => ranges.iter().find(|r| r.name == name),
            FacetKind::Value { .. } => None,
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self.kind, FacetKind::Range { .. })
    }
}
