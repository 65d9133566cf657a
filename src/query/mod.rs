//! Query configuration module
//!
//! Static declaration of what is searched, what comes back with each result
//! and which fields can be used for faceted filtering. Loaded once at startup
//! as part of the settings and never mutated afterwards.

mod facets;
mod fields;

pub use facets::*;
pub use fields::*;

use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Complete query configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueryConfig {
    /// Fields the search text is matched against
    pub search_fields: Vec<SearchField>,
    /// Fields returned with every result, in display order
    pub result_fields: Vec<ResultField>,
    /// Facets, in display order
    pub facets: Vec<FacetDefinition>,
    /// Largest page size a user may request
    pub max_page_size: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        let score_ranges = |scale: f64| {
            vec![
                RangeDef::new(0.0, 5.0 * scale, "Not good"),
                RangeDef::new(5.0 * scale, 7.0 * scale, "Not bad"),
                RangeDef::new(7.0 * scale, 9.0 * scale, "Pretty good"),
                RangeDef::new(9.0 * scale, 10.0 * scale, "Must play!"),
            ]
        };

        Self {
            search_fields: vec![SearchField::new("name")],
            result_fields: vec![
                ResultField::snippet("name", 75, true),
                ResultField::snippet("genre", 50, true),
                ResultField::snippet("publisher", 50, true),
                ResultField::raw("critic_score"),
                ResultField::raw("user_score"),
                ResultField::snippet("platform", 50, true),
                ResultField::raw("image_url"),
            ],
            facets: vec![
                FacetDefinition::range("user_score", "User Score", score_ranges(1.0)),
                FacetDefinition::range("critic_score", "Critic Score", score_ranges(10.0)),
                FacetDefinition::value("genre", "Genre", 100),
                FacetDefinition::value("publisher", "Publisher", 100).filterable(true),
                FacetDefinition::value("platform", "Platform", 100),
            ],
            max_page_size: 100,
        }
    }
}

impl QueryConfig {
    /// Get a facet definition by field name
    pub fn facet(&self, field: &str) -> Option<&FacetDefinition> {
        self.facets.iter().find(|f| f.field == field)
    }

    /// Get a result field declaration by name
    pub fn result_field(&self, field: &str) -> Option<&ResultField> {
        self.result_fields.iter().find(|f| f.field == field)
    }

    /// Check the configuration for declarations the backend would reject
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.search_fields.is_empty() {
            return Err(SearchError::validation("at least one search field is required"));
        }
        if self.result_fields.is_empty() {
            return Err(SearchError::validation("at least one result field is required"));
        }
        if self.max_page_size == 0 {
            return Err(SearchError::validation("max_page_size must be positive"));
        }

        for field in &self.result_fields {
            if let Some(snippet) = field.snippet {
                if !(MIN_SNIPPET_SIZE..=MAX_SNIPPET_SIZE).contains(&snippet.size) {
                    return Err(SearchError::validation(format!(
                        "snippet size for '{}' must be between {} and {}",
                        field.field, MIN_SNIPPET_SIZE, MAX_SNIPPET_SIZE
                    )));
                }
            } else if !field.raw {
                return Err(SearchError::validation(format!(
                    "result field '{}' requests neither raw nor snippet",
                    field.field
                )));
            }
        }

        let mut seen = HashSet::new();
        for facet in &self.facets {
            if !seen.insert(facet.field.as_str()) {
                return Err(SearchError::validation(format!(
                    "facet '{}' is declared twice",
                    facet.field
                )));
            }

            match &facet.kind {
                FacetKind::Value { size } => {
                    if *size == 0 || *size > MAX_VALUE_FACET_SIZE {
                        return Err(SearchError::validation(format!(
                            "value facet '{}' size must be between 1 and {}",
                            facet.field, MAX_VALUE_FACET_SIZE
                        )));
                    }
                }
                FacetKind::Range { ranges } => validate_ranges(&facet.field, ranges)?,
            }
        }

        Ok(())
    }
}

/// Ranges must be non-empty, uniquely named, and ascending without overlap
fn validate_ranges(field: &str, ranges: &[RangeDef]) -> Result<(), SearchError> {
    if ranges.is_empty() {
        return Err(SearchError::validation(format!(
            "range facet '{}' has no ranges",
            field
        )));
    }

    let mut names = HashSet::new();
    let mut previous_to: Option<f64> = None;

    for (i, range) in ranges.iter().enumerate() {
        if !names.insert(range.name.as_str()) {
            return Err(SearchError::validation(format!(
                "range facet '{}' repeats the name '{}'",
                field, range.name
            )));
        }
        if range.from.is_none() && range.to.is_none() {
            return Err(SearchError::validation(format!(
                "range '{}' of facet '{}' is unbounded",
                range.name, field
            )));
        }
        if let (Some(from), Some(to)) = (range.from, range.to) {
            if from >= to {
                return Err(SearchError::validation(format!(
                    "range '{}' of facet '{}' is empty",
                    range.name, field
                )));
            }
        }
        if i > 0 {
            // only the first interval may be open below
            let from = range.from.ok_or_else(|| {
                SearchError::validation(format!(
                    "range '{}' of facet '{}' must have a lower bound",
                    range.name, field
                ))
            })?;
            match previous_to {
                Some(prev) if from >= prev => {}
                _ => {
                    return Err(SearchError::validation(format!(
                        "ranges of facet '{}' must be ascending and non-overlapping",
                        field
                    )))
                }
            }
        }
        previous_to = range.to;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = QueryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.facets.len(), 5);
        assert!(config.facet("publisher").unwrap().filterable);
    }

    #[test]
    fn test_critic_score_ranges_scaled() {
        let config = QueryConfig::default();
        let critic = config.facet("critic_score").unwrap();
        let range = critic.range_named("Pretty good").unwrap();
        assert_eq!(range.from, Some(70.0));
        assert_eq!(range.to, Some(90.0));
    }

    #[test]
    fn test_rejects_duplicate_facet() {
        let mut config = QueryConfig::default();
        config.facets.push(FacetDefinition::value("genre", "Genre again", 10));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_value_facet_size() {
        let mut config = QueryConfig::default();
        config.facets = vec![FacetDefinition::value("genre", "Genre", 0)];
        assert!(config.validate().is_err());
        config.facets = vec![FacetDefinition::value("genre", "Genre", 251)];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_descending_ranges() {
        let mut config = QueryConfig::default();
        config.facets = vec![FacetDefinition::range(
            "user_score",
            "User Score",
            vec![RangeDef::new(5.0, 7.0, "b"), RangeDef::new(0.0, 5.0, "a")],
        )];
        assert!(matches!(config.validate(), Err(SearchError::Validation(_))));
    }

    #[test]
    fn test_rejects_tiny_snippet() {
        let mut config = QueryConfig::default();
        config.result_fields = vec![ResultField::snippet("name", 5, true)];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_facet_kinds() {
        let yaml = r#"
search_fields:
  - field: name
result_fields:
  - field: name
    snippet: { size: 75, fallback: true }
  - field: user_score
    raw: true
facets:
  - field: genre
    label: Genre
    type: value
    size: 100
  - field: user_score
    type: range
    ranges:
      - { from: 0, to: 5, name: "Not good" }
      - { from: 5, to: 10, name: "Good" }
"#;
        let config: QueryConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.facets[0].kind, FacetKind::Value { size: 100 });
        assert!(config.facets[1].is_range());
        assert_eq!(config.max_page_size, 100);
    }
}
