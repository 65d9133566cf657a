//! Query state and UI actions

use crate::error::SearchError;
use crate::query::QueryConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::form_urlencoded;

/// Page size used when none is requested
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Sort direction
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
    /// Relevance order, decided by the backend
    #[default]
    None,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
            Self::None => "",
        }
    }

    /// Parse a direction, treating anything unknown as relevance order
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "asc" => Self::Asc,
            "desc" => Self::Desc,
            _ => Self::None,
        }
    }
}

/// A selected filter value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilterValue {
    /// Exact match on a value facet
    Value { value: String },
    /// Membership in a named interval of a range facet
    Range {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<f64>,
    },
}

impl FilterValue {
    pub fn value(value: impl Into<String>) -> Self {
        Self::Value {
            value: value.into(),
        }
    }

    /// Text identifying the value within its facet
    pub fn label(&self) -> &str {
        match self {
            Self::Value { value } => value,
            Self::Range { name, .. } => name,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything needed to issue one search request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryState {
    /// Text typed into the search box
    pub search_term: String,
    /// Selected values per facet field, kept in selection order
    #[serde(default)]
    pub selected_filters: BTreeMap<String, Vec<FilterValue>>,
    /// Field to sort by, relevance when absent
    pub sort_field: Option<String>,
    pub sort_direction: SortDirection,
    /// Page number (1-indexed)
    pub page_number: u32,
    pub page_size: u32,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            selected_filters: BTreeMap::new(),
            sort_field: None,
            sort_direction: SortDirection::None,
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A single user interaction with a control
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    /// New text in the search box; clears filters and returns to page 1
    SetSearchTerm(String),
    /// Select a filter value, or deselect it if already selected
    ToggleFilter { field: String, value: FilterValue },
    /// Clear the filters of one field, or all filters
    ClearFilters(Option<String>),
    SetSort {
        field: Option<String>,
        direction: SortDirection,
    },
    SetPage(u32),
    SetPageSize(u32),
    /// Replace the whole query, as a submitted URL does
    Replace(QueryState),
}

impl QueryState {
    /// Create a query for a search term with default paging
    pub fn new(search_term: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            ..Default::default()
        }
    }

    /// Set page number
    pub fn with_page(mut self, page: u32) -> Self {
        self.page_number = page;
        self
    }

    /// Set page size
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Set sort order
    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_field = Some(field.into());
        self.sort_direction = direction;
        self
    }

    /// Add a filter value
    pub fn with_filter(mut self, field: impl Into<String>, value: FilterValue) -> Self {
        let values = self.selected_filters.entry(field.into()).or_default();
        if !values.contains(&value) {
            values.push(value);
        }
        self
    }

    /// Compute the state that results from a user action
    pub fn apply(&self, action: UiAction) -> QueryState {
        let mut next = self.clone();
        match action {
            UiAction::SetSearchTerm(term) => {
                next.search_term = term;
                next.selected_filters.clear();
                next.page_number = 1;
            }
            UiAction::ToggleFilter { field, value } => {
                let values = next.selected_filters.entry(field.clone()).or_default();
                if let Some(pos) = values.iter().position(|v| *v == value) {
                    values.remove(pos);
                } else {
                    values.push(value);
                }
                if values.is_empty() {
                    next.selected_filters.remove(&field);
                }
                next.page_number = 1;
            }
            UiAction::ClearFilters(Some(field)) => {
                next.selected_filters.remove(&field);
                next.page_number = 1;
            }
            UiAction::ClearFilters(None) => {
                next.selected_filters.clear();
                next.page_number = 1;
            }
            UiAction::SetSort { field, direction } => {
                next.sort_field = field;
                next.sort_direction = direction;
                next.page_number = 1;
            }
            UiAction::SetPage(page) => {
                next.page_number = page;
            }
            UiAction::SetPageSize(size) => {
                next.page_size = size;
                next.page_number = 1;
            }
            UiAction::Replace(state) => next = state,
        }
        next
    }

    /// Whether a filter value is currently selected
    pub fn is_selected(&self, field: &str, value: &FilterValue) -> bool {
        self.selected_filters
            .get(field)
            .map(|values| values.contains(value))
            .unwrap_or(false)
    }

    /// Whether a sort order other than relevance is in effect
    pub fn is_sorted(&self) -> bool {
        self.sort_field.is_some() && self.sort_direction != SortDirection::None
    }

    /// Reject queries that must never reach the backend
    pub fn validate(&self, config: &QueryConfig) -> Result<(), SearchError> {
        if self.page_number < 1 {
            return Err(SearchError::validation("page number must be at least 1"));
        }
        if self.page_size == 0 {
            return Err(SearchError::validation("page size must be positive"));
        }
        if self.page_size > config.max_page_size {
            return Err(SearchError::validation(format!(
                "page size must not exceed {}",
                config.max_page_size
            )));
        }

        match (&self.sort_field, self.sort_direction) {
            (Some(field), SortDirection::None) => {
                return Err(SearchError::validation(format!(
                    "sort field '{}' needs a direction",
                    field
                )));
            }
            (None, SortDirection::Asc | SortDirection::Desc) => {
                return Err(SearchError::validation("sort direction needs a field"));
            }
            _ => {}
        }

        for (field, values) in &self.selected_filters {
            let facet = config.facet(field).ok_or_else(|| {
                SearchError::validation(format!("'{}' is not a facet field", field))
            })?;
            for value in values {
                match value {
                    FilterValue::Value { .. } if facet.is_range() => {
                        return Err(SearchError::validation(format!(
                            "facet '{}' only accepts ranges",
                            field
                        )));
                    }
                    FilterValue::Range { name, from, to } => {
                        let range = facet.range_named(name).ok_or_else(|| {
                            SearchError::validation(format!(
                                "facet '{}' has no range named '{}'",
                                field, name
                            ))
                        })?;
                        if !range.matches_bounds(*from, *to) {
                            return Err(SearchError::validation(format!(
                                "range '{}' of facet '{}' does not match its configured bounds",
                                name, field
                            )));
                        }
                    }
                    FilterValue::Value { .. } => {}
                }
            }
        }

        Ok(())
    }

    /// Encode the query as URL query parameters.
    ///
    /// Filters are written as repeated `filter=field:value` pairs, ranges by
    /// their configured name.
    pub fn to_query_string(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        out.append_pair("q", &self.search_term);
        for (field, values) in &self.selected_filters {
            for value in values {
                out.append_pair("filter", &format!("{}:{}", field, value.label()));
            }
        }
        if let Some(field) = self.sort_field.as_deref().filter(|_| self.is_sorted()) {
            out.append_pair("sort", field);
            out.append_pair("dir", self.sort_direction.as_str());
        }
        out.append_pair("page", &self.page_number.to_string());
        out.append_pair("size", &self.page_size.to_string());
        out.finish()
    }

    /// Decode a query from URL query parameters.
    ///
    /// Range filters are resolved against the configured intervals. The result
    /// is not validated; call [`QueryState::validate`] before issuing it.
    pub fn from_query_string(
        query: &str,
        config: &QueryConfig,
        default_page_size: u32,
    ) -> Result<Self, SearchError> {
        let mut state = QueryState {
            page_size: default_page_size,
            ..Default::default()
        };

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "q" => state.search_term = value.into_owned(),
                "page" => state.page_number = parse_number("page", &value)?,
                "size" => state.page_size = parse_number("size", &value)?,
                "sort" if !value.is_empty() => state.sort_field = Some(value.into_owned()),
                "dir" => state.sort_direction = SortDirection::parse(&value),
                "filter" => {
                    let (field, raw) = value.split_once(':').ok_or_else(|| {
                        SearchError::validation(format!("malformed filter '{}'", value))
                    })?;
                    let facet = config.facet(field).ok_or_else(|| {
                        SearchError::validation(format!("'{}' is not a facet field", field))
                    })?;
                    let filter = if facet.is_range() {
                        let range = facet.range_named(raw).ok_or_else(|| {
                            SearchError::validation(format!(
                                "facet '{}' has no range named '{}'",
                                field, raw
                            ))
                        })?;
                        FilterValue::Range {
                            name: range.name.clone(),
                            from: range.from,
                            to: range.to,
                        }
                    } else {
                        FilterValue::value(raw)
                    };
                    state = state.with_filter(field, filter);
                }
                _ => {}
            }
        }

        Ok(state)
    }
}

fn parse_number(name: &str, value: &str) -> Result<u32, SearchError> {
    value
        .trim()
        .parse()
        .map_err(|_| SearchError::validation(format!("{} must be a non-negative integer", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(name: &str, from: f64, to: f64) -> FilterValue {
        FilterValue::Range {
            name: name.to_string(),
            from: Some(from),
            to: Some(to),
        }
    }

    #[test]
    fn test_default_query() {
        let query = QueryState::new("zelda");
        assert_eq!(query.search_term, "zelda");
        assert_eq!(query.page_number, 1);
        assert_eq!(query.sort_direction, SortDirection::None);
    }

    #[test]
    fn test_search_term_clears_filters_and_page() {
        let query = QueryState::new("zelda")
            .with_filter("genre", FilterValue::value("Action"))
            .with_page(4);
        let next = query.apply(UiAction::SetSearchTerm("mario".to_string()));
        assert_eq!(next.search_term, "mario");
        assert!(next.selected_filters.is_empty());
        assert_eq!(next.page_number, 1);
        // the source state is untouched
        assert_eq!(query.page_number, 4);
    }

    #[test]
    fn test_toggle_filter() {
        let query = QueryState::new("zelda").with_page(3);
        let value = FilterValue::value("Nintendo");
        let on = query.apply(UiAction::ToggleFilter {
            field: "publisher".to_string(),
            value: value.clone(),
        });
        assert!(on.is_selected("publisher", &value));
        assert_eq!(on.page_number, 1);

        let off = on.apply(UiAction::ToggleFilter {
            field: "publisher".to_string(),
            value: value.clone(),
        });
        assert!(!off.is_selected("publisher", &value));
        assert!(!off.selected_filters.contains_key("publisher"));
    }

    #[test]
    fn test_set_page_keeps_filters() {
        let query = QueryState::new("zelda").with_filter("genre", FilterValue::value("RPG"));
        let next = query.apply(UiAction::SetPage(2));
        assert_eq!(next.page_number, 2);
        assert_eq!(next.selected_filters.len(), 1);
    }

    #[test]
    fn test_validate_paging() {
        let config = QueryConfig::default();
        assert!(QueryState::new("x").validate(&config).is_ok());
        assert!(QueryState::new("x").with_page(0).validate(&config).is_err());
        assert!(QueryState::new("x").with_page_size(0).validate(&config).is_err());
        assert!(QueryState::new("x").with_page_size(1000).validate(&config).is_err());
    }

    #[test]
    fn test_validate_sort_pairs() {
        let config = QueryConfig::default();
        let mut query = QueryState::new("x");
        query.sort_field = Some("name".to_string());
        assert!(query.validate(&config).is_err());

        let query = QueryState::new("x").with_sort("name", SortDirection::Asc);
        assert!(query.validate(&config).is_ok());
    }

    #[test]
    fn test_validate_filters() {
        let config = QueryConfig::default();
        let unknown = QueryState::new("x").with_filter("studio", FilterValue::value("a"));
        assert!(unknown.validate(&config).is_err());

        let bad_range = QueryState::new("x").with_filter("user_score", range("Amazing", 0.0, 1.0));
        assert!(bad_range.validate(&config).is_err());

        let value_on_range = QueryState::new("x").with_filter("user_score", FilterValue::value("7"));
        assert!(value_on_range.validate(&config).is_err());

        let ok = QueryState::new("x").with_filter("user_score", range("Not bad", 5.0, 7.0));
        assert!(ok.validate(&config).is_ok());
    }

    #[test]
    fn test_validate_range_bounds_follow_config() {
        let config = QueryConfig::default();

        let widened = QueryState::new("x").with_filter("user_score", range("Not bad", 0.0, 100.0));
        assert!(matches!(
            widened.validate(&config),
            Err(SearchError::Validation(_))
        ));

        let open = QueryState::new("x").with_filter(
            "user_score",
            FilterValue::Range {
                name: "Not bad".to_string(),
                from: None,
                to: Some(7.0),
            },
        );
        assert!(open.validate(&config).is_err());

        let critic = QueryState::new("x").with_filter("critic_score", range("Not bad", 50.0, 70.0));
        assert!(critic.validate(&config).is_ok());
    }

    #[test]
    fn test_query_string_round_trip() {
        let config = QueryConfig::default();
        let query = QueryState::new("the legend")
            .with_filter("genre", FilterValue::value("Role-Playing"))
            .with_filter("user_score", range("Must play!", 9.0, 10.0))
            .with_sort("name", SortDirection::Asc)
            .with_page(2)
            .with_page_size(40);

        let encoded = query.to_query_string();
        assert!(encoded.contains("q=the+legend"));
        assert!(encoded.contains("sort=name"));

        let decoded = QueryState::from_query_string(&encoded, &config, 20).unwrap();
        assert_eq!(decoded, query);
    }

    #[test]
    fn test_from_query_string_rejects_unknown_range() {
        let config = QueryConfig::default();
        let err = QueryState::from_query_string("q=x&filter=user_score:Sublime", &config, 20)
            .unwrap_err();
        assert!(matches!(err, SearchError::Validation(_)));
    }

    #[test]
    fn test_from_query_string_defaults() {
        let config = QueryConfig::default();
        let query = QueryState::from_query_string("q=zelda", &config, 40).unwrap();
        assert_eq!(query.page_size, 40);
        assert_eq!(query.page_number, 1);
        assert!(!query.is_sorted());
    }
}
