//! View models rendered by the templates and the JSON API

use crate::composer::{Snapshot, ViewState};
use crate::config::Settings;
use crate::error::SearchError;
use crate::results::snippet::{display_html, strip_highlight};
use crate::results::{ResultItem, ResultPage};
use crate::search::{QueryState, UiAction};
use serde::Serialize;

/// Pages linked on either side of the current one
const PAGE_WINDOW: u32 = 2;

/// Everything the search page template needs
#[derive(Debug, Serialize)]
pub struct SearchView {
    pub instance_name: String,
    pub search_term: String,
    pub status: &'static str,
    pub error: Option<ErrorView>,
    /// Local validation message for a rejected action
    pub validation: Option<String>,
    pub results: Vec<ResultView>,
    pub facets: Vec<FacetView>,
    pub paging: Option<PagingView>,
    pub sort_label: String,
    pub sort_options: Vec<OptionView>,
    pub page_sizes: Vec<OptionView>,
    pub page_size: u32,
    pub autocomplete: bool,
    pub clear_filters_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorView {
    pub kind: &'static str,
    pub message: String,
    pub retry_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResultView {
    pub title_html: String,
    pub title_text: String,
    pub url: Option<String>,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Serialize)]
pub struct FieldView {
    pub name: String,
    pub html: String,
}

#[derive(Debug, Serialize)]
pub struct FacetView {
    pub field: String,
    pub label: String,
    pub filterable: bool,
    pub buckets: Vec<BucketView>,
    pub clear_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BucketView {
    pub label: String,
    pub count: u64,
    pub selected: bool,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct PagingView {
    pub start: u64,
    pub end: u64,
    pub total: u64,
    pub current: u32,
    pub total_pages: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
    pub pages: Vec<PageLink>,
}

#[derive(Debug, Serialize)]
pub struct PageLink {
    pub number: u32,
    pub url: String,
    pub current: bool,
}

#[derive(Debug, Serialize)]
pub struct OptionView {
    pub name: String,
    pub url: String,
    pub selected: bool,
}

/// JSON response of the search endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<'a> {
    pub status: &'static str,
    pub sequence: u64,
    pub query: &'a QueryState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<&'a ResultPage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a SearchError>,
}

impl<'a> ApiResponse<'a> {
    pub fn new(snapshot: &'a Snapshot, validation: Option<&'a SearchError>) -> Self {
        Self {
            status: snapshot.state.name(),
            sequence: snapshot.sequence,
            query: &snapshot.query,
            page: snapshot.state.page(),
            error: validation.or_else(|| snapshot.state.error()),
        }
    }
}

/// URL of the search endpoint for a query
pub fn search_url(query: &QueryState) -> String {
    format!("/search?{}", query.to_query_string())
}

impl SearchView {
    pub fn build(settings: &Settings, snapshot: &Snapshot, validation: Option<&SearchError>) -> Self {
        let query = &snapshot.query;

        let error = snapshot.state.error().map(|err| ErrorView {
            kind: err.kind(),
            message: err.to_string(),
            retry_url: err.is_retryable().then(|| search_url(query)),
        });

        let (results, facets, paging): (Vec<ResultView>, Vec<FacetView>, Option<PagingView>) = match &snapshot.state {
            ViewState::Loaded(page) => (
                page.items.iter().map(|item| result_view(settings, item)).collect(),
                facet_views(settings, query, page),
                Some(paging_view(query, page)),
            ),
            _ => (Vec::new(), Vec::new(), None),
        };

        let sort_options = settings
            .ui
            .sort_options
            .iter()
            .map(|option| {
                let next = query.apply(UiAction::SetSort {
                    field: option.field.clone(),
                    direction: option.direction,
                });
                OptionView {
                    name: option.name.clone(),
                    selected: next.sort_field == query.sort_field
                        && next.sort_direction == query.sort_direction,
                    url: search_url(&next),
                }
            })
            .collect();

        let page_sizes = settings
            .ui
            .results_per_page
            .iter()
            .map(|size| OptionView {
                name: size.to_string(),
                url: search_url(&query.apply(UiAction::SetPageSize(*size))),
                selected: *size == query.page_size,
            })
            .collect();

        Self {
            instance_name: settings.general.instance_name.clone(),
            search_term: query.search_term.clone(),
            status: snapshot.state.name(),
            error,
            validation: validation.map(|e| e.to_string()),
            results,
            facets,
            paging,
            sort_label: settings.ui.sort_label.clone(),
            sort_options,
            page_sizes,
            page_size: query.page_size,
            autocomplete: settings.autocomplete.enabled,
            clear_filters_url: (!query.selected_filters.is_empty())
                .then(|| search_url(&query.apply(UiAction::ClearFilters(None)))),
        }
    }
}

fn result_view(settings: &Settings, item: &ResultItem) -> ResultView {
    let config = &settings.search;
    let title_field = settings.ui.title_field.as_str();

    let (title_html, title_text) = match item.field(title_field) {
        Some(value) => {
            let html = display_html(value, config.result_field(title_field)).unwrap_or_default();
            let text = value
                .raw_text()
                .or_else(|| value.snippet.as_deref().map(strip_highlight))
                .unwrap_or_default();
            (html, text)
        }
        None => (String::new(), String::new()),
    };

    let url = settings
        .ui
        .url_field
        .as_deref()
        .and_then(|f| item.field(f))
        .and_then(|v| v.raw_text());

    // configured fields only, in configured order
    let fields = config
        .result_fields
        .iter()
        .filter(|f| f.field != title_field && Some(f.field.as_str()) != settings.ui.url_field.as_deref())
        .filter_map(|f| {
            let value = item.field(&f.field)?;
            let html = display_html(value, Some(f))?;
            Some(FieldView {
                name: f.field.clone(),
                html,
            })
        })
        .collect();

    ResultView {
        title_html,
        title_text,
        url,
        fields,
    }
}

fn facet_views(settings: &Settings, query: &QueryState, page: &ResultPage) -> Vec<FacetView> {
    settings
        .search
        .facets
        .iter()
        .map(|facet| {
            let buckets = page
                .facet(&facet.field)
                .map(|result| {
                    result
                        .buckets
                        .iter()
                        .map(|bucket| BucketView {
                            label: bucket.label.clone(),
                            count: bucket.count,
                            selected: query.is_selected(&facet.field, &bucket.value),
                            url: search_url(&query.apply(UiAction::ToggleFilter {
                                field: facet.field.clone(),
                                value: bucket.value.clone(),
                            })),
                        })
                        .collect()
                })
                .unwrap_or_default();

            FacetView {
                field: facet.field.clone(),
                label: facet.display_label().to_string(),
                filterable: facet.filterable,
                buckets,
                clear_url: query.selected_filters.contains_key(&facet.field).then(|| {
                    search_url(&query.apply(UiAction::ClearFilters(Some(facet.field.clone()))))
                }),
            }
        })
        .collect()
}

fn paging_view(query: &QueryState, page: &ResultPage) -> PagingView {
    let current = page.paging.current.max(1);
    let total_pages = page.paging.total_pages;
    let link = |number: u32| search_url(&query.apply(UiAction::SetPage(number)));

    let first = current.saturating_sub(PAGE_WINDOW).max(1);
    let last = current.saturating_add(PAGE_WINDOW).min(total_pages);
    let pages = (first..=last)
        .map(|number| PageLink {
            number,
            url: link(number),
            current: number == current,
        })
        .collect();

    PagingView {
        start: page.start(),
        end: page.end(),
        total: page.total_count,
        current,
        total_pages,
        prev_url: (current > 1).then(|| link(current - 1)),
        next_url: (current < total_pages).then(|| link(current + 1)),
        pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{FacetBucket, FacetResult, FieldValue, PagingInfo};
    use crate::search::FilterValue;
    use std::sync::Arc;

    fn loaded(query: QueryState, page: ResultPage) -> Snapshot {
        Snapshot {
            query,
            state: ViewState::Loaded(Arc::new(page)),
            sequence: 1,
        }
    }

    fn sample_page() -> ResultPage {
        ResultPage {
            items: vec![ResultItem::new()
                .with_field(
                    "name",
                    FieldValue::raw("The Legend of Zelda").with_snippet("The Legend of <em>Zelda</em>"),
                )
                .with_field("image_url", FieldValue::raw("https://img.example.com/z.png"))
                .with_field("user_score", FieldValue::raw(9.1))],
            total_count: 45,
            facets: vec![FacetResult {
                field: "genre".to_string(),
                buckets: vec![FacetBucket {
                    label: "Action".to_string(),
                    count: 12,
                    value: FilterValue::value("Action"),
                }],
            }],
            paging: PagingInfo {
                current: 2,
                size: 20,
                total_pages: 3,
            },
        }
    }

    #[test]
    fn test_result_view() {
        let settings = Settings::default();
        let snapshot = loaded(QueryState::new("zelda").with_page(2), sample_page());
        let view = SearchView::build(&settings, &snapshot, None);

        let result = &view.results[0];
        assert_eq!(result.title_html, "The Legend of <em>Zelda</em>");
        assert_eq!(result.title_text, "The Legend of Zelda");
        assert_eq!(result.url.as_deref(), Some("https://img.example.com/z.png"));
        assert_eq!(result.fields.len(), 1);
        assert_eq!(result.fields[0].name, "user_score");
    }

    #[test]
    fn test_facet_and_paging_links() {
        let settings = Settings::default();
        let snapshot = loaded(QueryState::new("zelda").with_page(2), sample_page());
        let view = SearchView::build(&settings, &snapshot, None);

        assert_eq!(view.facets.len(), settings.search.facets.len());
        let genre = view.facets.iter().find(|f| f.field == "genre").unwrap();
        assert!(genre.buckets[0].url.contains("filter=genre%3AAction"));
        assert!(genre.buckets[0].url.contains("page=1"));
        assert!(!genre.buckets[0].selected);

        let paging = view.paging.unwrap();
        assert_eq!(paging.start, 21);
        assert_eq!(paging.total, 45);
        assert!(paging.prev_url.unwrap().contains("page=1"));
        assert!(paging.next_url.unwrap().contains("page=3"));
        assert_eq!(paging.pages.len(), 3);
    }

    #[test]
    fn test_error_view() {
        let settings = Settings::default();
        let snapshot = Snapshot {
            query: QueryState::new("zelda"),
            state: ViewState::Errored(SearchError::auth("expired")),
            sequence: 1,
        };
        let view = SearchView::build(&settings, &snapshot, None);
        let error = view.error.unwrap();
        assert_eq!(error.kind, "auth");
        assert!(error.retry_url.is_none());
        assert!(view.results.is_empty());
    }

    #[test]
    fn test_sort_selection() {
        let settings = Settings::default();
        let snapshot = loaded(
            QueryState::new("zelda").with_sort("name", crate::search::SortDirection::Asc),
            sample_page(),
        );
        let view = SearchView::build(&settings, &snapshot, None);
        assert!(!view.sort_options[0].selected);
        assert!(view.sort_options[1].selected);
        assert!(view.sort_options[0].url.contains("q=zelda"));
        assert!(!view.sort_options[0].url.contains("sort="));
    }
}
