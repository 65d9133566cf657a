//! HTTP request handlers

use super::state::AppState;
use super::view::{ApiResponse, SearchView};
use crate::autocomplete::fetch_suggestions;
use crate::composer::Snapshot;
use crate::error::SearchError;
use crate::search::{QueryState, UiAction};
use axum::{
    extract::{Query, RawQuery, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use url::form_urlencoded;

/// Home page handler
pub async fn index(State(state): State<AppState>) -> Response {
    let snapshot = state.composer.snapshot();
    render(&state, &snapshot, None, Format::Html)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Format {
    Html,
    Json,
}

impl Format {
    fn from_query(query: &str) -> Self {
        let json = form_urlencoded::parse(query.as_bytes())
            .any(|(key, value)| key == "format" && value == "json");
        if json {
            Self::Json
        } else {
            Self::Html
        }
    }
}

/// Search handler
///
/// The URL carries the complete query. It replaces the session's query and
/// the page shows the outcome of the most recently issued request.
pub async fn search(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let raw = raw.unwrap_or_default();
    let format = Format::from_query(&raw);

    let query = match QueryState::from_query_string(
        &raw,
        &state.settings.search,
        state.settings.ui.default_page_size,
    ) {
        Ok(query) => query,
        Err(err) => return rejected(&state, err, format),
    };

    match state.composer.dispatch(UiAction::Replace(query)).await {
        Ok(snapshot) => render(&state, &snapshot, None, format),
        Err(err) => rejected(&state, err, format),
    }
}

fn rejected(state: &AppState, err: SearchError, format: Format) -> Response {
    tracing::debug!("Rejected query: {}", err);
    let snapshot = state.composer.snapshot();
    let mut response = render(state, &snapshot, Some(&err), format);
    *response.status_mut() = StatusCode::BAD_REQUEST;
    response
}

fn render(
    state: &AppState,
    snapshot: &Snapshot,
    validation: Option<&SearchError>,
    format: Format,
) -> Response {
    if format == Format::Json {
        return Json(ApiResponse::new(snapshot, validation)).into_response();
    }

    let view = SearchView::build(&state.settings, snapshot, validation);
    match state.templates.render("search.html", &view) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "instance": state.instance_name(),
        "connector": state.composer.search().connector_name(),
        "version": crate::VERSION
    }))
}

/// Autocomplete parameters
#[derive(Debug, Deserialize)]
pub struct AutocompleteParams {
    #[serde(default)]
    pub q: String,
}

/// Autocomplete handler
pub async fn autocomplete(
    State(state): State<AppState>,
    Query(params): Query<AutocompleteParams>,
) -> Response {
    match fetch_suggestions(
        state.composer.search(),
        &state.settings.autocomplete,
        &params.q,
    )
    .await
    {
        Ok(suggestions) => Json(suggestions).into_response(),
        Err(err) => {
            tracing::warn!("Autocomplete failed: {}", err);
            (StatusCode::BAD_GATEWAY, Json(err)).into_response()
        }
    }
}
