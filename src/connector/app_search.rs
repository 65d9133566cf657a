//! App Search connector
//!
//! Talks to the App Search search and query suggestion APIs using a public
//! search key. Requests are built from the query configuration; responses are
//! normalized so that every configured facet is present, value facets honour
//! their size cap and range facets come back in configured order.

use super::traits::*;
use crate::config::ConnectorSettings;
use crate::error::SearchError;
use crate::network::HttpClient;
use crate::query::{FacetDefinition, FacetKind, QueryConfig, RangeDef};
use crate::results::{FacetBucket, FacetResult, FieldValue, PagingInfo, ResultItem, ResultPage};
use crate::search::{FilterValue, QueryState};
use anyhow::anyhow;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// App Search connector
pub struct AppSearch {
    client: HttpClient,
    search_url: String,
    suggestion_url: String,
    search_key: String,
    config: Arc<QueryConfig>,
}

impl AppSearch {
    /// Create a connector for the configured engine.
    ///
    /// Fails when no search key has been supplied.
    pub fn new(
        client: HttpClient,
        settings: &ConnectorSettings,
        config: Arc<QueryConfig>,
    ) -> anyhow::Result<Self> {
        let search_key = settings
            .search_key
            .as_ref()
            .ok_or_else(|| anyhow!("App Search requires a search key"))?
            .expose()
            .to_string();

        let base = url::Url::parse(&settings.endpoint_base)?;
        let engine_url = format!(
            "{}/api/as/v1/engines/{}",
            base.as_str().trim_end_matches('/'),
            settings.engine_name
        );

        Ok(Self {
            client,
            search_url: format!("{}/search.json", engine_url),
            suggestion_url: format!("{}/query_suggestion", engine_url),
            search_key,
            config,
        })
    }

    /// Build the search request for a query
    pub fn request(&self, query: &QueryState) -> BackendRequest {
        BackendRequest::post(&self.search_url)
            .header("Authorization", format!("Bearer {}", self.search_key))
            .json(search_body(&self.config, query))
    }

    /// Parse a search response into a normalized page
    pub fn response(&self, response: BackendResponse) -> Result<ResultPage, SearchError> {
        if !response.is_success() {
            return Err(response.error());
        }
        let body: SearchResponseBody = response.json()?;
        Ok(normalize(&self.config, body))
    }
}

#[async_trait]
impl Connector for AppSearch {
    fn name(&self) -> &str {
        "app_search"
    }

    async fn search(&self, query: &QueryState) -> Result<ResultPage, SearchError> {
        let response = self.client.execute(self.request(query)).await?;
        self.response(response)
    }

    async fn suggest(
        &self,
        term: &str,
        fields: &[String],
        size: u32,
    ) -> Result<Vec<String>, SearchError> {
        let request = BackendRequest::post(&self.suggestion_url)
            .header("Authorization", format!("Bearer {}", self.search_key))
            .json(json!({
                "query": term,
                "types": { "documents": { "fields": fields } },
                "size": size,
            }));

        let response = self.client.execute(request).await?;
        if !response.is_success() {
            return Err(response.error());
        }

        let body: SuggestionResponseBody = response.json()?;
        Ok(body
            .results
            .documents
            .into_iter()
            .map(|d| d.suggestion)
            .take(size as usize)
            .collect())
    }
}

/// Build the JSON body of a search request.
///
/// Keys are emitted in a fixed order, so the same query always produces the
/// same body.
pub fn search_body(config: &QueryConfig, query: &QueryState) -> Value {
    let mut body = Map::new();
    body.insert("query".into(), json!(query.search_term));
    body.insert(
        "page".into(),
        json!({ "current": query.page_number, "size": query.page_size }),
    );

    let search_fields: Map<String, Value> = config
        .search_fields
        .iter()
        .map(|f| {
            let options = match f.weight {
                Some(weight) => json!({ "weight": weight }),
                None => json!({}),
            };
            (f.field.clone(), options)
        })
        .collect();
    body.insert("search_fields".into(), Value::Object(search_fields));

    let result_fields: Map<String, Value> = config
        .result_fields
        .iter()
        .map(|f| {
            let mut options = Map::new();
            if f.raw {
                options.insert("raw".into(), json!({}));
            }
            if let Some(snippet) = f.snippet {
                options.insert(
                    "snippet".into(),
                    json!({ "size": snippet.size, "fallback": snippet.fallback }),
                );
            }
            (f.field.clone(), Value::Object(options))
        })
        .collect();
    body.insert("result_fields".into(), Value::Object(result_fields));

    if !config.facets.is_empty() {
        let facets: Map<String, Value> = config
            .facets
            .iter()
            .map(|f| (f.field.clone(), facet_request(f)))
            .collect();
        body.insert("facets".into(), Value::Object(facets));
    }

    if !query.selected_filters.is_empty() {
        // values of one field are OR'ed, fields are AND'ed
        let all: Vec<Value> = query
            .selected_filters
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(field, values)| {
                let any: Vec<Value> = values
                    .iter()
                    .map(|value| json!({ field.as_str(): filter_value(value) }))
                    .collect();
                json!({ "any": any })
            })
            .collect();
        if !all.is_empty() {
            body.insert("filters".into(), json!({ "all": all }));
        }
    }

    if let (Some(field), true) = (&query.sort_field, query.is_sorted()) {
        body.insert(
            "sort".into(),
            json!({ field.as_str(): query.sort_direction.as_str() }),
        );
    }

    Value::Object(body)
}

fn facet_request(facet: &FacetDefinition) -> Value {
    match &facet.kind {
        FacetKind::Value { size } => json!({ "type": "value", "size": size }),
        FacetKind::Range { ranges } => json!({
            "type": "range",
            "ranges": ranges.iter().map(range_json).collect::<Vec<_>>(),
        }),
    }
}

fn range_json(range: &RangeDef) -> Value {
    let mut out = Map::new();
    if let Some(from) = range.from {
        out.insert("from".into(), json!(from));
    }
    if let Some(to) = range.to {
        out.insert("to".into(), json!(to));
    }
    out.insert("name".into(), json!(range.name));
    Value::Object(out)
}

fn filter_value(value: &FilterValue) -> Value {
    match value {
        FilterValue::Value { value } => json!(value),
        FilterValue::Range { from, to, .. } => {
            let mut out = Map::new();
            if let Some(from) = from {
                out.insert("from".into(), json!(from));
            }
            if let Some(to) = to {
                out.insert("to".into(), json!(to));
            }
            Value::Object(out)
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponseBody {
    meta: ResponseMeta,
    #[serde(default)]
    results: Vec<Map<String, Value>>,
    #[serde(default)]
    facets: HashMap<String, Vec<FacetBlock>>,
}

#[derive(Debug, Deserialize)]
struct ResponseMeta {
    page: MetaPage,
}

#[derive(Debug, Deserialize)]
struct MetaPage {
    current: u32,
    size: u32,
    #[serde(default)]
    total_pages: u32,
    total_results: u64,
}

#[derive(Debug, Deserialize)]
struct FacetBlock {
    #[serde(default)]
    data: Vec<FacetDatum>,
}

#[derive(Debug, Deserialize)]
struct FacetDatum {
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    from: Option<f64>,
    #[serde(default)]
    to: Option<f64>,
    #[serde(default)]
    name: Option<String>,
    count: u64,
}

#[derive(Debug, Deserialize)]
struct SuggestionResponseBody {
    results: SuggestionResults,
}

#[derive(Debug, Deserialize)]
struct SuggestionResults {
    #[serde(default)]
    documents: Vec<SuggestionDocument>,
}

#[derive(Debug, Deserialize)]
struct SuggestionDocument {
    suggestion: String,
}

fn normalize(config: &QueryConfig, mut body: SearchResponseBody) -> ResultPage {
    let items = body.results.into_iter().map(result_item).collect();

    let facets = config
        .facets
        .iter()
        .map(|facet| {
            let data: Vec<FacetDatum> = body
                .facets
                .remove(&facet.field)
                .map(|blocks| blocks.into_iter().flat_map(|b| b.data).collect())
                .unwrap_or_default();
            normalize_facet(facet, data)
        })
        .collect();

    ResultPage {
        items,
        total_count: body.meta.page.total_results,
        facets,
        paging: PagingInfo {
            current: body.meta.page.current,
            size: body.meta.page.size,
            total_pages: body.meta.page.total_pages,
        },
    }
}

fn result_item(fields: Map<String, Value>) -> ResultItem {
    let fields = fields
        .into_iter()
        .filter(|(name, _)| !name.starts_with('_'))
        .map(|(name, value)| {
            let wrapped = value
                .as_object()
                .map(|obj| obj.contains_key("raw") || obj.contains_key("snippet"))
                .unwrap_or(false);
            let field = if wrapped {
                serde_json::from_value(value.clone()).unwrap_or_else(|_| FieldValue::raw(value))
            } else {
                FieldValue::raw(value)
            };
            (name, field)
        })
        .collect();
    ResultItem { fields }
}

fn normalize_facet(facet: &FacetDefinition, data: Vec<FacetDatum>) -> FacetResult {
    let buckets = match &facet.kind {
        FacetKind::Value { size } => data
            .into_iter()
            .filter_map(|datum| {
                let label = match datum.value? {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                Some(FacetBucket {
                    value: FilterValue::value(label.clone()),
                    label,
                    count: datum.count,
                })
            })
            .take(*size as usize)
            .collect(),
        FacetKind::Range { ranges } => {
            let mut buckets = Vec::with_capacity(ranges.len());
            for range in ranges {
                let datum = data
                    .iter()
                    .find(|d| d.name.as_deref() == Some(range.name.as_str()))
                    .or_else(|| data.iter().find(|d| range.matches_bounds(d.from, d.to)));
                if let Some(datum) = datum {
                    buckets.push(FacetBucket {
                        label: range.name.clone(),
                        count: datum.count,
                        value: FilterValue::Range {
                            name: range.name.clone(),
                            from: range.from,
                            to: range.to,
                        },
                    });
                }
            }
            if buckets.len() < data.len() {
                debug!(
                    "Dropped {} unconfigured ranges from facet {}",
                    data.len() - buckets.len(),
                    facet.field
                );
            }
            buckets
        }
    };

    FacetResult {
        field: facet.field.clone(),
        buckets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecretString;
    use crate::search::SortDirection;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(endpoint: &str) -> ConnectorSettings {
        ConnectorSettings {
            endpoint_base: endpoint.to_string(),
            engine_name: "video-games".to_string(),
            search_key: Some(SecretString::new("search-test")),
        }
    }

    fn connector(endpoint: &str) -> AppSearch {
        AppSearch::new(
            HttpClient::new().unwrap(),
            &settings(endpoint),
            Arc::new(QueryConfig::default()),
        )
        .unwrap()
    }

    fn zelda_response() -> Value {
        json!({
            "meta": {
                "page": { "current": 1, "size": 10, "total_pages": 1, "total_results": 2 },
                "request_id": "abc"
            },
            "results": [
                {
                    "name": { "raw": "The Legend of Zelda", "snippet": "The Legend of <em>Zelda</em>" },
                    "user_score": { "raw": 9.1 },
                    "image_url": { "raw": "https://img.example.com/zelda.png" },
                    "_meta": { "id": "1", "score": 12.5 }
                },
                {
                    "name": { "raw": "Zelda II", "snippet": "<em>Zelda</em> II" },
                    "genre": { "raw": "Action", "snippet": null },
                    "_meta": { "id": "2", "score": 10.0 }
                }
            ],
            "facets": {
                "user_score": [{
                    "type": "range",
                    "data": [
                        { "from": 9, "to": 10, "name": "Must play!", "count": 1 },
                        { "from": 0, "to": 5, "name": "Not good", "count": 0 },
                        { "from": 7, "to": 9, "name": "Pretty good", "count": 1 }
                    ]
                }],
                "genre": [{
                    "type": "value",
                    "data": [
                        { "value": "Action", "count": 2 },
                        { "value": "Adventure", "count": 1 }
                    ]
                }]
            }
        })
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let mut settings = settings("http://localhost:3002");
        settings.search_key = None;
        let result = AppSearch::new(
            HttpClient::new().unwrap(),
            &settings,
            Arc::new(QueryConfig::default()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_request_shape() {
        let app = connector("https://games.example.com/");
        let query = QueryState::new("zelda")
            .with_page_size(10)
            .with_filter("genre", FilterValue::value("Action"))
            .with_filter("genre", FilterValue::value("RPG"))
            .with_filter(
                "user_score",
                FilterValue::Range {
                    name: "Pretty good".to_string(),
                    from: Some(7.0),
                    to: Some(9.0),
                },
            )
            .with_sort("name", SortDirection::Asc);

        let request = app.request(&query);
        assert_eq!(
            request.url,
            "https://games.example.com/api/as/v1/engines/video-games/search.json"
        );
        assert_eq!(request.headers["Authorization"], "Bearer search-test");

        let body = request.body.unwrap();
        assert_eq!(body["query"], "zelda");
        assert_eq!(body["page"], json!({ "current": 1, "size": 10 }));
        assert_eq!(body["search_fields"], json!({ "name": {} }));
        assert_eq!(
            body["result_fields"]["name"],
            json!({ "snippet": { "size": 75, "fallback": true } })
        );
        assert_eq!(body["result_fields"]["critic_score"], json!({ "raw": {} }));
        assert_eq!(body["facets"]["genre"], json!({ "type": "value", "size": 100 }));
        assert_eq!(body["facets"]["user_score"]["ranges"][3]["name"], "Must play!");
        assert_eq!(
            body["filters"],
            json!({ "all": [
                { "any": [{ "genre": "Action" }, { "genre": "RPG" }] },
                { "any": [{ "user_score": { "from": 7.0, "to": 9.0 } }] }
            ]})
        );
        assert_eq!(body["sort"], json!({ "name": "asc" }));
    }

    #[test]
    fn test_relevance_sends_no_sort_or_filters() {
        let app = connector("https://games.example.com");
        let body = app.request(&QueryState::new("zelda")).body.unwrap();
        assert!(body.get("sort").is_none());
        assert!(body.get("filters").is_none());
    }

    #[test]
    fn test_request_is_deterministic() {
        let config = QueryConfig::default();
        let query = QueryState::new("mario")
            .with_filter("platform", FilterValue::value("Wii"))
            .with_filter("genre", FilterValue::value("Sports"));
        let a = serde_json::to_string(&search_body(&config, &query)).unwrap();
        let b = serde_json::to_string(&search_body(&config, &query.clone())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_value_facet_is_capped() {
        let facet = FacetDefinition::value("platform", "Platform", 2);
        let data = ["Wii", "DS", "PS2", "X360"]
            .iter()
            .map(|v| FacetDatum {
                value: Some(json!(v)),
                from: None,
                to: None,
                name: None,
                count: 3,
            })
            .collect();
        let result = normalize_facet(&facet, data);
        assert_eq!(result.buckets.len(), 2);
        assert_eq!(result.buckets[0].label, "Wii");
    }

    #[test]
    fn test_range_facet_follows_configured_order() {
        let facet = QueryConfig::default().facet("critic_score").unwrap().clone();
        let data = vec![
            FacetDatum { value: None, from: Some(90.0), to: Some(100.0), name: None, count: 4 },
            FacetDatum { value: None, from: Some(0.0), to: Some(50.0), name: None, count: 1 },
            FacetDatum { value: None, from: Some(50.0), to: Some(70.0), name: None, count: 2 },
            FacetDatum { value: None, from: Some(1.0), to: Some(2.0), name: None, count: 9 },
        ];
        let result = normalize_facet(&facet, data);
        let labels: Vec<&str> = result.buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Not good", "Not bad", "Must play!"]);
    }

    #[test]
    fn test_range_bucket_matched_by_bounds_when_name_differs() {
        let facet = QueryConfig::default().facet("user_score").unwrap().clone();
        let named = |name: &str, from: f64, to: f64, count: u64| FacetDatum {
            value: None,
            from: Some(from),
            to: Some(to),
            name: Some(name.to_string()),
            count,
        };
        let data = vec![
            named("Not good", 0.0, 5.0, 3),
            named("Meh", 5.0, 7.0, 6),
            named("Unknown", 11.0, 12.0, 8),
        ];
        let result = normalize_facet(&facet, data);

        assert_eq!(result.buckets.len(), 2);
        assert_eq!(result.buckets[1].label, "Not bad");
        assert_eq!(result.buckets[1].count, 6);
    }

    #[tokio::test]
    async fn test_search_against_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/as/v1/engines/video-games/search.json"))
            .and(header("authorization", "Bearer search-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(zelda_response()))
            .expect(1)
            .mount(&server)
            .await;

        let app = connector(&server.uri());
        let page = app
            .search(&QueryState::new("zelda").with_page_size(10))
            .await
            .unwrap();

        assert!(page.items.len() <= 10);
        assert!(page.total_count >= page.items.len() as u64);
        assert_eq!(page.items.len(), 2);
        assert!(page.items[0].field("_meta").is_none());
        assert_eq!(
            page.items[0].field("name").unwrap().snippet.as_deref(),
            Some("The Legend of <em>Zelda</em>")
        );
        assert_eq!(page.items[1].field("genre").unwrap().snippet, None);

        // every configured facet is present, in configured order
        let fields: Vec<&str> = page.facets.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["user_score", "critic_score", "genre", "publisher", "platform"]);
        assert!(page.facet("critic_score").unwrap().buckets.is_empty());

        let user_score: Vec<&str> = page
            .facet("user_score")
            .unwrap()
            .buckets
            .iter()
            .map(|b| b.label.as_str())
            .collect();
        assert_eq!(user_score, vec!["Not good", "Pretty good", "Must play!"]);
        assert_eq!(page.paging.total_pages, 1);
    }

    #[tokio::test]
    async fn test_identical_queries_give_identical_pages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/as/v1/engines/video-games/search.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(zelda_response()))
            .mount(&server)
            .await;

        let app = connector(&server.uri());
        let query = QueryState::new("zelda").with_page_size(10);
        let first = app.search(&query).await.unwrap();
        let second = app.search(&query).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_auth_failure_is_distinct() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "errors": ["Invalid authentication token."] })),
            )
            .mount(&server)
            .await;

        let err = connector(&server.uri())
            .search(&QueryState::new("zelda"))
            .await
            .unwrap_err();
        assert_eq!(err, SearchError::auth("Invalid authentication token."));
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = connector(&server.uri())
            .search(&QueryState::new("zelda"))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Transient(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = connector(&server.uri())
            .search(&QueryState::new("zelda"))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Transient(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transient() {
        // nothing listens on the discard port
        let err = connector("http://127.0.0.1:9")
            .search(&QueryState::new("zelda"))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Transient(_)));
    }

    #[tokio::test]
    async fn test_suggestions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/as/v1/engines/video-games/query_suggestion"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": { "documents": [
                    { "suggestion": "zelda" },
                    { "suggestion": "zelda ii" },
                    { "suggestion": "zelda link" }
                ]},
                "meta": { "request_id": "x" }
            })))
            .mount(&server)
            .await;

        let suggestions = connector(&server.uri())
            .suggest("zel", &["name".to_string()], 2)
            .await
            .unwrap();
        assert_eq!(suggestions, vec!["zelda", "zelda ii"]);
    }
}
