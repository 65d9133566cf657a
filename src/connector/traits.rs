//! Connector trait and the HTTP request/response types connectors exchange

use crate::error::SearchError;
use crate::results::ResultPage;
use crate::search::QueryState;
use async_trait::async_trait;
use std::collections::HashMap;

/// HTTP request to be sent to the search backend
#[derive(Debug, Clone)]
pub struct BackendRequest {
    /// URL to request
    pub url: String,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// JSON body
    pub body: Option<serde_json::Value>,
}

impl BackendRequest {
    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add JSON body
    pub fn json(mut self, data: serde_json::Value) -> Self {
        self.body = Some(data);
        self
    }
}

/// HTTP response from the search backend
#[derive(Debug)]
pub struct BackendResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
}

impl BackendResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, SearchError> {
        serde_json::from_str(&self.text)
            .map_err(|e| SearchError::transient(format!("malformed response: {}", e)))
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the backend refused the credentials
    pub fn is_auth_failure(&self) -> bool {
        self.status == 401 || self.status == 403
    }

    /// Map an unsuccessful response to the error the UI should show
    pub fn error(&self) -> SearchError {
        let detail = backend_message(&self.text)
            .unwrap_or_else(|| format!("HTTP {}", self.status));
        if self.is_auth_failure() {
            SearchError::auth(detail)
        } else {
            SearchError::transient(detail)
        }
    }
}

/// Pull a human readable message out of an error body
fn backend_message(text: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(text).ok()?;
    let errors = json.get("errors")?;
    match errors {
        serde_json::Value::Array(list) => {
            let messages: Vec<&str> = list.iter().filter_map(|e| e.as_str()).collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        serde_json::Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Gateway between the UI and a search backend.
///
/// Implementations translate a [`QueryState`] into a backend request and the
/// backend's answer into a normalized [`ResultPage`]. They never retry: a
/// failure is returned to the caller as is.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connector name, used in logs
    fn name(&self) -> &str;

    /// Run a query
    async fn search(&self, query: &QueryState) -> Result<ResultPage, SearchError>;

    /// Suggest completions for a partial search term
    async fn suggest(
        &self,
        _term: &str,
        _fields: &[String],
        _size: u32,
    ) -> Result<Vec<String>, SearchError> {
        Ok(Vec::new())
    }
}
