//! Search execution against the configured connector

use super::models::QueryState;
use crate::connector::Connector;
use crate::error::SearchError;
use crate::query::QueryConfig;
use crate::results::ResultPage;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Search executor: validates a query, sends it through the connector and
/// bounds the wait with a fixed timeout
#[derive(Clone)]
pub struct Search {
    /// Backend connector
    connector: Arc<dyn Connector>,
    /// Query configuration used for validation
    config: Arc<QueryConfig>,
    /// Time allowed for one request
    timeout: Duration,
}

impl Search {
    /// Create a new search executor
    pub fn new(connector: Arc<dyn Connector>, config: Arc<QueryConfig>) -> Self {
        Self {
            connector,
            config,
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT),
        }
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Query configuration this executor validates against
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Name of the backend connector
    pub fn connector_name(&self) -> &str {
        self.connector.name()
    }

    /// Reject a query locally, before any request is made
    pub fn validate(&self, query: &QueryState) -> Result<(), SearchError> {
        query.validate(&self.config)
    }

    /// Execute a query.
    ///
    /// Validation failures are returned without contacting the backend. The
    /// call is never retried; a timeout is reported as a transient failure.
    pub async fn execute(&self, query: &QueryState) -> Result<ResultPage, SearchError> {
        self.validate(query)?;
        self.send(query).await
    }

    /// Send an already validated query
    pub(crate) async fn send(&self, query: &QueryState) -> Result<ResultPage, SearchError> {
        let start = Instant::now();

        debug!(
            "Searching {} for '{}' (page {}, size {})",
            self.connector.name(),
            query.search_term,
            query.page_number,
            query.page_size
        );

        let result = match timeout(self.timeout, self.connector.search(query)).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::transient(format!(
                "no response within {:?}",
                self.timeout
            ))),
        };

        match &result {
            Ok(page) => debug!(
                "{} returned {} of {} results in {:?}",
                self.connector.name(),
                page.items.len(),
                page.total_count,
                start.elapsed()
            ),
            Err(e) => warn!("Search on {} failed: {}", self.connector.name(), e),
        }

        result
    }

    /// Fetch autocomplete suggestions
    pub async fn suggest(
        &self,
        term: &str,
        fields: &[String],
        size: u32,
    ) -> Result<Vec<String>, SearchError> {
        match timeout(self.timeout, self.connector.suggest(term, fields, size)).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::transient(format!(
                "no response within {:?}",
                self.timeout
            ))),
        }
    }
}
