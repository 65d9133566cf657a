//! In-memory connectors for tests

use super::Connector;
use crate::error::SearchError;
use crate::results::ResultPage;
use crate::search::QueryState;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;

/// Answers every query with the same outcome
pub struct StaticConnector {
    outcome: Result<ResultPage, SearchError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticConnector {
    pub fn new(page: ResultPage) -> Self {
        Self {
            outcome: Ok(page),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: SearchError) -> Self {
        Self {
            outcome: Err(error),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for StaticConnector {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, _query: &QueryState) -> Result<ResultPage, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }

    async fn suggest(
        &self,
        term: &str,
        _fields: &[String],
        size: u32,
    ) -> Result<Vec<String>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((1..=size).map(|i| format!("{} {}", term, i)).collect())
    }
}

type Pending = (QueryState, oneshot::Sender<Result<ResultPage, SearchError>>);

/// Holds every query until the test decides how and when it completes
#[derive(Default)]
pub struct GatedConnector {
    pending: Mutex<Vec<Pending>>,
}

impl GatedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests issued and not yet released
    pub fn pending(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Wait until `n` requests are outstanding
    pub async fn wait_for(&self, n: usize) {
        while self.pending() < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    /// Release the outstanding request whose search term matches
    pub fn release(&self, term: &str, outcome: Result<ResultPage, SearchError>) {
        let mut pending = self.pending.lock().unwrap();
        let pos = pending
            .iter()
            .position(|(q, _)| q.search_term == term)
            .expect("no pending request for term");
        let (_, tx) = pending.remove(pos);
        let _ = tx.send(outcome);
    }
}

#[async_trait]
impl Connector for GatedConnector {
    fn name(&self) -> &str {
        "gated"
    }

    async fn search(&self, query: &QueryState) -> Result<ResultPage, SearchError> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().push((query.clone(), tx));
        rx.await
            .unwrap_or_else(|_| Err(SearchError::transient("request dropped")))
    }
}
