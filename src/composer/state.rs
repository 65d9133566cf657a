//! View states of the presentation composer

use crate::error::SearchError;
use crate::results::ResultPage;
use crate::search::QueryState;
use std::sync::Arc;

/// What the UI is currently showing
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ViewState {
    /// No query issued yet
    #[default]
    Idle,
    /// The latest query is in flight
    Loading,
    /// The latest query succeeded
    Loaded(Arc<ResultPage>),
    /// The latest query failed; any control change retries
    Errored(SearchError),
}

impl ViewState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Loaded(_) => "loaded",
            Self::Errored(_) => "errored",
        }
    }

    pub fn page(&self) -> Option<&ResultPage> {
        match self {
            Self::Loaded(page) => Some(page),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SearchError> {
        match self {
            Self::Errored(err) => Some(err),
            _ => None,
        }
    }
}

/// A consistent copy of the composer's query and view
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Query of the most recently issued request
    pub query: QueryState,
    pub state: ViewState,
    /// Sequence number of the most recently issued request, 0 before any
    pub sequence: u64,
}

/// Handle for one issued request
#[derive(Debug, Clone)]
pub struct Ticket {
    pub(crate) sequence: u64,
    pub(crate) query: QueryState,
}

impl Ticket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }
}
