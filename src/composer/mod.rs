//! Presentation composer
//!
//! Owns the single query/result pair the UI renders. Every control change
//! produces a new [`QueryState`], which is validated and issued with a fresh
//! sequence number. A completion is applied only when it belongs to the most
//! recently issued request; superseded responses are dropped on arrival.
//! Nothing is cancelled and nothing is retried automatically.

mod state;

pub use state::{Snapshot, Ticket, ViewState};

use crate::error::SearchError;
use crate::results::ResultPage;
use crate::search::{QueryState, Search, UiAction};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

struct Inner {
    query: QueryState,
    view: ViewState,
    issued: u64,
}

/// Query/result state machine for one session
pub struct Composer {
    search: Search,
    inner: Mutex<Inner>,
}

impl Composer {
    /// Create an idle composer starting from `initial`
    pub fn new(search: Search, initial: QueryState) -> Self {
        Self {
            search,
            inner: Mutex::new(Inner {
                query: initial,
                view: ViewState::Idle,
                issued: 0,
            }),
        }
    }

    /// The executor requests go through
    pub fn search(&self) -> &Search {
        &self.search
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current query and view
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.lock();
        Snapshot {
            query: inner.query.clone(),
            state: inner.view.clone(),
            sequence: inner.issued,
        }
    }

    /// Apply a user action and issue the resulting query.
    ///
    /// An invalid query is rejected here: no request is issued and the
    /// current view is left as it was.
    pub fn issue(&self, action: UiAction) -> Result<Ticket, SearchError> {
        let mut inner = self.lock();
        let next = inner.query.apply(action);
        self.search.validate(&next)?;

        inner.issued += 1;
        inner.query = next.clone();
        inner.view = ViewState::Loading;

        debug!(
            "Issued request #{} for '{}'",
            inner.issued, next.search_term
        );

        Ok(Ticket {
            sequence: inner.issued,
            query: next,
        })
    }

    /// Record the outcome of an issued request.
    ///
    /// Returns whether the outcome was applied; outcomes of superseded
    /// requests are ignored.
    pub fn complete(&self, ticket: &Ticket, outcome: Result<ResultPage, SearchError>) -> bool {
        let mut inner = self.lock();
        if ticket.sequence != inner.issued {
            info!(
                "Discarding response #{}, request #{} supersedes it",
                ticket.sequence, inner.issued
            );
            return false;
        }

        inner.view = match outcome {
            Ok(page) => ViewState::Loaded(Arc::new(page)),
            Err(err) => ViewState::Errored(err),
        };
        true
    }

    /// Issue a query for `action`, wait for it and return the resulting view.
    ///
    /// The returned snapshot reflects the most recently issued request, which
    /// may be a newer one than this call's.
    pub async fn dispatch(&self, action: UiAction) -> Result<Snapshot, SearchError> {
        let ticket = self.issue(action)?;
        let outcome = self.search.send(&ticket.query).await;
        self.complete(&ticket, outcome);
        Ok(self.snapshot())
    }
}
