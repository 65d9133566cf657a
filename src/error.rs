//! Error types surfaced to the presentation layer

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a search request can end in.
///
/// Anything the backend reports that is not an authorization problem is
/// collapsed into [`SearchError::Transient`].
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum SearchError {
    /// The query was rejected locally and never sent to the backend
    #[error("invalid query: {0}")]
    Validation(String),

    /// Network failure, timeout or backend unavailability
    #[error("search service unavailable: {0}")]
    Transient(String),

    /// Credentials were rejected by the backend
    #[error("search credentials rejected: {0}")]
    Auth(String),
}

impl SearchError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Whether the UI should offer a retry affordance
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Transient(_) => "transient",
            Self::Auth(_) => "auth",
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transient("request timed out".to_string())
        } else {
            Self::Transient(err.to_string())
        }
    }
}
