//! search-ui-rs: a configuration-driven faceted search front end
//!
//! Turns a declarative query configuration into App Search requests,
//! normalizes the responses into result pages and keeps the rendered view
//! consistent with the most recent user action.

pub mod autocomplete;
pub mod composer;
pub mod config;
pub mod connector;
pub mod error;
pub mod network;
pub mod query;
pub mod results;
pub mod search;
pub mod web;

pub use composer::{Composer, Snapshot, ViewState};
pub use config::Settings;
pub use connector::Connector;
pub use error::SearchError;
pub use query::QueryConfig;
pub use results::ResultPage;
pub use search::{QueryState, Search, UiAction};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for backend requests in seconds
pub const DEFAULT_TIMEOUT: u64 = 5;
