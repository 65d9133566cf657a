//! Search module
//!
//! Query state, the actions that change it, and execution of a query
//! through the connector.

mod executor;
mod models;

pub use executor::Search;
pub use models::*;
