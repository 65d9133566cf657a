//! Search backend connectors
//!
//! Defines the [`Connector`] trait and the App Search implementation.

mod app_search;
mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use app_search::{search_body, AppSearch};
pub use traits::*;

use crate::config::Settings;
use crate::network::HttpClient;
use crate::query::QueryConfig;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Build the connector described by the settings
pub fn from_settings(
    settings: &Settings,
    client: HttpClient,
    config: Arc<QueryConfig>,
) -> Result<Arc<dyn Connector>> {
    let connector = AppSearch::new(client, &settings.connector, config)?;
    info!(
        "Using App Search engine '{}' at {}",
        settings.connector.engine_name, settings.connector.endpoint_base
    );
    Ok(Arc::new(connector))
}
