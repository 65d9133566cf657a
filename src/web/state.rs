//! Application state shared across handlers

use crate::composer::Composer;
use crate::config::Settings;
use crate::search::{QueryState, Search};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Query/result state of the session
    pub composer: Arc<Composer>,
    /// Template renderer
    pub templates: Arc<super::Templates>,
}

impl AppState {
    /// Create new application state around a search executor
    pub fn new(settings: Settings, search: Search) -> anyhow::Result<Self> {
        let initial = QueryState::default().with_page_size(settings.ui.default_page_size);
        let composer = Arc::new(Composer::new(search, initial));
        let templates = Arc::new(super::Templates::new()?);

        Ok(Self {
            settings: Arc::new(settings),
            composer,
            templates,
        })
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }
}
