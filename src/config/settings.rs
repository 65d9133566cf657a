//! Settings structures for search-ui-rs configuration

use crate::query::QueryConfig;
use crate::search::{SortDirection, DEFAULT_PAGE_SIZE};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Main settings structure loaded from settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
    pub connector: ConnectorSettings,
    /// Query configuration: searched, returned and faceted fields
    pub search: QueryConfig,
    pub autocomplete: AutocompleteSettings,
    pub ui: UiSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (SEARCHUI_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|name| std::env::var(name).ok());
    }

    /// Merge values from a variable lookup, environment style
    pub fn merge_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("SEARCHUI_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = var("SEARCHUI_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("SEARCHUI_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = var("SEARCHUI_ENDPOINT_BASE") {
            self.connector.endpoint_base = val;
        }
        if let Some(val) = var("SEARCHUI_ENGINE_NAME") {
            self.connector.engine_name = val;
        }
        if let Some(val) = var("SEARCHUI_SEARCH_KEY") {
            self.connector.search_key = Some(SecretString::new(val));
        }
    }

    /// Check the settings before the server starts
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        self.outgoing.timeout()?;

        if url::Url::parse(&self.connector.endpoint_base).is_err() {
            bail!(
                "connector.endpoint_base '{}' is not a valid URL",
                self.connector.endpoint_base
            );
        }
        if self.connector.engine_name.trim().is_empty() {
            bail!("connector.engine_name must be set");
        }
        if self.connector.search_key.is_none() {
            bail!("no search key configured; set connector.search_key or SEARCHUI_SEARCH_KEY");
        }

        let page_size = self.ui.default_page_size;
        if page_size == 0 || page_size > self.search.max_page_size {
            bail!(
                "ui.default_page_size must be between 1 and {}",
                self.search.max_page_size
            );
        }
        if let Some(size) = self
            .ui
            .results_per_page
            .iter()
            .find(|s| **s == 0 || **s > self.search.max_page_size)
        {
            bail!("ui.results_per_page option {} is out of range", size);
        }

        for option in &self.ui.sort_options {
            if option.field.is_some() == (option.direction == SortDirection::None) {
                bail!("sort option '{}' needs both a field and a direction, or neither", option.name);
            }
        }

        Ok(())
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name displayed in UI
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "Video Game Search".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8888,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Request timeout in seconds
    pub request_timeout: f64,
    /// Appended to the user agent
    pub useragent_suffix: Option<String>,
    /// Pool max size
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: crate::DEFAULT_TIMEOUT as f64,
            useragent_suffix: None,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

impl OutgoingSettings {
    /// Request timeout; must be a positive, finite number of seconds
    pub fn timeout(&self) -> Result<Duration> {
        let secs = self.request_timeout;
        if !secs.is_finite() || secs <= 0.0 {
            bail!(
                "outgoing.request_timeout must be a positive number of seconds, got {}",
                secs
            );
        }
        Ok(Duration::try_from_secs_f64(secs)?)
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// A credential that never shows up in logs or serialized settings
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString(***)")
    }
}

/// Search backend connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorSettings {
    /// Base URL of the deployment, e.g. `https://example.ent.cloud.es.io`
    pub endpoint_base: String,
    /// Engine to search
    pub engine_name: String,
    /// Public search key; supplied by file or environment, never built in
    #[serde(skip_serializing)]
    pub search_key: Option<SecretString>,
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self {
            endpoint_base: "http://localhost:3002".to_string(),
            engine_name: "video-games".to_string(),
            search_key: None,
        }
    }
}

/// Autocomplete settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocompleteSettings {
    pub enabled: bool,
    /// Fields suggestions are drawn from
    pub fields: Vec<String>,
    /// How many suggestions appear
    pub size: u32,
    /// Shortest term that triggers a lookup
    pub min_chars: usize,
}

impl Default for AutocompleteSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            fields: vec!["name".to_string()],
            size: 5,
            min_chars: 1,
        }
    }
}

/// One entry of the sort selector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SortOption {
    /// Label shown in the selector
    pub name: String,
    /// Field sorted on, relevance when absent
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub direction: SortDirection,
}

/// UI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Field used as the result title
    pub title_field: String,
    /// Field used as the result link / image
    pub url_field: Option<String>,
    /// Sort selector entries
    pub sort_options: Vec<SortOption>,
    /// Choices offered by the results-per-page selector
    pub results_per_page: Vec<u32>,
    /// Page size before the user picks one
    pub default_page_size: u32,
    /// Label of the sort selector
    pub sort_label: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            title_field: "name".to_string(),
            url_field: Some("image_url".to_string()),
            sort_options: vec![
                SortOption {
                    name: "Relevance".to_string(),
                    field: None,
                    direction: SortDirection::None,
                },
                SortOption {
                    name: "Name".to_string(),
                    field: Some("name".to_string()),
                    direction: SortDirection::Asc,
                },
            ],
            results_per_page: vec![20, 40, 60],
            default_page_size: DEFAULT_PAGE_SIZE,
            sort_label: "Sort by".to_string(),
        }
    }
}
