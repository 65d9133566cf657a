//! HTTP client for talking to the search backend

use crate::config::OutgoingSettings;
use crate::connector::{BackendRequest, BackendResponse};
use crate::error::SearchError;
use anyhow::Result;
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;
use tracing::trace;

/// HTTP client wrapper configured from the outgoing settings
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    user_agent: String,
    extra_headers: HashMap<String, String>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let timeout = settings.timeout()?;
        let mut builder = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        let user_agent = match settings.useragent_suffix {
            Some(ref suffix) => format!("search-ui-rs/{} {}", crate::VERSION, suffix),
            None => format!("search-ui-rs/{}", crate::VERSION),
        };

        Ok(Self {
            client,
            default_timeout: timeout,
            user_agent,
            extra_headers: settings.extra_headers.clone(),
        })
    }

    /// Time allowed for a request when the caller sets none
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Execute a backend request
    pub async fn execute(&self, request: BackendRequest) -> Result<BackendResponse, SearchError> {
        trace!("POST {}", request.url);

        let mut req_builder = self
            .client
            .post(&request.url)
            .timeout(self.default_timeout)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json");

        // Request headers win over configured extras
        let overridden = |key: &str| {
            request
                .headers
                .keys()
                .any(|own| own.eq_ignore_ascii_case(key))
        };
        for (key, value) in self.extra_headers.iter().filter(|(k, _)| !overridden(k)) {
            req_builder = req_builder.header(key, value);
        }

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.json(&body);
        }

        let response = req_builder.send().await?;

        Self::parse_response(response).await
    }

    /// Parse response into BackendResponse
    async fn parse_response(response: Response) -> Result<BackendResponse, SearchError> {
        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok(BackendResponse { status, text })
    }

    /// Get current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}
