//! search-ui-rs: a configuration-driven faceted search front end
//!
//! This is the main entry point for the application.

use anyhow::Result;
use clap::Parser;
use search_ui_rs::{
    config::{self, Settings},
    connector,
    network::HttpClient,
    search::Search,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// A configuration-driven faceted search front end
#[derive(Debug, Parser)]
#[command(name = "search-ui-rs", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", env = config::SETTINGS_PATH_VAR)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = config::load(args.config.as_deref())?;
    init_logging(&settings);

    info!("Starting search-ui-rs v{}", search_ui_rs::VERSION);
    settings.validate()?;
    info!(
        "Loaded configuration for instance: {}",
        settings.general.instance_name
    );

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;
    let timeout = client.default_timeout();

    let query_config = Arc::new(settings.search.clone());
    let backend = connector::from_settings(&settings, client, query_config.clone())?;
    let search = Search::new(backend, query_config).with_timeout(timeout);

    // Bind address
    let addr = SocketAddr::new(
        settings.server.bind_address.parse()?,
        settings.server.port,
    );

    let state = AppState::new(settings, search)?;
    let app = create_router(state);

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Log level comes from RUST_LOG, else from the debug setting
fn init_logging(settings: &Settings) {
    let default = if settings.general.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
