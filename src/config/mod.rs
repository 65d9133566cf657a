//! Configuration module for search-ui-rs
//!
//! Handles loading and validating settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_VAR: &str = "SEARCHUI_SETTINGS_PATH";

/// Locations searched for a settings file, in order
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("search-ui-rs/settings.yml"));
    }
    paths
}

/// Load settings from an explicit path, the environment, a default location,
/// or fall back to defaults. Environment overrides are applied last.
pub fn load(explicit: Option<&Path>) -> Result<Settings> {
    let from_env = std::env::var(SETTINGS_PATH_VAR).ok().map(PathBuf::from);

    let candidate = explicit
        .map(Path::to_path_buf)
        .or(from_env)
        .or_else(|| default_paths().into_iter().find(|p| p.exists()));

    let mut settings = match candidate {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::from_file(&path)?
        }
        None => {
            info!("No settings file found, using defaults");
            Settings::default()
        }
    };

    settings.merge_env();
    Ok(settings)
}
