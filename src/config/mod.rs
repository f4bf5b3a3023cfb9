//! Configuration module for search-synth
//!
//! Handles loading settings from YAML files, `.env` and environment variables.

mod settings;

pub use settings::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_ENV: &str = "SEARCH_SYNTH_SETTINGS_PATH";

/// Settings together with the file they came from
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: Settings,
    /// `None` when no settings file was found and defaults were used
    pub source: Option<PathBuf>,
}

/// Load settings from the first settings file found, or use defaults.
///
/// Lookup order: `explicit` (the `--config` flag), `$SEARCH_SYNTH_SETTINGS_PATH`,
/// then the default locations. Environment overrides are merged last.
/// Nothing is logged; callers report `source` once logging is set up.
pub fn load(explicit: Option<&Path>) -> Result<LoadedSettings> {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    if let Some(path) = explicit {
        return load_file(path);
    }

    if let Ok(path) = std::env::var(SETTINGS_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return load_file(&path);
        }
    }

    for path in default_paths() {
        if path.exists() {
            return load_file(&path);
        }
    }

    let mut settings = Settings::default();
    settings.merge_env();
    Ok(LoadedSettings {
        settings,
        source: None,
    })
}

fn load_file(path: &Path) -> Result<LoadedSettings> {
    let mut settings = Settings::from_file(path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;
    settings.merge_env();
    Ok(LoadedSettings {
        settings,
        source: Some(path.to_path_buf()),
    })
}

fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
        PathBuf::from("/etc/search-synth/settings.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("search-synth/settings.yml"));
    }
    paths
}
