use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const APP_NAME: &str = "nasfind";
const CONFIG_FILE: &str = "config.json";
const INDEX_DIR_NAME: &str = "searchidx";
const STORE_DIR_NAME: &str = "meta";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the index families live (defaults to `<data>/searchidx`)
    #[serde(default)]
    pub index_dir: Option<PathBuf>,

    /// Where the metadata store lives (defaults to `<data>/meta`)
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    /// Roots indexed by `ensure` when none are given on the command line
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// Index dotfiles and dot-directories
    #[serde(default)]
    pub include_hidden: bool,

    /// Walk each root on its own worker thread
    #[serde(default)]
    pub parallel_roots: bool,
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: AppConfig = serde_json::from_str(&content)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolved index directory
    pub fn resolved_index_dir(&self) -> Result<PathBuf> {
        match &self.index_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(get_app_data_dir()?.join(INDEX_DIR_NAME)),
        }
    }

    /// Resolved metadata store directory
    pub fn resolved_store_dir(&self) -> Result<PathBuf> {
        match &self.store_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(get_app_data_dir()?.join(STORE_DIR_NAME)),
        }
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}
