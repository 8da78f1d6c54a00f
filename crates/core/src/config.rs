//! Application configuration.
//!
//! Values come from `<config_dir>/loadout/config.toml` when present, then
//! `LOADOUT_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{roster::Settings, store::StoreManager};

/// Config directory name under the platform config root.
pub const CONFIG_DIR: &str = "loadout";
const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "LOADOUT";

const DEFAULT_CONFIG: &str = r#"# Loadout configuration.

# Directory holding classes.json and cards/.
# data_dir = "data"

# Directory where pilotStore.json is written.
# store_dir = "~/.local/share/loadout"

# Toggles applied to a freshly created roster.
enable_custom_cards = false
enable_faction_filtering = true
enable_unique_restriction = true
"#;

/// Resolved settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Catalog directory.
    pub data_dir: PathBuf,
    /// Directory for the store document.
    pub store_dir: PathBuf,
    /// Show homebrew cards by default.
    pub enable_custom_cards: bool,
    /// Enforce faction quotas by default.
    pub enable_faction_filtering: bool,
    /// Enforce unique cards by default.
    pub enable_unique_restriction: bool,
}

impl AppConfig {
    /// Load from the default config file and environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load from `path` (optional) and environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        let defaults = Settings::default();
        let settings = Config::builder()
            .set_default("data_dir", "data")?
            .set_default(
                "store_dir",
                StoreManager::default_root().to_string_lossy().to_string(),
            )?
            .set_default("enable_custom_cards", defaults.enable_custom_cards)?
            .set_default("enable_faction_filtering", defaults.enable_faction_filtering)?
            .set_default("enable_unique_restriction", defaults.enable_unique_restriction)?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = settings
            .try_deserialize()
            .context("failed to parse configuration")?;
        Ok(config)
    }

    /// Toggles for a roster that has never been saved.
    pub fn default_settings(&self) -> Settings {
        Settings {
            enable_custom_cards: self.enable_custom_cards,
            enable_faction_filtering: self.enable_faction_filtering,
            enable_unique_restriction: self.enable_unique_restriction,
        }
    }
}

/// Location of the user config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write a commented default config file if none exists.
pub fn ensure_default_config() -> Result<()> {
    ensure_config_at(&config_path())
}

fn ensure_config_at(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote default config to {}", path.display());
    Ok(())
}
