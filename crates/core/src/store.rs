//! Roster persistence.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::roster::{Roster, Settings};

/// Store name; also the file stem of the document on disk.
pub const STORE_NAME: &str = "pilotStore";

/// Directory under `~/.local/share` used when no store dir is configured.
pub const DEFAULT_STORE_DIR: &str = "loadout";

/// On-disk document wrapping the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorePayload {
    store: String,
    saved_at: DateTime<Utc>,
    #[serde(default)]
    state: Roster,
}

impl StorePayload {
    fn new(state: Roster) -> Self {
        Self {
            store: STORE_NAME.to_string(),
            saved_at: Utc::now(),
            state,
        }
    }

    /// When the document was last written.
    pub fn saved_at(&self) -> DateTime<Utc> {
        self.saved_at
    }

    /// Consume the payload and return the stored roster.
    pub fn into_state(self) -> Roster {
        self.state
    }
}

/// Reads and writes the roster document.
pub struct StoreManager {
    root: PathBuf,
}

impl StoreManager {
    /// Create a manager rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location under the user's data directory.
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_STORE_DIR)
    }

    /// Full path of the store document.
    pub fn path(&self) -> PathBuf {
        self.root.join(format!("{STORE_NAME}.json"))
    }

    /// Load the roster, or a fresh one with `defaults` if nothing was saved.
    pub fn load_or_default(&self, defaults: Settings) -> Result<Roster> {
        match self.load()? {
            Some(payload) => Ok(payload.into_state()),
            None => Ok(Roster::with_settings(defaults)),
        }
    }

    /// Read the stored payload, if the document exists.
    pub fn load(&self) -> Result<Option<StorePayload>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let payload: StorePayload = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(Some(payload))
    }

    /// Write the roster, replacing any previous document.
    pub fn save(&self, roster: &Roster) -> Result<StorePayload> {
        let payload = StorePayload::new(roster.clone());
        let path = self.path();
        write_payload(&path, &payload)?;
        info!(
            "saved {} pilots to {}",
            roster.pilots().len(),
            path.display()
        );
        Ok(payload)
    }
}

fn write_payload(path: &Path, payload: &StorePayload) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let serialised = serde_json::to_vec_pretty(payload)?;
    fs::write(path, serialised).with_context(|| format!("failed to write {}", path.display()))
}
