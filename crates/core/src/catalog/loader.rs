use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::models::{Card, ClassDef};

use super::Catalog;

/// File holding the class definitions inside a data directory.
pub const CLASSES_FILE: &str = "classes.json";
/// Directory holding card files inside a data directory.
pub const CARDS_DIR: &str = "cards";

/// Loads a [`Catalog`] from a data directory laid out as
/// `classes.json` plus `cards/**/*.json`.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    root_path: PathBuf,
}

impl CatalogLoader {
    /// Build a loader rooted at the given data directory.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
        }
    }

    /// Root path of the data directory.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Read every card and class file.
    pub fn load(&self) -> Result<Catalog> {
        let classes = self.load_classes()?;
        let cards = self.load_cards()?;
        info!(
            "loaded {} cards and {} classes from {}",
            cards.len(),
            classes.len(),
            self.root_path.display()
        );
        Ok(Catalog::new(cards, classes))
    }

    fn load_classes(&self) -> Result<Vec<ClassDef>> {
        let path = self.root_path.join(CLASSES_FILE);
        if !path.is_file() {
            warn!("no class definitions at {}", path.display());
            return Ok(Vec::new());
        }
        read_json_array(&path)
    }

    fn load_cards(&self) -> Result<Vec<Card>> {
        let card_root = self.root_path.join(CARDS_DIR);
        if !card_root.is_dir() {
            warn!("no card directory at {}", card_root.display());
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&card_root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
            .collect();
        files.sort();

        let mut cards = Vec::new();
        for path in files {
            match read_json_array::<Card>(&path) {
                Ok(mut batch) => cards.append(&mut batch),
                Err(err) => warn!("Skipping {}: {err:#}", path.display()),
            }
        }
        Ok(cards)
    }
}

fn read_json_array<T>(path: &Path) -> Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
{
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let items = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(items)
}
