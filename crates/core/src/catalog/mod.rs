//! Read-only card and class catalog.

/// Discovery of catalog data files on disk.
pub mod loader;

use std::collections::HashMap;

use tracing::warn;

use crate::models::{Card, ClassDef};

pub use loader::CatalogLoader;

/// Static reference data keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cards: HashMap<String, Card>,
    /// Card ids in load order, for stable listing.
    order: Vec<String>,
    classes: HashMap<String, ClassDef>,
}

impl Catalog {
    /// Build a catalog. Later duplicates of a card id or class name are
    /// dropped with a warning.
    pub fn new(cards: Vec<Card>, classes: Vec<ClassDef>) -> Self {
        let mut catalog = Self::default();
        for card in cards {
            if catalog.cards.contains_key(&card.id) {
                warn!("duplicate card id '{}' ignored", card.id);
                continue;
            }
            for name in card.unknown_types() {
                warn!("card {} declares unknown type '{name}'", card.id);
            }
            for name in card.unknown_factions() {
                warn!("card {} declares unknown faction '{name}'", card.id);
            }
            catalog.order.push(card.id.clone());
            catalog.cards.insert(card.id.clone(), card);
        }
        for class in classes {
            let key = class.name.to_lowercase();
            if catalog.classes.contains_key(&key) {
                warn!("duplicate class '{}' ignored", class.name);
                continue;
            }
            catalog.classes.insert(key, class);
        }
        catalog
    }

    /// Card lookup by exact id.
    pub fn find_card_by_id(&self, id: &str) -> Option<&Card> {
        self.cards.get(id)
    }

    /// Class lookup, case-insensitive.
    pub fn find_class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(&name.trim().to_lowercase())
    }

    /// All cards in load order.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.order.iter().filter_map(|id| self.cards.get(id))
    }

    /// All classes, sorted by name.
    pub fn classes(&self) -> Vec<&ClassDef> {
        let mut classes: Vec<&ClassDef> = self.classes.values().collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        classes
    }

    /// Number of distinct cards.
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }
}
