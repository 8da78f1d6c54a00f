#![allow(missing_docs)]

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    catalog::Catalog,
    error::InvariantError,
    faction::{used_faction_slots, Faction, FactionCounts},
    slots::{Slot, SlotKey},
};

/// Active pilot id used when the roster is empty.
pub const DEFAULT_PILOT_ID: &str = "1";

/// A pilot and their loadout. Mutated only through [`Roster`] transitions;
/// the accessors below are read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pilot {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) class: String,
    pub(crate) rank: u32,
    #[serde(default)]
    pub(crate) xp: u32,
    #[serde(default)]
    pub(crate) ships: Vec<String>,
    pub(crate) selected_ship: String,
    #[serde(default)]
    pub(crate) slots: Vec<Slot>,
    #[serde(default)]
    pub(crate) slot_cards: BTreeMap<SlotKey, String>,
    #[serde(default)]
    pub(crate) selected_cards: BTreeSet<String>,
    #[serde(default)]
    pub(crate) owned_cards: BTreeSet<String>,
    #[serde(default)]
    pub(crate) card_upgrades: BTreeMap<String, u32>,
    #[serde(default)]
    pub(crate) used_faction_slots: FactionCounts,
    #[serde(default)]
    pub(crate) card_faction_mappings: BTreeMap<String, Faction>,
    #[serde(default)]
    pub(crate) ship_kills: BTreeMap<String, u32>,
}

impl Pilot {
    pub(crate) fn new(id: String, name: String, class: String, ship: String) -> Self {
        Self {
            id,
            name,
            class,
            rank: 1,
            xp: 0,
            ships: vec![ship.clone()],
            selected_ship: ship,
            slots: Vec::new(),
            slot_cards: BTreeMap::new(),
            selected_cards: BTreeSet::new(),
            owned_cards: BTreeSet::new(),
            card_upgrades: BTreeMap::new(),
            used_faction_slots: FactionCounts::new(),
            card_faction_mappings: BTreeMap::new(),
            ship_kills: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn xp(&self) -> u32 {
        self.xp
    }

    pub fn ships(&self) -> &[String] {
        &self.ships
    }

    pub fn selected_ship(&self) -> &str {
        &self.selected_ship
    }

    /// Materialised slots in display order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot_cards(&self) -> &BTreeMap<SlotKey, String> {
        &self.slot_cards
    }

    pub fn selected_cards(&self) -> &BTreeSet<String> {
        &self.selected_cards
    }

    pub fn owned_cards(&self) -> &BTreeSet<String> {
        &self.owned_cards
    }

    pub fn card_upgrades(&self) -> &BTreeMap<String, u32> {
        &self.card_upgrades
    }

    /// Cached faction usage, refreshed by every equipment transition.
    pub fn used_faction_slots(&self) -> &FactionCounts {
        &self.used_faction_slots
    }

    pub fn card_faction_mappings(&self) -> &BTreeMap<String, Faction> {
        &self.card_faction_mappings
    }

    pub fn ship_kills(&self) -> &BTreeMap<String, u32> {
        &self.ship_kills
    }

    pub fn slot(&self, key: &SlotKey) -> Option<&Slot> {
        self.slots.iter().find(|slot| &slot.key == key)
    }

    pub fn owns(&self, card_id: &str) -> bool {
        self.owned_cards.contains(card_id)
    }

    pub fn is_equipped(&self, card_id: &str) -> bool {
        self.slot_cards.values().any(|id| id == card_id)
    }

    /// Keys currently holding `card_id`, in slot order.
    pub fn keys_holding(&self, card_id: &str) -> Vec<SlotKey> {
        let mut keys: Vec<SlotKey> = self
            .slot_cards
            .iter()
            .filter(|(_, id)| id.as_str() == card_id)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort_by_key(|key| self.slots.iter().position(|slot| &slot.key == key));
        keys
    }

    /// Distinct equipped card ids, ordered by their first slot.
    pub fn equipped_cards(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for slot in &self.slots {
            if let Some(id) = self.slot_cards.get(&slot.key) {
                if !seen.contains(&id.as_str()) {
                    seen.push(id);
                }
            }
        }
        for id in self.slot_cards.values() {
            if !seen.contains(&id.as_str()) {
                seen.push(id);
            }
        }
        seen
    }

    /// Upgrade level; absent entries are level 0.
    pub fn upgrade_level(&self, card_id: &str) -> u32 {
        self.card_upgrades.get(card_id).copied().unwrap_or(0)
    }

    /// Check the bookkeeping invariants that every transition must keep.
    pub fn verify(&self, catalog: &Catalog) -> Result<(), InvariantError> {
        for key in self.slot_cards.keys() {
            if self.slot(key).is_none() {
                return Err(InvariantError::OrphanedSlot(key.clone()));
            }
        }

        for card_id in self.equipped_cards() {
            if !self.owns(card_id) {
                return Err(InvariantError::UnownedCard(card_id.to_string()));
            }
            let Some(card) = catalog.find_card_by_id(card_id) else {
                continue;
            };
            let required = card.requirements().len();
            let held = self.keys_holding(card_id).len();
            if held != required {
                return Err(InvariantError::Occupancy {
                    card: card_id.to_string(),
                    held,
                    required,
                });
            }
        }

        let fresh = used_faction_slots(self, catalog);
        if fresh != self.used_faction_slots {
            return Err(InvariantError::LedgerDrift {
                cached: self.used_faction_slots.clone(),
                fresh,
            });
        }
        Ok(())
    }
}

/// Engine-wide toggles. Flipping one does not re-validate equipped cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Show homebrew cards in listings.
    #[serde(default)]
    pub enable_custom_cards: bool,
    /// Enforce faction quotas at equip time and filter listings by faction.
    #[serde(default = "enabled")]
    pub enable_faction_filtering: bool,
    /// Allow each unique card on at most one pilot.
    #[serde(default = "enabled")]
    pub enable_unique_restriction: bool,
}

fn enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_custom_cards: false,
            enable_faction_filtering: true,
            enable_unique_restriction: true,
        }
    }
}

/// The whole engine state: every pilot, the active pointer and the toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    #[serde(default)]
    pub(crate) pilots: Vec<Pilot>,
    #[serde(default = "default_pilot_id")]
    pub(crate) current_pilot_id: String,
    #[serde(default)]
    pub settings: Settings,
}

fn default_pilot_id() -> String {
    DEFAULT_PILOT_ID.to_string()
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            pilots: Vec::new(),
            current_pilot_id: default_pilot_id(),
            settings: Settings::default(),
        }
    }
}

impl Roster {
    /// Empty roster with the given toggles.
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn pilots(&self) -> &[Pilot] {
        &self.pilots
    }

    pub fn pilot(&self, id: &str) -> Option<&Pilot> {
        self.pilots.iter().find(|pilot| pilot.id == id)
    }

    pub fn current_pilot_id(&self) -> &str {
        &self.current_pilot_id
    }

    /// The active pilot, if the pointer names one.
    pub fn current_pilot(&self) -> Option<&Pilot> {
        self.pilot(&self.current_pilot_id)
    }

    pub(crate) fn pilot_index(&self, id: &str) -> Option<usize> {
        self.pilots.iter().position(|pilot| pilot.id == id)
    }
}
