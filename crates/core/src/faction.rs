//! Faction names and the faction-quota ledger.
//!
//! Capacity accrues per rank from the class data; usage is derived from the
//! cards a pilot currently has equipped. Both are keyed by the canonical
//! [`Faction`] so spelling variants in data files cannot split a quota.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{catalog::Catalog, models::ClassDef, roster::Pilot};

/// Canonical faction key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    /// Rebel Alliance.
    Rebel,
    /// Galactic Empire.
    Empire,
    /// Scum and Villainy.
    Scum,
    /// Resistance.
    Resistance,
    /// First Order.
    FirstOrder,
    /// Galactic Republic.
    Republic,
    /// Separatist Alliance.
    Separatist,
    /// Unrestricted cards; never counts against a quota.
    Neutral,
}

/// Per-faction counts, used for both capacity and usage.
pub type FactionCounts = BTreeMap<Faction, u32>;

impl Faction {
    /// Canonicalise a faction spelling (`"First Order"`, `"firstorder"`,
    /// `"Separatists"`, `"galacticempire"`, ...).
    pub fn normalize(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        let key = key.strip_prefix("the").unwrap_or(&key);
        let faction = match key {
            "" | "neutral" | "none" => Faction::Neutral,
            "rebel" | "rebels" | "rebelalliance" => Faction::Rebel,
            "empire" | "imperial" | "galacticempire" => Faction::Empire,
            "scum" | "scumandvillainy" => Faction::Scum,
            "resistance" => Faction::Resistance,
            "firstorder" => Faction::FirstOrder,
            "republic" | "galacticrepublic" => Faction::Republic,
            "separatist" | "separatists" | "separatistalliance" => Faction::Separatist,
            _ => return None,
        };
        Some(faction)
    }

    /// Map a rank quota code to its faction.
    pub fn from_code(code: char) -> Option<Self> {
        let faction = match code {
            'R' => Faction::Rebel,
            'E' => Faction::Empire,
            'S' => Faction::Scum,
            'T' => Faction::Resistance,
            'F' => Faction::FirstOrder,
            'P' => Faction::Republic,
            'C' => Faction::Separatist,
            _ => return None,
        };
        Some(faction)
    }

    /// Canonical lower-case key.
    pub fn key(self) -> &'static str {
        match self {
            Faction::Rebel => "rebel",
            Faction::Empire => "empire",
            Faction::Scum => "scum",
            Faction::Resistance => "resistance",
            Faction::FirstOrder => "firstorder",
            Faction::Republic => "republic",
            Faction::Separatist => "separatist",
            Faction::Neutral => "neutral",
        }
    }

    /// Whether the faction is the unrestricted one.
    pub fn is_neutral(self) -> bool {
        self == Faction::Neutral
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Sum the faction quota contributed by every rank up to `max_rank`.
pub fn faction_limits(class: &ClassDef, max_rank: u32) -> FactionCounts {
    let mut limits = FactionCounts::new();
    for rank in class.ranks_up_to(max_rank) {
        for code in rank.factions.chars().filter(|ch| !ch.is_whitespace()) {
            match Faction::from_code(code) {
                Some(faction) => *limits.entry(faction).or_insert(0) += 1,
                None => warn!(
                    "class {} rank {} has unknown faction code '{code}'",
                    class.name, rank.rank
                ),
            }
        }
    }
    limits
}

/// Faction a pilot's equipped card counts against, if any.
///
/// The remembered equip-time choice wins when it is one of the card's
/// factions; otherwise the first non-neutral faction listed is used.
pub fn resolve_faction(pilot: &Pilot, catalog: &Catalog, card_id: &str) -> Option<Faction> {
    let card = catalog.find_card_by_id(card_id)?;
    let factions = card.factions();
    if let Some(chosen) = pilot.card_faction_mappings.get(card_id) {
        if factions.contains(chosen) {
            return Some(*chosen).filter(|f| !f.is_neutral());
        }
    }
    factions.into_iter().find(|f| !f.is_neutral())
}

/// Count faction usage over the pilot's equipped cards.
///
/// A multi-slot card holds several slot keys but consumes one quota entry.
pub fn used_faction_slots(pilot: &Pilot, catalog: &Catalog) -> FactionCounts {
    used_faction_slots_excluding(pilot, catalog, &[])
}

/// Like [`used_faction_slots`] but ignores the listed card ids, which lets a
/// caller evaluate a replacement before mutating anything.
pub fn used_faction_slots_excluding(
    pilot: &Pilot,
    catalog: &Catalog,
    excluded: &[&str],
) -> FactionCounts {
    let equipped: BTreeSet<&str> = pilot
        .slot_cards
        .values()
        .map(String::as_str)
        .filter(|id| !excluded.contains(id))
        .collect();

    let mut used = FactionCounts::new();
    for card_id in equipped {
        if let Some(faction) = resolve_faction(pilot, catalog, card_id) {
            *used.entry(faction).or_insert(0) += 1;
        }
    }
    used
}

/// Whether `card_id` fits within the faction quota.
///
/// With `chosen` the check is limited to that faction; without it any of the
/// card's factions with headroom will do. Neutral or unrestricted cards
/// always pass.
pub fn can_equip(
    limits: &FactionCounts,
    used: &FactionCounts,
    factions: &[Faction],
    chosen: Option<Faction>,
) -> bool {
    if factions.is_empty() || factions.iter().any(|f| f.is_neutral()) {
        return true;
    }
    let has_headroom = |faction: &Faction| {
        let capacity = limits.get(faction).copied().unwrap_or(0);
        let usage = used.get(faction).copied().unwrap_or(0);
        usage < capacity
    };
    match chosen {
        Some(faction) => factions.contains(&faction) && has_headroom(&faction),
        None => factions.iter().any(has_headroom),
    }
}

/// Faction a card should be recorded under when equipped without an
/// explicit choice: neutral if listed, else the first with headroom.
pub fn pick_faction(
    limits: &FactionCounts,
    used: &FactionCounts,
    factions: &[Faction],
) -> Option<Faction> {
    if factions.iter().any(|f| f.is_neutral()) {
        return Some(Faction::Neutral);
    }
    factions.iter().copied().find(|faction| {
        used.get(faction).copied().unwrap_or(0) < limits.get(faction).copied().unwrap_or(0)
    })
}

/// Remaining capacity per faction (never negative).
pub fn headroom(limits: &FactionCounts, used: &FactionCounts) -> FactionCounts {
    limits
        .iter()
        .map(|(faction, capacity)| {
            let usage = used.get(faction).copied().unwrap_or(0);
            (*faction, capacity.saturating_sub(usage))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixtures, slots::SlotKey};

    #[test]
    fn normalizes_known_spelling_variants() {
        assert_eq!(Faction::normalize("First Order"), Some(Faction::FirstOrder));
        assert_eq!(Faction::normalize("firstorder"), Some(Faction::FirstOrder));
        assert_eq!(Faction::normalize("Separatists"), Some(Faction::Separatist));
        assert_eq!(Faction::normalize("separatist"), Some(Faction::Separatist));
        assert_eq!(Faction::normalize("theresistance"), Some(Faction::Resistance));
        assert_eq!(Faction::normalize("Galactic Empire"), Some(Faction::Empire));
        assert_eq!(Faction::normalize("Neutral"), Some(Faction::Neutral));
        assert_eq!(Faction::normalize("Mandalorian"), None);
    }

    #[test]
    fn limits_accumulate_across_ranks() {
        let catalog = fixtures::catalog();
        let class = catalog.find_class("Ace").unwrap();
        assert_eq!(faction_limits(class, 1).get(&Faction::Empire), None);
        let at_two = faction_limits(class, 2);
        assert_eq!(at_two.get(&Faction::Rebel), Some(&1));
        assert_eq!(at_two.get(&Faction::Empire), Some(&1));
        let at_three = faction_limits(class, 3);
        assert_eq!(at_three.get(&Faction::Rebel), Some(&2));
    }

    #[test]
    fn can_equip_respects_headroom() {
        let mut limits = FactionCounts::new();
        limits.insert(Faction::Rebel, 1);
        let mut used = FactionCounts::new();

        assert!(can_equip(&limits, &used, &[], None));
        assert!(can_equip(&limits, &used, &[Faction::Neutral, Faction::Empire], None));
        assert!(can_equip(&limits, &used, &[Faction::Rebel], None));
        assert!(!can_equip(&limits, &used, &[Faction::Empire], None));

        used.insert(Faction::Rebel, 1);
        assert!(!can_equip(&limits, &used, &[Faction::Rebel], None));
        assert!(!can_equip(&limits, &used, &[Faction::Rebel, Faction::Empire], None));

        limits.insert(Faction::Empire, 1);
        assert!(can_equip(&limits, &used, &[Faction::Rebel, Faction::Empire], None));
        assert!(!can_equip(
            &limits,
            &used,
            &[Faction::Rebel, Faction::Empire],
            Some(Faction::Rebel)
        ));
        assert!(!can_equip(&limits, &used, &[Faction::Rebel], Some(Faction::Empire)));
    }

    #[test]
    fn usage_prefers_remembered_choice_and_skips_neutral() {
        let catalog = fixtures::catalog();
        let mut pilot = fixtures::pilot(&catalog, "Ace", "X-Wing", 3);
        pilot.owned_cards.extend(
            ["dual-loyalty", "neutral-hull", "rebel-crew"].map(String::from),
        );
        pilot
            .slot_cards
            .insert(SlotKey::Fixed(0), "dual-loyalty".to_string());
        pilot
            .slot_cards
            .insert(SlotKey::Fixed(1), "neutral-hull".to_string());

        let used = used_faction_slots(&pilot, &catalog);
        assert_eq!(used.get(&Faction::Rebel), Some(&1));
        assert_eq!(used.len(), 1);

        pilot
            .card_faction_mappings
            .insert("dual-loyalty".to_string(), Faction::Empire);
        let used = used_faction_slots(&pilot, &catalog);
        assert_eq!(used.get(&Faction::Empire), Some(&1));
        assert_eq!(used.get(&Faction::Rebel), None);

        let excluded = used_faction_slots_excluding(&pilot, &catalog, &["dual-loyalty"]);
        assert!(excluded.is_empty());
    }

    #[test]
    fn headroom_saturates() {
        let limits = FactionCounts::from([(Faction::Scum, 2)]);
        let used = FactionCounts::from([(Faction::Scum, 3)]);
        assert_eq!(headroom(&limits, &used).get(&Faction::Scum), Some(&0));
    }
}
