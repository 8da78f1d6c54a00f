//! Read-only catalog models: cards, classes, ships and ranks.

use serde::{Deserialize, Serialize};

use crate::{
    codec::{parse_codes, CardType, SlotCode},
    faction::Faction,
};

/// Data-file field that holds either a single string or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// A single value.
    One(String),
    /// An ordered list of values.
    Many(Vec<String>),
}

impl OneOrMany {
    /// Borrow the values in declaration order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            OneOrMany::One(value) => vec![value.as_str()],
            OneOrMany::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// Catalog entry for an equippable card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Unique identifier (kebab-case).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Type name, or ordered type names for multi-slot cards.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<OneOrMany>,
    /// Eligible faction(s); absent means neutral.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction: Option<OneOrMany>,
    /// Minimum pilot initiative required to equip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiative: Option<u32>,
    /// At most one copy may be held across the roster.
    #[serde(default)]
    pub unique: bool,
    /// Whether the card can be upgraded with energy.
    #[serde(default)]
    pub upgradeable: bool,
    /// Maximum upgrade level when `upgradeable`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<u32>,
    /// Energy regained each round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_energy: Option<u32>,
    /// Slot codes granted while the card is equipped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub free_slots: Vec<String>,
    /// Homebrew card; only affects visibility filtering.
    #[serde(default)]
    pub custom: bool,
    /// Point cost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<i64>,
    /// Rules text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Artwork path or URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Card {
    /// Ordered type requirements. Unknown type names are dropped.
    pub fn requirements(&self) -> Vec<CardType> {
        self.type_names()
            .into_iter()
            .filter_map(CardType::from_name)
            .collect()
    }

    /// Declared type names that match no card type.
    pub fn unknown_types(&self) -> Vec<&str> {
        self.type_names()
            .into_iter()
            .filter(|name| CardType::from_name(name).is_none())
            .collect()
    }

    fn type_names(&self) -> Vec<&str> {
        self.kind.as_ref().map(OneOrMany::values).unwrap_or_default()
    }

    /// Whether the card needs more than one slot.
    pub fn is_multi_slot(&self) -> bool {
        self.requirements().len() > 1
    }

    /// Eligible factions, normalised, in declaration order. Unknown
    /// spellings are dropped.
    pub fn factions(&self) -> Vec<Faction> {
        self.faction_names()
            .into_iter()
            .filter_map(Faction::normalize)
            .collect()
    }

    /// Declared faction names that normalise to nothing.
    pub fn unknown_factions(&self) -> Vec<&str> {
        self.faction_names()
            .into_iter()
            .filter(|name| Faction::normalize(name).is_none())
            .collect()
    }

    fn faction_names(&self) -> Vec<&str> {
        self.faction.as_ref().map(OneOrMany::values).unwrap_or_default()
    }

    /// Highest upgrade level the card supports.
    pub fn max_upgrade(&self) -> u32 {
        if self.upgradeable {
            self.energy.unwrap_or(0)
        } else {
            0
        }
    }

    /// Slot codes granted once equipped.
    pub fn granted_slots(&self) -> Vec<SlotCode> {
        self.free_slots
            .iter()
            .flat_map(|codes| parse_codes(codes))
            .collect()
    }

    /// Cost used for sorting, missing costs sort first.
    pub fn sort_cost(&self) -> i64 {
        self.cost.unwrap_or(0)
    }
}

/// A ship a class may fly, with its built-in slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipDef {
    /// Ship name, unique within its class.
    pub name: String,
    /// Fixed slot codes in display order.
    #[serde(default)]
    pub slots: String,
    /// Slots with an unchangeable type, keyed by ship name.
    #[serde(default)]
    pub locked: String,
    /// Extra wildcard slots appended after the fixed ones.
    #[serde(default)]
    pub wildcards: usize,
}

impl ShipDef {
    /// Fixed slot codes including trailing wildcards.
    pub fn fixed_codes(&self) -> Vec<SlotCode> {
        let mut codes = parse_codes(&self.slots);
        codes.extend(std::iter::repeat(SlotCode::Any).take(self.wildcards));
        codes
    }

    /// Locked slot codes.
    pub fn locked_codes(&self) -> Vec<SlotCode> {
        parse_codes(&self.locked)
    }
}

/// Contribution unlocked when a pilot reaches a rank.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankDef {
    /// Rank number, starting at 1.
    pub rank: u32,
    /// Fixed slot codes added at this rank.
    #[serde(default)]
    pub slots: String,
    /// Optional slot groups, each a run of slot codes.
    #[serde(default)]
    pub optional: Vec<String>,
    /// Faction quota contribution as a multiset of faction codes.
    #[serde(default)]
    pub factions: String,
    /// Initiative from this rank on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiative: Option<u32>,
}

/// Pilot class with its ships and rank ladder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDef {
    /// Class name.
    pub name: String,
    /// Ships the class may fly.
    #[serde(default)]
    pub ships: Vec<ShipDef>,
    /// Rank ladder, in any order.
    #[serde(default)]
    pub ranks: Vec<RankDef>,
}

impl ClassDef {
    /// Find a ship offered by this class.
    pub fn ship(&self, name: &str) -> Option<&ShipDef> {
        self.ships.iter().find(|ship| ship.name == name)
    }

    /// Ranks at or below `rank`, in ascending rank order.
    pub fn ranks_up_to(&self, rank: u32) -> Vec<&RankDef> {
        let mut ranks: Vec<&RankDef> = self.ranks.iter().filter(|r| r.rank <= rank).collect();
        ranks.sort_by_key(|r| r.rank);
        ranks
    }

    /// Initiative of the highest unlocked rank that declares one.
    pub fn initiative_at(&self, rank: u32) -> u32 {
        self.ranks_up_to(rank)
            .into_iter()
            .rev()
            .find_map(|r| r.initiative)
            .unwrap_or(0)
    }
}
