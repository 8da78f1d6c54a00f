//! Slot identity, derivation and card-to-slot matching.

/// Slot inventory derivation from class, ship and rank.
pub mod deriver;
/// Combination search for multi-slot cards.
pub mod matcher;

use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::codec::SlotCode;

pub use deriver::{derive_slots, slot_inventory};
pub use matcher::{first_combination, match_keys, slot_combinations};

/// Identity of a slot, tagged with where it came from.
///
/// The string form (`fixed-0`, `optional-1`, `X-Wing-0`, `free-r2-d2-0`) is
/// only used at the serialisation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotKey {
    /// Ship slots followed by rank fixed slots.
    Fixed(usize),
    /// Slots from rank optional groups.
    Optional(usize),
    /// Locked slot of the named ship.
    Locked(String, usize),
    /// Slot granted by an equipped card.
    Free(String, usize),
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKey::Fixed(index) => write!(f, "fixed-{index}"),
            SlotKey::Optional(index) => write!(f, "optional-{index}"),
            SlotKey::Locked(ship, index) => write!(f, "{ship}-{index}"),
            SlotKey::Free(card, index) => write!(f, "free-{card}-{index}"),
        }
    }
}

/// Failure to parse a slot key string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid slot key '{0}'")]
pub struct SlotKeyError(pub String);

impl FromStr for SlotKey {
    type Err = SlotKeyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || SlotKeyError(raw.to_string());
        let (head, index) = raw.rsplit_once('-').ok_or_else(invalid)?;
        let index = index.parse::<usize>().map_err(|_| invalid())?;
        if head.is_empty() {
            return Err(invalid());
        }
        let key = match head {
            "fixed" => SlotKey::Fixed(index),
            "optional" => SlotKey::Optional(index),
            _ => match head.strip_prefix("free-") {
                Some(card) if !card.is_empty() => SlotKey::Free(card.to_string(), index),
                _ => SlotKey::Locked(head.to_string(), index),
            },
        };
        Ok(key)
    }
}

impl Serialize for SlotKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// A materialised slot: key plus accepted code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Where the slot came from.
    pub key: SlotKey,
    /// Card type the slot accepts.
    pub code: SlotCode,
}

impl Slot {
    /// Pair a key with its code.
    pub fn new(key: SlotKey, code: SlotCode) -> Self {
        Self { key, code }
    }
}
