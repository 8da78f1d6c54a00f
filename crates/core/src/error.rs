//! Error types shared across the engine.

use thiserror::Error;

use crate::{faction::FactionCounts, slots::SlotKey, validation::NameError};

/// Failures of roster operations that are not rule gates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    /// Pilot name rejected by validation.
    #[error(transparent)]
    InvalidName(#[from] NameError),
    /// Class missing from the catalog.
    #[error("unknown class '{0}'")]
    UnknownClass(String),
    /// Ship not offered by the chosen class.
    #[error("class {class} does not offer ship '{ship}'")]
    UnknownShip {
        /// Class name.
        class: String,
        /// Requested ship.
        ship: String,
    },
}

/// Internal bookkeeping that fell out of sync. Never caused by user input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantError {
    /// An occupied key is missing from the pilot's slot list.
    #[error("slot {0} is occupied but not materialised")]
    OrphanedSlot(SlotKey),
    /// An equipped card is not owned.
    #[error("card {0} is equipped but not owned")]
    UnownedCard(String),
    /// A card holds a different number of slots than it requires.
    #[error("card {card} holds {held} slots but requires {required}")]
    Occupancy {
        /// Card id.
        card: String,
        /// Keys currently held.
        held: usize,
        /// Type requirements declared by the card.
        required: usize,
    },
    /// Cached faction usage differs from a fresh recomputation.
    #[error("cached faction usage {cached:?} differs from {fresh:?}")]
    LedgerDrift {
        /// Value stored on the pilot.
        cached: FactionCounts,
        /// Freshly computed value.
        fresh: FactionCounts,
    },
}
