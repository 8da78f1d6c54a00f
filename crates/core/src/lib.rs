#![warn(clippy::all, missing_docs)]

//! Loadout rules engine.
//!
//! Derives a pilot's equipment slots from class, rank and ship data, matches
//! cards onto those slots, and gates every equip on faction quotas,
//! initiative and uniqueness. The roster is a single-writer, in-memory state
//! machine; the catalog, store and config modules cover its I/O edges.

pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod faction;
pub mod models;
pub mod roster;
pub mod slots;
pub mod store;
pub mod validation;

#[cfg(test)]
mod fixtures;

pub use catalog::{Catalog, CatalogLoader};
pub use codec::{CardType, SlotCode};
pub use config::AppConfig;
pub use error::{InvariantError, RosterError};
pub use faction::Faction;
pub use models::{Card, ClassDef};
pub use roster::{CardFilter, Pilot, Roster, Settings};
pub use slots::{Slot, SlotKey};
pub use store::StoreManager;
