//! Pilot roster: the mutable engine state, its transitions and read-only
//! queries.
//!
//! All mutation goes through the methods in [`actions`]; the pilot fields
//! are not writable from outside the crate.

pub mod actions;
mod models;
pub mod query;

pub use models::{Pilot, Roster, Settings, DEFAULT_PILOT_ID};
pub use query::CardFilter;
