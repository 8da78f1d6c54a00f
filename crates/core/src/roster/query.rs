//! Read-only projections over a roster. Everything here takes its inputs
//! explicitly and never mutates.

use crate::{
    catalog::Catalog,
    codec::{CardType, SlotCode},
    faction::{faction_limits, headroom, Faction, FactionCounts},
    models::Card,
    slots::{slot_combinations, Slot, SlotKey},
};

use super::models::{Pilot, Roster, Settings};

/// Whether any pilot other than `except` holds `card_id` selected or
/// equipped.
pub fn is_card_taken(roster: &Roster, card_id: &str, except: Option<&str>) -> bool {
    roster
        .pilots()
        .iter()
        .filter(|pilot| Some(pilot.id()) != except)
        .any(|pilot| pilot.selected_cards().contains(card_id) || pilot.is_equipped(card_id))
}

/// Initiative granted by the pilot's class at their current rank.
pub fn pilot_initiative(catalog: &Catalog, pilot: &Pilot) -> u32 {
    catalog
        .find_class(pilot.class())
        .map_or(0, |class| class.initiative_at(pilot.rank()))
}

/// Faction quota accrued up to the pilot's rank.
pub fn faction_capacity(catalog: &Catalog, pilot: &Pilot) -> FactionCounts {
    catalog
        .find_class(pilot.class())
        .map(|class| faction_limits(class, pilot.rank()))
        .unwrap_or_default()
}

/// Remaining quota per faction.
pub fn faction_headroom(catalog: &Catalog, pilot: &Pilot) -> FactionCounts {
    headroom(&faction_capacity(catalog, pilot), pilot.used_faction_slots())
}

/// Factions the pilot has any quota for.
pub fn allowed_factions(catalog: &Catalog, pilot: &Pilot) -> Vec<Faction> {
    faction_capacity(catalog, pilot)
        .into_iter()
        .filter(|(_, capacity)| *capacity > 0)
        .map(|(faction, _)| faction)
        .collect()
}

/// Unoccupied slots in display order.
pub fn available_slots(pilot: &Pilot) -> Vec<&Slot> {
    pilot
        .slots()
        .iter()
        .filter(|slot| !pilot.slot_cards().contains_key(&slot.key))
        .collect()
}

/// Every slot assignment the card could take on this pilot right now.
pub fn card_combinations(
    catalog: &Catalog,
    pilot: &Pilot,
    card_id: &str,
    target: Option<&SlotKey>,
) -> Vec<Vec<SlotKey>> {
    let Some(card) = catalog.find_card_by_id(card_id) else {
        return Vec::new();
    };
    slot_combinations(&card.requirements(), pilot.slots(), pilot.slot_cards(), target)
}

/// Card listings for a browsing pilot. Every listing is sorted by cost,
/// cheapest first, keeping catalog order among equal costs.
pub struct CardFilter<'a> {
    catalog: &'a Catalog,
    settings: Settings,
    pilot: Option<&'a Pilot>,
}

impl<'a> CardFilter<'a> {
    /// Listings as seen by `pilot`, or by nobody in particular.
    pub fn new(catalog: &'a Catalog, settings: Settings, pilot: Option<&'a Pilot>) -> Self {
        Self {
            catalog,
            settings,
            pilot,
        }
    }

    /// Custom cards stay hidden unless enabled or owned by the browsing pilot.
    fn visible(&self, card: &Card) -> bool {
        !card.custom
            || self.settings.enable_custom_cards
            || self.pilot.is_some_and(|pilot| pilot.owns(&card.id))
    }

    fn collect(&self, keep: impl Fn(&Card) -> bool) -> Vec<&'a Card> {
        let mut cards: Vec<&Card> = self
            .catalog
            .cards()
            .filter(|card| self.visible(card) && keep(card))
            .collect();
        cards.sort_by_key(|card| card.sort_cost());
        cards
    }

    /// Every visible card.
    pub fn all(&self) -> Vec<&'a Card> {
        self.collect(|_| true)
    }

    /// Cards with `kind` among their requirements.
    pub fn by_type(&self, kind: CardType) -> Vec<&'a Card> {
        self.collect(|card| card.requirements().contains(&kind))
    }

    /// Cards eligible for `faction`. Cards without a faction count as
    /// neutral.
    pub fn by_faction(&self, faction: Faction) -> Vec<&'a Card> {
        self.collect(|card| {
            let factions = card.factions();
            if factions.is_empty() {
                faction.is_neutral()
            } else {
                factions.contains(&faction)
            }
        })
    }

    /// Cards usable under any of `allowed`, plus neutral ones. With faction
    /// filtering off this is [`CardFilter::all`].
    pub fn by_allowed_factions(&self, allowed: &[Faction]) -> Vec<&'a Card> {
        if !self.settings.enable_faction_filtering {
            return self.all();
        }
        self.collect(|card| {
            let factions = card.factions();
            factions.is_empty()
                || factions
                    .iter()
                    .any(|faction| faction.is_neutral() || allowed.contains(faction))
        })
    }

    /// Cards with a requirement that one of `codes` accepts. No codes means
    /// no restriction.
    pub fn by_slot_codes(&self, codes: &[SlotCode]) -> Vec<&'a Card> {
        if codes.is_empty() {
            return self.all();
        }
        self.collect(|card| {
            card.requirements()
                .into_iter()
                .any(|kind| codes.iter().any(|code| code.accepts(kind)))
        })
    }
}
