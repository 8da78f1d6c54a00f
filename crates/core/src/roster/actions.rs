//! Roster transitions. Each public method applies one command atomically:
//! gated commands either commit fully and return `true`, or return `false`
//! without touching any state.

use tracing::{debug, info, warn};

use crate::{
    catalog::Catalog,
    error::RosterError,
    faction::{
        can_equip, faction_limits, pick_faction, used_faction_slots,
        used_faction_slots_excluding, Faction,
    },
    slots::{deriver::free_slots_for, first_combination, match_keys, slot_inventory, Slot, SlotKey},
    validation::validate_name,
};

use super::{
    models::{Pilot, Roster, DEFAULT_PILOT_ID},
    query::is_card_taken,
};

/// Where a card should go.
#[derive(Clone, Copy)]
enum Placement<'a> {
    /// A specific slot; multi-slot cards fill the rest automatically.
    Slot(&'a SlotKey),
    /// First valid assignment in slot order.
    Auto,
    /// Caller-chosen keys, one per requirement.
    Keys(&'a [SlotKey]),
}

/// A validated equip, ready to commit.
struct EquipPlan {
    card_id: String,
    keys: Vec<SlotKey>,
    displaced: Option<String>,
    faction: Option<Faction>,
    free_slots: Vec<Slot>,
}

impl Roster {
    /// Create a pilot, make it active and return its id.
    pub fn create_pilot(
        &mut self,
        catalog: &Catalog,
        name: &str,
        class: &str,
        ship: &str,
    ) -> Result<String, RosterError> {
        let name = validate_name(name, self.pilots.iter().map(|pilot| pilot.name.as_str()))?;
        let class_def = catalog
            .find_class(class)
            .ok_or_else(|| RosterError::UnknownClass(class.to_string()))?;
        if class_def.ship(ship).is_none() {
            return Err(RosterError::UnknownShip {
                class: class_def.name.clone(),
                ship: ship.to_string(),
            });
        }

        let id = self.next_pilot_id();
        let mut pilot = Pilot::new(id.clone(), name, class_def.name.clone(), ship.to_string());
        refresh_pilot(&mut pilot, catalog);
        info!("created pilot {} ({}) as {}", pilot.id, pilot.name, pilot.class);
        self.pilots.push(pilot);
        self.current_pilot_id = id.clone();
        Ok(id)
    }

    fn next_pilot_id(&self) -> String {
        let next = self
            .pilots
            .iter()
            .filter_map(|pilot| pilot.id.parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);
        next.to_string()
    }

    /// Remove a pilot. When the active pilot goes, the first remaining pilot
    /// (or the default id) becomes active.
    pub fn delete_pilot(&mut self, pilot_id: &str) -> bool {
        let Some(index) = self.pilot_index(pilot_id) else {
            warn!("cannot delete unknown pilot {pilot_id}");
            return false;
        };
        self.pilots.remove(index);
        if self.current_pilot_id == pilot_id {
            self.current_pilot_id = self
                .pilots
                .first()
                .map(|pilot| pilot.id.clone())
                .unwrap_or_else(|| DEFAULT_PILOT_ID.to_string());
        }
        true
    }

    /// Move the active pointer and refresh the new pilot's derived slots and
    /// faction cache.
    pub fn switch_pilot(&mut self, catalog: &Catalog, pilot_id: &str) -> bool {
        let Some(index) = self.pilot_index(pilot_id) else {
            warn!("cannot switch to unknown pilot {pilot_id}");
            return false;
        };
        self.current_pilot_id = pilot_id.to_string();
        let pilot = &mut self.pilots[index];
        refresh_pilot(pilot, catalog);
        debug_verify(pilot, catalog);
        true
    }

    /// Re-derive every pilot's slots and faction cache against `catalog`.
    /// Run after loading a stored roster, which may predate the catalog or
    /// omit derived fields.
    pub fn refresh(&mut self, catalog: &Catalog) {
        for pilot in &mut self.pilots {
            refresh_pilot(pilot, catalog);
            debug_verify(pilot, catalog);
        }
    }

    /// Acquire a card permanently. Idempotent for owned cards.
    pub fn add_card_to_deck(&mut self, catalog: &Catalog, pilot_id: &str, card_id: &str) -> bool {
        if catalog.find_card_by_id(card_id).is_none() {
            warn!("cannot add unknown card {card_id} to a deck");
            return false;
        }
        let Some(pilot) = self.pilot_mut(pilot_id) else {
            return false;
        };
        pilot.owned_cards.insert(card_id.to_string());
        true
    }

    /// Give up a card: unequip it everywhere, drop selection and upgrades,
    /// then ownership.
    pub fn remove_card_from_deck(&mut self, catalog: &Catalog, pilot_id: &str, card_id: &str) -> bool {
        let Some(pilot) = self.pilot_mut(pilot_id) else {
            return false;
        };
        if !pilot.owned_cards.contains(card_id) {
            return false;
        }
        unequip(pilot, catalog, card_id);
        pilot.selected_cards.remove(card_id);
        pilot.card_upgrades.remove(card_id);
        pilot.owned_cards.remove(card_id);
        pilot.used_faction_slots = used_faction_slots(pilot, catalog);
        debug_verify(pilot, catalog);
        true
    }

    /// Stage an owned card for the deck.
    pub fn select_card(&mut self, catalog: &Catalog, pilot_id: &str, card_id: &str) -> bool {
        let Some(card) = catalog.find_card_by_id(card_id) else {
            warn!("cannot select unknown card {card_id}");
            return false;
        };
        let Some(pilot) = self.pilot(pilot_id) else {
            return false;
        };
        if !pilot.owns(card_id) || pilot.is_equipped(card_id) {
            debug!("pilot {pilot_id} cannot select {card_id}: not owned or already equipped");
            return false;
        }
        if self.settings.enable_unique_restriction
            && card.unique
            && is_card_taken(self, card_id, Some(pilot_id))
        {
            debug!("unique card {card_id} is already taken by another pilot");
            return false;
        }
        if let Some(pilot) = self.pilot_mut(pilot_id) {
            pilot.selected_cards.insert(card_id.to_string());
        }
        true
    }

    /// Drop a card from the staging area. Always succeeds.
    pub fn unselect_card(&mut self, catalog: &Catalog, pilot_id: &str, card_id: &str) {
        if let Some(pilot) = self.pilot_mut(pilot_id) {
            pilot.selected_cards.remove(card_id);
            pilot.used_faction_slots = used_faction_slots(pilot, catalog);
        }
    }

    /// Equip `card_id` into `slot`. A blank id clears the slot instead.
    pub fn assign_card_to_slot(
        &mut self,
        catalog: &Catalog,
        pilot_id: &str,
        slot: &SlotKey,
        card_id: &str,
    ) -> bool {
        self.assign_card_to_slot_as(catalog, pilot_id, slot, card_id, None)
    }

    /// [`Roster::assign_card_to_slot`] with an explicit faction for cards
    /// that list several.
    pub fn assign_card_to_slot_as(
        &mut self,
        catalog: &Catalog,
        pilot_id: &str,
        slot: &SlotKey,
        card_id: &str,
        faction: Option<Faction>,
    ) -> bool {
        if card_id.trim().is_empty() {
            return self.remove_card_from_slot(catalog, pilot_id, slot);
        }
        self.equip(catalog, pilot_id, card_id, Placement::Slot(slot), faction)
    }

    /// Equip a multi-slot card into the first slots that fit all of its
    /// requirements.
    pub fn assign_multi_slot_card(
        &mut self,
        catalog: &Catalog,
        pilot_id: &str,
        card_id: &str,
        faction: Option<Faction>,
    ) -> bool {
        self.equip(catalog, pilot_id, card_id, Placement::Auto, faction)
    }

    /// Equip a multi-slot card into exactly `slot_keys`.
    pub fn assign_multi_slot_card_to_slots(
        &mut self,
        catalog: &Catalog,
        pilot_id: &str,
        card_id: &str,
        slot_keys: &[SlotKey],
        faction: Option<Faction>,
    ) -> bool {
        self.equip(catalog, pilot_id, card_id, Placement::Keys(slot_keys), faction)
    }

    /// Clear the card in `slot`, along with every other slot it holds and
    /// any slots it granted. Returns whether anything was removed.
    pub fn remove_card_from_slot(&mut self, catalog: &Catalog, pilot_id: &str, slot: &SlotKey) -> bool {
        let Some(pilot) = self.pilot_mut(pilot_id) else {
            return false;
        };
        let Some(card_id) = pilot.slot_cards.get(slot).cloned() else {
            return false;
        };
        unequip(pilot, catalog, &card_id);
        pilot.used_faction_slots = used_faction_slots(pilot, catalog);
        debug_verify(pilot, catalog);
        true
    }

    /// Raise a card's upgrade level by one, up to its energy.
    pub fn upgrade_card(&mut self, catalog: &Catalog, pilot_id: &str, card_id: &str) -> bool {
        let Some(card) = catalog.find_card_by_id(card_id) else {
            warn!("cannot upgrade unknown card {card_id}");
            return false;
        };
        let Some(pilot) = self.pilot_mut(pilot_id) else {
            return false;
        };
        if !pilot.owns(card_id) {
            return false;
        }
        let level = pilot.upgrade_level(card_id);
        if level >= card.max_upgrade() {
            return false;
        }
        pilot.card_upgrades.insert(card_id.to_string(), level + 1);
        true
    }

    /// Lower a card's upgrade level by one; level 0 removes the entry.
    pub fn downgrade_card(&mut self, pilot_id: &str, card_id: &str) -> bool {
        let Some(pilot) = self.pilot_mut(pilot_id) else {
            return false;
        };
        match pilot.upgrade_level(card_id) {
            0 => false,
            1 => {
                pilot.card_upgrades.remove(card_id);
                true
            }
            level => {
                pilot.card_upgrades.insert(card_id.to_string(), level - 1);
                true
            }
        }
    }

    /// Fly a different owned ship. All equipment is unequipped.
    pub fn change_selected_ship(&mut self, catalog: &Catalog, pilot_id: &str, ship: &str) -> bool {
        let Some(pilot) = self.pilot_mut(pilot_id) else {
            return false;
        };
        if !pilot.ships.iter().any(|owned| owned == ship) {
            debug!("pilot {pilot_id} does not own ship {ship}");
            return false;
        }
        pilot.selected_ship = ship.to_string();
        pilot.slot_cards.clear();
        pilot.card_faction_mappings.clear();
        refresh_pilot(pilot, catalog);
        debug_verify(pilot, catalog);
        true
    }

    /// Acquire a ship offered by the pilot's class.
    pub fn add_ship(&mut self, catalog: &Catalog, pilot_id: &str, ship: &str) -> bool {
        let Some(pilot) = self.pilot_mut(pilot_id) else {
            return false;
        };
        let offered = catalog
            .find_class(&pilot.class)
            .is_some_and(|class| class.ship(ship).is_some());
        if !offered || pilot.ships.iter().any(|owned| owned == ship) {
            return false;
        }
        pilot.ships.push(ship.to_string());
        true
    }

    /// Set the rank and re-derive slots. Cards left in slots that no longer
    /// exist are unequipped.
    pub fn set_rank(&mut self, catalog: &Catalog, pilot_id: &str, rank: u32) -> bool {
        let Some(pilot) = self.pilot_mut(pilot_id) else {
            return false;
        };
        pilot.rank = rank;
        refresh_pilot(pilot, catalog);
        debug_verify(pilot, catalog);
        true
    }

    /// Add experience points.
    pub fn add_xp(&mut self, pilot_id: &str, amount: u32) -> bool {
        let Some(pilot) = self.pilot_mut(pilot_id) else {
            return false;
        };
        pilot.xp = pilot.xp.saturating_add(amount);
        true
    }

    /// Adjust the kill count for a ship icon; counts never drop below zero.
    pub fn record_kill(&mut self, pilot_id: &str, icon: &str, delta: i32) -> bool {
        let Some(pilot) = self.pilot_mut(pilot_id) else {
            return false;
        };
        let current = pilot.ship_kills.get(icon).copied().unwrap_or(0);
        let next = current.saturating_add_signed(delta);
        if next == 0 {
            pilot.ship_kills.remove(icon);
        } else {
            pilot.ship_kills.insert(icon.to_string(), next);
        }
        true
    }

    /// Whether `card_id` could be equipped somewhere right now, with every
    /// gate applied. Nothing is mutated.
    pub fn can_equip_card(&self, catalog: &Catalog, pilot_id: &str, card_id: &str) -> bool {
        self.plan_equip(catalog, pilot_id, card_id, Placement::Auto, None)
            .is_some()
    }

    fn pilot_mut(&mut self, pilot_id: &str) -> Option<&mut Pilot> {
        let pilot = self.pilots.iter_mut().find(|pilot| pilot.id == pilot_id);
        if pilot.is_none() {
            warn!("unknown pilot {pilot_id}");
        }
        pilot
    }

    fn equip(
        &mut self,
        catalog: &Catalog,
        pilot_id: &str,
        card_id: &str,
        placement: Placement<'_>,
        faction: Option<Faction>,
    ) -> bool {
        let Some(plan) = self.plan_equip(catalog, pilot_id, card_id, placement, faction) else {
            return false;
        };
        let Some(pilot) = self.pilot_mut(pilot_id) else {
            return false;
        };
        commit(pilot, catalog, plan);
        debug_verify(pilot, catalog);
        true
    }

    /// Run every gate without mutating anything.
    fn plan_equip(
        &self,
        catalog: &Catalog,
        pilot_id: &str,
        card_id: &str,
        placement: Placement<'_>,
        chosen: Option<Faction>,
    ) -> Option<EquipPlan> {
        let Some(pilot) = self.pilot(pilot_id) else {
            warn!("unknown pilot {pilot_id}");
            return None;
        };
        let Some(card) = catalog.find_card_by_id(card_id) else {
            warn!("cannot equip unknown card {card_id}");
            return None;
        };
        let Some(class) = catalog.find_class(&pilot.class) else {
            warn!("pilot {pilot_id} has unknown class {}", pilot.class);
            return None;
        };
        let reject = |reason: &str| {
            debug!("pilot {pilot_id} cannot equip {card_id}: {reason}");
            None
        };

        if !pilot.owns(card_id) {
            return reject("card not owned");
        }
        if pilot.is_equipped(card_id) {
            return reject("card already equipped");
        }
        let requirements = card.requirements();
        if requirements.is_empty() {
            return reject("card has no slot type");
        }
        if !card.unknown_types().is_empty() {
            return reject("card declares unknown slot type");
        }
        let initiative = class.initiative_at(pilot.rank);
        if card.initiative.is_some_and(|required| initiative < required) {
            return reject("initiative too low");
        }
        if self.settings.enable_unique_restriction
            && card.unique
            && is_card_taken(self, card_id, Some(pilot_id))
        {
            return reject("unique card held by another pilot");
        }

        let displaced = match placement {
            Placement::Slot(slot) if requirements.len() == 1 => {
                pilot.slot_cards.get(slot).cloned()
            }
            _ => None,
        };
        let keys = match placement {
            Placement::Slot(slot) if requirements.len() == 1 => {
                let Some(target) = pilot.slot(slot) else {
                    return reject("slot does not exist");
                };
                if !target.code.accepts(requirements[0]) {
                    return reject("slot type does not match");
                }
                Some(vec![slot.clone()])
            }
            Placement::Slot(slot) => {
                first_combination(&requirements, &pilot.slots, &pilot.slot_cards, Some(slot))
            }
            Placement::Auto => {
                first_combination(&requirements, &pilot.slots, &pilot.slot_cards, None)
            }
            Placement::Keys(keys) => {
                match_keys(&requirements, &pilot.slots, &pilot.slot_cards, keys)
            }
        };
        let Some(keys) = keys else {
            return reject("no free slots fit every requirement");
        };

        let factions = card.factions();
        let limits = faction_limits(class, pilot.rank);
        let excluded: Vec<&str> = displaced.iter().map(String::as_str).collect();
        let used = used_faction_slots_excluding(pilot, catalog, &excluded);
        if self.settings.enable_faction_filtering && !can_equip(&limits, &used, &factions, chosen) {
            return reject("faction quota exhausted");
        }
        let faction = match chosen {
            Some(faction) if factions.contains(&faction) => Some(faction),
            Some(_) if factions.is_empty() => None,
            Some(_) => return reject("chosen faction not listed on card"),
            None if factions.len() > 1 => {
                pick_faction(&limits, &used, &factions).or_else(|| factions.first().copied())
            }
            None => None,
        };

        Some(EquipPlan {
            card_id: card_id.to_string(),
            keys,
            displaced,
            faction,
            free_slots: free_slots_for(card),
        })
    }
}

fn commit(pilot: &mut Pilot, catalog: &Catalog, plan: EquipPlan) {
    if let Some(displaced) = &plan.displaced {
        unequip(pilot, catalog, displaced);
    }
    pilot.selected_cards.remove(&plan.card_id);
    for key in plan.keys {
        pilot.slot_cards.insert(key, plan.card_id.clone());
    }
    for slot in plan.free_slots {
        if pilot.slot(&slot.key).is_none() {
            pilot.slots.push(slot);
        }
    }
    if let Some(faction) = plan.faction {
        pilot
            .card_faction_mappings
            .insert(plan.card_id.clone(), faction);
    }
    pilot.used_faction_slots = used_faction_slots(pilot, catalog);
}

/// Clear every key holding `card_id` and delete the slots it granted.
/// Cards sitting in those granted slots are unequipped as well.
fn unequip(pilot: &mut Pilot, catalog: &Catalog, card_id: &str) {
    let mut pending = vec![card_id.to_string()];
    while let Some(card_id) = pending.pop() {
        pilot.slot_cards.retain(|_, id| id != &card_id);
        pilot.card_faction_mappings.remove(&card_id);

        let granted: Vec<SlotKey> = pilot
            .slots
            .iter()
            .filter(|slot| matches!(&slot.key, SlotKey::Free(owner, _) if owner == &card_id))
            .map(|slot| slot.key.clone())
            .collect();
        for key in &granted {
            if let Some(occupant) = pilot.slot_cards.get(key) {
                if !pending.contains(occupant) {
                    pending.push(occupant.clone());
                }
            }
        }
        pilot.slots.retain(|slot| !granted.contains(&slot.key));
        pilot.slot_cards.retain(|key, _| !granted.contains(key));
    }
    if catalog.find_card_by_id(card_id).is_none() {
        warn!("unequipped card {card_id} is missing from the catalog");
    }
}

/// Rebuild a pilot's slots from class data plus the free slots of equipped
/// cards, drop equipment that no longer has a slot, and refresh the faction
/// cache.
fn refresh_pilot(pilot: &mut Pilot, catalog: &Catalog) {
    let Some(class) = catalog.find_class(&pilot.class) else {
        warn!("pilot {} has unknown class {}", pilot.id, pilot.class);
        pilot.used_faction_slots = used_faction_slots(pilot, catalog);
        return;
    };

    let equipped: Vec<String> = pilot
        .equipped_cards()
        .into_iter()
        .map(str::to_string)
        .collect();
    let unowned: Vec<String> = equipped
        .iter()
        .filter(|id| !pilot.owns(id))
        .cloned()
        .collect();
    for card_id in &unowned {
        warn!("pilot {} had unowned card {card_id} equipped", pilot.id);
        unequip(pilot, catalog, card_id);
    }

    let mut slots = slot_inventory(class, &pilot.selected_ship, pilot.rank);
    loop {
        let before = slots.len();
        for card_id in &equipped {
            if unowned.contains(card_id) {
                continue;
            }
            let Some(card) = catalog.find_card_by_id(card_id) else {
                continue;
            };
            // Only cards that still sit in a materialised slot grant slots.
            let seated = pilot
                .keys_holding(card_id)
                .iter()
                .any(|key| slots.iter().any(|slot| &slot.key == key));
            if !seated {
                continue;
            }
            for slot in free_slots_for(card) {
                if !slots.iter().any(|known| known.key == slot.key) {
                    slots.push(slot);
                }
            }
        }
        if slots.len() == before {
            break;
        }
    }
    pilot.slots = slots;

    loop {
        let orphan = pilot
            .slot_cards
            .iter()
            .find(|(key, _)| pilot.slot(key).is_none())
            .map(|(_, id)| id.clone());
        match orphan {
            Some(card_id) => {
                debug!("pilot {} lost the slot for {card_id}; unequipping", pilot.id);
                unequip(pilot, catalog, &card_id);
            }
            None => break,
        }
    }
    pilot.used_faction_slots = used_faction_slots(pilot, catalog);
}

fn debug_verify(pilot: &Pilot, catalog: &Catalog) {
    debug_assert_eq!(
        pilot.verify(catalog),
        Ok(()),
        "pilot {} invariant violated",
        pilot.id
    );
}
