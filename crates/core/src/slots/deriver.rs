use tracing::warn;

use crate::{
    codec::{parse_codes, SlotCode},
    models::{Card, ClassDef},
};

use super::{Slot, SlotKey};

struct Contributions {
    fixed: Vec<SlotCode>,
    optional: Vec<SlotCode>,
    locked: Vec<SlotCode>,
}

fn contributions(class: &ClassDef, selected_ship: &str, rank: u32) -> Contributions {
    let (mut fixed, locked) = match class.ship(selected_ship) {
        Some(ship) => (ship.fixed_codes(), ship.locked_codes()),
        None => {
            warn!(
                "class {} does not offer ship '{selected_ship}', deriving rank slots only",
                class.name
            );
            (Vec::new(), Vec::new())
        }
    };

    let ranks = class.ranks_up_to(rank);
    fixed.extend(ranks.iter().flat_map(|r| parse_codes(&r.slots)));
    let optional = ranks
        .iter()
        .flat_map(|r| r.optional.iter())
        .flat_map(|group| parse_codes(group))
        .collect();

    Contributions {
        fixed,
        optional,
        locked,
    }
}

/// Ordered slot codes for a pilot: ship slots, then rank fixed slots, then
/// rank optional slots, accumulated over every rank up to `rank`.
pub fn derive_slots(class: &ClassDef, selected_ship: &str, rank: u32) -> Vec<SlotCode> {
    let Contributions {
        mut fixed,
        optional,
        ..
    } = contributions(class, selected_ship, rank);
    fixed.extend(optional);
    fixed
}

/// Keyed slot inventory: `Fixed` for ship and rank fixed slots, `Optional`
/// for optional groups, then `Locked` slots of the selected ship.
///
/// Indices are positional, so a rank increase only appends keys.
pub fn slot_inventory(class: &ClassDef, selected_ship: &str, rank: u32) -> Vec<Slot> {
    let Contributions {
        fixed,
        optional,
        locked,
    } = contributions(class, selected_ship, rank);

    let fixed = fixed
        .into_iter()
        .enumerate()
        .map(|(index, code)| Slot::new(SlotKey::Fixed(index), code));
    let optional = optional
        .into_iter()
        .enumerate()
        .map(|(index, code)| Slot::new(SlotKey::Optional(index), code));
    let locked = locked
        .into_iter()
        .enumerate()
        .map(|(index, code)| Slot::new(SlotKey::Locked(selected_ship.to_string(), index), code));

    fixed.chain(optional).chain(locked).collect()
}

/// Slots synthesised for the codes a card grants once equipped.
pub fn free_slots_for(card: &Card) -> Vec<Slot> {
    card.granted_slots()
        .into_iter()
        .enumerate()
        .map(|(index, code)| Slot::new(SlotKey::Free(card.id.clone(), index), code))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codec::CardType, fixtures};

    fn code(kind: CardType) -> SlotCode {
        SlotCode::Type(kind)
    }

    #[test]
    fn derives_ship_then_rank_fixed_then_optional() {
        let catalog = fixtures::catalog();
        let class = catalog.find_class("Ace").unwrap();

        assert_eq!(
            derive_slots(class, "X-Wing", 1),
            vec![
                code(CardType::Astromech),
                code(CardType::Modification),
                code(CardType::Talent),
                code(CardType::Crew),
            ]
        );
        assert_eq!(
            derive_slots(class, "X-Wing", 2),
            vec![
                code(CardType::Astromech),
                code(CardType::Modification),
                code(CardType::Talent),
                code(CardType::Talent),
                code(CardType::Crew),
                code(CardType::Crew),
                SlotCode::Any,
            ]
        );
    }

    #[test]
    fn rank_increase_keeps_existing_keys_stable() {
        let catalog = fixtures::catalog();
        let class = catalog.find_class("Ace").unwrap();
        let low = slot_inventory(class, "X-Wing", 1);
        let high = slot_inventory(class, "X-Wing", 3);
        for slot in &low {
            assert!(high.contains(slot), "{} vanished after rank up", slot.key);
        }
    }

    #[test]
    fn inventory_keys_locked_slots_by_ship() {
        let catalog = fixtures::catalog();
        let class = catalog.find_class("Ace").unwrap();
        let inventory = slot_inventory(class, "Y-Wing", 1);
        let keys: Vec<String> = inventory.iter().map(|slot| slot.key.to_string()).collect();
        assert_eq!(
            keys,
            vec!["fixed-0", "fixed-1", "fixed-2", "fixed-3", "optional-0", "Y-Wing-0"]
        );
        assert_eq!(inventory[1].code, SlotCode::Any);
        assert_eq!(inventory[5].code, code(CardType::Gunner));
    }

    #[test]
    fn unknown_ship_falls_back_to_rank_slots() {
        let catalog = fixtures::catalog();
        let class = catalog.find_class("Ace").unwrap();
        assert_eq!(
            derive_slots(class, "Millennium Falcon", 1),
            vec![code(CardType::Talent), code(CardType::Crew)]
        );
    }

    #[test]
    fn free_slots_are_keyed_by_card() {
        let catalog = fixtures::catalog();
        let card = catalog.find_card_by_id("r2-d2").unwrap();
        let slots = free_slots_for(card);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].key, SlotKey::Free("r2-d2".into(), 0));
        assert_eq!(slots[0].code, code(CardType::Modification));
    }
}
