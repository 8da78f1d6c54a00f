use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::codec::CardType;

use super::{Slot, SlotKey};

/// Unoccupied slot keys able to hold each required type. Wildcard slots are
/// registered under every type the card needs and nowhere else.
fn candidates(
    requirements: &[CardType],
    inventory: &[Slot],
    occupied: &BTreeMap<SlotKey, String>,
) -> HashMap<CardType, Vec<SlotKey>> {
    let mut by_type: HashMap<CardType, Vec<SlotKey>> = requirements
        .iter()
        .map(|kind| (*kind, Vec::new()))
        .collect();

    for slot in inventory.iter().filter(|slot| !occupied.contains_key(&slot.key)) {
        for (kind, keys) in by_type.iter_mut() {
            if slot.code.accepts(*kind) && !keys.contains(&slot.key) {
                keys.push(slot.key.clone());
            }
        }
    }

    // HashMap iteration order is arbitrary; restore inventory order.
    let position: HashMap<&SlotKey, usize> = inventory
        .iter()
        .enumerate()
        .map(|(index, slot)| (&slot.key, index))
        .collect();
    for keys in by_type.values_mut() {
        keys.sort_by_key(|key| position.get(key).copied().unwrap_or(usize::MAX));
    }
    by_type
}

struct Search<'a> {
    requirements: &'a [CardType],
    candidates: HashMap<CardType, Vec<SlotKey>>,
    target: Option<&'a SlotKey>,
    limit: Option<usize>,
    seen: BTreeSet<Vec<SlotKey>>,
    found: Vec<Vec<SlotKey>>,
}

impl Search<'_> {
    fn done(&self) -> bool {
        self.limit.is_some_and(|limit| self.found.len() >= limit)
    }

    fn run(&mut self, chosen: &mut Vec<SlotKey>) {
        if self.done() {
            return;
        }
        let depth = chosen.len();
        if depth == self.requirements.len() {
            if self.target.is_some_and(|target| !chosen.contains(target)) {
                return;
            }
            let mut set = chosen.clone();
            set.sort();
            if self.seen.insert(set) {
                self.found.push(chosen.clone());
            }
            return;
        }

        let kind = self.requirements[depth];
        let options = self.candidates.get(&kind).cloned().unwrap_or_default();
        for key in options {
            if chosen.contains(&key) {
                continue;
            }
            chosen.push(key);
            self.run(chosen);
            chosen.pop();
            if self.done() {
                return;
            }
        }
    }
}

fn search(
    requirements: &[CardType],
    inventory: &[Slot],
    occupied: &BTreeMap<SlotKey, String>,
    target: Option<&SlotKey>,
    limit: Option<usize>,
) -> Vec<Vec<SlotKey>> {
    if requirements.is_empty() {
        return Vec::new();
    }

    if let Some(target) = target {
        let Some(slot) = inventory.iter().find(|slot| &slot.key == target) else {
            return Vec::new();
        };
        if !requirements.iter().any(|kind| slot.code.accepts(*kind)) {
            return Vec::new();
        }
    }

    let candidates = candidates(requirements, inventory, occupied);

    if let [kind] = requirements {
        let keys = candidates.get(kind).cloned().unwrap_or_default();
        return keys
            .into_iter()
            .filter(|key| target.map_or(true, |target| key == target))
            .take(limit.unwrap_or(usize::MAX))
            .map(|key| vec![key])
            .collect();
    }

    let mut search = Search {
        requirements,
        candidates,
        target,
        limit,
        seen: BTreeSet::new(),
        found: Vec::new(),
    };
    search.run(&mut Vec::with_capacity(requirements.len()));
    search.found
}

/// Every distinct assignment of `requirements` to unoccupied, compatible
/// slots. Each result lists one key per requirement, in requirement order;
/// results covering the same set of slots are reported once.
///
/// With `target`, only assignments that use that slot are returned.
pub fn slot_combinations(
    requirements: &[CardType],
    inventory: &[Slot],
    occupied: &BTreeMap<SlotKey, String>,
    target: Option<&SlotKey>,
) -> Vec<Vec<SlotKey>> {
    search(requirements, inventory, occupied, target, None)
}

/// First assignment in inventory order, if any exists.
pub fn first_combination(
    requirements: &[CardType],
    inventory: &[Slot],
    occupied: &BTreeMap<SlotKey, String>,
    target: Option<&SlotKey>,
) -> Option<Vec<SlotKey>> {
    search(requirements, inventory, occupied, target, Some(1))
        .into_iter()
        .next()
}

/// Order caller-chosen `keys` so that each serves a compatible requirement.
/// Returns `None` unless the keys are distinct, unoccupied, one per
/// requirement, and admit a full matching.
pub fn match_keys(
    requirements: &[CardType],
    inventory: &[Slot],
    occupied: &BTreeMap<SlotKey, String>,
    keys: &[SlotKey],
) -> Option<Vec<SlotKey>> {
    let distinct: BTreeSet<&SlotKey> = keys.iter().collect();
    if keys.len() != requirements.len() || distinct.len() != keys.len() {
        return None;
    }
    if keys.iter().any(|key| occupied.contains_key(key)) {
        return None;
    }
    let restricted: Vec<Slot> = inventory
        .iter()
        .filter(|slot| distinct.contains(&slot.key))
        .cloned()
        .collect();
    if restricted.len() != keys.len() {
        return None;
    }
    first_combination(requirements, &restricted, occupied, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SlotCode;
    use proptest::prelude::*;

    fn slots(codes: &[SlotCode]) -> Vec<Slot> {
        codes
            .iter()
            .enumerate()
            .map(|(index, code)| Slot::new(SlotKey::Fixed(index), *code))
            .collect()
    }

    const CREW: SlotCode = SlotCode::Type(CardType::Crew);
    const TALENT: SlotCode = SlotCode::Type(CardType::Talent);
    const GUNNER: SlotCode = SlotCode::Type(CardType::Gunner);

    fn choose(n: usize, k: usize) -> usize {
        (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
    }

    #[test]
    fn three_crew_slots_give_three_pairs() {
        let inventory = slots(&[CREW, CREW, CREW]);
        let combos = slot_combinations(
            &[CardType::Crew, CardType::Crew],
            &inventory,
            &BTreeMap::new(),
            None,
        );
        assert_eq!(combos.len(), 3);
        let sets: BTreeSet<BTreeSet<SlotKey>> = combos
            .iter()
            .map(|combo| combo.iter().cloned().collect())
            .collect();
        assert_eq!(sets.len(), 3);
        assert!(combos.iter().all(|combo| combo[0] != combo[1]));
    }

    #[test]
    fn occupied_slots_are_skipped() {
        let inventory = slots(&[TALENT, TALENT]);
        let occupied = BTreeMap::from([(SlotKey::Fixed(0), "someone".to_string())]);
        assert!(slot_combinations(
            &[CardType::Talent, CardType::Talent],
            &inventory,
            &occupied,
            None
        )
        .is_empty());
    }

    #[test]
    fn wildcard_serves_any_required_type() {
        let inventory = slots(&[CREW, SlotCode::Any, GUNNER]);
        let combos = slot_combinations(
            &[CardType::Crew, CardType::Gunner],
            &inventory,
            &BTreeMap::new(),
            None,
        );
        // crew+gunner, crew+any, any+gunner
        assert_eq!(combos.len(), 3);
        for combo in &combos {
            assert_ne!(combo[0], SlotKey::Fixed(2));
            assert_ne!(combo[1], SlotKey::Fixed(0));
        }
    }

    #[test]
    fn mixed_types_respect_requirement_order() {
        let inventory = slots(&[GUNNER, CREW]);
        let combos = slot_combinations(
            &[CardType::Crew, CardType::Gunner],
            &inventory,
            &BTreeMap::new(),
            None,
        );
        assert_eq!(combos, vec![vec![SlotKey::Fixed(1), SlotKey::Fixed(0)]]);
    }

    #[test]
    fn target_slot_restricts_results() {
        let inventory = slots(&[CREW, CREW, CREW, TALENT]);
        let reqs = [CardType::Crew, CardType::Crew];
        let combos = slot_combinations(&reqs, &inventory, &BTreeMap::new(), Some(&SlotKey::Fixed(2)));
        assert_eq!(combos.len(), 2);
        assert!(combos.iter().all(|combo| combo.contains(&SlotKey::Fixed(2))));

        let wrong_type =
            slot_combinations(&reqs, &inventory, &BTreeMap::new(), Some(&SlotKey::Fixed(3)));
        assert!(wrong_type.is_empty());

        let outside =
            slot_combinations(&reqs, &inventory, &BTreeMap::new(), Some(&SlotKey::Optional(0)));
        assert!(outside.is_empty());
    }

    #[test]
    fn empty_requirements_match_nothing() {
        let inventory = slots(&[CREW]);
        assert!(slot_combinations(&[], &inventory, &BTreeMap::new(), None).is_empty());
        assert!(first_combination(&[], &inventory, &BTreeMap::new(), None).is_none());
    }

    #[test]
    fn single_requirement_lists_each_slot() {
        let inventory = slots(&[CREW, TALENT, SlotCode::Any]);
        let combos = slot_combinations(&[CardType::Talent], &inventory, &BTreeMap::new(), None);
        assert_eq!(
            combos,
            vec![vec![SlotKey::Fixed(1)], vec![SlotKey::Fixed(2)]]
        );
    }

    #[test]
    fn backtracking_finds_matching_greedy_would_miss() {
        // Greedy would put the crew requirement in the wildcard and strand
        // the talent.
        let inventory = slots(&[SlotCode::Any, CREW]);
        let found = first_combination(
            &[CardType::Crew, CardType::Talent],
            &inventory,
            &BTreeMap::new(),
            None,
        );
        assert_eq!(found, Some(vec![SlotKey::Fixed(1), SlotKey::Fixed(0)]));
    }

    #[test]
    fn match_keys_validates_caller_choice() {
        let inventory = slots(&[CREW, GUNNER, TALENT]);
        let reqs = [CardType::Gunner, CardType::Crew];
        let occupied = BTreeMap::new();

        let ordered = match_keys(&reqs, &inventory, &occupied, &[SlotKey::Fixed(0), SlotKey::Fixed(1)]);
        assert_eq!(ordered, Some(vec![SlotKey::Fixed(1), SlotKey::Fixed(0)]));

        assert!(match_keys(&reqs, &inventory, &occupied, &[SlotKey::Fixed(0)]).is_none());
        assert!(match_keys(&reqs, &inventory, &occupied, &[SlotKey::Fixed(0), SlotKey::Fixed(0)]).is_none());
        assert!(match_keys(&reqs, &inventory, &occupied, &[SlotKey::Fixed(0), SlotKey::Fixed(2)]).is_none());

        let taken = BTreeMap::from([(SlotKey::Fixed(1), "other".to_string())]);
        assert!(match_keys(&reqs, &inventory, &taken, &[SlotKey::Fixed(0), SlotKey::Fixed(1)]).is_none());
    }

    proptest! {
        #[test]
        fn identical_requirements_yield_n_choose_k(n in 1usize..9, k in 1usize..5) {
            prop_assume!(k <= n);
            let inventory = slots(&vec![CREW; n]);
            let reqs = vec![CardType::Crew; k];
            let combos = slot_combinations(&reqs, &inventory, &BTreeMap::new(), None);
            prop_assert_eq!(combos.len(), choose(n, k));
            for combo in &combos {
                let set: BTreeSet<_> = combo.iter().collect();
                prop_assert_eq!(set.len(), k);
            }
        }

        #[test]
        fn first_combination_agrees_with_enumeration(
            codes in proptest::collection::vec(0u8..4, 0..7),
            reqs in proptest::collection::vec(0u8..3, 1..4),
        ) {
            let palette = [CREW, TALENT, GUNNER, SlotCode::Any];
            let kinds = [CardType::Crew, CardType::Talent, CardType::Gunner];
            let inventory = slots(&codes.iter().map(|c| palette[*c as usize]).collect::<Vec<_>>());
            let reqs: Vec<CardType> = reqs.iter().map(|r| kinds[*r as usize]).collect();
            let all = slot_combinations(&reqs, &inventory, &BTreeMap::new(), None);
            let first = first_combination(&reqs, &inventory, &BTreeMap::new(), None);
            prop_assert_eq!(first.is_some(), !all.is_empty());
            if let Some(first) = first {
                prop_assert_eq!(Some(&first), all.first());
            }
        }
    }
}
