//! Small hand-built catalog and roster shared by unit tests.

use crate::{
    catalog::Catalog,
    faction::used_faction_slots,
    models::{Card, ClassDef, OneOrMany, RankDef, ShipDef},
    roster::{Pilot, Roster},
    slots::slot_inventory,
};

pub fn card(id: &str, kind: &str, faction: Option<&str>) -> Card {
    Card {
        id: id.to_string(),
        name: id.to_string(),
        kind: Some(OneOrMany::One(kind.to_string())),
        faction: faction.map(|f| OneOrMany::One(f.to_string())),
        initiative: None,
        unique: false,
        upgradeable: false,
        energy: None,
        recurring_energy: None,
        free_slots: Vec::new(),
        custom: false,
        cost: None,
        description: None,
        image: None,
    }
}

pub fn multi(id: &str, kinds: &[&str]) -> Card {
    Card {
        kind: Some(OneOrMany::Many(kinds.iter().map(|k| k.to_string()).collect())),
        ..card(id, kinds[0], None)
    }
}

fn ace_class() -> ClassDef {
    ClassDef {
        name: "Ace".into(),
        ships: vec![
            ShipDef {
                name: "X-Wing".into(),
                slots: "Am".into(),
                locked: String::new(),
                wildcards: 0,
            },
            ShipDef {
                name: "Y-Wing".into(),
                slots: "A)B".into(),
                locked: "Y".into(),
                wildcards: 0,
            },
        ],
        ranks: vec![
            RankDef {
                rank: 1,
                slots: "E".into(),
                optional: vec!["W".into()],
                factions: String::new(),
                initiative: Some(2),
            },
            RankDef {
                rank: 2,
                slots: "E".into(),
                optional: vec!["W)".into()],
                factions: "RE".into(),
                initiative: Some(3),
            },
            RankDef {
                rank: 3,
                slots: "W".into(),
                optional: Vec::new(),
                factions: "R".into(),
                initiative: Some(4),
            },
        ],
    }
}

/// Catalog with one class and a spread of cards exercising each rule.
pub fn catalog() -> Catalog {
    let cards = vec![
        Card {
            unique: true,
            free_slots: vec!["m".into()],
            cost: Some(4),
            ..card("r2-d2", "Astromech", Some("Rebel"))
        },
        Card {
            faction: Some(OneOrMany::Many(vec!["Rebel".into(), "Empire".into()])),
            cost: Some(3),
            ..card("dual-loyalty", "Crew", None)
        },
        Card {
            cost: Some(1),
            ..card("neutral-hull", "Modification", Some("Neutral"))
        },
        Card {
            cost: Some(2),
            ..card("rebel-crew", "Crew", Some("Rebel"))
        },
        Card {
            unique: true,
            cost: Some(5),
            ..card("imperial-ace", "Talent", Some("Galactic Empire"))
        },
        multi("double-down", &["Talent", "Talent"]),
        multi("twin-crew", &["Crew", "Crew"]),
        multi("gun-team", &["Crew", "Gunner"]),
        Card {
            initiative: Some(4),
            ..card("veteran-instincts", "Talent", None)
        },
        Card {
            upgradeable: true,
            energy: Some(2),
            ..card("shield-upgrade", "Modification", None)
        },
        Card {
            custom: true,
            ..card("custom-gizmo", "Modification", None)
        },
        Card {
            free_slots: vec!["W".into()],
            ..card("cargo-hold", "Modification", None)
        },
    ];
    Catalog::new(cards, vec![ace_class()])
}

/// Pilot "1" with derived slots and a consistent ledger.
pub fn pilot(catalog: &Catalog, class: &str, ship: &str, rank: u32) -> Pilot {
    let mut pilot = Pilot::new("1".into(), "Wedge".into(), class.into(), ship.into());
    pilot.rank = rank;
    if let Some(class) = catalog.find_class(class) {
        pilot.slots = slot_inventory(class, ship, rank);
    }
    pilot.used_faction_slots = used_faction_slots(&pilot, catalog);
    pilot
}

/// Two Ace pilots: "1" Wedge (rank 1, X-Wing and Y-Wing) active, and
/// "2" Luke (rank 2, X-Wing).
pub fn roster(catalog: &Catalog) -> Roster {
    let mut roster = Roster::default();
    let mut wedge = pilot(catalog, "Ace", "X-Wing", 1);
    wedge.ships.push("Y-Wing".into());
    let mut luke = pilot(catalog, "Ace", "X-Wing", 2);
    luke.id = "2".into();
    luke.name = "Luke".into();
    roster.pilots = vec![wedge, luke];
    roster.current_pilot_id = "1".into();
    roster
}
