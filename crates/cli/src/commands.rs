//! Command-line surface and dispatch onto the roster.

use std::{path::PathBuf, str::FromStr};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use loadout_core::{
    roster::query::{self, allowed_factions, card_combinations, faction_headroom},
    CardFilter, CardType, Catalog, Faction, Pilot, Roster, SlotKey,
};

#[derive(Debug, Parser)]
#[command(name = "loadout")]
#[command(about = "Manage pilot loadouts: decks, slots and faction quotas", long_about = None)]
pub struct Cli {
    /// Catalog directory holding classes.json and cards/
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Directory of the pilot store
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Pilot to act on instead of the active one
    #[arg(long, global = true)]
    pub pilot: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, PartialEq, Subcommand)]
pub enum Command {
    /// List pilots
    Pilots,
    /// Show the pilot's slots and faction headroom
    Show,
    /// List cards the pilot can see
    Cards {
        /// Only cards of this type
        #[arg(value_parser = parse_card_type)]
        kind: Option<CardType>,
    },
    /// Create a pilot and make it active
    Create { name: String, class: String, ship: String },
    /// Remove a pilot
    Delete { id: String },
    /// Make a pilot active
    Switch { id: String },
    /// Add a card to the deck
    Own { card: String },
    /// Remove a card from the deck
    Drop { card: String },
    /// Stage a card
    Select { card: String },
    /// Unstage a card
    Unselect { card: String },
    /// Equip a card into a slot
    Equip {
        #[arg(value_parser = SlotKey::from_str)]
        slot: SlotKey,
        card: String,
        /// Faction to record for cards that list several
        #[arg(long = "as", value_parser = parse_faction)]
        faction: Option<Faction>,
    },
    /// Equip a multi-slot card, into the given slots or the first that fit
    EquipMulti {
        card: String,
        #[arg(value_parser = SlotKey::from_str)]
        slots: Vec<SlotKey>,
        /// Faction to record for cards that list several
        #[arg(long = "as", value_parser = parse_faction)]
        faction: Option<Faction>,
    },
    /// Clear a slot
    Unequip {
        #[arg(value_parser = SlotKey::from_str)]
        slot: SlotKey,
    },
    /// List slot combinations for a card
    Combos {
        card: String,
        /// Slot every combination must use
        #[arg(value_parser = SlotKey::from_str)]
        target: Option<SlotKey>,
    },
    /// Raise a card's upgrade level
    Upgrade { card: String },
    /// Lower a card's upgrade level
    Downgrade { card: String },
    /// Fly another owned ship
    Ship { ship: String },
    /// Add a ship to the hangar
    AddShip { ship: String },
    /// Set the pilot's rank
    Rank { rank: u32 },
    /// Award experience
    Xp { amount: u32 },
    /// Adjust the kill count for a ship icon
    Kill {
        icon: String,
        #[arg(allow_negative_numbers = true)]
        delta: i32,
    },
}

impl Command {
    /// Whether the command can change the roster.
    pub fn mutates(&self) -> bool {
        !matches!(
            self,
            Command::Pilots | Command::Show | Command::Cards { .. } | Command::Combos { .. }
        )
    }
}

fn parse_faction(raw: &str) -> Result<Faction, String> {
    Faction::normalize(raw).ok_or_else(|| format!("unknown faction '{raw}'"))
}

fn parse_card_type(raw: &str) -> Result<CardType, String> {
    CardType::from_name(raw).ok_or_else(|| format!("unknown card type '{raw}'"))
}

/// Apply `command` for `pilot_id`. Returns the line to print.
pub fn execute(
    roster: &mut Roster,
    catalog: &Catalog,
    pilot_id: &str,
    command: Command,
) -> Result<String> {
    let outcome = |applied: bool| (if applied { "ok" } else { "rejected" }).to_string();

    let output = match command {
        Command::Pilots => list_pilots(roster),
        Command::Show => {
            let pilot = roster
                .pilot(pilot_id)
                .ok_or_else(|| anyhow!("no pilot with id {pilot_id}"))?;
            describe_pilot(catalog, pilot)?
        }
        Command::Cards { kind } => {
            let pilot = roster.pilot(pilot_id);
            let filter = CardFilter::new(catalog, roster.settings, pilot);
            let cards = match (kind, pilot) {
                (Some(kind), _) => filter.by_type(kind),
                (None, Some(pilot)) => filter.by_allowed_factions(&allowed_factions(catalog, pilot)),
                (None, None) => filter.all(),
            };
            cards
                .iter()
                .map(|card| format!("{:>3}  {}  ({})", card.sort_cost(), card.name, card.id))
                .collect::<Vec<_>>()
                .join("\n")
        }
        Command::Create { name, class, ship } => {
            let id = roster.create_pilot(catalog, &name, &class, &ship)?;
            format!("created pilot {id}")
        }
        Command::Delete { id } => outcome(roster.delete_pilot(&id)),
        Command::Switch { id } => outcome(roster.switch_pilot(catalog, &id)),
        Command::Own { card } => outcome(roster.add_card_to_deck(catalog, pilot_id, &card)),
        Command::Drop { card } => outcome(roster.remove_card_from_deck(catalog, pilot_id, &card)),
        Command::Select { card } => outcome(roster.select_card(catalog, pilot_id, &card)),
        Command::Unselect { card } => {
            roster.unselect_card(catalog, pilot_id, &card);
            outcome(true)
        }
        Command::Equip {
            slot,
            card,
            faction,
        } => outcome(roster.assign_card_to_slot_as(catalog, pilot_id, &slot, &card, faction)),
        Command::EquipMulti {
            card,
            slots,
            faction,
        } => outcome(if slots.is_empty() {
            roster.assign_multi_slot_card(catalog, pilot_id, &card, faction)
        } else {
            roster.assign_multi_slot_card_to_slots(catalog, pilot_id, &card, &slots, faction)
        }),
        Command::Unequip { slot } => outcome(roster.remove_card_from_slot(catalog, pilot_id, &slot)),
        Command::Combos { card, target } => {
            let pilot = roster
                .pilot(pilot_id)
                .ok_or_else(|| anyhow!("no pilot with id {pilot_id}"))?;
            card_combinations(catalog, pilot, &card, target.as_ref())
                .iter()
                .map(|keys| {
                    keys.iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(" + ")
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        Command::Upgrade { card } => outcome(roster.upgrade_card(catalog, pilot_id, &card)),
        Command::Downgrade { card } => outcome(roster.downgrade_card(pilot_id, &card)),
        Command::Ship { ship } => outcome(roster.change_selected_ship(catalog, pilot_id, &ship)),
        Command::AddShip { ship } => outcome(roster.add_ship(catalog, pilot_id, &ship)),
        Command::Rank { rank } => outcome(roster.set_rank(catalog, pilot_id, rank)),
        Command::Xp { amount } => outcome(roster.add_xp(pilot_id, amount)),
        Command::Kill { icon, delta } => outcome(roster.record_kill(pilot_id, &icon, delta)),
    };
    Ok(output)
}

fn list_pilots(roster: &Roster) -> String {
    roster
        .pilots()
        .iter()
        .map(|pilot| {
            let marker = if pilot.id() == roster.current_pilot_id() {
                '*'
            } else {
                ' '
            };
            format!(
                "{marker} {:>3}  {}  {} rank {}  {}",
                pilot.id(),
                pilot.name(),
                pilot.class(),
                pilot.rank(),
                pilot.selected_ship()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn describe_pilot(catalog: &Catalog, pilot: &Pilot) -> Result<String> {
    let mut lines = vec![format!(
        "{} ({}) {} rank {} initiative {} xp {}  flying {}",
        pilot.name(),
        pilot.id(),
        pilot.class(),
        pilot.rank(),
        query::pilot_initiative(catalog, pilot),
        pilot.xp(),
        pilot.selected_ship()
    )];
    for slot in pilot.slots() {
        let card = pilot
            .slot_cards()
            .get(&slot.key)
            .map(String::as_str)
            .unwrap_or("-");
        lines.push(format!("  {:<20} {}  {card}", slot.key.to_string(), slot.code));
    }
    let headroom = faction_headroom(catalog, pilot);
    if !headroom.is_empty() {
        lines.push(format!(
            "  faction headroom: {}",
            serde_json::to_string(&headroom).context("failed to render faction headroom")?
        ));
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use loadout_core::{Card, ClassDef};
    use serde_json::json;

    fn parse(line: &str) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("loadout").chain(line.split_whitespace()))
    }

    fn catalog() -> Catalog {
        let cards: Vec<Card> = serde_json::from_value(json!([
            {"id": "r2-d2", "name": "R2-D2", "type": "Astromech", "faction": "Rebel",
             "unique": true, "freeSlots": ["m"], "cost": 4},
            {"id": "twin-crew", "name": "Twin Crew", "type": ["Crew", "Crew"]}
        ]))
        .unwrap();
        let classes: Vec<ClassDef> = serde_json::from_value(json!([
            {"name": "Ace",
             "ships": [{"name": "X-Wing", "slots": "AW"}],
             "ranks": [{"rank": 1, "slots": "E", "optional": ["W)"], "factions": "R",
                        "initiative": 2}]}
        ]))
        .unwrap();
        Catalog::new(cards, classes)
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_options_go_anywhere() -> Result<()> {
        let cli = parse("--pilot 2 equip fixed-0 r2-d2 --data /tmp/cards")?;
        assert_eq!(cli.pilot.as_deref(), Some("2"));
        assert_eq!(cli.data, Some(PathBuf::from("/tmp/cards")));
        assert_eq!(cli.store, None);
        assert_eq!(
            cli.command,
            Command::Equip {
                slot: SlotKey::Fixed(0),
                card: "r2-d2".into(),
                faction: None,
            }
        );
        Ok(())
    }

    #[test]
    fn equip_accepts_an_explicit_faction() -> Result<()> {
        let command = parse("equip optional-1 dual-loyalty --as empire")?.command;
        assert_eq!(
            command,
            Command::Equip {
                slot: SlotKey::Optional(1),
                card: "dual-loyalty".into(),
                faction: Some(Faction::Empire),
            }
        );
        assert!(command.mutates());
        Ok(())
    }

    #[test]
    fn equip_multi_parses_free_slot_keys() -> Result<()> {
        assert_eq!(
            parse("equip-multi gun-team optional-0 free-r2-d2-0")?.command,
            Command::EquipMulti {
                card: "gun-team".into(),
                slots: vec![SlotKey::Optional(0), SlotKey::Free("r2-d2".into(), 0)],
                faction: None,
            }
        );
        Ok(())
    }

    #[test]
    fn bad_input_is_reported() -> Result<()> {
        assert!(parse("").is_err());
        assert!(parse("rank high").is_err());
        assert!(parse("equip fixed-0").is_err());
        assert!(parse("equip slot-zero r2-d2").is_err());
        assert!(parse("equip fixed-0 r2-d2 --as hutts").is_err());
        assert!(parse("cards starship").is_err());
        assert!(parse("teleport").is_err());
        assert!(!parse("combos twin-crew")?.command.mutates());
        assert_eq!(
            parse("cards crew")?.command,
            Command::Cards {
                kind: Some(CardType::Crew)
            }
        );
        Ok(())
    }

    #[test]
    fn kill_takes_signed_deltas() -> Result<()> {
        assert_eq!(
            parse("kill tie -1")?.command,
            Command::Kill {
                icon: "tie".into(),
                delta: -1
            }
        );
        Ok(())
    }

    #[test]
    fn equip_and_combos_run_against_a_roster() -> Result<()> {
        let catalog = catalog();
        let mut roster = Roster::default();
        let created = execute(
            &mut roster,
            &catalog,
            "1",
            parse("create Wedge Ace X-Wing")?.command,
        )?;
        assert_eq!(created, "created pilot 1");
        for card in ["r2-d2", "twin-crew"] {
            let owned = execute(&mut roster, &catalog, "1", parse(&format!("own {card}"))?.command)?;
            assert_eq!(owned, "ok");
        }

        let equipped = execute(&mut roster, &catalog, "1", parse("equip fixed-0 r2-d2")?.command)?;
        assert_eq!(equipped, "ok");
        let pilot = roster.pilot("1").unwrap();
        assert_eq!(pilot.slot_cards().get(&SlotKey::Fixed(0)).map(String::as_str), Some("r2-d2"));
        assert!(pilot.slot(&SlotKey::Free("r2-d2".into(), 0)).is_some());

        let combos = execute(&mut roster, &catalog, "1", parse("combos twin-crew")?.command)?;
        assert_eq!(combos.lines().count(), 3);
        assert!(combos.lines().all(|line| line.split(" + ").count() == 2));

        let targeted = execute(
            &mut roster,
            &catalog,
            "1",
            parse("combos twin-crew optional-1")?.command,
        )?;
        assert_eq!(targeted.lines().count(), 2);

        let talent_slot = execute(&mut roster, &catalog, "1", parse("equip fixed-2 twin-crew")?.command)?;
        assert_eq!(talent_slot, "rejected");
        assert!(!roster.pilot("1").unwrap().is_equipped("twin-crew"));
        Ok(())
    }
}
