//! Single-character slot codes and the card types they stand for.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

/// Code of the wildcard slot that accepts every card type.
pub const WILDCARD_CODE: char = ')';

/// Card types that can be fitted into a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    /// Pilot ability card.
    Ace,
    /// Astromech droid.
    Astromech,
    /// Cannon.
    Cannon,
    /// Ship configuration.
    Configuration,
    /// Crew member.
    Crew,
    /// Force power.
    Force,
    /// Gunner.
    Gunner,
    /// Illicit equipment.
    Illicit,
    /// Missile.
    Missile,
    /// Ship modification.
    Modification,
    /// Bombs and mines.
    Payload,
    /// Force-sensitive pilot ability.
    Sensitive,
    /// Sensor.
    Sensor,
    /// Tactical relay.
    Tactical,
    /// Pilot talent.
    Talent,
    /// Tech.
    Tech,
    /// Ship title.
    Title,
    /// Torpedo.
    Torpedo,
    /// Turret.
    Turret,
}

const CODE_TABLE: [(CardType, char, &str); 19] = [
    (CardType::Ace, 'x', "ace"),
    (CardType::Astromech, 'A', "astromech"),
    (CardType::Cannon, 'C', "cannon"),
    (CardType::Configuration, 'n', "configuration"),
    (CardType::Crew, 'W', "crew"),
    (CardType::Force, 'F', "force"),
    (CardType::Gunner, 'Y', "gunner"),
    (CardType::Illicit, 'I', "illicit"),
    (CardType::Missile, 'M', "missile"),
    (CardType::Modification, 'm', "modification"),
    (CardType::Payload, 'B', "payload"),
    (CardType::Sensitive, 'z', "sensitive"),
    (CardType::Sensor, 'S', "sensor"),
    (CardType::Tactical, 'T', "tactical"),
    (CardType::Talent, 'E', "talent"),
    (CardType::Tech, 'X', "tech"),
    (CardType::Title, 't', "title"),
    (CardType::Torpedo, 'P', "torpedo"),
    (CardType::Turret, 'U', "turret"),
];

impl CardType {
    /// Every card type in code-table order.
    pub fn all() -> impl Iterator<Item = CardType> {
        CODE_TABLE.iter().map(|(kind, _, _)| *kind)
    }

    /// Lower-case type name as used by card data.
    pub fn name(self) -> &'static str {
        CODE_TABLE
            .iter()
            .find(|(kind, _, _)| *kind == self)
            .map(|(_, _, name)| *name)
            .unwrap_or("")
    }

    /// Single-character slot code.
    pub fn code(self) -> char {
        CODE_TABLE
            .iter()
            .find(|(kind, _, _)| *kind == self)
            .map(|(_, code, _)| *code)
            .unwrap_or(WILDCARD_CODE)
    }

    /// Parse a type name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        let needle = name.trim();
        CODE_TABLE
            .iter()
            .find(|(_, _, known)| known.eq_ignore_ascii_case(needle))
            .map(|(kind, _, _)| *kind)
    }

    /// Look up the card type behind a slot code.
    pub fn from_code(code: char) -> Option<Self> {
        CODE_TABLE
            .iter()
            .find(|(_, known, _)| *known == code)
            .map(|(kind, _, _)| *kind)
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Map a slot code to its type name. The wildcard has no single name.
pub fn code_to_name(code: char) -> Option<&'static str> {
    CardType::from_code(code).map(CardType::name)
}

/// Map a type name (or `any`) to its slot code.
pub fn name_to_code(name: &str) -> Option<char> {
    if name.trim().eq_ignore_ascii_case("any") {
        return Some(WILDCARD_CODE);
    }
    CardType::from_name(name).map(CardType::code)
}

/// Accepted card type of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotCode {
    /// Slot that only takes one card type.
    Type(CardType),
    /// Wildcard slot.
    Any,
}

impl SlotCode {
    /// Parse a single slot code character.
    pub fn from_char(code: char) -> Option<Self> {
        if code == WILDCARD_CODE {
            return Some(SlotCode::Any);
        }
        CardType::from_code(code).map(SlotCode::Type)
    }

    /// Character representation.
    pub fn as_char(self) -> char {
        match self {
            SlotCode::Type(kind) => kind.code(),
            SlotCode::Any => WILDCARD_CODE,
        }
    }

    /// Whether a card of `kind` may occupy a slot with this code.
    pub fn accepts(self, kind: CardType) -> bool {
        match self {
            SlotCode::Type(own) => own == kind,
            SlotCode::Any => true,
        }
    }

    /// Whether this is the wildcard code.
    pub fn is_wildcard(self) -> bool {
        matches!(self, SlotCode::Any)
    }
}

impl fmt::Display for SlotCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotCode::Type(kind) => write!(f, "{} ({})", kind.code(), kind.name()),
            SlotCode::Any => write!(f, "{WILDCARD_CODE} (any)"),
        }
    }
}

impl Serialize for SlotCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_char(self.as_char())
    }
}

impl<'de> Deserialize<'de> for SlotCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(code), None) => SlotCode::from_char(code)
                .ok_or_else(|| de::Error::custom(format!("unknown slot code '{raw}'"))),
            _ => Err(de::Error::custom(format!(
                "slot code must be a single character, got '{raw}'"
            ))),
        }
    }
}

/// Parse a run of slot codes such as `"AmE)"`, skipping unknown characters.
pub fn parse_codes(codes: &str) -> Vec<SlotCode> {
    codes
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .filter_map(|ch| {
            let parsed = SlotCode::from_char(ch);
            if parsed.is_none() {
                warn!("ignoring unknown slot code '{ch}' in \"{codes}\"");
            }
            parsed
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_names_round_trip_for_every_type() {
        for kind in CardType::all() {
            let code = name_to_code(kind.name()).expect("type has a code");
            assert_eq!(code_to_name(code), Some(kind.name()));
        }
        assert_eq!(CardType::all().count(), 19);
    }

    #[test]
    fn wildcard_has_code_but_no_name() {
        assert_eq!(name_to_code("Any"), Some(WILDCARD_CODE));
        assert_eq!(code_to_name(WILDCARD_CODE), None);
        assert_eq!(SlotCode::from_char(')'), Some(SlotCode::Any));
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(CardType::from_name(" Talent "), Some(CardType::Talent));
        assert_eq!(name_to_code("ASTROMECH"), Some('A'));
        assert_eq!(name_to_code("hyperdrive"), None);
    }

    #[test]
    fn wildcard_accepts_everything_typed_slot_only_its_type() {
        assert!(SlotCode::Any.accepts(CardType::Crew));
        assert!(SlotCode::Type(CardType::Crew).accepts(CardType::Crew));
        assert!(!SlotCode::Type(CardType::Crew).accepts(CardType::Gunner));
    }

    #[test]
    fn parse_codes_skips_unknown_characters() {
        let parsed = parse_codes("Am ?)");
        assert_eq!(
            parsed,
            vec![
                SlotCode::Type(CardType::Astromech),
                SlotCode::Type(CardType::Modification),
                SlotCode::Any,
            ]
        );
    }

    #[test]
    fn slot_code_serializes_as_single_character() {
        let json = serde_json::to_string(&SlotCode::Type(CardType::Title)).unwrap();
        assert_eq!(json, "\"t\"");
        let back: SlotCode = serde_json::from_str("\")\"").unwrap();
        assert_eq!(back, SlotCode::Any);
        assert!(serde_json::from_str::<SlotCode>("\"tt\"").is_err());
    }
}
