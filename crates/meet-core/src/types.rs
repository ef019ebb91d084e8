//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A relay entry must list between one and four legs.
    #[error("relay entry in lane {lane} has {legs} legs, expected 1 to 4")]
    RelayLegs { lane: u8, legs: usize },

    /// Two entries in the same heat claim the same lane.
    #[error("heat {heat} has more than one entry in lane {lane}")]
    DuplicateLane { heat: String, lane: u8 },

    /// Two siblings share an identifier.
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    /// Invalid medal value.
    #[error("invalid medal: {value}")]
    InvalidMedal { value: String },

    /// Invalid provenance value.
    #[error("invalid result provenance: {value}")]
    InvalidProvenance { value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated athlete identifier.
    ///
    /// Besides directory identities this also covers two synthetic forms:
    /// relay teams (`relay:<leg>+<leg>...`) and unresolved import names
    /// (`unresolved-<uuid>`).
    AthleteId, "athlete ID"
);

define_string_id!(
    /// A validated competition identifier.
    CompetitionId, "competition ID"
);

define_string_id!(
    /// A validated event identifier, unique within the system.
    EventId, "event ID"
);

define_string_id!(
    /// A validated heat identifier.
    HeatId, "heat ID"
);

const RELAY_PREFIX: &str = "relay:";
const PLACEHOLDER_PREFIX: &str = "unresolved-";

impl AthleteId {
    /// Builds the result key for a relay team from its legs, in leg order.
    ///
    /// The same four swimmers in a different order are a different team.
    pub fn relay_team(legs: &[Self]) -> Result<Self, ValidationError> {
        if legs.is_empty() {
            return Err(ValidationError::Empty {
                field: "relay legs",
            });
        }
        let joined = legs
            .iter()
            .map(Self::as_str)
            .collect::<Vec<_>>()
            .join("+");
        Ok(Self(format!("{RELAY_PREFIX}{joined}")))
    }

    /// Builds a deterministic placeholder identity for a name that could not be
    /// resolved against the athlete directory.
    ///
    /// The same name (ignoring case and surrounding whitespace) always maps to the
    /// same placeholder, so repeated imports upsert instead of duplicating.
    #[must_use]
    pub fn placeholder(name: &str) -> Self {
        let key = name.trim().to_lowercase();
        let uuid = Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes());
        Self(format!("{PLACEHOLDER_PREFIX}{uuid}"))
    }

    /// Whether this identity was synthesized for an unresolved import name.
    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(PLACEHOLDER_PREFIX)
    }

    /// Whether this identity keys a relay team.
    pub fn is_relay_team(&self) -> bool {
        self.0.starts_with(RELAY_PREFIX)
    }
}

/// Medal classification attached to an official result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    /// String representation for storage and display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gold => "GOLD",
            Self::Silver => "SILVER",
            Self::Bronze => "BRONZE",
        }
    }
}

impl fmt::Display for Medal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Medal {
    type Err = ValidationError;

    /// Parses a medal name, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GOLD" => Ok(Self::Gold),
            "SILVER" => Ok(Self::Silver),
            "BRONZE" => Ok(Self::Bronze),
            _ => Err(ValidationError::InvalidMedal {
                value: s.to_string(),
            }),
        }
    }
}

/// Which source produced a result entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Captured by the stopwatch during a heat.
    Live,
    /// Entered or corrected by an operator.
    Manual,
    /// Extracted from a results document.
    Imported,
}

impl Provenance {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Manual => "manual",
            Self::Imported => "imported",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provenance {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "live" => Ok(Self::Live),
            "manual" => Ok(Self::Manual),
            "imported" => Ok(Self::Imported),
            _ => Err(ValidationError::InvalidProvenance {
                value: s.to_string(),
            }),
        }
    }
}

/// Officiality class of a result entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Officiality {
    /// Sanctioned ranking record.
    Official,
    /// Provisional capture, not used for ranking.
    Unofficial,
}

impl Officiality {
    #[must_use]
    pub const fn from_flag(is_official: bool) -> Self {
        if is_official {
            Self::Official
        } else {
            Self::Unofficial
        }
    }

    #[must_use]
    pub const fn is_official(self) -> bool {
        matches!(self, Self::Official)
    }
}

impl fmt::Display for Officiality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Official => f.write_str("official"),
            Self::Unofficial => f.write_str("unofficial"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn athlete_id_rejects_empty() {
        assert!(AthleteId::new("").is_err());
        assert!(AthleteId::new("   ").is_err());
        assert!(AthleteId::new("ath-1").is_ok());
    }

    #[test]
    fn event_id_serde_roundtrip() {
        let id = EventId::new("ev-100-free").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ev-100-free\"");
        let parsed: EventId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn heat_id_serde_rejects_empty() {
        let result: Result<HeatId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn relay_team_keeps_leg_order() {
        let legs = [AthleteId::new("a").unwrap(), AthleteId::new("b").unwrap()];
        let team = AthleteId::relay_team(&legs).unwrap();
        assert_eq!(team.as_str(), "relay:a+b");
        assert!(team.is_relay_team());

        let reversed = [legs[1].clone(), legs[0].clone()];
        assert_ne!(AthleteId::relay_team(&reversed).unwrap(), team);
        assert!(AthleteId::relay_team(&[]).is_err());
    }

    #[test]
    fn placeholder_is_deterministic_and_flagged() {
        let first = AthleteId::placeholder("Joao Silva");
        let second = AthleteId::placeholder("  joao silva ");
        assert_eq!(first, second);
        assert!(first.is_placeholder());
        assert!(!AthleteId::new("ath-1").unwrap().is_placeholder());
        assert_ne!(first, AthleteId::placeholder("João Silva"));
    }

    #[test]
    fn medal_parses_case_insensitively() {
        assert_eq!("GOLD".parse::<Medal>().unwrap(), Medal::Gold);
        assert_eq!(" silver ".parse::<Medal>().unwrap(), Medal::Silver);
        assert_eq!("Bronze".parse::<Medal>().unwrap(), Medal::Bronze);
        assert!("platinum".parse::<Medal>().is_err());
        assert!("".parse::<Medal>().is_err());
    }

    #[test]
    fn medal_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Medal::Silver).unwrap(), "\"SILVER\"");
    }

    #[test]
    fn provenance_from_str_roundtrip() {
        for p in [Provenance::Live, Provenance::Manual, Provenance::Imported] {
            assert_eq!(p.as_str().parse::<Provenance>().unwrap(), p);
        }
        assert!("ai".parse::<Provenance>().is_err());
    }

    #[test]
    fn officiality_from_flag() {
        assert_eq!(Officiality::from_flag(true), Officiality::Official);
        assert!(!Officiality::from_flag(false).is_official());
    }
}
