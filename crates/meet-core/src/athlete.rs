//! Read-only athlete directory used for display names and import resolution.

use serde::{Deserialize, Serialize};

use crate::types::AthleteId;

/// An athlete as known to the team directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Athlete {
    pub id: AthleteId,
    /// Full display name, e.g. "João Silva".
    pub name: String,
    #[serde(default)]
    pub category: String,
}

/// Lookup interface over the athlete directory.
///
/// This allows reconciliation to work with different directory backings
/// (e.g., rows loaded from `meet-db`, or test fixtures).
pub trait AthleteDirectory {
    /// Resolves an athlete by identity.
    fn resolve(&self, id: &AthleteId) -> Option<&Athlete>;

    /// All known athletes, in directory order.
    fn list_all(&self) -> &[Athlete];

    /// Finds an athlete by exact full name, ignoring case.
    ///
    /// No accent folding or fuzzy matching: "Joao Silva" does not find "João Silva".
    fn find_by_name(&self, name: &str) -> Option<&Athlete> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.list_all()
            .iter()
            .find(|athlete| athlete.name.trim().to_lowercase() == wanted)
    }
}

/// In-memory directory snapshot.
#[derive(Debug, Clone, Default)]
pub struct AthleteRoster {
    athletes: Vec<Athlete>,
}

impl AthleteRoster {
    pub fn new(athletes: Vec<Athlete>) -> Self {
        Self { athletes }
    }
}

impl AthleteDirectory for AthleteRoster {
    fn resolve(&self, id: &AthleteId) -> Option<&Athlete> {
        self.athletes.iter().find(|athlete| &athlete.id == id)
    }

    fn list_all(&self) -> &[Athlete] {
        &self.athletes
    }
}
