//! Per-event result storage.
//!
//! A [`ResultStore`] holds at most one official and one unofficial entry per
//! athlete. Writing to an occupied `(athlete, officiality)` slot replaces the
//! previous entry wholesale; nothing is merged field by field, so a fresh time
//! can never end up next to a stale rank.

use std::collections::BTreeMap;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::heat::Split;
use crate::types::{AthleteId, Medal, Officiality, Provenance};

/// One athlete's (or relay team's) result in one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub athlete_id: AthleteId,
    pub athlete_name: String,
    /// Display time, e.g. `1:01,20`.
    pub time: String,
    /// Sort value. Not derived from `time` for manual and imported entries.
    pub time_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub splits: Vec<Split>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medal: Option<Medal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trophy: Option<String>,
    pub is_official: bool,
    pub provenance: Provenance,
}

impl ResultEntry {
    pub const fn officiality(&self) -> Officiality {
        Officiality::from_flag(self.is_official)
    }

    fn sort_key(&self) -> (u64, u32, &str) {
        (
            self.time_ms,
            self.rank.unwrap_or(u32::MAX),
            self.athlete_id.as_str(),
        )
    }
}

/// Outcome counts of a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// Entries written to an empty slot.
    pub inserted: usize,
    /// Entries that displaced a different entry.
    pub replaced: usize,
    /// Entries identical to what was already stored.
    pub unchanged: usize,
}

impl MergeSummary {
    pub const fn total(&self) -> usize {
        self.inserted + self.replaced + self.unchanged
    }
}

impl AddAssign for MergeSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.inserted += rhs.inserted;
        self.replaced += rhs.replaced;
        self.unchanged += rhs.unchanged;
    }
}

/// Medal and trophy counts, always computed from official entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MedalTally {
    pub gold: usize,
    pub silver: usize,
    pub bronze: usize,
    pub trophies: usize,
}

impl MedalTally {
    /// Counts medals and trophies over the given entries.
    pub fn count<'a>(entries: impl IntoIterator<Item = &'a ResultEntry>) -> Self {
        let mut tally = Self::default();
        for entry in entries {
            match entry.medal {
                Some(Medal::Gold) => tally.gold += 1,
                Some(Medal::Silver) => tally.silver += 1,
                Some(Medal::Bronze) => tally.bronze += 1,
                None => {}
            }
            if entry.trophy.as_deref().is_some_and(|t| !t.trim().is_empty()) {
                tally.trophies += 1;
            }
        }
        tally
    }
}

impl AddAssign for MedalTally {
    fn add_assign(&mut self, rhs: Self) {
        self.gold += rhs.gold;
        self.silver += rhs.silver;
        self.bronze += rhs.bronze;
        self.trophies += rhs.trophies;
    }
}

/// Two or more official entries claiming the same rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankConflict {
    pub rank: u32,
    pub athletes: Vec<AthleteId>,
}

/// Official and unofficial results for one event, keyed by athlete.
///
/// Serialized as a single list with `is_official` flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ResultEntry>", into = "Vec<ResultEntry>")]
pub struct ResultStore {
    official: BTreeMap<AthleteId, ResultEntry>,
    unofficial: BTreeMap<AthleteId, ResultEntry>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    const fn class(&self, officiality: Officiality) -> &BTreeMap<AthleteId, ResultEntry> {
        match officiality {
            Officiality::Official => &self.official,
            Officiality::Unofficial => &self.unofficial,
        }
    }

    fn class_mut(&mut self, officiality: Officiality) -> &mut BTreeMap<AthleteId, ResultEntry> {
        match officiality {
            Officiality::Official => &mut self.official,
            Officiality::Unofficial => &mut self.unofficial,
        }
    }

    /// Upserts every entry into the `officiality` class.
    ///
    /// The entry's `is_official` flag is overwritten to match the class it is
    /// stored under. Later entries in the batch win over earlier ones for the
    /// same athlete.
    pub fn merge(
        &mut self,
        entries: impl IntoIterator<Item = ResultEntry>,
        officiality: Officiality,
    ) -> MergeSummary {
        let mut summary = MergeSummary::default();
        let class = self.class_mut(officiality);
        for mut entry in entries {
            entry.is_official = officiality.is_official();
            match class.get(&entry.athlete_id) {
                None => summary.inserted += 1,
                Some(existing) if *existing == entry => summary.unchanged += 1,
                Some(_) => summary.replaced += 1,
            }
            class.insert(entry.athlete_id.clone(), entry);
        }
        summary
    }

    pub fn get(&self, athlete: &AthleteId, officiality: Officiality) -> Option<&ResultEntry> {
        self.class(officiality).get(athlete)
    }

    /// Both entries for an athlete, official first.
    pub fn entries_for(&self, athlete: &AthleteId) -> impl Iterator<Item = &ResultEntry> {
        self.official
            .get(athlete)
            .into_iter()
            .chain(self.unofficial.get(athlete))
    }

    /// Official entries, fastest first.
    pub fn official_sorted(&self) -> Vec<&ResultEntry> {
        Self::sorted(&self.official)
    }

    /// Unofficial entries, fastest first.
    pub fn unofficial_sorted(&self) -> Vec<&ResultEntry> {
        Self::sorted(&self.unofficial)
    }

    fn sorted(class: &BTreeMap<AthleteId, ResultEntry>) -> Vec<&ResultEntry> {
        let mut entries: Vec<&ResultEntry> = class.values().collect();
        entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        entries
    }

    /// Every entry, official class first, each class in athlete order.
    pub fn iter(&self) -> impl Iterator<Item = &ResultEntry> {
        self.official.values().chain(self.unofficial.values())
    }

    pub fn len(&self) -> usize {
        self.official.len() + self.unofficial.len()
    }

    pub fn is_empty(&self) -> bool {
        self.official.is_empty() && self.unofficial.is_empty()
    }

    /// Medal and trophy counts over the official entries.
    pub fn tally(&self) -> MedalTally {
        MedalTally::count(self.official.values())
    }

    /// Ranks claimed by more than one official entry.
    ///
    /// Ranks are operator data and are never rewritten; this only reports.
    pub fn rank_conflicts(&self) -> Vec<RankConflict> {
        let mut by_rank: BTreeMap<u32, Vec<AthleteId>> = BTreeMap::new();
        for entry in self.official.values() {
            if let Some(rank) = entry.rank {
                by_rank
                    .entry(rank)
                    .or_default()
                    .push(entry.athlete_id.clone());
            }
        }
        by_rank
            .into_iter()
            .filter(|(_, athletes)| athletes.len() > 1)
            .map(|(rank, athletes)| RankConflict { rank, athletes })
            .collect()
    }
}

impl From<Vec<ResultEntry>> for ResultStore {
    fn from(entries: Vec<ResultEntry>) -> Self {
        let mut store = Self::new();
        for entry in entries {
            let officiality = entry.officiality();
            store.merge([entry], officiality);
        }
        store
    }
}

impl From<ResultStore> for Vec<ResultEntry> {
    fn from(store: ResultStore) -> Self {
        store
            .official
            .into_values()
            .chain(store.unofficial.into_values())
            .collect()
    }
}
