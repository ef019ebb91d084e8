//! Competitions, their events, and the competition-wide result views.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::heat::Heat;
use crate::results::{MedalTally, RankConflict, ResultEntry, ResultStore};
use crate::types::{AthleteId, CompetitionId, EventId, HeatId, ValidationError};

/// Calendar status. `Past` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionStatus {
    #[default]
    Upcoming,
    Past,
}

impl CompetitionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Past => "past",
        }
    }
}

impl std::fmt::Display for CompetitionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CompetitionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(Self::Upcoming),
            "past" => Ok(Self::Past),
            _ => Err(format!("invalid competition status: {s}")),
        }
    }
}

/// Where a competition is in its one-way lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Upcoming, not yet started.
    Scheduled,
    /// Upcoming and started: heats may be timed.
    Active,
    Past,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Past => "past",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    #[default]
    Individual,
    Relay,
}

impl EventKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Relay => "relay",
        }
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "individual" => Ok(Self::Individual),
            "relay" => Ok(Self::Relay),
            _ => Err(format!("invalid event kind: {s}")),
        }
    }
}

/// One race distance and stroke within a competition, e.g. "100m Livre".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    /// "Eliminatórias", "Final A", ...
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub kind: EventKind,
    #[serde(default)]
    heats: Vec<Heat>,
    #[serde(default)]
    results: ResultStore,
}

impl Event {
    pub fn new(id: EventId, name: impl Into<String>, kind: EventKind) -> Self {
        Self {
            id,
            name: name.into(),
            stage: String::new(),
            kind,
            heats: Vec::new(),
            results: ResultStore::new(),
        }
    }

    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = stage.into();
        self
    }

    /// Rebuilds an event with persisted results. Used by storage.
    #[must_use]
    pub fn with_results(mut self, results: ResultStore) -> Self {
        self.results = results;
        self
    }

    /// Appends a heat, keeping heats ordered by number. Heat ids are unique per event.
    pub fn add_heat(&mut self, heat: Heat) -> std::result::Result<(), ValidationError> {
        heat.validate()?;
        if self.heat(&heat.id).is_some() {
            return Err(ValidationError::DuplicateId {
                kind: "heat",
                id: heat.id.to_string(),
            });
        }
        self.heats.push(heat);
        self.heats.sort_by_key(|heat| heat.number);
        Ok(())
    }

    pub fn heats(&self) -> &[Heat] {
        &self.heats
    }

    pub fn heat(&self, id: &HeatId) -> Option<&Heat> {
        self.heats.iter().find(|heat| &heat.id == id)
    }

    pub(crate) fn heat_mut(&mut self, id: &HeatId) -> Result<&mut Heat> {
        self.heats
            .iter_mut()
            .find(|heat| &heat.id == id)
            .ok_or_else(|| CoreError::not_found("heat", id))
    }

    pub const fn results(&self) -> &ResultStore {
        &self.results
    }

    pub(crate) const fn results_mut(&mut self) -> &mut ResultStore {
        &mut self.results
    }

    /// Display label combining name and stage.
    pub fn label(&self) -> String {
        if self.stage.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.name, self.stage)
        }
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        for (index, heat) in self.heats.iter().enumerate() {
            if self.heats[..index].iter().any(|other| other.id == heat.id) {
                return Err(ValidationError::DuplicateId {
                    kind: "heat",
                    id: heat.id.to_string(),
                });
            }
            heat.validate()?;
        }
        Ok(())
    }
}

/// A swim meet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competition {
    pub id: CompetitionId,
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub(crate) status: CompetitionStatus,
    #[serde(default)]
    pub(crate) is_active: bool,
    #[serde(default)]
    pub(crate) registered_athletes: Vec<AthleteId>,
    #[serde(default)]
    events: Vec<Event>,
}

impl Competition {
    /// A new, upcoming, inactive competition with no events.
    pub fn new(id: CompetitionId, name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id,
            name: name.into(),
            location: String::new(),
            date,
            end_date: None,
            category: String::new(),
            sub_category: None,
            status: CompetitionStatus::Upcoming,
            is_active: false,
            registered_athletes: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Rebuilds persisted lifecycle fields. Used by storage.
    ///
    /// An active flag on a past competition is dropped.
    #[must_use]
    pub fn with_lifecycle(mut self, status: CompetitionStatus, is_active: bool) -> Self {
        self.status = status;
        self.is_active = is_active && status == CompetitionStatus::Upcoming;
        self
    }

    pub const fn status(&self) -> CompetitionStatus {
        self.status
    }

    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    pub const fn state(&self) -> LifecycleState {
        match (self.status, self.is_active) {
            (CompetitionStatus::Past, _) => LifecycleState::Past,
            (CompetitionStatus::Upcoming, true) => LifecycleState::Active,
            (CompetitionStatus::Upcoming, false) => LifecycleState::Scheduled,
        }
    }

    /// Registered athletes, in registration order.
    pub fn registered_athletes(&self) -> &[AthleteId] {
        &self.registered_athletes
    }

    pub fn is_registered(&self, athlete: &AthleteId) -> bool {
        self.registered_athletes.contains(athlete)
    }

    pub fn add_event(&mut self, event: Event) -> std::result::Result<(), ValidationError> {
        event.validate()?;
        if self.event(&event.id).is_some() {
            return Err(ValidationError::DuplicateId {
                kind: "event",
                id: event.id.to_string(),
            });
        }
        self.events.push(event);
        Ok(())
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn event(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|event| &event.id == id)
    }

    pub(crate) fn event_mut(&mut self, id: &EventId) -> Result<&mut Event> {
        self.events
            .iter_mut()
            .find(|event| &event.id == id)
            .ok_or_else(|| CoreError::not_found("event", id))
    }

    pub(crate) fn events_mut(&mut self) -> &mut [Event] {
        &mut self.events
    }

    /// Checks every heat and rejects duplicate event ids. Snapshots loaded from
    /// JSON go through here.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        for (index, event) in self.events.iter().enumerate() {
            if self.events[..index].iter().any(|other| other.id == event.id) {
                return Err(ValidationError::DuplicateId {
                    kind: "event",
                    id: event.id.to_string(),
                });
            }
            event.validate()?;
        }
        Ok(())
    }

    pub fn individual_event_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| event.kind == EventKind::Individual)
            .count()
    }

    pub fn relay_event_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| event.kind == EventKind::Relay)
            .count()
    }

    /// Medal and trophy counts over every event's official results.
    ///
    /// Computed from scratch on each call; there is no cached counter to drift.
    pub fn tally(&self) -> MedalTally {
        let mut tally = MedalTally::default();
        for event in &self.events {
            tally += event.results.tally();
        }
        tally
    }

    /// Every result across the competition, labelled with its event.
    pub fn overview(&self) -> CompetitionResults<'_> {
        let mut official = Vec::new();
        let mut unofficial = Vec::new();
        let mut rank_conflicts = Vec::new();
        for event in &self.events {
            official.extend(event.results.official_sorted().into_iter().map(|entry| {
                EventResult {
                    event_id: &event.id,
                    event_name: &event.name,
                    entry,
                }
            }));
            unofficial.extend(event.results.unofficial_sorted().into_iter().map(|entry| {
                EventResult {
                    event_id: &event.id,
                    event_name: &event.name,
                    entry,
                }
            }));
            rank_conflicts.extend(
                event
                    .results
                    .rank_conflicts()
                    .into_iter()
                    .map(|conflict| (&event.id, conflict)),
            );
        }
        official.sort_by_key(|result| result.entry.time_ms);
        unofficial.sort_by_key(|result| result.entry.time_ms);

        CompetitionResults {
            official,
            unofficial,
            tally: self.tally(),
            rank_conflicts,
        }
    }
}

/// A result together with the event it belongs to.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EventResult<'a> {
    pub event_id: &'a EventId,
    pub event_name: &'a str,
    #[serde(flatten)]
    pub entry: &'a ResultEntry,
}

/// Competition-wide results, each list fastest first.
#[derive(Debug, Clone, Serialize)]
pub struct CompetitionResults<'a> {
    pub official: Vec<EventResult<'a>>,
    pub unofficial: Vec<EventResult<'a>>,
    pub tally: MedalTally,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rank_conflicts: Vec<(&'a EventId, RankConflict)>,
}

/// A competition shared between threads.
///
/// Each closure runs under the lock, so merges from different threads
/// serialize and the last one to run wins.
#[derive(Debug, Clone)]
pub struct SharedCompetition {
    inner: Arc<Mutex<Competition>>,
}

impl SharedCompetition {
    pub fn new(competition: Competition) -> Self {
        Self {
            inner: Arc::new(Mutex::new(competition)),
        }
    }

    /// Runs `f` with exclusive access.
    pub fn with<R>(&self, f: impl FnOnce(&mut Competition) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> Competition {
        self.with(|competition| competition.clone())
    }
}
