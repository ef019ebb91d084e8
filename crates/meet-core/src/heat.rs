//! Heats, lane entries and live split capture.
//!
//! A [`Heat`] is the persistent description of one race: its lanes and where it
//! is in the `Pending → Timing → Finished` lifecycle. A [`HeatSession`] is the
//! ephemeral stopwatch view that exists only while the heat is being timed; it
//! owns one [`Clock`] and one split list per lane and shares nothing with other
//! sessions.

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, ClockState};
use crate::error::{CoreError, Result};
use crate::time::{MonotonicTime, TimeSource};
use crate::types::{AthleteId, CompetitionId, EventId, HeatId, ValidationError};

/// Maximum legs in a relay entry.
pub const MAX_RELAY_LEGS: usize = 4;

/// Who swims in a lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Competitor {
    Individual(AthleteId),
    /// Legs in swimming order.
    Relay(Vec<AthleteId>),
}

impl Competitor {
    /// Result-store key for this competitor.
    pub fn result_key(&self) -> Result<AthleteId> {
        match self {
            Self::Individual(id) => Ok(id.clone()),
            Self::Relay(legs) => Ok(AthleteId::relay_team(legs)?),
        }
    }

    /// Every athlete swimming for this competitor.
    pub fn athletes(&self) -> &[AthleteId] {
        match self {
            Self::Individual(id) => std::slice::from_ref(id),
            Self::Relay(legs) => legs,
        }
    }
}

/// One lane of a heat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawHeatEntry", into = "RawHeatEntry")]
pub struct HeatEntry {
    pub lane: u8,
    pub competitor: Competitor,
    /// Combined age of the relay team, for age-group relays.
    pub total_age: Option<u16>,
}

impl HeatEntry {
    pub const fn individual(lane: u8, athlete: AthleteId) -> Self {
        Self {
            lane,
            competitor: Competitor::Individual(athlete),
            total_age: None,
        }
    }

    pub fn relay(lane: u8, legs: Vec<AthleteId>) -> std::result::Result<Self, ValidationError> {
        if legs.is_empty() || legs.len() > MAX_RELAY_LEGS {
            return Err(ValidationError::RelayLegs {
                lane,
                legs: legs.len(),
            });
        }
        Ok(Self {
            lane,
            competitor: Competitor::Relay(legs),
            total_age: None,
        })
    }
}

/// Wire form of a heat entry: either `athlete_id` or `relay_athletes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawHeatEntry {
    lane: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    athlete_id: Option<AthleteId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    relay_athletes: Vec<AthleteId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    total_age: Option<u16>,
}

impl TryFrom<RawHeatEntry> for HeatEntry {
    type Error = ValidationError;

    fn try_from(raw: RawHeatEntry) -> std::result::Result<Self, Self::Error> {
        let mut entry = match (raw.athlete_id, raw.relay_athletes.is_empty()) {
            (Some(athlete), true) => Self::individual(raw.lane, athlete),
            (None, false) => Self::relay(raw.lane, raw.relay_athletes)?,
            (None, true) => {
                return Err(ValidationError::Empty {
                    field: "lane competitor",
                });
            }
            (Some(_), false) => {
                return Err(ValidationError::RelayLegs {
                    lane: raw.lane,
                    legs: raw.relay_athletes.len() + 1,
                });
            }
        };
        entry.total_age = raw.total_age;
        Ok(entry)
    }
}

impl From<HeatEntry> for RawHeatEntry {
    fn from(entry: HeatEntry) -> Self {
        let (athlete_id, relay_athletes) = match entry.competitor {
            Competitor::Individual(id) => (Some(id), Vec::new()),
            Competitor::Relay(legs) => (None, legs),
        };
        Self {
            lane: entry.lane,
            athlete_id,
            relay_athletes,
            total_age: entry.total_age,
        }
    }
}

/// Heat lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatStatus {
    #[default]
    Pending,
    Timing,
    Finished,
}

impl HeatStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Timing => "timing",
            Self::Finished => "finished",
        }
    }
}

impl std::fmt::Display for HeatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HeatStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "timing" => Ok(Self::Timing),
            "finished" => Ok(Self::Finished),
            _ => Err(format!("invalid heat status: {s}")),
        }
    }
}

/// One timed race within an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heat {
    pub id: HeatId,
    pub number: u32,
    /// Scheduled start, as printed on the programme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    entries: Vec<HeatEntry>,
    #[serde(default)]
    status: HeatStatus,
}

impl Heat {
    /// Creates a pending heat. Entries are ordered by lane.
    pub fn new(
        id: HeatId,
        number: u32,
        mut entries: Vec<HeatEntry>,
    ) -> std::result::Result<Self, ValidationError> {
        entries.sort_by_key(|entry| entry.lane);
        let heat = Self {
            id,
            number,
            time: None,
            entries,
            status: HeatStatus::Pending,
        };
        heat.validate()?;
        Ok(heat)
    }

    /// Checks lane uniqueness; entries deserialized from storage go through here.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let mut lanes: Vec<u8> = self.entries.iter().map(|entry| entry.lane).collect();
        lanes.sort_unstable();
        if let Some(pair) = lanes.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(ValidationError::DuplicateLane {
                heat: self.id.to_string(),
                lane: pair[0],
            });
        }
        Ok(())
    }

    pub fn entries(&self) -> &[HeatEntry] {
        &self.entries
    }

    pub const fn status(&self) -> HeatStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: HeatStatus) {
        self.status = status;
    }

    /// Rebuilds a heat with a persisted status. Used by storage.
    #[must_use]
    pub fn with_status(mut self, status: HeatStatus) -> Self {
        self.status = status;
        self
    }

    /// Replaces the lane entries. Only a pending heat can change its lanes.
    pub fn replace_entries(&mut self, mut entries: Vec<HeatEntry>) -> Result<()> {
        if self.status != HeatStatus::Pending {
            return Err(CoreError::invalid_state(format!(
                "heat {} entries are frozen once timing has begun (status: {})",
                self.id, self.status
            )));
        }
        entries.sort_by_key(|entry| entry.lane);
        let candidate = Self {
            entries,
            ..self.clone()
        };
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    /// Whether `athlete` swims in this heat, individually or as a relay leg.
    pub fn involves(&self, athlete: &AthleteId) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.competitor.athletes().contains(athlete))
    }
}

/// An intermediate time at a distance marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    /// Distance label, e.g. "50m".
    pub distance: String,
    /// Milliseconds since heat start.
    pub time_ms: u64,
}

/// Live timing state for one lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveEntryTiming {
    pub lane: u8,
    pub competitor: Competitor,
    splits: Vec<Split>,
    final_time_ms: Option<u64>,
}

impl LiveEntryTiming {
    fn new(entry: &HeatEntry) -> Self {
        Self {
            lane: entry.lane,
            competitor: entry.competitor.clone(),
            splits: Vec::new(),
            final_time_ms: None,
        }
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    pub const fn is_finished(&self) -> bool {
        self.final_time_ms.is_some()
    }

    pub const fn final_time_ms(&self) -> Option<u64> {
        self.final_time_ms
    }

    fn clear(&mut self) {
        self.splits.clear();
        self.final_time_ms = None;
    }
}

/// What a session hands over when it is saved.
#[derive(Debug, Clone)]
pub struct HeatCapture {
    pub competition_id: CompetitionId,
    pub event_id: EventId,
    pub heat_id: HeatId,
    pub lanes: Vec<LiveEntryTiming>,
}

/// An in-progress heat: one clock, one split recorder per lane.
#[derive(Debug)]
pub struct HeatSession<T: TimeSource = MonotonicTime> {
    competition_id: CompetitionId,
    event_id: EventId,
    heat_id: HeatId,
    clock: Clock<T>,
    lanes: Vec<LiveEntryTiming>,
}

impl<T: TimeSource> HeatSession<T> {
    /// Snapshots the heat's entries into a fresh session with a stopped clock.
    pub fn new(competition_id: CompetitionId, event_id: EventId, heat: &Heat, source: T) -> Self {
        Self {
            competition_id,
            event_id,
            heat_id: heat.id.clone(),
            clock: Clock::new(source),
            lanes: heat.entries().iter().map(LiveEntryTiming::new).collect(),
        }
    }

    pub const fn competition_id(&self) -> &CompetitionId {
        &self.competition_id
    }

    pub const fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub const fn heat_id(&self) -> &HeatId {
        &self.heat_id
    }

    /// Starts or resumes the stopwatch.
    pub fn start(&mut self) -> bool {
        let started = self.clock.start();
        if started {
            tracing::debug!(heat = %self.heat_id, elapsed_ms = self.clock.elapsed_ms(), "clock started");
        }
        started
    }

    pub fn pause(&mut self) -> bool {
        let paused = self.clock.pause();
        if paused {
            tracing::debug!(heat = %self.heat_id, elapsed_ms = self.clock.elapsed_ms(), "clock paused");
        }
        paused
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.clock.elapsed_ms()
    }

    pub const fn clock_state(&self) -> ClockState {
        self.clock.state()
    }

    pub fn lanes(&self) -> &[LiveEntryTiming] {
        &self.lanes
    }

    pub fn lane(&self, lane: u8) -> Option<&LiveEntryTiming> {
        self.lanes.iter().find(|timing| timing.lane == lane)
    }

    pub fn all_finished(&self) -> bool {
        self.lanes.iter().all(LiveEntryTiming::is_finished)
    }

    fn lane_mut(&mut self, lane: u8) -> Result<&mut LiveEntryTiming> {
        self.lanes
            .iter_mut()
            .find(|timing| timing.lane == lane)
            .ok_or_else(|| CoreError::not_found("lane", lane))
    }

    /// Records a split for `lane` at the current elapsed time.
    ///
    /// Fails with `InvalidState` when the clock is not running, the lane has
    /// finished, or the reading is not strictly after the lane's previous split.
    pub fn record_split(&mut self, lane: u8, label: impl Into<String>) -> Result<&Split> {
        if !self.clock.is_running() {
            return Err(CoreError::invalid_state(format!(
                "cannot record a split while the clock is {:?}",
                self.clock.state()
            )));
        }
        let elapsed = self.clock.elapsed_ms();
        let heat_id = self.heat_id.clone();
        let timing = self.lane_mut(lane)?;
        if timing.is_finished() {
            return Err(CoreError::invalid_state(format!(
                "lane {lane} has already finished"
            )));
        }
        if let Some(previous) = timing.splits.last().filter(|s| elapsed <= s.time_ms) {
            return Err(CoreError::invalid_state(format!(
                "split at {elapsed}ms is not after lane {lane}'s previous split at {}ms",
                previous.time_ms
            )));
        }

        let split = Split {
            distance: label.into(),
            time_ms: elapsed,
        };
        tracing::debug!(heat = %heat_id, lane, distance = %split.distance, time_ms = elapsed, "split recorded");
        let index = timing.splits.len();
        timing.splits.push(split);
        Ok(&timing.splits[index])
    }

    /// Records the lane's next split using the conventional `"{n*step}m"` label.
    pub fn record_next_split(&mut self, lane: u8, step_m: u32) -> Result<&Split> {
        let taken = self
            .lane(lane)
            .ok_or_else(|| CoreError::not_found("lane", lane))?
            .splits
            .len();
        let n = u32::try_from(taken).unwrap_or(u32::MAX).saturating_add(1);
        self.record_split(lane, format!("{}m", n.saturating_mul(step_m)))
    }

    /// Stops the lane at the current elapsed time and returns that final time.
    ///
    /// A second finish for the same lane is rejected, not ignored.
    pub fn finish_lane(&mut self, lane: u8) -> Result<u64> {
        if self.clock.state() == ClockState::Stopped {
            return Err(CoreError::invalid_state(format!(
                "cannot finish lane {lane} before the clock has started"
            )));
        }
        let elapsed = self.clock.elapsed_ms();
        let heat_id = self.heat_id.clone();
        let timing = self.lane_mut(lane)?;
        if let Some(final_time) = timing.final_time_ms {
            return Err(CoreError::invalid_state(format!(
                "lane {lane} already finished at {final_time}ms"
            )));
        }
        timing.final_time_ms = Some(elapsed);
        tracing::debug!(heat = %heat_id, lane, final_ms = elapsed, "lane finished");
        Ok(elapsed)
    }

    /// Discards every split and finish and zeroes the clock.
    pub fn reset_heat(&mut self) {
        self.clock.reset();
        for timing in &mut self.lanes {
            timing.clear();
        }
        tracing::debug!(heat = %self.heat_id, "heat reset");
    }

    /// Ends the session, handing over every lane's timing.
    pub fn into_capture(self) -> HeatCapture {
        HeatCapture {
            competition_id: self.competition_id,
            event_id: self.event_id,
            heat_id: self.heat_id,
            lanes: self.lanes,
        }
    }
}
