//! Core domain logic for swim meet timing.
//!
//! This crate contains the fundamental types and logic for:
//! - Live timing: a pausable stopwatch and per-lane split capture for one heat
//! - Results: per-event official/unofficial stores fed by live, manual and
//!   imported results
//! - Lifecycle: the competition state machine that gates heat timing
//! - Import: mapping extracted result rows onto events and athletes

mod athlete;
mod clock;
mod competition;
mod error;
pub mod heat;
mod import;
mod lifecycle;
pub mod reconcile;
mod results;
pub mod time;
pub mod types;

pub use athlete::{Athlete, AthleteDirectory, AthleteRoster};
pub use clock::{Clock, ClockState};
pub use competition::{
    Competition, CompetitionResults, CompetitionStatus, Event, EventKind, EventResult,
    LifecycleState, SharedCompetition,
};
pub use error::{CoreError, Result};
pub use heat::{Competitor, Heat, HeatEntry, HeatSession, HeatStatus, LiveEntryTiming, Split};
pub use import::{EventImport, ExtractedResult, ImportReconciler, ImportReport};
pub use lifecycle::HeatSaveReport;
pub use reconcile::{ManualResult, ParseMode, ResultReconciler, ResultSource};
pub use results::{MedalTally, MergeSummary, RankConflict, ResultEntry, ResultStore};
pub use time::{ManualTime, MonotonicTime, TimeSource, format_time, parse_time};
pub use types::{
    AthleteId, CompetitionId, EventId, HeatId, Medal, Officiality, Provenance, ValidationError,
};
