//! Competition lifecycle: `Scheduled → Active → Past`, and the heat
//! transitions it gates.
//!
//! Every operation either completes or returns an error with the competition
//! untouched.

use crate::athlete::AthleteDirectory;
use crate::competition::{Competition, CompetitionStatus, LifecycleState};
use crate::error::{CoreError, Result};
use crate::heat::{Competitor, HeatSession, HeatStatus};
use crate::reconcile::{LiveResult, ManualResult, ResultReconciler, ResultSource};
use crate::results::MergeSummary;
use crate::time::TimeSource;
use crate::types::{AthleteId, EventId, HeatId};

/// Outcome of saving a timed heat.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct HeatSaveReport {
    pub summary: MergeSummary,
    /// Lanes whose finish was saved.
    pub saved_lanes: Vec<u8>,
    /// Lanes without a finish; nothing was saved for them.
    pub dropped_lanes: Vec<u8>,
}

impl Competition {
    /// Activates a scheduled competition.
    pub fn start(&mut self) -> Result<()> {
        if self.state() != LifecycleState::Scheduled {
            return Err(CoreError::invalid_state(format!(
                "competition {} cannot start from {}",
                self.id,
                self.state()
            )));
        }
        self.is_active = true;
        tracing::info!(competition = %self.id, "competition started");
        Ok(())
    }

    /// Closes an active competition for good.
    ///
    /// Heats still timing stay in that state and can no longer be saved; they
    /// are logged so the operator can enter their results by hand.
    pub fn finish(&mut self) -> Result<()> {
        if self.state() != LifecycleState::Active {
            return Err(CoreError::invalid_state(format!(
                "competition {} cannot finish from {}",
                self.id,
                self.state()
            )));
        }
        self.is_active = false;
        self.status = CompetitionStatus::Past;
        let stranded = self.timing_heats();
        if !stranded.is_empty() {
            tracing::warn!(
                competition = %self.id,
                heats = ?stranded,
                "competition finished with heats still timing"
            );
        }
        tracing::info!(competition = %self.id, "competition finished");
        Ok(())
    }

    /// Heats currently in `Timing`, with their event, in event order.
    pub fn timing_heats(&self) -> Vec<(&EventId, &HeatId)> {
        self.events()
            .iter()
            .flat_map(|event| {
                event
                    .heats()
                    .iter()
                    .filter(|heat| heat.status() == HeatStatus::Timing)
                    .map(move |heat| (&event.id, &heat.id))
            })
            .collect()
    }

    /// Adds an athlete to the roster. Returns `false` if already registered.
    ///
    /// Heat entries are not touched.
    pub fn register(&mut self, athlete: AthleteId) -> bool {
        if self.is_registered(&athlete) {
            return false;
        }
        tracing::debug!(competition = %self.id, %athlete, "athlete registered");
        self.registered_athletes.push(athlete);
        true
    }

    /// Removes an athlete from the roster. Returns `false` if not registered.
    ///
    /// Heat entries and results that name the athlete stay as they are.
    pub fn unregister(&mut self, athlete: &AthleteId) -> bool {
        let before = self.registered_athletes.len();
        self.registered_athletes.retain(|registered| registered != athlete);
        let removed = self.registered_athletes.len() != before;
        if removed {
            tracing::debug!(competition = %self.id, %athlete, "athlete unregistered");
        }
        removed
    }

    fn ensure_active(&self, action: &str) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(CoreError::invalid_state(format!(
                "cannot {action}: competition {} is {}",
                self.id,
                self.state()
            )))
        }
    }

    /// Puts a heat into `Timing` and returns a fresh session for it.
    ///
    /// Re-opening a heat that is already timing discards whatever the previous
    /// session captured; live state is never persisted, so a lost session must
    /// not wedge the heat.
    pub fn open_heat<T: TimeSource>(
        &mut self,
        event_id: &EventId,
        heat_id: &HeatId,
        source: T,
    ) -> Result<HeatSession<T>> {
        self.ensure_active("open a heat")?;
        let competition_id = self.id.clone();
        let heat = self.event_mut(event_id)?.heat_mut(heat_id)?;
        match heat.status() {
            HeatStatus::Pending => {}
            HeatStatus::Timing => {
                tracing::warn!(heat = %heat_id, "heat already timing, starting a new session");
            }
            HeatStatus::Finished => {
                return Err(CoreError::invalid_state(format!(
                    "heat {heat_id} is already finished"
                )));
            }
        }
        heat.set_status(HeatStatus::Timing);
        tracing::info!(competition = %competition_id, event = %event_id, heat = %heat_id, "heat opened");
        Ok(HeatSession::new(
            competition_id,
            event_id.clone(),
            heat,
            source,
        ))
    }

    /// Checks that `session` can be saved into this competition right now.
    ///
    /// [`Competition::save_heat`] consumes the session, so callers that want
    /// to keep timing after a refusal check first.
    pub fn check_save<T: TimeSource>(&self, session: &HeatSession<T>) -> Result<()> {
        self.ensure_active("save a heat")?;
        if session.competition_id() != &self.id {
            return Err(CoreError::invalid_state(format!(
                "session belongs to competition {}, not {}",
                session.competition_id(),
                self.id
            )));
        }
        let event = self
            .event(session.event_id())
            .ok_or_else(|| CoreError::not_found("event", session.event_id()))?;
        let heat = event
            .heat(session.heat_id())
            .ok_or_else(|| CoreError::not_found("heat", session.heat_id()))?;
        if heat.status() != HeatStatus::Timing {
            return Err(CoreError::invalid_state(format!(
                "heat {} is {}, not timing",
                heat.id,
                heat.status()
            )));
        }
        Ok(())
    }

    /// Saves a timed heat: finished lanes become unofficial live results and
    /// the heat is marked finished.
    pub fn save_heat<T: TimeSource, D: AthleteDirectory + ?Sized>(
        &mut self,
        session: HeatSession<T>,
        directory: &D,
    ) -> Result<HeatSaveReport> {
        self.check_save(&session)?;
        let capture = session.into_capture();

        let mut report = HeatSaveReport::default();
        let mut results = Vec::with_capacity(capture.lanes.len());
        for timing in &capture.lanes {
            let Some(time_ms) = timing.final_time_ms() else {
                report.dropped_lanes.push(timing.lane);
                continue;
            };
            results.push(LiveResult {
                athlete_id: timing.competitor.result_key()?,
                athlete_name: display_name(&timing.competitor, timing.lane, directory),
                lane: timing.lane,
                time_ms,
                splits: timing.splits().to_vec(),
            });
            report.saved_lanes.push(timing.lane);
        }
        if !report.dropped_lanes.is_empty() {
            tracing::warn!(
                heat = %capture.heat_id,
                lanes = ?report.dropped_lanes,
                "lanes without a finish were not saved"
            );
        }

        let event = self.event_mut(&capture.event_id)?;
        report.summary =
            ResultReconciler::default().apply(event.results_mut(), ResultSource::Live(results))?;
        event.heat_mut(&capture.heat_id)?.set_status(HeatStatus::Finished);
        tracing::info!(
            competition = %capture.competition_id,
            event = %capture.event_id,
            heat = %capture.heat_id,
            saved = report.saved_lanes.len(),
            "heat saved"
        );
        Ok(report)
    }

    /// Applies operator corrections to one event. Allowed in any state, so
    /// results can still be fixed after the competition is over.
    pub fn record_manual(
        &mut self,
        event_id: &EventId,
        edits: Vec<ManualResult>,
        reconciler: &ResultReconciler,
    ) -> Result<MergeSummary> {
        let event = self.event_mut(event_id)?;
        reconciler.apply(event.results_mut(), ResultSource::Manual(edits))
    }
}

fn display_name<D: AthleteDirectory + ?Sized>(
    competitor: &Competitor,
    lane: u8,
    directory: &D,
) -> String {
    let names: Vec<&str> = competitor
        .athletes()
        .iter()
        .filter_map(|id| directory.resolve(id))
        .map(|athlete| athlete.name.as_str())
        .collect();
    if names.is_empty() {
        format!("Lane {lane}")
    } else {
        names.join(" / ")
    }
}
