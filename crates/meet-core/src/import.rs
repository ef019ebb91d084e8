//! Reconciles results extracted from a scanned results sheet onto a
//! competition's events and the athlete directory.
//!
//! Matching is deliberately simple and deterministic:
//!
//! - **Events**: both names are lowercased and every run of punctuation or
//!   whitespace collapses to one space. A row belongs to an event when either
//!   name contains the other. "100m Livre Final" matches an event named
//!   "100m Livre — Final A"; "150m Livre" also matches "50m Livre", and such a
//!   row is applied to every event it matches.
//! - **Athletes**: exact full name, ignoring case and surrounding whitespace.
//!   No accent folding. Names that do not resolve get a placeholder identity
//!   (see [`AthleteId::placeholder`]) and are listed in the report. Rows with
//!   no name are keyed by their content, so distinct rows never collapse.

use rayon::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

use crate::athlete::AthleteDirectory;
use crate::competition::{Competition, Event};
use crate::error::Result;
use crate::reconcile::{ImportedResult, ResultReconciler, ResultSource};
use crate::results::MergeSummary;
use crate::types::{AthleteId, EventId, Medal};

const UNKNOWN_ATHLETE: &str = "Unknown athlete";
const MISSING_TIME: &str = "00:00,00";

/// One row as produced by the document-extraction collaborator.
///
/// Treated as untrusted: every field is optional and unparseable rank or medal
/// values are dropped rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedResult {
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub athlete_name: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_rank")]
    pub rank: Option<u32>,
    #[serde(default, deserialize_with = "lenient_medal")]
    pub medal: Option<Medal>,
    #[serde(default)]
    pub time_ms: Option<u64>,
}

/// Accepts `2`, `"2"` or anything else (as absent).
fn lenient_rank<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<u32>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|rank| *rank > 0))
}

fn lenient_medal<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Medal>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}

/// What an import did to one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventImport {
    pub event_id: EventId,
    pub event_name: String,
    /// Rows that matched this event.
    pub matched: usize,
    pub summary: MergeSummary,
}

/// Outcome of an import. Unresolved names are warnings, not failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub events: Vec<EventImport>,
    /// Athlete names that did not resolve, in first-seen order.
    pub unresolved_names: Vec<String>,
    /// Event names of rows that matched no event.
    pub unmatched_events: Vec<String>,
}

impl ImportReport {
    pub fn applied(&self) -> usize {
        self.events.iter().map(|event| event.summary.total()).sum()
    }
}

/// Maps extracted rows onto events and athletes and merges them as official
/// results.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportReconciler {
    reconciler: ResultReconciler,
}

impl ImportReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Imports `rows` into every event of `competition` they match.
    ///
    /// Allowed in any lifecycle state. An empty `rows` is a no-op.
    pub fn import<D: AthleteDirectory + Sync + ?Sized>(
        &self,
        competition: &mut Competition,
        rows: &[ExtractedResult],
        directory: &D,
    ) -> Result<ImportReport> {
        let mut report = ImportReport::default();
        if rows.is_empty() {
            return Ok(report);
        }

        let row_hints: Vec<String> = rows
            .iter()
            .map(|row| normalize(row.event_name.as_deref().unwrap_or_default()))
            .collect();

        let event_names: Vec<String> = competition
            .events()
            .iter()
            .map(|event| normalize(&event.name))
            .collect();

        // Resolution is pure, so match every event in parallel and merge in order.
        let planned: Vec<Vec<ImportedResult>> = event_names
            .par_iter()
            .map(|event| {
                rows.iter()
                    .zip(&row_hints)
                    .filter(|(_, hint)| names_match(hint, event))
                    .map(|(row, _)| resolve(row, directory))
                    .collect()
            })
            .collect();

        let matched_rows: Vec<bool> = row_hints
            .iter()
            .map(|hint| event_names.iter().any(|event| names_match(hint, event)))
            .collect();

        for (row, matched) in rows.iter().zip(&matched_rows) {
            if !matched {
                let hint = row.event_name.clone().unwrap_or_default();
                tracing::warn!(event = %hint, "extracted row matched no event");
                if !report.unmatched_events.contains(&hint) {
                    report.unmatched_events.push(hint);
                }
            }
        }

        for (index, resolved) in planned.into_iter().enumerate() {
            if resolved.is_empty() {
                continue;
            }
            for result in &resolved {
                if result.athlete_id.is_placeholder()
                    && !report.unresolved_names.contains(&result.athlete_name)
                {
                    tracing::warn!(name = %result.athlete_name, id = %result.athlete_id, "athlete not found, using placeholder");
                    report.unresolved_names.push(result.athlete_name.clone());
                }
            }
            let event: &mut Event = &mut competition.events_mut()[index];
            let matched = resolved.len();
            let summary = self
                .reconciler
                .apply(event.results_mut(), ResultSource::Imported(resolved))?;
            report.events.push(EventImport {
                event_id: event.id.clone(),
                event_name: event.name.clone(),
                matched,
                summary,
            });
        }

        tracing::info!(
            competition = %competition.id,
            rows = rows.len(),
            applied = report.applied(),
            unresolved = report.unresolved_names.len(),
            "import reconciled"
        );
        Ok(report)
    }
}

fn resolve<D: AthleteDirectory + ?Sized>(row: &ExtractedResult, directory: &D) -> ImportedResult {
    let time = row
        .time
        .as_deref()
        .map(str::trim)
        .filter(|time| !time.is_empty())
        .unwrap_or(MISSING_TIME);
    let name = row
        .athlete_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let (athlete_id, athlete_name) = match name {
        Some(name) => directory.find_by_name(name).map_or_else(
            || (AthleteId::placeholder(name), name.to_string()),
            |athlete| (athlete.id.clone(), athlete.name.clone()),
        ),
        None => {
            let key = format!(
                "{UNKNOWN_ATHLETE}|{}|{time}|{}",
                row.event_name.as_deref().unwrap_or_default().trim(),
                row.rank.map(|rank| rank.to_string()).unwrap_or_default()
            );
            (AthleteId::placeholder(&key), UNKNOWN_ATHLETE.to_string())
        }
    };
    ImportedResult {
        athlete_id,
        athlete_name,
        time: time.to_string(),
        time_ms: row.time_ms.unwrap_or(0),
        rank: row.rank,
        medal: row.medal,
    }
}

/// Lowercases and collapses every non-alphanumeric run to a single space.
fn normalize(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether either normalized name contains the other. Empty names match nothing.
fn names_match(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}
