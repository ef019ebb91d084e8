//! Folding results from the three sources into an event's [`ResultStore`].
//!
//! | source   | class written                         | `time_ms`                         |
//! |----------|---------------------------------------|-----------------------------------|
//! | Live     | unofficial                            | stopwatch reading                 |
//! | Manual   | the class of the entry being edited   | kept from the prior entry (lenient) or parsed from the edited time (strict) |
//! | Imported | official                              | supplied numeric time, else 0     |
//!
//! Every source ends in [`ResultStore::merge`], so idempotence and
//! last-write-wins hold no matter where an entry came from.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::heat::Split;
use crate::results::{MergeSummary, ResultEntry, ResultStore};
use crate::time::{format_time, parse_time};
use crate::types::{AthleteId, Medal, Officiality, Provenance};

/// A finished lane from a saved heat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveResult {
    pub athlete_id: AthleteId,
    pub athlete_name: String,
    pub lane: u8,
    pub time_ms: u64,
    pub splits: Vec<Split>,
}

/// An operator's edit, as raw form text.
///
/// Blank fields clear the corresponding value. Use [`ManualResult::prefilled`]
/// to start from an existing entry so untouched fields survive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualResult {
    pub athlete_id: Option<AthleteId>,
    pub athlete_name: String,
    pub time: String,
    pub rank: String,
    pub medal: String,
    pub trophy: String,
    /// Which entry to edit. `None` edits the official entry if there is one,
    /// else the unofficial one; a brand new result is unofficial.
    #[serde(default)]
    pub officiality: Option<Officiality>,
}

impl ManualResult {
    /// A form populated from an existing entry.
    pub fn prefilled(entry: &ResultEntry) -> Self {
        Self {
            athlete_id: Some(entry.athlete_id.clone()),
            athlete_name: entry.athlete_name.clone(),
            time: entry.time.clone(),
            rank: entry.rank.map(|r| r.to_string()).unwrap_or_default(),
            medal: entry.medal.map(|m| m.to_string()).unwrap_or_default(),
            trophy: entry.trophy.clone().unwrap_or_default(),
            officiality: Some(entry.officiality()),
        }
    }
}

/// A result resolved from an extracted document row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedResult {
    pub athlete_id: AthleteId,
    pub athlete_name: String,
    pub time: String,
    pub time_ms: u64,
    pub rank: Option<u32>,
    pub medal: Option<Medal>,
}

/// An incoming batch, tagged by where it came from.
#[derive(Debug, Clone)]
pub enum ResultSource {
    Live(Vec<LiveResult>),
    Manual(Vec<ManualResult>),
    Imported(Vec<ImportedResult>),
}

impl ResultSource {
    pub const fn provenance(&self) -> Provenance {
        match self {
            Self::Live(_) => Provenance::Live,
            Self::Manual(_) => Provenance::Manual,
            Self::Imported(_) => Provenance::Imported,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Live(results) => results.len(),
            Self::Manual(results) => results.len(),
            Self::Imported(results) => results.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How manual form text is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Unparseable rank or medal becomes absent; `time_ms` is left alone.
    #[default]
    Lenient,
    /// Unparseable input is rejected and the edited time sets `time_ms`.
    Strict,
}

/// Parsed manual form fields.
struct ParsedEdit {
    rank: Option<u32>,
    medal: Option<Medal>,
    trophy: Option<String>,
    time: String,
    /// Only set in strict mode.
    time_ms: Option<u64>,
}

/// Applies result batches to an event's store.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultReconciler {
    mode: ParseMode,
}

impl ResultReconciler {
    pub const fn new(mode: ParseMode) -> Self {
        Self { mode }
    }

    pub const fn mode(&self) -> ParseMode {
        self.mode
    }

    /// Merges a batch into `store`.
    ///
    /// Either every entry of the batch is applied or, on error, none is.
    pub fn apply(&self, store: &mut ResultStore, source: ResultSource) -> Result<MergeSummary> {
        let provenance = source.provenance();
        let summary = match source {
            ResultSource::Live(results) => {
                let entries = results.into_iter().map(|result| ResultEntry {
                    athlete_id: result.athlete_id,
                    athlete_name: result.athlete_name,
                    time: format_time(result.time_ms),
                    time_ms: result.time_ms,
                    splits: result.splits,
                    rank: None,
                    medal: None,
                    trophy: None,
                    is_official: false,
                    provenance: Provenance::Live,
                });
                store.merge(entries, Officiality::Unofficial)
            }
            ResultSource::Imported(results) => {
                let entries = results.into_iter().map(|result| ResultEntry {
                    athlete_id: result.athlete_id,
                    athlete_name: result.athlete_name,
                    time: result.time,
                    time_ms: result.time_ms,
                    splits: Vec::new(),
                    rank: result.rank,
                    medal: result.medal,
                    trophy: None,
                    is_official: true,
                    provenance: Provenance::Imported,
                });
                store.merge(entries, Officiality::Official)
            }
            ResultSource::Manual(edits) => self.apply_manual(store, edits)?,
        };
        tracing::debug!(
            %provenance,
            inserted = summary.inserted,
            replaced = summary.replaced,
            unchanged = summary.unchanged,
            "results merged"
        );
        Ok(summary)
    }

    fn apply_manual(&self, store: &mut ResultStore, edits: Vec<ManualResult>) -> Result<MergeSummary> {
        // Parse the whole batch first so a strict failure leaves the store untouched.
        let parsed = edits
            .iter()
            .map(|edit| {
                let athlete = edit
                    .athlete_id
                    .clone()
                    .ok_or_else(|| CoreError::malformed("athlete", edit.athlete_name.clone()))?;
                Ok((athlete, self.parse_edit(edit)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut summary = MergeSummary::default();
        for ((athlete, fields), edit) in parsed.into_iter().zip(edits) {
            let (officiality, existing) = match edit.officiality {
                Some(officiality) => (officiality, store.get(&athlete, officiality)),
                None => store
                    .entries_for(&athlete)
                    .next()
                    .map_or((Officiality::Unofficial, None), |entry| {
                        (entry.officiality(), Some(entry))
                    }),
            };
            // Fall back to the other class's entry for the sort value, so an edit
            // never silently zeroes a known time.
            let known_ms = existing
                .or_else(|| store.entries_for(&athlete).next())
                .map_or(0, |entry| entry.time_ms);
            let splits = existing.map(|entry| entry.splits.clone()).unwrap_or_default();

            let entry = ResultEntry {
                athlete_id: athlete,
                athlete_name: edit.athlete_name,
                time: fields.time,
                time_ms: fields.time_ms.unwrap_or(known_ms),
                splits,
                rank: fields.rank,
                medal: fields.medal,
                trophy: fields.trophy,
                is_official: officiality.is_official(),
                provenance: Provenance::Manual,
            };
            summary += store.merge([entry], officiality);
        }
        Ok(summary)
    }

    fn parse_edit(&self, edit: &ManualResult) -> Result<ParsedEdit> {
        let rank_text = edit.rank.trim();
        let medal_text = edit.medal.trim();
        let trophy = Some(edit.trophy.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        match self.mode {
            ParseMode::Lenient => Ok(ParsedEdit {
                rank: rank_text.parse::<u32>().ok().filter(|r| *r > 0),
                medal: medal_text.parse::<Medal>().ok(),
                trophy,
                time: edit.time.trim().to_string(),
                time_ms: None,
            }),
            ParseMode::Strict => {
                let rank = if rank_text.is_empty() {
                    None
                } else {
                    Some(
                        rank_text
                            .parse::<u32>()
                            .ok()
                            .filter(|r| *r > 0)
                            .ok_or_else(|| CoreError::malformed("rank", rank_text))?,
                    )
                };
                let medal = if medal_text.is_empty() {
                    None
                } else {
                    Some(
                        medal_text
                            .parse::<Medal>()
                            .map_err(|_| CoreError::malformed("medal", medal_text))?,
                    )
                };
                let time_ms = parse_time(&edit.time)?;
                Ok(ParsedEdit {
                    rank,
                    medal,
                    trophy,
                    time: format_time(time_ms),
                    time_ms: Some(time_ms),
                })
            }
        }
    }
}
