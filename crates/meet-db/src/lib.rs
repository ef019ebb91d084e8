//! Storage layer for swim meet competitions.
//!
//! Provides persistence for the athlete directory and for competition aggregates
//! (events, heats and results) using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared across
//! threads without external synchronization.
//!
//! # Schema
//!
//! Dates are stored as TEXT in `YYYY-MM-DD` form. Heat lane entries and result
//! splits are stored as JSON, in the same shape `meet-core` serializes them.
//!
//! A competition is saved as a whole: [`Database::save_competition`] replaces
//! every row under the competition in one transaction. Live timing state is never
//! stored; a heat that was timing when the process stopped comes back as `timing`
//! and can be re-opened.

use std::path::Path;

use chrono::NaiveDate;
use meet_core::{
    Athlete, AthleteId, Competition, CompetitionId, CompetitionStatus, Event, EventId, EventKind,
    Heat, HeatEntry, HeatId, HeatStatus, LifecycleState, Medal, Provenance, ResultEntry,
    ResultStore, Split, ValidationError,
};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A JSON column could not be encoded or decoded.
    #[error("invalid JSON column: {0}")]
    Json(#[from] serde_json::Error),
    /// A stored value does not fit the domain type.
    #[error("invalid stored {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    /// A stored row failed domain validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The requested competition does not exist.
    #[error("competition not found: {0}")]
    CompetitionNotFound(String),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// One row of the competition listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionSummary {
    pub id: CompetitionId,
    pub name: String,
    pub date: NaiveDate,
    pub state: LifecycleState,
    pub event_count: usize,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS athletes (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_athletes_name ON athletes(name);

            -- status: 'upcoming' | 'past'
            -- is_active is only ever set while status is 'upcoming'
            CREATE TABLE IF NOT EXISTS competitions (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                location TEXT NOT NULL DEFAULT '',
                date TEXT NOT NULL,
                end_date TEXT,
                category TEXT NOT NULL DEFAULT '',
                sub_category TEXT,
                status TEXT NOT NULL DEFAULT 'upcoming',
                is_active INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_competitions_date ON competitions(date);

            CREATE TABLE IF NOT EXISTS competition_athletes (
                competition_id TEXT NOT NULL,
                athlete_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (competition_id, athlete_id),
                FOREIGN KEY (competition_id) REFERENCES competitions(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS events (
                competition_id TEXT NOT NULL,
                id TEXT NOT NULL,
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                stage TEXT NOT NULL DEFAULT '',
                kind TEXT NOT NULL DEFAULT 'individual',
                PRIMARY KEY (competition_id, id),
                FOREIGN KEY (competition_id) REFERENCES competitions(id) ON DELETE CASCADE
            );

            -- entries: JSON array of lane entries
            CREATE TABLE IF NOT EXISTS heats (
                competition_id TEXT NOT NULL,
                event_id TEXT NOT NULL,
                id TEXT NOT NULL,
                number INTEGER NOT NULL,
                time TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                entries TEXT NOT NULL,
                PRIMARY KEY (competition_id, event_id, id),
                FOREIGN KEY (competition_id, event_id)
                    REFERENCES events(competition_id, id) ON DELETE CASCADE
            );

            -- splits: JSON array of {distance, time_ms}
            CREATE TABLE IF NOT EXISTS results (
                competition_id TEXT NOT NULL,
                event_id TEXT NOT NULL,
                athlete_id TEXT NOT NULL,
                is_official INTEGER NOT NULL,
                athlete_name TEXT NOT NULL,
                time TEXT NOT NULL,
                time_ms INTEGER NOT NULL,
                splits TEXT NOT NULL DEFAULT '[]',
                rank INTEGER,
                medal TEXT,
                trophy TEXT,
                provenance TEXT NOT NULL,
                PRIMARY KEY (competition_id, event_id, athlete_id, is_official),
                FOREIGN KEY (competition_id, event_id)
                    REFERENCES events(competition_id, id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_results_athlete ON results(athlete_id);
            ",
        )?;
        Ok(())
    }

    /// Inserts or updates athletes by ID. Returns the number of rows written.
    pub fn upsert_athletes(&mut self, athletes: &[Athlete]) -> Result<usize, DbError> {
        if athletes.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO athletes (id, name, category) VALUES (?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET name = excluded.name, category = excluded.category
                ",
            )?;
            for athlete in athletes {
                written += stmt.execute(params![
                    athlete.id.as_str(),
                    athlete.name,
                    athlete.category
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(written, "athletes upserted");
        Ok(written)
    }

    /// Lists the athlete directory ordered by name then ID.
    pub fn list_athletes(&self) -> Result<Vec<Athlete>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, category FROM athletes ORDER BY name ASC, id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut athletes = Vec::new();
        for row in rows {
            let (id, name, category) = row?;
            athletes.push(Athlete {
                id: AthleteId::new(id)?,
                name,
                category,
            });
        }
        Ok(athletes)
    }

    /// Stores a competition, replacing whatever was stored under its ID.
    pub fn save_competition(&mut self, competition: &Competition) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM competitions WHERE id = ?",
            [competition.id.as_str()],
        )?;
        tx.execute(
            "
            INSERT INTO competitions
            (id, name, location, date, end_date, category, sub_category, status, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                competition.id.as_str(),
                competition.name,
                competition.location,
                format_date(competition.date),
                competition.end_date.map(format_date),
                competition.category,
                competition.sub_category,
                competition.status().as_str(),
                competition.is_active(),
            ],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO competition_athletes (competition_id, athlete_id, position) VALUES (?, ?, ?)",
            )?;
            for (position, athlete) in competition.registered_athletes().iter().enumerate() {
                stmt.execute(params![
                    competition.id.as_str(),
                    athlete.as_str(),
                    to_i64(position, "position")?
                ])?;
            }
        }
        for (position, event) in competition.events().iter().enumerate() {
            insert_event(&tx, &competition.id, position, event)?;
        }
        tx.commit()?;
        tracing::debug!(competition = %competition.id, events = competition.events().len(), "competition saved");
        Ok(())
    }

    /// Loads a full competition aggregate.
    pub fn load_competition(&self, id: &CompetitionId) -> Result<Competition, DbError> {
        let row = self
            .conn
            .query_row(
                "
                SELECT name, location, date, end_date, category, sub_category, status, is_active
                FROM competitions WHERE id = ?
                ",
                [id.as_str()],
                |row| {
                    Ok(CompetitionRow {
                        name: row.get(0)?,
                        location: row.get(1)?,
                        date: row.get(2)?,
                        end_date: row.get(3)?,
                        category: row.get(4)?,
                        sub_category: row.get(5)?,
                        status: row.get(6)?,
                        is_active: row.get(7)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| DbError::CompetitionNotFound(id.to_string()))?;

        let status: CompetitionStatus = parse_field(&row.status, "competition status")?;
        let mut competition = Competition::new(id.clone(), row.name, parse_date(&row.date)?)
            .with_lifecycle(status, row.is_active);
        competition.location = row.location;
        competition.end_date = row.end_date.as_deref().map(parse_date).transpose()?;
        competition.category = row.category;
        competition.sub_category = row.sub_category;

        for athlete in self.registered_athletes(id)? {
            competition.register(athlete);
        }
        for event in self.load_events(id)? {
            competition.add_event(event)?;
        }
        Ok(competition)
    }

    /// Lists competitions, most recent date first.
    pub fn list_competitions(&self) -> Result<Vec<CompetitionSummary>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT c.id, c.name, c.date, c.status, c.is_active,
                   (SELECT COUNT(*) FROM events e WHERE e.competition_id = c.id)
            FROM competitions c
            ORDER BY c.date DESC, c.id ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, bool>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;
        let mut competitions = Vec::new();
        for row in rows {
            let (id, name, date, status, is_active, event_count) = row?;
            let status: CompetitionStatus = parse_field(&status, "competition status")?;
            let id = CompetitionId::new(id)?;
            let date = parse_date(&date)?;
            let state = Competition::new(id.clone(), name.clone(), date)
                .with_lifecycle(status, is_active)
                .state();
            competitions.push(CompetitionSummary {
                id,
                name,
                date,
                state,
                event_count: usize::try_from(event_count).unwrap_or_default(),
            });
        }
        Ok(competitions)
    }

    fn registered_athletes(&self, competition: &CompetitionId) -> Result<Vec<AthleteId>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT athlete_id FROM competition_athletes
            WHERE competition_id = ?
            ORDER BY position ASC
            ",
        )?;
        let rows = stmt.query_map([competition.as_str()], |row| row.get::<_, String>(0))?;
        let mut athletes = Vec::new();
        for row in rows {
            athletes.push(AthleteId::new(row?)?);
        }
        Ok(athletes)
    }

    fn load_events(&self, competition: &CompetitionId) -> Result<Vec<Event>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, name, stage, kind FROM events
            WHERE competition_id = ?
            ORDER BY position ASC
            ",
        )?;
        let rows = stmt.query_map([competition.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut events = Vec::new();
        for row in rows {
            let (id, name, stage, kind) = row?;
            let kind: EventKind = parse_field(&kind, "event kind")?;
            let id = EventId::new(id)?;
            let results = self.load_results(competition, &id)?;
            let mut event = Event::new(id, name, kind)
                .with_stage(stage)
                .with_results(results);
            for heat in self.load_heats(competition, &event.id)? {
                event.add_heat(heat)?;
            }
            events.push(event);
        }
        Ok(events)
    }

    fn load_heats(&self, competition: &CompetitionId, event: &EventId) -> Result<Vec<Heat>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, number, time, status, entries FROM heats
            WHERE competition_id = ? AND event_id = ?
            ORDER BY number ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([competition.as_str(), event.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;
        let mut heats = Vec::new();
        for row in rows {
            let (id, number, time, status, entries) = row?;
            let status: HeatStatus = parse_field(&status, "heat status")?;
            let entries: Vec<HeatEntry> = serde_json::from_str(&entries)?;
            let mut heat = Heat::new(HeatId::new(id)?, number, entries)?.with_status(status);
            heat.time = time;
            heats.push(heat);
        }
        Ok(heats)
    }

    fn load_results(&self, competition: &CompetitionId, event: &EventId) -> Result<ResultStore, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT athlete_id, is_official, athlete_name, time, time_ms, splits, rank, medal, trophy, provenance
            FROM results
            WHERE competition_id = ? AND event_id = ?
            ORDER BY is_official DESC, athlete_id ASC
            ",
        )?;
        let rows = stmt.query_map([competition.as_str(), event.as_str()], |row| {
            Ok(ResultRow {
                athlete_id: row.get(0)?,
                is_official: row.get(1)?,
                athlete_name: row.get(2)?,
                time: row.get(3)?,
                time_ms: row.get(4)?,
                splits: row.get(5)?,
                rank: row.get(6)?,
                medal: row.get(7)?,
                trophy: row.get(8)?,
                provenance: row.get(9)?,
            })
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.into_entry()?);
        }
        Ok(ResultStore::from(entries))
    }
}

struct CompetitionRow {
    name: String,
    location: String,
    date: String,
    end_date: Option<String>,
    category: String,
    sub_category: Option<String>,
    status: String,
    is_active: bool,
}

struct ResultRow {
    athlete_id: String,
    is_official: bool,
    athlete_name: String,
    time: String,
    time_ms: i64,
    splits: String,
    rank: Option<u32>,
    medal: Option<String>,
    trophy: Option<String>,
    provenance: String,
}

impl ResultRow {
    fn into_entry(self) -> Result<ResultEntry, DbError> {
        let splits: Vec<Split> = serde_json::from_str(&self.splits)?;
        let medal = self
            .medal
            .as_deref()
            .map(|medal| parse_field::<Medal>(medal, "medal"))
            .transpose()?;
        Ok(ResultEntry {
            athlete_id: AthleteId::new(self.athlete_id)?,
            athlete_name: self.athlete_name,
            time: self.time,
            time_ms: u64::try_from(self.time_ms).map_err(|_| DbError::InvalidValue {
                field: "time_ms",
                value: self.time_ms.to_string(),
            })?,
            splits,
            rank: self.rank,
            medal,
            trophy: self.trophy,
            is_official: self.is_official,
            provenance: parse_field::<Provenance>(&self.provenance, "provenance")?,
        })
    }
}

fn insert_event(
    tx: &Transaction<'_>,
    competition: &CompetitionId,
    position: usize,
    event: &Event,
) -> Result<(), DbError> {
    tx.execute(
        "INSERT INTO events (competition_id, id, position, name, stage, kind) VALUES (?, ?, ?, ?, ?, ?)",
        params![
            competition.as_str(),
            event.id.as_str(),
            to_i64(position, "position")?,
            event.name,
            event.stage,
            event.kind.as_str(),
        ],
    )?;

    let mut heat_stmt = tx.prepare(
        "
        INSERT INTO heats (competition_id, event_id, id, number, time, status, entries)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ",
    )?;
    for heat in event.heats() {
        heat_stmt.execute(params![
            competition.as_str(),
            event.id.as_str(),
            heat.id.as_str(),
            heat.number,
            heat.time,
            heat.status().as_str(),
            serde_json::to_string(heat.entries())?,
        ])?;
    }

    let mut result_stmt = tx.prepare(
        "
        INSERT INTO results
        (competition_id, event_id, athlete_id, is_official, athlete_name, time, time_ms, splits, rank, medal, trophy, provenance)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ",
    )?;
    for entry in event.results().iter() {
        result_stmt.execute(params![
            competition.as_str(),
            event.id.as_str(),
            entry.athlete_id.as_str(),
            entry.is_official,
            entry.athlete_name,
            entry.time,
            to_i64(entry.time_ms, "time_ms")?,
            serde_json::to_string(&entry.splits)?,
            entry.rank,
            entry.medal.map(|medal| medal.as_str()),
            entry.trophy,
            entry.provenance.as_str(),
        ])?;
    }
    Ok(())
}

fn to_i64<N>(value: N, field: &'static str) -> Result<i64, DbError>
where
    N: TryInto<i64> + Copy + ToString,
{
    value.try_into().map_err(|_| DbError::InvalidValue {
        field,
        value: value.to_string(),
    })
}

fn parse_field<T: std::str::FromStr>(value: &str, field: &'static str) -> Result<T, DbError> {
    value.parse().map_err(|_| DbError::InvalidValue {
        field,
        value: value.to_string(),
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| DbError::InvalidValue {
        field: "date",
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use meet_core::{ManualResult, ManualTime, Officiality, ResultReconciler};
    use std::collections::HashSet;

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        assert_eq!(
            table_columns(&db.conn, "competitions"),
            vec![
                "id",
                "name",
                "location",
                "date",
                "end_date",
                "category",
                "sub_category",
                "status",
                "is_active",
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "results"),
            vec![
                "competition_id",
                "event_id",
                "athlete_id",
                "is_official",
                "athlete_name",
                "time",
                "time_ms",
                "splits",
                "rank",
                "medal",
                "trophy",
                "provenance",
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "heats"),
            vec!["competition_id", "event_id", "id", "number", "time", "status", "entries"]
        );

        assert!(index_names(&db.conn, "results").contains("idx_results_athlete"));
        assert!(index_names(&db.conn, "competitions").contains("idx_competitions_date"));

        let result_fks = foreign_keys(&db.conn, "results");
        assert_eq!(result_fks.len(), 2, "composite key to events");
        assert!(result_fks.iter().all(|(table, _, _, on_delete)| table == "events" && on_delete == "CASCADE"));

        let event_fks = foreign_keys(&db.conn, "events");
        assert_eq!(
            event_fks,
            vec![(
                "competitions".to_string(),
                "competition_id".to_string(),
                "id".to_string(),
                "CASCADE".to_string(),
            )]
        );
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    fn foreign_keys(conn: &Connection, table: &str) -> Vec<(String, String, String, String)> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA foreign_key_list({table})"))
            .expect("prepare foreign_key_list");
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(6)?,
                ))
            })
            .expect("query foreign_key_list");
        rows.map(|row| row.expect("foreign_key_list row")).collect()
    }

    fn athlete(id: &str, name: &str) -> Athlete {
        Athlete {
            id: AthleteId::new(id).unwrap(),
            name: name.to_string(),
            category: "Junior".to_string(),
        }
    }

    fn sample_competition() -> Competition {
        let mut competition = Competition::new(
            CompetitionId::new("comp-1").unwrap(),
            "Torneio Regional",
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        );
        competition.location = "Piscina Municipal".to_string();
        competition.end_date = NaiveDate::from_ymd_opt(2026, 3, 15);
        competition.sub_category = Some("Infantil".to_string());
        competition.register(AthleteId::new("ath-joao").unwrap());
        competition.register(AthleteId::new("ath-ana").unwrap());

        let mut event = Event::new(EventId::new("ev-1").unwrap(), "100m Livre", EventKind::Individual)
            .with_stage("Final");
        let mut heat = Heat::new(
            HeatId::new("h1").unwrap(),
            1,
            vec![
                HeatEntry::individual(4, AthleteId::new("ath-joao").unwrap()),
                HeatEntry::individual(5, AthleteId::new("ath-ana").unwrap()),
            ],
        )
        .unwrap();
        heat.time = Some("09:30".to_string());
        event.add_heat(heat).unwrap();
        competition.add_event(event).unwrap();

        let mut relay = Event::new(EventId::new("ev-2").unwrap(), "4x50m Livre", EventKind::Relay);
        relay
            .add_heat(
                Heat::new(
                    HeatId::new("r1").unwrap(),
                    1,
                    vec![
                        HeatEntry::relay(
                            2,
                            vec![
                                AthleteId::new("ath-joao").unwrap(),
                                AthleteId::new("ath-ana").unwrap(),
                            ],
                        )
                        .unwrap(),
                    ],
                )
                .unwrap(),
            )
            .unwrap();
        competition.add_event(relay).unwrap();
        competition
    }

    #[test]
    fn upsert_athletes_updates_in_place() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        db.upsert_athletes(&[athlete("a", "Ana Costa"), athlete("b", "Bruno Lima")])
            .unwrap();
        db.upsert_athletes(&[athlete("a", "Ana C. Costa")]).unwrap();

        let names: Vec<String> = db
            .list_athletes()
            .unwrap()
            .into_iter()
            .map(|athlete| athlete.name)
            .collect();
        assert_eq!(names, vec!["Ana C. Costa", "Bruno Lima"]);
    }

    #[test]
    fn competition_roundtrips_with_live_results() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let mut competition = sample_competition();
        competition.start().unwrap();

        let time = ManualTime::new();
        let mut session = competition
            .open_heat(
                &EventId::new("ev-1").unwrap(),
                &HeatId::new("h1").unwrap(),
                time.clone(),
            )
            .unwrap();
        session.start();
        time.advance(30_000);
        session.record_split(4, "50m").unwrap();
        time.advance(28_320);
        session.finish_lane(4).unwrap();
        competition
            .save_heat(session, &meet_core::AthleteRoster::default())
            .unwrap();

        db.save_competition(&competition).unwrap();
        let loaded = db.load_competition(&competition.id).unwrap();
        assert_eq!(loaded, competition);

        let entry = loaded.events()[0]
            .results()
            .get(&AthleteId::new("ath-joao").unwrap(), Officiality::Unofficial)
            .unwrap();
        assert_eq!(entry.splits.len(), 1);
        assert_eq!(entry.time_ms, 58_320);
    }

    #[test]
    fn save_replaces_previous_rows() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let mut competition = sample_competition();
        db.save_competition(&competition).unwrap();

        competition.unregister(&AthleteId::new("ath-ana").unwrap());
        competition.start().unwrap();
        competition.finish().unwrap();
        db.save_competition(&competition).unwrap();

        let loaded = db.load_competition(&competition.id).unwrap();
        assert_eq!(loaded.state(), LifecycleState::Past);
        assert_eq!(loaded.registered_athletes().len(), 1);

        let heats: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM heats", [], |row| row.get(0))
            .unwrap();
        assert_eq!(heats, 2);
    }

    #[test]
    fn official_and_unofficial_rows_coexist() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let mut competition = sample_competition();
        let reconciler = ResultReconciler::default();
        competition
            .record_manual(
                &EventId::new("ev-1").unwrap(),
                vec![ManualResult {
                    athlete_id: Some(AthleteId::new("ath-ana").unwrap()),
                    athlete_name: "Ana Costa".to_string(),
                    time: "1:02,00".to_string(),
                    rank: "2".to_string(),
                    medal: "SILVER".to_string(),
                    officiality: Some(Officiality::Official),
                    ..ManualResult::default()
                }],
                &reconciler,
            )
            .unwrap();
        competition
            .record_manual(
                &EventId::new("ev-1").unwrap(),
                vec![ManualResult {
                    athlete_id: Some(AthleteId::new("ath-ana").unwrap()),
                    athlete_name: "Ana Costa".to_string(),
                    time: "1:02,10".to_string(),
                    officiality: Some(Officiality::Unofficial),
                    ..ManualResult::default()
                }],
                &reconciler,
            )
            .unwrap();
        db.save_competition(&competition).unwrap();
        let loaded = db.load_competition(&competition.id).unwrap();
        let results = loaded.events()[0].results();
        assert_eq!(results.len(), 2);
        assert_eq!(loaded.tally().silver, 1);
    }

    #[test]
    fn list_competitions_reports_state() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let mut active = sample_competition();
        active.start().unwrap();
        db.save_competition(&active).unwrap();

        let later = Competition::new(
            CompetitionId::new("comp-2").unwrap(),
            "Copa de Inverno",
            NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
        );
        db.save_competition(&later).unwrap();

        let listed = db.list_competitions().unwrap();
        let summary: Vec<(&str, LifecycleState, usize)> = listed
            .iter()
            .map(|c| (c.id.as_str(), c.state, c.event_count))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("comp-2", LifecycleState::Scheduled, 0),
                ("comp-1", LifecycleState::Active, 2),
            ]
        );
    }

    #[test]
    fn load_missing_competition_fails() {
        let db = Database::open_in_memory().expect("open in-memory db");
        let err = db
            .load_competition(&CompetitionId::new("nope").unwrap())
            .unwrap_err();
        assert!(matches!(err, DbError::CompetitionNotFound(id) if id == "nope"));
    }

    #[test]
    fn corrupt_status_is_reported() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        db.save_competition(&sample_competition()).unwrap();
        db.conn
            .execute("UPDATE competitions SET status = 'cancelled'", [])
            .unwrap();
        let err = db
            .load_competition(&CompetitionId::new("comp-1").unwrap())
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidValue { field: "competition status", .. }));
    }

    #[test]
    fn database_persists_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meet.db");
        {
            let mut db = Database::open(&path).unwrap();
            db.save_competition(&sample_competition()).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.list_competitions().unwrap().len(), 1);
    }
}
