//! Shared utilities for CLI commands.

use anyhow::{Context, Result};

use meet_core::{AthleteRoster, Competition, CompetitionId, EventId};
use meet_db::Database;

use crate::Config;

/// Opens the configured database, creating its directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

/// Loads a competition by its command-line ID.
pub fn load_competition(db: &Database, id: &str) -> Result<Competition> {
    let id = CompetitionId::new(id).context("invalid competition ID")?;
    db.load_competition(&id)
        .with_context(|| format!("failed to load competition {id}"))
}

/// The athlete directory as currently stored.
pub fn load_roster(db: &Database) -> Result<AthleteRoster> {
    Ok(AthleteRoster::new(
        db.list_athletes().context("failed to list athletes")?,
    ))
}

pub fn parse_event_id(id: &str) -> Result<EventId> {
    EventId::new(id).context("invalid event ID")
}
