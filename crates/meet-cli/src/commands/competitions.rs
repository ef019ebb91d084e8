//! Competitions command for listing stored competitions.

use std::io::Write;

use anyhow::Result;

use crate::Config;
use crate::commands::util::open_database;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let competitions = db.list_competitions()?;

    if competitions.is_empty() {
        writeln!(writer, "No competitions.")?;
        return Ok(());
    }

    for competition in competitions {
        writeln!(
            writer,
            "{}  {}  {:<9}  {} ({} events)",
            competition.id, competition.date, competition.state, competition.name, competition.event_count
        )?;
    }
    Ok(())
}
