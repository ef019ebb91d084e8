//! Results command: official and unofficial standings plus the medal tally.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use meet_core::EventResult;

use crate::Config;
use crate::commands::util::{load_competition, open_database};

#[derive(Debug, Args)]
pub struct ResultsArgs {
    /// Competition ID.
    pub competition: String,
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &ResultsArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let competition = load_competition(&db, &args.competition)?;
    let overview = competition.overview();

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&overview)?)?;
        return Ok(());
    }

    writeln!(
        writer,
        "{} ({}) - {}",
        competition.name,
        competition.id,
        competition.state()
    )?;
    write_section(writer, "Official", &overview.official)?;
    write_section(writer, "Unofficial", &overview.unofficial)?;
    for (event, conflict) in &overview.rank_conflicts {
        let athletes: Vec<&str> = conflict.athletes.iter().map(|id| id.as_str()).collect();
        writeln!(
            writer,
            "Rank conflict in {event}: rank {} shared by {}",
            conflict.rank,
            athletes.join(", ")
        )?;
    }
    let tally = overview.tally;
    writeln!(
        writer,
        "Medals: {} gold, {} silver, {} bronze, {} trophies",
        tally.gold, tally.silver, tally.bronze, tally.trophies
    )?;
    Ok(())
}

fn write_section<W: Write>(writer: &mut W, title: &str, results: &[EventResult<'_>]) -> Result<()> {
    writeln!(writer, "{title}:")?;
    if results.is_empty() {
        writeln!(writer, "  (none)")?;
        return Ok(());
    }
    for result in results {
        let entry = result.entry;
        let mut line = format!(
            "  {:>8}  {}  {}",
            entry.time, entry.athlete_name, result.event_name
        );
        if let Some(rank) = entry.rank {
            line.push_str(&format!("  #{rank}"));
        }
        if let Some(medal) = entry.medal {
            line.push_str(&format!("  {medal}"));
        }
        if let Some(trophy) = &entry.trophy {
            line.push_str(&format!("  [{trophy}]"));
        }
        writeln!(writer, "{line}")?;
    }
    Ok(())
}
