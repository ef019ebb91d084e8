//! Lifecycle and roster commands: start, finish, register, unregister.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use meet_core::AthleteId;

use crate::Config;
use crate::commands::util::{load_competition, open_database};

#[derive(Debug, Args)]
pub struct CompetitionArgs {
    /// Competition ID.
    pub competition: String,
}

#[derive(Debug, Args)]
pub struct RosterArgs {
    /// Competition ID.
    pub competition: String,
    /// Athlete ID.
    pub athlete: String,
}

pub fn start<W: Write>(writer: &mut W, args: &CompetitionArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let mut competition = load_competition(&db, &args.competition)?;
    competition.start()?;
    db.save_competition(&competition)?;
    writeln!(writer, "Started {} ({})", competition.name, competition.id)?;
    Ok(())
}

pub fn finish<W: Write>(writer: &mut W, args: &CompetitionArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let mut competition = load_competition(&db, &args.competition)?;
    competition.finish()?;
    db.save_competition(&competition)?;
    writeln!(writer, "Finished {} ({})", competition.name, competition.id)?;
    Ok(())
}

pub fn register<W: Write>(writer: &mut W, args: &RosterArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let mut competition = load_competition(&db, &args.competition)?;
    let athlete = AthleteId::new(args.athlete.as_str()).context("invalid athlete ID")?;
    if competition.register(athlete.clone()) {
        db.save_competition(&competition)?;
        writeln!(writer, "Registered {athlete} for {}", competition.id)?;
    } else {
        writeln!(writer, "{athlete} is already registered for {}", competition.id)?;
    }
    Ok(())
}

pub fn unregister<W: Write>(writer: &mut W, args: &RosterArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let mut competition = load_competition(&db, &args.competition)?;
    let athlete = AthleteId::new(args.athlete.as_str()).context("invalid athlete ID")?;
    if competition.unregister(&athlete) {
        db.save_competition(&competition)?;
        writeln!(writer, "Unregistered {athlete} from {}", competition.id)?;
    } else {
        writeln!(writer, "{athlete} is not registered for {}", competition.id)?;
    }
    Ok(())
}
