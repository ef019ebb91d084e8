//! Edit command for manual result corrections.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use meet_core::{
    AthleteDirectory, AthleteId, ManualResult, Officiality, ParseMode, ResultReconciler,
};

use crate::Config;
use crate::commands::util::{load_competition, load_roster, open_database, parse_event_id};

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Competition ID.
    pub competition: String,
    /// Event ID.
    pub event: String,
    /// Athlete ID (or relay team key).
    pub athlete: String,

    /// Display time, e.g. 1:01,20.
    #[arg(long)]
    pub time: Option<String>,
    /// Placing; empty clears it.
    #[arg(long)]
    pub rank: Option<String>,
    /// GOLD, SILVER or BRONZE; empty clears it.
    #[arg(long)]
    pub medal: Option<String>,
    /// Trophy label; empty clears it.
    #[arg(long)]
    pub trophy: Option<String>,
    /// Display name when the athlete has no entry yet.
    #[arg(long)]
    pub name: Option<String>,

    /// Edit the official entry.
    #[arg(long, conflicts_with = "unofficial")]
    pub official: bool,
    /// Edit the unofficial entry.
    #[arg(long)]
    pub unofficial: bool,

    /// Reject unparseable values and derive the sort time from --time.
    #[arg(long)]
    pub strict: bool,
}

impl EditArgs {
    const fn officiality(&self) -> Option<Officiality> {
        if self.official {
            Some(Officiality::Official)
        } else if self.unofficial {
            Some(Officiality::Unofficial)
        } else {
            None
        }
    }
}

pub fn run<W: Write>(writer: &mut W, args: &EditArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let mut competition = load_competition(&db, &args.competition)?;
    let event_id = parse_event_id(&args.event)?;
    let athlete = AthleteId::new(args.athlete.as_str()).context("invalid athlete ID")?;
    let requested = args.officiality();

    let event = competition
        .event(&event_id)
        .with_context(|| format!("event not found: {event_id}"))?;
    // Promoting or demoting starts from the athlete's entry in the other class.
    let existing = requested
        .and_then(|officiality| event.results().get(&athlete, officiality))
        .or_else(|| event.results().entries_for(&athlete).next());

    let mut form = if let Some(entry) = existing {
        ManualResult::prefilled(entry)
    } else {
        let roster = load_roster(&db)?;
        let name = args
            .name
            .clone()
            .or_else(|| roster.resolve(&athlete).map(|a| a.name.clone()))
            .unwrap_or_else(|| athlete.to_string());
        ManualResult {
            athlete_id: Some(athlete.clone()),
            athlete_name: name,
            ..ManualResult::default()
        }
    };
    form.officiality = requested.or(form.officiality);
    if let Some(name) = &args.name {
        form.athlete_name.clone_from(name);
    }
    for (field, value) in [
        (&mut form.time, &args.time),
        (&mut form.rank, &args.rank),
        (&mut form.medal, &args.medal),
        (&mut form.trophy, &args.trophy),
    ] {
        if let Some(value) = value {
            field.clone_from(value);
        }
    }
    let officiality = form.officiality.unwrap_or(Officiality::Unofficial);

    let mode = if args.strict || config.strict_edits {
        ParseMode::Strict
    } else {
        ParseMode::Lenient
    };
    let summary = competition.record_manual(&event_id, vec![form], &ResultReconciler::new(mode))?;
    db.save_competition(&competition)?;

    let entry = competition
        .event(&event_id)
        .and_then(|event| event.results().get(&athlete, officiality))
        .with_context(|| format!("edited entry for {athlete} is missing"))?;
    let verb = if summary.inserted > 0 { "Added" } else { "Updated" };
    writeln!(
        writer,
        "{verb} {officiality} result for {} in {event_id}: {} rank {} medal {} trophy {}",
        entry.athlete_name,
        entry.time,
        entry.rank.map_or_else(|| "-".to_string(), |rank| rank.to_string()),
        entry.medal.map_or("-", |medal| medal.as_str()),
        entry.trophy.as_deref().unwrap_or("-"),
    )?;
    Ok(())
}
