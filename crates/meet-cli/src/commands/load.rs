//! Load command for seeding athletes and competitions from a JSON snapshot.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;

use meet_core::{Athlete, Competition};

use crate::Config;
use crate::commands::util::open_database;

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// JSON file with `athletes` and `competitions` arrays.
    pub file: PathBuf,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    athletes: Vec<Athlete>,
    #[serde(default)]
    competitions: Vec<Competition>,
}

pub fn run<W: Write>(writer: &mut W, args: &LoadArgs, config: &Config) -> Result<()> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;

    for competition in &snapshot.competitions {
        competition
            .validate()
            .with_context(|| format!("invalid competition {}", competition.id))?;
    }

    let mut db = open_database(config)?;
    let athletes = db.upsert_athletes(&snapshot.athletes)?;
    for competition in snapshot.competitions.iter().cloned() {
        let competition = {
            let (status, is_active) = (competition.status(), competition.is_active());
            competition.with_lifecycle(status, is_active)
        };
        db.save_competition(&competition)
            .with_context(|| format!("failed to save competition {}", competition.id))?;
    }

    tracing::info!(athletes, competitions = snapshot.competitions.len(), "snapshot loaded");
    writeln!(
        writer,
        "Loaded {athletes} athletes and {} competitions",
        snapshot.competitions.len()
    )?;
    Ok(())
}
