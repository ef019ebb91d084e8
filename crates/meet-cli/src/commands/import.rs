//! Import command for results extracted from a scanned results sheet.
//!
//! Reads a JSON array of `{eventName, athleteName, time, rank, medal}` rows, as
//! produced by the extraction service, from a file or stdin.

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use meet_core::{ExtractedResult, ImportReconciler};

use crate::Config;
use crate::commands::util::{load_competition, load_roster, open_database};

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Competition ID.
    pub competition: String,
    /// Read rows from this file instead of stdin.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

pub fn run<R: Read, W: Write>(
    mut reader: R,
    writer: &mut W,
    args: &ImportArgs,
    config: &Config,
) -> Result<()> {
    let content = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut content = String::new();
            reader
                .read_to_string(&mut content)
                .context("failed to read stdin")?;
            content
        }
    };
    let rows: Vec<ExtractedResult> = if content.trim().is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&content).context("failed to parse extracted results")?
    };

    let mut db = open_database(config)?;
    let mut competition = load_competition(&db, &args.competition)?;
    let roster = load_roster(&db)?;

    let report = ImportReconciler::new().import(&mut competition, &rows, &roster)?;
    if report.applied() > 0 {
        db.save_competition(&competition)?;
    }

    writeln!(writer, "Imported {} rows into {}", rows.len(), competition.id)?;
    for event in &report.events {
        writeln!(
            writer,
            "- {}: {} matched ({} new, {} replaced, {} unchanged)",
            event.event_name,
            event.matched,
            event.summary.inserted,
            event.summary.replaced,
            event.summary.unchanged
        )?;
    }
    if !report.unresolved_names.is_empty() {
        writeln!(
            writer,
            "Unresolved athletes (stored under placeholder IDs): {}",
            report.unresolved_names.join(", ")
        )?;
    }
    if !report.unmatched_events.is_empty() {
        writeln!(
            writer,
            "Rows matching no event: {}",
            report.unmatched_events.join(", ")
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use meet_core::{AthleteId, EventId, Medal, Officiality};

    use crate::commands::testing::seeded;

    fn args() -> ImportArgs {
        ImportArgs {
            competition: "comp-1".to_string(),
            file: None,
        }
    }

    #[test]
    fn import_from_stdin() {
        let temp = tempfile::tempdir().unwrap();
        let config = seeded(temp.path());
        let input = r#"[
            {"eventName":"100m Livre — Final A","athleteName":"João Silva","time":"1:01,20","rank":2,"medal":"SILVER"},
            {"eventName":"100m Livre","athleteName":"Joao Silva","time":"1:03,00","rank":"4"},
            {"eventName":"200m Borboleta","athleteName":"Ana Costa","time":"2:30,00"}
        ]"#;

        let mut output = Vec::new();
        run(input.as_bytes(), &mut output, &args(), &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Imported 3 rows into comp-1
        - 100m Livre: 2 matched (2 new, 0 replaced, 0 unchanged)
        Unresolved athletes (stored under placeholder IDs): Joao Silva
        Rows matching no event: 200m Borboleta
        ");

        let db = open_database(&config).unwrap();
        let competition = load_competition(&db, "comp-1").unwrap();
        let entry = competition
            .event(&EventId::new("ev-100-free").unwrap())
            .unwrap()
            .results()
            .get(&AthleteId::new("ath-joao").unwrap(), Officiality::Official)
            .unwrap()
            .clone();
        assert_eq!(entry.rank, Some(2));
        assert_eq!(entry.medal, Some(Medal::Silver));
    }

    #[test]
    fn import_from_file_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let config = seeded(temp.path());
        let file = temp.path().join("rows.json");
        std::fs::write(
            &file,
            r#"[{"eventName":"100m Livre","athleteName":"Ana Costa","time":"1:05,00","timeMs":65000}]"#,
        )
        .unwrap();
        let args = ImportArgs {
            competition: "comp-1".to_string(),
            file: Some(file),
        };

        run(std::io::empty(), &mut Vec::new(), &args, &config).unwrap();
        let mut output = Vec::new();
        run(std::io::empty(), &mut output, &args, &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Imported 1 rows into comp-1
        - 100m Livre: 1 matched (0 new, 0 replaced, 1 unchanged)
        ");
    }

    #[test]
    fn empty_input_is_noop() {
        let temp = tempfile::tempdir().unwrap();
        let config = seeded(temp.path());

        let mut output = Vec::new();
        run("".as_bytes(), &mut output, &args(), &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @"Imported 0 rows into comp-1");
    }

    #[test]
    fn malformed_json_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let config = seeded(temp.path());
        let err = run("{not json".as_bytes(), &mut Vec::new(), &args(), &config).unwrap_err();
        assert!(err.to_string().contains("failed to parse extracted results"));
    }
}
