//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::edit::EditArgs;
use crate::commands::import::ImportArgs;
use crate::commands::lifecycle::{CompetitionArgs, RosterArgs};
use crate::commands::load::LoadArgs;
use crate::commands::results::ResultsArgs;
use crate::commands::time::TimeArgs;

/// Live heat timing and results for swim meets.
///
/// Times heats lane by lane, takes manual corrections, and reconciles results
/// imported from scanned sheets with what was timed at the pool.
#[derive(Debug, Parser)]
#[command(name = "meet", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load athletes and competitions from a JSON snapshot.
    Load(LoadArgs),

    /// List stored competitions.
    Competitions,

    /// Mark a scheduled competition as in progress.
    Start(CompetitionArgs),

    /// Close an in-progress competition.
    Finish(CompetitionArgs),

    /// Add an athlete to a competition's roster.
    Register(RosterArgs),

    /// Remove an athlete from a competition's roster.
    Unregister(RosterArgs),

    /// Time a heat interactively, reading commands from stdin.
    Time(TimeArgs),

    /// Add or correct one athlete's result by hand.
    Edit(EditArgs),

    /// Import results extracted from a scanned results sheet.
    Import(ImportArgs),

    /// Show official and unofficial results with the medal tally.
    Results(ResultsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn edit_flags_conflict() {
        let parsed = Cli::try_parse_from([
            "meet",
            "edit",
            "comp-1",
            "ev-100-free",
            "ath-ana",
            "--official",
            "--unofficial",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parses_time_command() {
        let cli = Cli::try_parse_from(["meet", "-v", "time", "comp-1", "ev-100-free", "heat-1"])
            .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Time(args)) => {
                assert_eq!(args.competition, "comp-1");
                assert_eq!(args.event, "ev-100-free");
                assert_eq!(args.heat, "heat-1");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
