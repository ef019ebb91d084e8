//! Time command: interactive live timing for one heat.
//!
//! Reads one command per line from stdin. The heat is marked timing as soon as
//! the session opens; only `save` writes results. Quitting or reaching end of
//! input discards the session and leaves the heat timing, so it can be re-opened.

use std::fmt::Write as _;
use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Args;

use meet_core::{ClockState, CoreError, HeatId, HeatSession, MonotonicTime, TimeSource, format_time};

use crate::Config;
use crate::commands::util::{load_competition, load_roster, open_database, parse_event_id};

const USAGE: &str = "start, pause, split <lane> [label], finish <lane>, reset, status, save, quit";

#[derive(Debug, Args)]
pub struct TimeArgs {
    /// Competition ID.
    pub competition: String,
    /// Event ID.
    pub event: String,
    /// Heat ID.
    pub heat: String,
}

/// One operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Start,
    Pause,
    /// Without a label the next conventional distance is used.
    Split { lane: u8, label: Option<String> },
    Finish { lane: u8 },
    Reset,
    Status,
    Save,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_lowercase();
        let lane = |arg: Option<&str>| -> Result<u8, String> {
            let arg = arg.ok_or_else(|| format!("{verb} needs a lane number"))?;
            arg.parse().map_err(|_| format!("invalid lane: {arg}"))
        };
        let command = match verb.as_str() {
            "start" => Self::Start,
            "pause" => Self::Pause,
            "split" => Self::Split {
                lane: lane(parts.next())?,
                label: parts.next().map(str::to_string),
            },
            "finish" => Self::Finish {
                lane: lane(parts.next())?,
            },
            "reset" => Self::Reset,
            "status" => Self::Status,
            "save" => Self::Save,
            "quit" | "exit" => Self::Quit,
            _ => return Err(format!("unknown command: {s} (expected {USAGE})")),
        };
        Ok(command)
    }
}

const fn clock_label(state: ClockState) -> &'static str {
    match state {
        ClockState::Stopped => "stopped",
        ClockState::Running => "running",
        ClockState::Paused => "paused",
    }
}

/// Applies a timing command to the session and returns the reply to print.
///
/// `save` and `quit` end the session and are handled by the caller.
pub fn apply<T: TimeSource>(
    session: &mut HeatSession<T>,
    command: &SessionCommand,
    split_step_m: u32,
) -> Result<String, CoreError> {
    let reply = match command {
        SessionCommand::Start => {
            if session.start() {
                format!("clock running at {}", format_time(session.elapsed_ms()))
            } else {
                "clock already running".to_string()
            }
        }
        SessionCommand::Pause => {
            if session.pause() {
                format!("clock paused at {}", format_time(session.elapsed_ms()))
            } else {
                "clock is not running".to_string()
            }
        }
        SessionCommand::Split { lane, label } => {
            let split = match label {
                Some(label) => session.record_split(*lane, label.as_str())?,
                None => session.record_next_split(*lane, split_step_m)?,
            };
            format!("lane {lane} split {} {}", split.distance, format_time(split.time_ms))
        }
        SessionCommand::Finish { lane } => {
            let time_ms = session.finish_lane(*lane)?;
            format!("lane {lane} finished {}", format_time(time_ms))
        }
        SessionCommand::Reset => {
            session.reset_heat();
            "heat reset".to_string()
        }
        SessionCommand::Status => status(session),
        SessionCommand::Save | SessionCommand::Quit => String::new(),
    };
    Ok(reply)
}

fn status<T: TimeSource>(session: &HeatSession<T>) -> String {
    let mut out = format!(
        "clock {} {}",
        clock_label(session.clock_state()),
        format_time(session.elapsed_ms())
    );
    for timing in session.lanes() {
        let who = timing
            .competitor
            .result_key()
            .map_or_else(|_| "?".to_string(), |id| id.to_string());
        let _ = write!(out, "\nlane {} {who}:", timing.lane);
        if timing.splits().is_empty() && !timing.is_finished() {
            out.push_str(" -");
        }
        for split in timing.splits() {
            let _ = write!(out, " {} {}", split.distance, format_time(split.time_ms));
        }
        if let Some(final_ms) = timing.final_time_ms() {
            let _ = write!(out, " | finished {}", format_time(final_ms));
        }
    }
    out
}

pub fn run<R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
    args: &TimeArgs,
    config: &Config,
) -> Result<()> {
    run_with_source(reader, writer, args, config, MonotonicTime::new())
}

fn run_with_source<T: TimeSource, R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
    args: &TimeArgs,
    config: &Config,
    source: T,
) -> Result<()> {
    let mut db = open_database(config)?;
    let mut competition = load_competition(&db, &args.competition)?;
    let roster = load_roster(&db)?;
    let event_id = parse_event_id(&args.event)?;
    let heat_id = HeatId::new(args.heat.as_str()).context("invalid heat ID")?;

    let mut session = competition.open_heat(&event_id, &heat_id, source)?;
    db.save_competition(&competition)?;

    let lanes: Vec<String> = session
        .lanes()
        .iter()
        .map(|timing| timing.lane.to_string())
        .collect();
    writeln!(
        writer,
        "Timing heat {heat_id} (lanes {}). Commands: {USAGE}",
        lanes.join(", ")
    )?;

    for line in reader.lines() {
        let line = line.context("failed to read command")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let command = match line.parse::<SessionCommand>() {
            Ok(command) => command,
            Err(message) => {
                writeln!(writer, "error: {message}")?;
                continue;
            }
        };
        match command {
            SessionCommand::Save => {
                if let Err(err) = competition.check_save(&session) {
                    writeln!(writer, "error: {err}")?;
                    continue;
                }
                let report = competition.save_heat(session, &roster)?;
                db.save_competition(&competition)?;
                writeln!(
                    writer,
                    "Saved heat {heat_id}: {} lanes saved, {} without a finish",
                    report.saved_lanes.len(),
                    report.dropped_lanes.len()
                )?;
                return Ok(());
            }
            SessionCommand::Quit => break,
            other => match apply(&mut session, &other, config.split_distance_m) {
                Ok(reply) => writeln!(writer, "{reply}")?,
                Err(err) => writeln!(writer, "error: {err}")?,
            },
        }
    }

    writeln!(writer, "Session discarded; heat {heat_id} is still timing")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use meet_core::{
        CompetitionId, EventId, Heat, HeatEntry, HeatStatus, ManualTime, Officiality,
    };

    use crate::commands::testing::seeded;

    fn session() -> (HeatSession<ManualTime>, ManualTime) {
        let heat = Heat::new(
            HeatId::new("heat-1").unwrap(),
            1,
            vec![
                HeatEntry::individual(4, meet_core::AthleteId::new("ath-joao").unwrap()),
                HeatEntry::individual(5, meet_core::AthleteId::new("ath-ana").unwrap()),
            ],
        )
        .unwrap();
        let time = ManualTime::new();
        let session = HeatSession::new(
            CompetitionId::new("comp-1").unwrap(),
            EventId::new("ev-100-free").unwrap(),
            &heat,
            time.clone(),
        );
        (session, time)
    }

    fn parse(line: &str) -> SessionCommand {
        line.parse().unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse("START"), SessionCommand::Start);
        assert_eq!(
            parse("split 4 100m"),
            SessionCommand::Split {
                lane: 4,
                label: Some("100m".to_string())
            }
        );
        assert_eq!(parse("split 4"), SessionCommand::Split { lane: 4, label: None });
        assert_eq!(parse("finish 5"), SessionCommand::Finish { lane: 5 });
        assert!("finish".parse::<SessionCommand>().unwrap_err().contains("needs a lane"));
        assert!("split x".parse::<SessionCommand>().unwrap_err().contains("invalid lane"));
        assert!("lap 4".parse::<SessionCommand>().unwrap_err().starts_with("unknown command"));
    }

    #[test]
    fn timed_race_replies() {
        let (mut session, time) = session();
        let mut replies = Vec::new();
        replies.push(apply(&mut session, &SessionCommand::Start, 50).unwrap());
        time.advance(30_000);
        replies.push(apply(&mut session, &parse("split 4"), 50).unwrap());
        time.advance(1_250);
        replies.push(apply(&mut session, &parse("split 5 50m"), 50).unwrap());
        time.advance(27_070);
        replies.push(apply(&mut session, &parse("finish 4"), 50).unwrap());
        replies.push(apply(&mut session, &SessionCommand::Pause, 50).unwrap());
        replies.push(apply(&mut session, &SessionCommand::Status, 50).unwrap());

        assert_snapshot!(replies.join("\n"), @r"
        clock running at 00,00
        lane 4 split 50m 30,00
        lane 5 split 50m 31,25
        lane 4 finished 58,32
        clock paused at 58,32
        clock paused 58,32
        lane 4 ath-joao: 50m 30,00 | finished 58,32
        lane 5 ath-ana: 50m 31,25
        ");
    }

    #[test]
    fn split_while_paused_is_an_error() {
        let (mut session, time) = session();
        apply(&mut session, &SessionCommand::Start, 50).unwrap();
        time.advance(1_000);
        apply(&mut session, &SessionCommand::Pause, 50).unwrap();
        let err = apply(&mut session, &parse("split 4"), 50).unwrap_err();
        assert!(err.is_invalid_state());
        assert!(session.lane(4).unwrap().splits().is_empty());
    }

    fn args() -> TimeArgs {
        TimeArgs {
            competition: "comp-1".to_string(),
            event: "ev-100-free".to_string(),
            heat: "heat-1".to_string(),
        }
    }

    fn start_competition(config: &Config) {
        let mut db = open_database(config).unwrap();
        let mut competition = load_competition(&db, "comp-1").unwrap();
        competition.start().unwrap();
        db.save_competition(&competition).unwrap();
    }

    #[test]
    fn scripted_session_saves_results() {
        let temp = tempfile::tempdir().unwrap();
        let config = seeded(temp.path());
        start_competition(&config);

        let script = "start\nsplit 4\nfinish 4\nfinish 4\nbogus\nsave\n";
        let mut output = Vec::new();
        run_with_source(script.as_bytes(), &mut output, &args(), &config, ManualTime::new())
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Timing heat heat-1 (lanes 4, 5). Commands: start, pause, split <lane> [label], finish <lane>, reset, status, save, quit
        clock running at 00,00
        lane 4 split 50m 00,00
        lane 4 finished 00,00
        error: invalid state: lane 4 already finished at 0ms
        error: unknown command: bogus (expected start, pause, split <lane> [label], finish <lane>, reset, status, save, quit)
        Saved heat heat-1: 1 lanes saved, 1 without a finish
        ");

        let db = open_database(&config).unwrap();
        let competition = load_competition(&db, "comp-1").unwrap();
        let event = competition.event(&EventId::new("ev-100-free").unwrap()).unwrap();
        assert_eq!(
            event.heat(&HeatId::new("heat-1").unwrap()).unwrap().status(),
            HeatStatus::Finished
        );
        let entry = event
            .results()
            .get(&meet_core::AthleteId::new("ath-joao").unwrap(), Officiality::Unofficial)
            .unwrap();
        assert_eq!(entry.athlete_name, "João Silva");
    }

    #[test]
    fn quitting_leaves_heat_timing() {
        let temp = tempfile::tempdir().unwrap();
        let config = seeded(temp.path());
        start_competition(&config);

        let mut output = Vec::new();
        run_with_source("start\nquit\n".as_bytes(), &mut output, &args(), &config, ManualTime::new())
            .unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.ends_with("Session discarded; heat heat-1 is still timing\n"));

        let db = open_database(&config).unwrap();
        let competition = load_competition(&db, "comp-1").unwrap();
        let heat = competition
            .event(&EventId::new("ev-100-free").unwrap())
            .unwrap()
            .heat(&HeatId::new("heat-1").unwrap())
            .unwrap()
            .clone();
        assert_eq!(heat.status(), HeatStatus::Timing);
        assert!(competition.events()[0].results().is_empty());
    }

    #[test]
    fn timing_requires_active_competition() {
        let temp = tempfile::tempdir().unwrap();
        let config = seeded(temp.path());
        let err = run_with_source("".as_bytes(), &mut Vec::new(), &args(), &config, ManualTime::new())
            .unwrap_err();
        assert!(err.to_string().contains("cannot open a heat"));
    }
}
