use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use meet_cli::commands::{competitions, edit, import, lifecycle, load, results, time};
use meet_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match command {
        Commands::Load(args) => load::run(&mut out, args, &config)?,
        Commands::Competitions => competitions::run(&mut out, &config)?,
        Commands::Start(args) => lifecycle::start(&mut out, args, &config)?,
        Commands::Finish(args) => lifecycle::finish(&mut out, args, &config)?,
        Commands::Register(args) => lifecycle::register(&mut out, args, &config)?,
        Commands::Unregister(args) => lifecycle::unregister(&mut out, args, &config)?,
        Commands::Time(args) => time::run(std::io::stdin().lock(), &mut out, args, &config)?,
        Commands::Edit(args) => edit::run(&mut out, args, &config)?,
        Commands::Import(args) => import::run(std::io::stdin().lock(), &mut out, args, &config)?,
        Commands::Results(args) => results::run(&mut out, args, &config)?,
    }
    out.flush()?;

    Ok(())
}
