use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use undo_redo_cli::{CliConfig, Session};

/// Runs an undo/redo script against an integer counter.
#[derive(Parser, Debug)]
#[command(name = "undo-redo", version, about)]
struct Cli {
    /// Script file to run. Reads stdin when omitted.
    script: Option<PathBuf>,

    /// JSON config file. Created with defaults if missing.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Starting counter value (overrides the config file).
    #[arg(long)]
    initial: Option<i64>,

    /// Stop at the first failing command.
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => CliConfig::load_or_create(path),
        None => CliConfig::default(),
    };
    if let Some(initial) = cli.initial {
        config.initial_value = initial;
        config.sanitize();
    }
    config.strict |= cli.strict;

    tracing::info!("Starting undo-redo session at {}", config.initial_value);

    let mut session = Session::new(&config);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let summary = match &cli.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open script {}", path.display()))?;
            session.run_script(BufReader::new(file), &mut out, config.strict)?
        }
        None => session.run_script(io::stdin().lock(), &mut out, config.strict)?,
    };

    tracing::info!(
        "Finished: {} succeeded, {} failed, final value {}",
        summary.succeeded,
        summary.failed,
        session.value()
    );
    Ok(())
}
