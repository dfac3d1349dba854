mod cmd;
mod keys;
mod output;
mod root;
mod tui;

use anyhow::Context;
use clap::{Parser, Subcommand};
use picker_core::DEFAULT_RECENT_LIMIT;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

#[derive(Parser)]
#[command(
    name = "picker",
    about = "Pick roster entries at random, one at a time and without repetition",
    version,
    propagate_version = true
)]
struct Cli {
    /// Roster CSV file (default: ./students.csv)
    #[arg(long, global = true, env = "PICKER_ROSTER")]
    roster: Option<PathBuf>,

    /// Append logs to this file (the interactive picker discards them otherwise)
    #[arg(long, global = true, env = "PICKER_LOG")]
    log_file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print pick counts and the most recent picks, then exit
    Status {
        /// Number of recent picks to show
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
    },
}

fn main() {
    let cli = Cli::parse();
    let interactive = cli.command.is_none();

    if let Err(e) = init_logging(cli.log_file.as_deref(), interactive) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }

    let roster = root::resolve_roster(cli.roster.as_deref());

    let result = match cli.command {
        None => cmd::interactive::run(&roster, DEFAULT_RECENT_LIMIT),
        Some(Commands::Status { limit }) => cmd::status::run(&roster, limit, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

/// The interactive picker owns the terminal, so its logs only go to a file.
fn init_logging(log_file: Option<&Path>, interactive: bool) -> anyhow::Result<()> {
    let (writer, default_level) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            (
                BoxMakeWriter::new(std::sync::Mutex::new(file)),
                tracing::Level::INFO,
            )
        }
        None if interactive => (BoxMakeWriter::new(std::io::sink), tracing::Level::WARN),
        None => (BoxMakeWriter::new(std::io::stderr), tracing::Level::WARN),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_ansi(log_file.is_none() && !interactive)
        .with_writer(writer)
        .init();
    Ok(())
}
