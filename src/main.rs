use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use rustmigrate::cli::{VERSION, init_tracing, render_history};
use rustmigrate::{FileLedger, Ledger, MigratorConfig};

#[derive(Parser)]
#[command(name = "rustmigrate")]
#[command(about = "Inspect a rustmigrate state ledger")]
struct Cli {
    /// Ledger file (overrides MIGRATE_LEDGER_PATH)
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the migration history, newest first
    History {
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Show the current state
    Current,
    /// Show version
    Version,
}

fn main() {
    init_tracing();
    if let Err(err) = run(Cli::parse()) {
        eprintln!("✗ {:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli { ledger, command } = cli;

    match command {
        Command::Version => println!("Version: {}", VERSION),
        Command::History { json, no_color } => {
            let entries = open_ledger(ledger)?
                .history()
                .context("failed to read migration history")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                return Err(anyhow!("there is no migration done yet"));
            } else {
                print!("{}", render_history(&entries, !no_color));
            }
        }
        Command::Current => match open_ledger(ledger)?.current_state()? {
            Some(entry) => println!(
                "{} ({}) by {} at {}",
                entry.tag, entry.level, entry.operator, entry.created_at
            ),
            None => println!("null"),
        },
    }

    Ok(())
}

fn open_ledger(path: Option<PathBuf>) -> Result<FileLedger> {
    let mut config = MigratorConfig::from_env().context("failed to read configuration")?;
    if let Some(path) = path {
        config = config.ledger_path(path);
    }
    if !config.ledger_path.exists() {
        return Err(anyhow!(
            "ledger '{}' does not exist",
            config.ledger_path.display()
        ));
    }
    config
        .open_ledger()
        .with_context(|| format!("failed to open ledger '{}'", config.ledger_path.display()))
}
