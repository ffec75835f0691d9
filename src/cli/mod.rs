//! Operator-facing surface.
//!
//! Hosts build their registry and backing-store handle, then hand control to
//! [`migrate_main`] (or [`run`] when they manage arguments and output
//! themselves):
//!
//! ```text
//! app --from null --to user_table_start --user alice
//! app --from user_table_start --to user_table_add_column --user alice --dry-run
//! app --list
//! ```

mod history;

pub use history::render_history;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::MigratorConfig;
use crate::core::MigrateError;
use crate::executor::{Executor, MigrationPlan, MigrationReport};
use crate::ledger::{Ledger, LedgerEntry};
use crate::registry::Registry;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(about = "Apply or revert schema migration steps")]
pub struct MigrateArgs {
    /// Tag the ledger currently reports ("null" for a pristine store)
    #[arg(long)]
    pub from: Option<String>,

    /// Tag to migrate to
    #[arg(long)]
    pub to: Option<String>,

    /// Operator who runs the migration
    #[arg(long)]
    pub user: Option<String>,

    /// List the migration history
    #[arg(long, visible_alias = "history")]
    pub list: bool,

    /// Show version
    #[arg(short = 'V', long)]
    pub version: bool,

    /// Resolve and print the walk without running any step
    #[arg(long)]
    pub dry_run: bool,

    /// Ledger file (overrides MIGRATE_LEDGER_PATH)
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// What a CLI invocation did.
#[derive(Debug)]
pub enum CliOutcome {
    Version,
    History(Vec<LedgerEntry>),
    Planned(MigrationPlan),
    Migrated(MigrationReport),
}

/// Runs one CLI invocation against an explicit registry, handle and ledger.
///
/// `default_operator` is used when `--user` is absent.
pub fn run<C, L, W>(
    args: &MigrateArgs,
    registry: &Registry<C>,
    conn: &mut C,
    ledger: L,
    default_operator: Option<&str>,
    out: &mut W,
) -> Result<CliOutcome>
where
    L: Ledger,
    W: Write + ?Sized,
{
    if args.version {
        writeln!(out, "Version: {}", VERSION)?;
        return Ok(CliOutcome::Version);
    }

    if args.list {
        let entries = ledger.history().context("failed to read migration history")?;
        if entries.is_empty() {
            return Err(MigrateError::validation("there is no migration done yet").into());
        }
        write!(out, "{}", render_history(&entries, !args.no_color))?;
        return Ok(CliOutcome::History(entries));
    }

    let from = required(args.from.as_deref(), "from")?;
    let to = required(args.to.as_deref(), "to")?;

    let executor = Executor::new(registry, ledger)?;

    if args.dry_run {
        let plan = executor.plan(from, to)?;
        if plan.is_noop() {
            writeln!(out, "nothing to migrate - already at '{}'", plan.to)?;
        }
        for transition in &plan.transitions {
            writeln!(
                out,
                "{} ({}) -> ({}) {} -> {}",
                transition.direction,
                transition.from_level,
                transition.to_level,
                transition.from_tag,
                transition.to_tag
            )?;
        }
        return Ok(CliOutcome::Planned(plan));
    }

    let operator = args
        .user
        .as_deref()
        .or(default_operator)
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| MigrateError::validation("no username set"))?;

    let report = executor.execute(conn, from, to, operator)?;
    if report.is_noop() {
        writeln!(out, "nothing to migrate - already at '{}'", report.current_tag)?;
    }
    for transition in &report.applied {
        writeln!(
            out,
            "{} ({}) -> ({}) {} -> {}",
            transition.direction,
            transition.from_level,
            transition.to_level,
            transition.from_tag,
            transition.to_tag
        )?;
    }
    Ok(CliOutcome::Migrated(report))
}

/// Entry point for host binaries.
///
/// Parses the process arguments, resolves configuration from the
/// environment, opens the file ledger and runs the invocation. Any failure is
/// reported on stderr and terminates the process with status 1.
pub fn migrate_main<C>(registry: &Registry<C>, conn: &mut C) {
    init_tracing();
    let args = MigrateArgs::parse();

    if let Err(err) = run_with_config(&args, registry, conn) {
        eprintln!("✗ {:#}", err);
        std::process::exit(1);
    }
}

fn run_with_config<C>(args: &MigrateArgs, registry: &Registry<C>, conn: &mut C) -> Result<CliOutcome> {
    let mut config = MigratorConfig::from_env().context("failed to read configuration")?;
    if let Some(path) = &args.ledger {
        config = config.ledger_path(path);
    }

    let ledger = config
        .open_ledger()
        .with_context(|| format!("failed to open ledger '{}'", config.ledger_path.display()))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(args, registry, conn, &ledger, config.operator.as_deref(), &mut out)
}

/// Installs a `tracing` subscriber on stderr filtered by `RUST_LOG`
/// (default `info`). Does nothing if one is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn required<'a>(value: Option<&'a str>, flag: &str) -> std::result::Result<&'a str, MigrateError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MigrateError::validation(format!("no {}-flag found", flag)))
}
