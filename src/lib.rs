// ============================================================================
// rustmigrate Library
// ============================================================================

pub mod cli;
pub mod config;
pub mod core;
pub mod executor;
pub mod ledger;
pub mod registry;

// Re-export main types for convenience
pub use crate::config::MigratorConfig;
pub use crate::core::{BoxError, Direction, MigrateError, NULL_TAG, Position, Result};
pub use executor::{Executor, MigrationPlan, MigrationReport, Transition};
pub use ledger::{DurabilityMode, FileLedger, Ledger, LedgerEntry, MemoryLedger};
pub use registry::{RegisteredStep, Registry, Step, StepAction};

// ============================================================================
// One-shot helper
// ============================================================================

/// Runs a single migration from `from` to `to` against an explicit registry
/// and ledger.
///
/// Shorthand for constructing an [`Executor`] and calling
/// [`Executor::execute`].
///
/// # Examples
///
/// ```
/// use rustmigrate::{Ledger, MemoryLedger, Registry, Step, migrate};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut registry: Registry<Vec<&'static str>> = Registry::new();
/// registry.register(
///     Step::new("user_table_start")
///         .with_level("mig0001")
///         .with_forward(|db: &mut Vec<&'static str>| {
///             db.push("users");
///             Ok(())
///         })
///         .with_backward(|db: &mut Vec<&'static str>| {
///             db.pop();
///             Ok(())
///         }),
/// )?;
///
/// let ledger = MemoryLedger::new();
/// let mut db = Vec::new();
/// migrate(&registry, &ledger, &mut db, "null", "user_table_start", "alice")?;
///
/// assert_eq!(db, vec!["users"]);
/// assert_eq!(ledger.current_state()?.unwrap().tag, "user_table_start");
/// # Ok(())
/// # }
/// ```
pub fn migrate<C, L: Ledger>(
    registry: &Registry<C>,
    ledger: L,
    conn: &mut C,
    from: &str,
    to: &str,
    operator: &str,
) -> Result<MigrationReport> {
    Executor::new(registry, ledger)?.execute(conn, from, to, operator)
}
