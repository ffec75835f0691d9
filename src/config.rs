use std::env;
use std::path::{Path, PathBuf};

use crate::core::Result;
use crate::ledger::{DurabilityMode, FileLedger};

pub const LEDGER_PATH_VAR: &str = "MIGRATE_LEDGER_PATH";
pub const DURABILITY_VAR: &str = "MIGRATE_DURABILITY";
pub const OPERATOR_VAR: &str = "MIGRATE_USER";

/// Migrator configuration
///
/// Resolved from the environment by the binary; hosts embedding the CLI can
/// build it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratorConfig {
    /// Location of the ledger log file
    pub ledger_path: PathBuf,

    /// Flush policy for ledger appends
    pub durability: DurabilityMode,

    /// Default operator identity when none is passed on the command line
    pub operator: Option<String>,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("migrations.ledger"),
            durability: DurabilityMode::Sync,
            operator: None,
        }
    }
}

impl MigratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ledger file path
    pub fn ledger_path(mut self, path: impl AsRef<Path>) -> Self {
        self.ledger_path = path.as_ref().to_path_buf();
        self
    }

    /// Set the durability mode
    pub fn durability(mut self, durability: DurabilityMode) -> Self {
        self.durability = durability;
        self
    }

    /// Set the default operator
    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    /// Reads `MIGRATE_LEDGER_PATH`, `MIGRATE_DURABILITY` and `MIGRATE_USER`
    /// (falling back to `USER`).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(LEDGER_PATH_VAR).filter(|p| !p.is_empty()) {
            config.ledger_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(DURABILITY_VAR).filter(|d| !d.is_empty()) {
            config.durability = raw.parse()?;
        }
        config.operator = lookup(OPERATOR_VAR)
            .or_else(|| lookup("USER"))
            .filter(|u| !u.trim().is_empty());

        Ok(config)
    }

    /// Opens the file ledger this configuration points at.
    pub fn open_ledger(&self) -> Result<FileLedger> {
        FileLedger::open(&self.ledger_path, self.durability)
    }
}
