//! Append-only state ledger.
//!
//! The ledger records every completed transition. Its latest entry is the
//! authoritative "current" state; no entries means the pristine `"null"`
//! state.

pub mod file;
pub mod memory;

pub use file::{DurabilityMode, FileLedger};
pub use memory::MemoryLedger;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{NULL_TAG, Result};

/// One recorded transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Auto-incrementing identity, starting at 1
    pub id: u64,
    pub tag: String,
    pub level: String,
    /// Identity of the operator who ran the transition
    pub operator: String,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// True if this entry records a return to the pristine state.
    pub fn is_null(&self) -> bool {
        self.tag == NULL_TAG
    }
}

/// Read/append contract of the backing store that keeps ledger rows.
pub trait Ledger {
    /// Latest entry, or `None` when nothing has been recorded yet.
    ///
    /// Backends that model emptiness as a lookup failure may return
    /// [`MigrateError::EmptyLedger`](crate::MigrateError::EmptyLedger)
    /// instead; callers treat both the same.
    fn current_state(&self) -> Result<Option<LedgerEntry>>;

    /// Durably appends a new entry and returns it.
    ///
    /// A failed append must leave the previous current state in place.
    fn append(&self, tag: &str, level: &str, operator: &str) -> Result<LedgerEntry>;

    /// All entries, newest first.
    fn history(&self) -> Result<Vec<LedgerEntry>>;
}

impl<L: Ledger + ?Sized> Ledger for &L {
    fn current_state(&self) -> Result<Option<LedgerEntry>> {
        (**self).current_state()
    }

    fn append(&self, tag: &str, level: &str, operator: &str) -> Result<LedgerEntry> {
        (**self).append(tag, level, operator)
    }

    fn history(&self) -> Result<Vec<LedgerEntry>> {
        (**self).history()
    }
}

impl<L: Ledger + ?Sized> Ledger for Box<L> {
    fn current_state(&self) -> Result<Option<LedgerEntry>> {
        (**self).current_state()
    }

    fn append(&self, tag: &str, level: &str, operator: &str) -> Result<LedgerEntry> {
        (**self).append(tag, level, operator)
    }

    fn history(&self) -> Result<Vec<LedgerEntry>> {
        (**self).history()
    }
}
