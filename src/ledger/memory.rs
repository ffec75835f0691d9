use std::sync::RwLock;

use chrono::Utc;

use super::{Ledger, LedgerEntry};
use crate::core::Result;

/// Process-local ledger kept in memory.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: RwLock<Vec<LedgerEntry>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> Result<usize> {
        Ok(self.entries.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.entries.read()?.is_empty())
    }
}

impl Ledger for MemoryLedger {
    fn current_state(&self) -> Result<Option<LedgerEntry>> {
        Ok(self.entries.read()?.last().cloned())
    }

    fn append(&self, tag: &str, level: &str, operator: &str) -> Result<LedgerEntry> {
        let mut entries = self.entries.write()?;
        let id = entries.last().map_or(1, |last| last.id + 1);
        let entry = LedgerEntry {
            id,
            tag: tag.to_string(),
            level: level.to_string(),
            operator: operator.to_string(),
            created_at: Utc::now(),
        };
        entries.push(entry.clone());
        Ok(entry)
    }

    fn history(&self) -> Result<Vec<LedgerEntry>> {
        Ok(self.entries.read()?.iter().rev().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ledger_has_no_current_state() {
        let ledger = MemoryLedger::new();
        assert!(ledger.current_state().unwrap().is_none());
        assert!(ledger.history().unwrap().is_empty());
        assert!(ledger.is_empty().unwrap());
    }

    #[test]
    fn test_latest_append_is_current() {
        let ledger = MemoryLedger::new();
        ledger.append("a", "mig0001", "alice").unwrap();
        let second = ledger.append("b", "mig0002", "bob").unwrap();

        assert_eq!(second.id, 2);
        let current = ledger.current_state().unwrap().unwrap();
        assert_eq!(current, second);
        assert_eq!(current.operator, "bob");
    }

    #[test]
    fn test_history_is_newest_first() {
        let ledger = MemoryLedger::new();
        ledger.append("a", "mig0001", "alice").unwrap();
        ledger.append("b", "mig0002", "alice").unwrap();
        ledger.append("null", "null", "alice").unwrap();

        let history = ledger.history().unwrap();
        let tags: Vec<_> = history.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["null", "b", "a"]);
        assert!(history[0].is_null());
        assert_eq!(ledger.len().unwrap(), 3);
    }
}
