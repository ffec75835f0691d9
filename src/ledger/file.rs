//! Durable ledger backed by an append-only log file.
//!
//! Every entry is stored as a little-endian `u32` length prefix followed by
//! the MessagePack encoding of a [`LedgerEntry`].

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use chrono::Utc;
use tracing::{Level, event};

use super::{Ledger, LedgerEntry};
use crate::core::{MigrateError, Result};

const LEN_PREFIX: usize = 4;

// ============================================================================
// Durability Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// Flush and fsync after every append
    #[default]
    Sync,
    /// Flush to the OS after every append, leave syncing to the OS
    Async,
}

impl FromStr for DurabilityMode {
    type Err = MigrateError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "sync" => Ok(Self::Sync),
            "async" => Ok(Self::Async),
            _ => Err(MigrateError::validation(format!(
                "durability must be one of: sync, async (got '{}')",
                raw
            ))),
        }
    }
}

// ============================================================================
// File Ledger
// ============================================================================

struct LogHandle {
    file: File,
    len: u64,
    last_id: u64,
    /// Set when a failed append could not be rolled back; the file may hold
    /// stray bytes past `len` until the ledger is reopened.
    poisoned: bool,
}

pub struct FileLedger {
    path: PathBuf,
    durability: DurabilityMode,
    handle: Mutex<LogHandle>,
}

impl std::fmt::Debug for FileLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLedger")
            .field("path", &self.path)
            .field("durability", &self.durability)
            .finish()
    }
}

impl FileLedger {
    /// Opens (or creates) the ledger log at `path`.
    ///
    /// A torn record left at the tail by an interrupted append is cut off so
    /// that the last complete entry stays current.
    pub fn open<P: AsRef<Path>>(path: P, durability: DurabilityMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    MigrateError::store(format!("Failed to create ledger directory: {}", e))
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| MigrateError::store(format!("Failed to open ledger file: {}", e)))?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| MigrateError::store(format!("Failed to read ledger file: {}", e)))?;
        let (entries, valid_len) = decode_records(&bytes)?;

        if valid_len < bytes.len() as u64 {
            event!(
                Level::WARN,
                path = %path.display(),
                dropped_bytes = bytes.len() as u64 - valid_len,
                "ledger has a torn trailing record, truncating"
            );
            file.set_len(valid_len).map_err(|e| {
                MigrateError::store(format!("Failed to truncate torn ledger record: {}", e))
            })?;
        }

        let last_id = entries.last().map_or(0, |e| e.id);
        Ok(Self {
            path,
            durability,
            handle: Mutex::new(LogHandle {
                file,
                len: valid_len,
                last_id,
                poisoned: false,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn durability(&self) -> DurabilityMode {
        self.durability
    }

    fn read_entries(&self) -> Result<Vec<LedgerEntry>> {
        let _guard = self.handle.lock()?;
        let bytes = fs::read(&self.path)
            .map_err(|e| MigrateError::store(format!("Failed to read ledger file: {}", e)))?;
        let (entries, _) = decode_records(&bytes)?;
        Ok(entries)
    }
}

impl Ledger for FileLedger {
    fn current_state(&self) -> Result<Option<LedgerEntry>> {
        Ok(self.read_entries()?.pop())
    }

    fn append(&self, tag: &str, level: &str, operator: &str) -> Result<LedgerEntry> {
        let mut handle = self.handle.lock()?;
        if handle.poisoned {
            return Err(MigrateError::store(format!(
                "ledger '{}' has unrecovered bytes from a failed append, reopen it first",
                self.path.display()
            )));
        }

        let entry = LedgerEntry {
            id: handle.last_id + 1,
            tag: tag.to_string(),
            level: level.to_string(),
            operator: operator.to_string(),
            created_at: Utc::now(),
        };
        let record = encode_record(&entry)?;

        if let Err(e) = write_record(&mut handle.file, &record, self.durability) {
            // Cut any partial bytes so the previous entry stays current.
            let offset = handle.len;
            if let Err(trunc) = handle.file.set_len(offset) {
                event!(Level::ERROR, error = %trunc, "ledger rollback after failed append failed");
                handle.poisoned = true;
            }
            return Err(MigrateError::store(format!(
                "Failed to append ledger entry: {}",
                e
            )));
        }

        handle.len += record.len() as u64;
        handle.last_id = entry.id;
        Ok(entry)
    }

    fn history(&self) -> Result<Vec<LedgerEntry>> {
        let mut entries = self.read_entries()?;
        entries.reverse();
        Ok(entries)
    }
}

fn encode_record(entry: &LedgerEntry) -> Result<Vec<u8>> {
    let serialized = rmp_serde::to_vec(entry)
        .map_err(|e| MigrateError::store(format!("Failed to serialize ledger entry: {}", e)))?;
    let len = u32::try_from(serialized.len())
        .map_err(|_| MigrateError::store("Ledger entry too large"))?;

    let mut record = Vec::with_capacity(LEN_PREFIX + serialized.len());
    record.extend_from_slice(&len.to_le_bytes());
    record.extend_from_slice(&serialized);
    Ok(record)
}

fn write_record(file: &mut File, record: &[u8], durability: DurabilityMode) -> std::io::Result<()> {
    file.write_all(record)?;
    file.flush()?;
    if durability == DurabilityMode::Sync {
        file.sync_all()?;
    }
    Ok(())
}

/// Decodes complete records and returns them with the byte length they span.
/// An incomplete trailing record is not an error.
fn decode_records(bytes: &[u8]) -> Result<(Vec<LedgerEntry>, u64)> {
    let mut entries = Vec::new();
    let mut offset = 0usize;

    while offset < bytes.len() {
        let Some(prefix) = bytes.get(offset..offset + LEN_PREFIX) else {
            break;
        };
        let len_bytes = <[u8; LEN_PREFIX]>::try_from(prefix)
            .map_err(|e| MigrateError::store(format!("Invalid ledger record prefix: {}", e)))?;
        let len = u32::from_le_bytes(len_bytes) as usize;

        let start = offset + LEN_PREFIX;
        let Some(data) = bytes.get(start..start + len) else {
            break;
        };
        let entry: LedgerEntry = rmp_serde::from_slice(data).map_err(|e| {
            MigrateError::store(format!(
                "Failed to deserialize ledger entry at byte {}: {}",
                offset, e
            ))
        })?;
        entries.push(entry);
        offset = start + len;
    }

    Ok((entries, offset as u64))
}
