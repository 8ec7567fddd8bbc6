use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cell::CellRef;
use crate::error::Result;
use crate::hash::Hash;
use crate::repo::write_atomic;

/// a staged cell change
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub workbook_id: String,
    pub sheet_number: u32,
    pub row_letters: String,
    pub col_number: u32,
    pub blob_hash: Hash,
    /// seconds since epoch at which the entry was (last) staged
    pub timestamp: i64,
    /// framed blob length before compression
    pub original_size: u64,
    /// zlib stream length on disk
    pub compressed_size: u64,
}

impl IndexEntry {
    /// the cell this entry stages
    pub fn cell(&self) -> CellRef {
        CellRef {
            workbook_id: self.workbook_id.clone(),
            sheet_number: self.sheet_number,
            row_letters: self.row_letters.clone(),
            col_number: self.col_number,
        }
    }

    /// staging index key, e.g. "wb1:1:A:1"
    pub fn key(&self) -> String {
        self.cell().key()
    }

    /// cell address, e.g. "A1"
    pub fn address(&self) -> String {
        self.cell().address()
    }

    /// hierarchical object path, e.g. "wb1/1/A1"
    pub fn tree_path(&self) -> String {
        self.cell().tree_path()
    }
}

/// outcome of staging a cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    Added,
    Updated,
    Unchanged,
}

impl StageOutcome {
    /// whether the staging area was modified
    pub fn staged(self) -> bool {
        !matches!(self, StageOutcome::Unchanged)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageOutcome::Added => "added",
            StageOutcome::Updated => "updated",
            StageOutcome::Unchanged => "unchanged",
        }
    }
}

/// aggregate statistics over the staging area
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub total_entries: usize,
    pub entries_by_workbook: BTreeMap<String, usize>,
    pub total_original_size: u64,
    pub total_compressed_size: u64,
}

impl IndexStats {
    /// compressed over original, or 0.0 for an empty index
    pub fn compression_ratio(&self) -> f64 {
        if self.total_original_size == 0 {
            0.0
        } else {
            self.total_compressed_size as f64 / self.total_original_size as f64
        }
    }
}

/// the staging index: a durable map of pending cell changes
///
/// every operation holds the process-wide readers-writer lock across its
/// whole load/modify/save cycle; saves go through an atomic sibling rename
pub struct Index {
    path: PathBuf,
    lock: RwLock<()>,
}

impl Index {
    /// open the index, creating an empty file when missing
    pub(crate) fn create(path: PathBuf) -> Result<Self> {
        let index = Self::open(path);
        if !index.path.exists() {
            index.save(&BTreeMap::new())?;
        }
        Ok(index)
    }

    pub(crate) fn open(path: PathBuf) -> Self {
        Self {
            path,
            lock: RwLock::new(()),
        }
    }

    /// insert or update an entry
    ///
    /// staging a blob hash identical to the one already recorded for the
    /// cell is a no-op and reports `Unchanged`
    pub fn upsert(
        &self,
        cell: &CellRef,
        blob_hash: Hash,
        original_size: u64,
        compressed_size: u64,
    ) -> Result<StageOutcome> {
        let _guard = self.lock.write().expect("index lock poisoned");
        let mut entries = self.load();
        let key = cell.key();

        let outcome = match entries.get(&key) {
            Some(existing) if existing.blob_hash == blob_hash => {
                debug!(key = %key, "blob hash unchanged, skipping index update");
                return Ok(StageOutcome::Unchanged);
            }
            Some(_) => StageOutcome::Updated,
            None => StageOutcome::Added,
        };

        entries.insert(
            key,
            IndexEntry {
                workbook_id: cell.workbook_id.clone(),
                sheet_number: cell.sheet_number,
                row_letters: cell.row_letters.clone(),
                col_number: cell.col_number,
                blob_hash,
                timestamp: epoch_seconds(),
                original_size,
                compressed_size,
            },
        );
        self.save(&entries)?;
        Ok(outcome)
    }

    /// stage several cells with a single lock acquisition and a single save
    pub fn batch_upsert(
        &self,
        updates: &[(CellRef, Hash, u64, u64)],
    ) -> Result<Vec<StageOutcome>> {
        let _guard = self.lock.write().expect("index lock poisoned");
        let mut entries = self.load();
        let mut outcomes = Vec::with_capacity(updates.len());
        let mut modified = false;

        for (cell, blob_hash, original_size, compressed_size) in updates {
            let key = cell.key();
            let outcome = match entries.get(&key) {
                Some(existing) if existing.blob_hash == *blob_hash => StageOutcome::Unchanged,
                Some(_) => StageOutcome::Updated,
                None => StageOutcome::Added,
            };
            if outcome.staged() {
                entries.insert(
                    key,
                    IndexEntry {
                        workbook_id: cell.workbook_id.clone(),
                        sheet_number: cell.sheet_number,
                        row_letters: cell.row_letters.clone(),
                        col_number: cell.col_number,
                        blob_hash: *blob_hash,
                        timestamp: epoch_seconds(),
                        original_size: *original_size,
                        compressed_size: *compressed_size,
                    },
                );
                modified = true;
            }
            outcomes.push(outcome);
        }

        if modified {
            self.save(&entries)?;
        }
        Ok(outcomes)
    }

    /// remove an entry by key; returns whether it was present
    pub fn remove(&self, key: &str) -> Result<bool> {
        let _guard = self.lock.write().expect("index lock poisoned");
        let mut entries = self.load();
        if entries.remove(key).is_some() {
            self.save(&entries)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// all staged entries, oldest first
    pub fn entries(&self) -> Vec<IndexEntry> {
        let _guard = self.lock.read().expect("index lock poisoned");
        let mut entries: Vec<_> = self.load().into_values().collect();
        entries.sort_by_key(|e| e.timestamp);
        entries
    }

    /// staged entries for one workbook, ordered by sheet and cell
    pub fn entries_for_workbook(&self, workbook_id: &str) -> Vec<IndexEntry> {
        let _guard = self.lock.read().expect("index lock poisoned");
        let mut entries: Vec<_> = self
            .load()
            .into_values()
            .filter(|e| e.workbook_id == workbook_id)
            .collect();
        entries.sort_by(|a, b| {
            a.sheet_number
                .cmp(&b.sheet_number)
                .then_with(|| a.row_letters.cmp(&b.row_letters))
                .then_with(|| a.col_number.cmp(&b.col_number))
        });
        entries
    }

    /// staged entries for one sheet, ordered by cell
    pub fn entries_for_sheet(&self, workbook_id: &str, sheet_number: u32) -> Vec<IndexEntry> {
        let _guard = self.lock.read().expect("index lock poisoned");
        let mut entries: Vec<_> = self
            .load()
            .into_values()
            .filter(|e| e.workbook_id == workbook_id && e.sheet_number == sheet_number)
            .collect();
        entries.sort_by(|a, b| {
            a.row_letters
                .cmp(&b.row_letters)
                .then_with(|| a.col_number.cmp(&b.col_number))
        });
        entries
    }

    /// whether a cell is currently staged
    pub fn is_staged(&self, key: &str) -> bool {
        let _guard = self.lock.read().expect("index lock poisoned");
        self.load().contains_key(key)
    }

    /// number of staged entries
    pub fn len(&self) -> usize {
        let _guard = self.lock.read().expect("index lock poisoned");
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// drop every staged entry
    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock.write().expect("index lock poisoned");
        self.save(&BTreeMap::new())
    }

    /// aggregate counts and sizes over the staging area
    pub fn stats(&self) -> IndexStats {
        let _guard = self.lock.read().expect("index lock poisoned");
        let entries = self.load();

        let mut stats = IndexStats {
            total_entries: entries.len(),
            ..IndexStats::default()
        };
        for entry in entries.values() {
            *stats
                .entries_by_workbook
                .entry(entry.workbook_id.clone())
                .or_insert(0) += 1;
            stats.total_original_size += entry.original_size;
            stats.total_compressed_size += entry.compressed_size;
        }
        stats
    }

    /// lenient loader: a missing, empty, or unparseable index reads as empty
    fn load(&self) -> BTreeMap<String, IndexEntry> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read index, treating as empty");
                return BTreeMap::new();
            }
        };
        if content.trim().is_empty() {
            return BTreeMap::new();
        }
        match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to parse index, treating as empty");
                BTreeMap::new()
            }
        }
    }

    fn save(&self, entries: &BTreeMap<String, IndexEntry>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        write_atomic(&self.path, json.as_bytes())
    }
}

/// current unix time in whole seconds
pub(crate) fn epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
