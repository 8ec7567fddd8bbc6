use tracing::debug;

use crate::cell::CellRef;
use crate::error::Result;
use crate::hash::Hash;
use crate::index::StageOutcome;
use crate::object::{self, ObjectKind};
use crate::repo::Repo;
use crate::workbook::WorkbookStore;

/// result of staging one cell
#[derive(Clone, Debug)]
pub struct StageResult {
    pub blob_hash: Hash,
    pub cell_address: String,
    /// framed blob length before compression
    pub original_size: u64,
    /// zlib stream length on disk
    pub compressed_size: u64,
    pub outcome: StageOutcome,
}

impl StageResult {
    /// whether the staging area was modified
    pub fn staged(&self) -> bool {
        self.outcome.staged()
    }
}

/// stage the current value of one cell
///
/// reads the live value from the workbook store, writes it as a blob, and
/// records the index entry; staging a value whose blob hash already matches
/// the staged entry reports `Unchanged`
pub fn stage(repo: &Repo, store: &dyn WorkbookStore, cell: &CellRef) -> Result<StageResult> {
    let value = store.read_cell(
        &cell.workbook_id,
        cell.sheet_number,
        &cell.row_letters,
        cell.col_number,
    )?;

    let stored = object::put(repo, ObjectKind::Blob, value.as_bytes())?;
    let outcome = repo
        .index()
        .upsert(cell, stored.hash, stored.size, stored.compressed_size)?;

    debug!(cell = %cell, hash = %stored.hash, outcome = outcome.as_str(), "staged cell");

    Ok(StageResult {
        blob_hash: stored.hash,
        cell_address: cell.address(),
        original_size: stored.size,
        compressed_size: stored.compressed_size,
        outcome,
    })
}

/// remove a cell from the staging area; returns whether it was staged
pub fn unstage(repo: &Repo, cell: &CellRef) -> Result<bool> {
    repo.index().remove(&cell.key())
}

/// stage several cells with a single index save
pub fn batch_stage(
    repo: &Repo,
    store: &dyn WorkbookStore,
    cells: &[CellRef],
) -> Result<Vec<StageResult>> {
    let mut updates = Vec::with_capacity(cells.len());
    for cell in cells {
        let value = store.read_cell(
            &cell.workbook_id,
            cell.sheet_number,
            &cell.row_letters,
            cell.col_number,
        )?;
        let stored = object::put(repo, ObjectKind::Blob, value.as_bytes())?;
        updates.push((cell.clone(), stored.hash, stored.size, stored.compressed_size));
    }

    let outcomes = repo.index().batch_upsert(&updates)?;

    Ok(updates
        .into_iter()
        .zip(outcomes)
        .map(|((cell, hash, original_size, compressed_size), outcome)| StageResult {
            blob_hash: hash,
            cell_address: cell.address(),
            original_size,
            compressed_size,
            outcome,
        })
        .collect())
}
