use tracing::{info, warn};

use crate::cell::CellRef;
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::index::epoch_seconds;
use crate::object::{self, tree, ObjectKind};
use crate::ops::rollback::{changed_paths, require_commit};
use crate::repo::Repo;
use crate::workbook::WorkbookStore;

/// result of a reset, revert, or cherry-pick
///
/// for resets `target` is the commit the branch moved to; for revert and
/// cherry-pick it is the newly created commit
#[derive(Clone, Debug)]
pub struct RollbackOutcome {
    pub operation: &'static str,
    pub target: Hash,
    pub previous: Option<Hash>,
    pub affected_paths: Vec<String>,
    pub timestamp: i64,
}

/// move the current branch to a target commit and rewrite both the staging
/// area and the workbook store to match its tree
///
/// restore is best-effort per cell: a cell that fails to restore is logged
/// and skipped, and the ref still advances
pub fn hard_reset(
    repo: &Repo,
    store: &dyn WorkbookStore,
    target: &Hash,
) -> Result<RollbackOutcome> {
    let commit = require_commit(repo, target)?;
    let previous = repo.read_head()?;
    let affected = changed_paths(repo, previous.as_ref(), target)?;

    repo.index().clear()?;

    for (path, blob_hash) in tree::walk(repo, &commit.tree)? {
        if let Err(e) = restore_cell(repo, store, &path, &blob_hash) {
            warn!(path = %path, error = %e, "failed to restore cell during hard reset");
        }
    }

    repo.advance_head(target)?;

    info!(target = %target, "hard reset complete");

    Ok(RollbackOutcome {
        operation: "hard_reset",
        target: *target,
        previous,
        affected_paths: affected,
        timestamp: epoch_seconds(),
    })
}

/// move the current branch to a target commit, leaving the staging area and
/// the workbook store untouched
///
/// the affected paths are informational: the set that would change under a
/// hard reset
pub fn soft_reset(repo: &Repo, target: &Hash) -> Result<RollbackOutcome> {
    require_commit(repo, target)?;
    let previous = repo.read_head()?;
    let affected = changed_paths(repo, previous.as_ref(), target)?;

    repo.advance_head(target)?;

    info!(target = %target, "soft reset complete");

    Ok(RollbackOutcome {
        operation: "soft_reset",
        target: *target,
        previous,
        affected_paths: affected,
        timestamp: epoch_seconds(),
    })
}

/// write one tree leaf back into the workbook store and restage it
fn restore_cell(
    repo: &Repo,
    store: &dyn WorkbookStore,
    path: &str,
    blob_hash: &Hash,
) -> Result<()> {
    let cell = CellRef::from_tree_path(path)?;

    let (kind, payload) = object::get(repo, blob_hash)?;
    if kind != ObjectKind::Blob {
        return Err(Error::CorruptObjectMessage(format!(
            "expected blob at {}, found {}",
            path,
            kind.as_str()
        )));
    }
    let value = String::from_utf8_lossy(&payload);
    store.write_cell(
        &cell.workbook_id,
        cell.sheet_number,
        &cell.row_letters,
        cell.col_number,
        &value,
    )?;

    // the framing header is not part of the stored value but counts toward
    // the size accounting
    let (original_size, compressed_size) = object::sizes(repo, blob_hash)?;
    repo.index()
        .upsert(&cell, *blob_hash, original_size, compressed_size)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::commit::commit;
    use crate::ops::log::history;
    use crate::ops::stage::stage;
    use crate::workbook::MemoryWorkbookStore;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, Repo, MemoryWorkbookStore) {
        let dir = tempdir().unwrap();
        let repo = Repo::init(dir.path()).unwrap();
        let store = MemoryWorkbookStore::new();
        (dir, repo, store)
    }

    fn cell() -> CellRef {
        CellRef::new("wb1", 1, "A", 1).unwrap()
    }

    fn make_commit(repo: &Repo, store: &MemoryWorkbookStore, value: &str, message: &str) -> Hash {
        store.write_cell("wb1", 1, "A", 1, value).unwrap();
        stage(repo, store, &cell()).unwrap();
        commit(repo, message, "Alice", "alice@x").unwrap().commit_hash
    }

    #[test]
    fn test_hard_reset_restores_workbook_and_branch() {
        let (_dir, repo, store) = setup();
        let first = make_commit(&repo, &store, "Hello", "init");
        make_commit(&repo, &store, "World", "update");

        let outcome = hard_reset(&repo, &store, &first).unwrap();

        assert_eq!(outcome.operation, "hard_reset");
        assert_eq!(store.read_cell("wb1", 1, "A", 1).unwrap(), "Hello");
        assert_eq!(repo.read_head().unwrap(), Some(first));
        assert_eq!(repo.read_branch("master").unwrap(), Some(first));

        // history now starts at the first commit
        let entries = history(&repo, 10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].hash, first);
    }

    #[test]
    fn test_hard_reset_index_mirrors_target_tree() {
        let (_dir, repo, store) = setup();
        let first = make_commit(&repo, &store, "Hello", "init");
        make_commit(&repo, &store, "World", "update");

        hard_reset(&repo, &store, &first).unwrap();

        let target_commit = object::read_commit(&repo, &first).unwrap();
        let tree_leaves = tree::walk(&repo, &target_commit.tree).unwrap();

        let mut index_pairs: Vec<(String, Hash)> = repo
            .index()
            .entries()
            .iter()
            .map(|e| (e.tree_path(), e.blob_hash))
            .collect();
        index_pairs.sort();
        let mut expected = tree_leaves;
        expected.sort();
        assert_eq!(index_pairs, expected);
    }

    #[test]
    fn test_hard_reset_reports_changed_paths() {
        let (_dir, repo, store) = setup();
        let first = make_commit(&repo, &store, "Hello", "init");

        // second commit touches a second cell too
        store.write_cell("wb1", 1, "A", 1, "World").unwrap();
        store.write_cell("wb1", 1, "B", 2, "Extra").unwrap();
        stage(&repo, &store, &cell()).unwrap();
        stage(&repo, &store, &CellRef::new("wb1", 1, "B", 2).unwrap()).unwrap();
        commit(&repo, "update", "Alice", "alice@x").unwrap();

        let outcome = hard_reset(&repo, &store, &first).unwrap();
        assert_eq!(
            outcome.affected_paths,
            vec!["wb1/1/A1".to_string(), "wb1/1/B2".to_string()]
        );
    }

    #[test]
    fn test_hard_reset_missing_commit() {
        let (_dir, repo, store) = setup();
        let fake = Hash::from_hex("0000000000000000000000000000000000000000").unwrap();
        assert!(matches!(
            hard_reset(&repo, &store, &fake),
            Err(Error::ObjectNotFound(_))
        ));
    }

    #[test]
    fn test_soft_reset_moves_ref_only() {
        let (_dir, repo, store) = setup();
        let first = make_commit(&repo, &store, "Hello", "init");
        make_commit(&repo, &store, "World", "update");

        let index_before = std::fs::read(repo.vcs_dir().join("index")).unwrap();
        let outcome = soft_reset(&repo, &first).unwrap();

        assert_eq!(outcome.operation, "soft_reset");
        // workbook keeps the newer value
        assert_eq!(store.read_cell("wb1", 1, "A", 1).unwrap(), "World");
        // ref moved back
        assert_eq!(repo.read_head().unwrap(), Some(first));
        // the index file is byte-for-byte untouched
        let index_after = std::fs::read(repo.vcs_dir().join("index")).unwrap();
        assert_eq!(index_before, index_after);
    }

    #[test]
    fn test_soft_reset_reports_would_change_set() {
        let (_dir, repo, store) = setup();
        let first = make_commit(&repo, &store, "Hello", "init");
        make_commit(&repo, &store, "World", "update");

        let outcome = soft_reset(&repo, &first).unwrap();
        assert_eq!(outcome.affected_paths, vec!["wb1/1/A1".to_string()]);
        assert_eq!(outcome.previous.is_some(), true);
    }

    #[test]
    fn test_soft_reset_identical_trees_reports_nothing() {
        let (_dir, repo, store) = setup();
        let first = make_commit(&repo, &store, "Hello", "init");

        let outcome = soft_reset(&repo, &first).unwrap();
        assert!(outcome.affected_paths.is_empty());
    }

    #[test]
    fn test_hard_reset_skips_unrestorable_cells() {
        let (_dir, repo, store) = setup();
        let first = make_commit(&repo, &store, "Hello", "init");
        make_commit(&repo, &store, "World", "update");

        // delete the blob behind the target tree to force a per-cell failure
        let target_commit = object::read_commit(&repo, &first).unwrap();
        let (_, blob) = tree::walk(&repo, &target_commit.tree).unwrap()[0].clone();
        std::fs::remove_file(object::object_path(&repo, &blob)).unwrap();

        // the reset itself still succeeds and the ref advances
        let outcome = hard_reset(&repo, &store, &first).unwrap();
        assert_eq!(outcome.operation, "hard_reset");
        assert_eq!(repo.read_head().unwrap(), Some(first));
        // the unrestorable cell kept its previous value
        assert_eq!(store.read_cell("wb1", 1, "A", 1).unwrap(), "World");
    }
}
