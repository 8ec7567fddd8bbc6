use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::ops::commit::commit;
use crate::ops::reset::RollbackOutcome;
use crate::ops::rollback::{leaf_map, require_commit, stage_leaf};
use crate::repo::Repo;

/// create a new commit that undoes the changes of an earlier commit
///
/// cells the reverted commit added cannot be removed, because the staging
/// index has no deletion marker; they are left in place
pub fn revert(repo: &Repo, target: &Hash, author: &str, email: &str) -> Result<RollbackOutcome> {
    let reverted = require_commit(repo, target)?;
    let Some(parent) = reverted.parent else {
        // the initial commit has no parent state to return to
        return Err(Error::Empty("revert"));
    };
    let parent_commit = require_commit(repo, &parent)?;
    let previous = repo.read_head()?;

    let target_leaves = leaf_map(repo, &reverted.tree)?;
    let parent_leaves = leaf_map(repo, &parent_commit.tree)?;

    repo.index().clear()?;

    let mut staged = 0usize;
    let mut affected: Vec<String> = Vec::new();

    let mut all_paths: Vec<&String> = target_leaves.keys().chain(parent_leaves.keys()).collect();
    all_paths.sort();
    all_paths.dedup();

    for path in all_paths {
        match (target_leaves.get(path), parent_leaves.get(path)) {
            (Some(in_target), Some(in_parent)) if in_target != in_parent => {
                // modified by the reverted commit: restage the parent version
                if stage_leaf(repo, path, in_parent)? {
                    staged += 1;
                    affected.push(path.clone());
                }
            }
            (None, Some(in_parent)) => {
                // deleted by the reverted commit: restore it
                if stage_leaf(repo, path, in_parent)? {
                    staged += 1;
                    affected.push(path.clone());
                }
            }
            (Some(_), None) => {
                debug!(path = %path, "cell added by reverted commit is left in place");
            }
            _ => {}
        }
    }

    if staged == 0 {
        return Err(Error::Empty("revert"));
    }

    let message = format!(
        "Revert \"{}\"\n\nThis reverts commit {}.",
        reverted.message.trim(),
        target
    );
    let outcome = commit(repo, &message, author, email)?;

    info!(reverted = %target, commit = %outcome.commit_hash, staged, "created revert commit");

    Ok(RollbackOutcome {
        operation: "revert",
        target: outcome.commit_hash,
        previous,
        affected_paths: affected,
        timestamp: outcome.timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellRef;
    use crate::object::{self, read_commit};
    use crate::ops::stage::stage;
    use crate::workbook::MemoryWorkbookStore;
    use crate::workbook::WorkbookStore;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, Repo, MemoryWorkbookStore) {
        let dir = tempdir().unwrap();
        let repo = Repo::init(dir.path()).unwrap();
        let store = MemoryWorkbookStore::new();
        (dir, repo, store)
    }

    fn stage_cell(repo: &Repo, store: &MemoryWorkbookStore, letters: &str, value: &str) {
        store.write_cell("wb1", 1, letters, 1, value).unwrap();
        stage(repo, store, &CellRef::new("wb1", 1, letters, 1).unwrap()).unwrap();
    }

    #[test]
    fn test_revert_restores_parent_tree() {
        let (_dir, repo, store) = setup();

        stage_cell(&repo, &store, "A", "Hello");
        let first = commit(&repo, "init", "Alice", "alice@x").unwrap();

        stage_cell(&repo, &store, "A", "World");
        let second = commit(&repo, "update", "Alice", "alice@x").unwrap();

        let outcome = revert(&repo, &second.commit_hash, "Bob", "bob@x").unwrap();

        // the revert commit's tree matches the first commit's tree
        let revert_commit = read_commit(&repo, &outcome.target).unwrap();
        assert_eq!(revert_commit.tree, first.tree_hash);
        assert_eq!(revert_commit.parent, Some(second.commit_hash));
        assert!(revert_commit
            .message
            .starts_with("Revert \"update\""));
        assert!(revert_commit
            .message
            .contains(&format!("This reverts commit {}.", second.commit_hash)));

        // the staged blob was the "Hello" blob
        assert_eq!(outcome.affected_paths, vec!["wb1/1/A1".to_string()]);
    }

    #[test]
    fn test_revert_stages_hello_blob() {
        let (_dir, repo, store) = setup();

        stage_cell(&repo, &store, "A", "Hello");
        commit(&repo, "init", "Alice", "alice@x").unwrap();

        stage_cell(&repo, &store, "A", "World");
        let second = commit(&repo, "update", "Alice", "alice@x").unwrap();

        let outcome = revert(&repo, &second.commit_hash, "Bob", "bob@x").unwrap();

        // tree of the revert commit resolves A1 to the "Hello" blob
        let revert_commit = read_commit(&repo, &outcome.target).unwrap();
        let leaves = object::walk(&repo, &revert_commit.tree).unwrap();
        assert_eq!(leaves.len(), 1);
        assert_eq!(
            leaves[0].1.to_hex(),
            "5ab2f8a4323abafb10abb68657d9d39f1a775057"
        );
    }

    #[test]
    fn test_revert_restores_dropped_cells() {
        let (_dir, repo, store) = setup();

        // first commit captures two cells
        stage_cell(&repo, &store, "A", "keep");
        stage_cell(&repo, &store, "B", "dropped later");
        commit(&repo, "both", "Alice", "alice@x").unwrap();

        // second commit only snapshots A (B's change never staged)
        stage_cell(&repo, &store, "A", "changed");
        let second = commit(&repo, "only A", "Alice", "alice@x").unwrap();

        let outcome = revert(&repo, &second.commit_hash, "Bob", "bob@x").unwrap();

        // both the modified A and the disappeared B come back from the parent
        assert_eq!(
            outcome.affected_paths,
            vec!["wb1/1/A1".to_string(), "wb1/1/B1".to_string()]
        );
    }

    #[test]
    fn test_revert_added_cells_are_left_in_place() {
        let (_dir, repo, store) = setup();

        stage_cell(&repo, &store, "A", "Hello");
        commit(&repo, "init", "Alice", "alice@x").unwrap();

        // the second commit adds B alongside the unchanged A
        stage_cell(&repo, &store, "A", "Hello2");
        stage_cell(&repo, &store, "B", "new cell");
        let second = commit(&repo, "add B", "Alice", "alice@x").unwrap();

        let outcome = revert(&repo, &second.commit_hash, "Bob", "bob@x").unwrap();

        // only A's modification is reverted; B has no deletion marker
        assert_eq!(outcome.affected_paths, vec!["wb1/1/A1".to_string()]);
    }

    #[test]
    fn test_revert_initial_commit_fails() {
        let (_dir, repo, store) = setup();

        stage_cell(&repo, &store, "A", "Hello");
        let first = commit(&repo, "init", "Alice", "alice@x").unwrap();

        assert!(matches!(
            revert(&repo, &first.commit_hash, "Bob", "bob@x"),
            Err(Error::Empty(_))
        ));
    }

    #[test]
    fn test_revert_identical_trees_fails_empty() {
        let (_dir, repo, store) = setup();

        stage_cell(&repo, &store, "A", "Hello");
        commit(&repo, "init", "Alice", "alice@x").unwrap();

        // second commit snapshots the same single cell with the same value
        stage_cell(&repo, &store, "A", "Hello");
        let second = commit(&repo, "no-op", "Alice", "alice@x").unwrap();

        assert!(matches!(
            revert(&repo, &second.commit_hash, "Bob", "bob@x"),
            Err(Error::Empty(_))
        ));
    }

    #[test]
    fn test_revert_missing_commit_fails() {
        let (_dir, repo, _store) = setup();
        let fake = Hash::from_hex("0000000000000000000000000000000000000000").unwrap();
        assert!(matches!(
            revert(&repo, &fake, "Bob", "bob@x"),
            Err(Error::ObjectNotFound(_))
        ));
    }
}
