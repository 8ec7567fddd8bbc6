use tracing::info;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::ops::commit::commit;
use crate::ops::reset::RollbackOutcome;
use crate::ops::rollback::{leaf_map, require_commit, stage_leaf};
use crate::repo::Repo;

/// replay an earlier commit's snapshot on top of the current HEAD
pub fn cherry_pick(
    repo: &Repo,
    target: &Hash,
    author: &str,
    email: &str,
) -> Result<RollbackOutcome> {
    let picked = require_commit(repo, target)?;
    if picked.parent.is_none() {
        return Err(Error::InvalidInput(format!(
            "cannot cherry-pick initial commit {}",
            target
        )));
    }
    let previous = repo.read_head()?;

    let leaves = leaf_map(repo, &picked.tree)?;

    repo.index().clear()?;

    let mut staged = 0usize;
    let mut affected: Vec<String> = Vec::new();
    for (path, blob_hash) in &leaves {
        if stage_leaf(repo, path, blob_hash)? {
            staged += 1;
            affected.push(path.clone());
        }
    }

    if staged == 0 {
        return Err(Error::Empty("cherry-pick"));
    }

    let message = format!(
        "{}\n\n(cherry picked from commit {})",
        picked.message.trim(),
        target
    );
    let outcome = commit(repo, &message, author, email)?;

    info!(picked = %target, commit = %outcome.commit_hash, staged, "created cherry-pick commit");

    Ok(RollbackOutcome {
        operation: "cherry_pick",
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
    use crate::object::read_commit;
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
    fn test_cherry_pick_replays_snapshot() {
        let (_dir, repo, store) = setup();

        stage_cell(&repo, &store, "A", "Hello");
        commit(&repo, "init", "Alice", "alice@x").unwrap();

        stage_cell(&repo, &store, "A", "World");
        let second = commit(&repo, "update", "Alice", "alice@x").unwrap();

        stage_cell(&repo, &store, "A", "Third");
        let third = commit(&repo, "again", "Alice", "alice@x").unwrap();

        let outcome = cherry_pick(&repo, &second.commit_hash, "Bob", "bob@x").unwrap();

        let picked = read_commit(&repo, &outcome.target).unwrap();
        // the new commit reuses the picked snapshot on top of the old head
        assert_eq!(picked.tree, second.tree_hash);
        assert_eq!(picked.parent, Some(third.commit_hash));
        assert!(picked.message.starts_with("update"));
        assert!(picked
            .message
            .contains(&format!("(cherry picked from commit {})", second.commit_hash)));
        assert_eq!(repo.read_head().unwrap(), Some(outcome.target));
    }

    #[test]
    fn test_cherry_pick_clears_prior_staging() {
        let (_dir, repo, store) = setup();

        stage_cell(&repo, &store, "A", "Hello");
        commit(&repo, "init", "Alice", "alice@x").unwrap();

        stage_cell(&repo, &store, "A", "World");
        let second = commit(&repo, "update", "Alice", "alice@x").unwrap();

        // stray staged change that the cherry-pick must discard
        stage_cell(&repo, &store, "B", "stray");

        cherry_pick(&repo, &second.commit_hash, "Bob", "bob@x").unwrap();

        // the index was cleared by the embedded commit
        assert!(repo.index().is_empty());
        let head = read_commit(&repo, &repo.read_head().unwrap().unwrap()).unwrap();
        assert_eq!(head.tree, second.tree_hash);
    }

    #[test]
    fn test_cherry_pick_initial_commit_fails() {
        let (_dir, repo, store) = setup();

        stage_cell(&repo, &store, "A", "Hello");
        let first = commit(&repo, "init", "Alice", "alice@x").unwrap();

        assert!(matches!(
            cherry_pick(&repo, &first.commit_hash, "Bob", "bob@x"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_cherry_pick_missing_commit_fails() {
        let (_dir, repo, _store) = setup();
        let fake = Hash::from_hex("0000000000000000000000000000000000000000").unwrap();
        assert!(matches!(
            cherry_pick(&repo, &fake, "Bob", "bob@x"),
            Err(Error::ObjectNotFound(_))
        ));
    }
}
