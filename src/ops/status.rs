use crate::error::Result;
use crate::index::IndexEntry;
use crate::object::{read_commit, CommitInfo};
use crate::repo::Repo;

/// snapshot of the repository state
#[derive(Clone, Debug)]
pub struct Status {
    pub staged: usize,
    pub clean: bool,
    pub staged_files: Vec<IndexEntry>,
    pub last_commit: Option<CommitInfo>,
}

/// report the staging area and the current head commit
pub fn status(repo: &Repo) -> Result<Status> {
    let staged_files = repo.index().entries();
    let last_commit = match repo.read_head()? {
        Some(hash) => Some(CommitInfo::new(hash, read_commit(repo, &hash)?)),
        None => None,
    };
    Ok(Status {
        staged: staged_files.len(),
        clean: staged_files.is_empty(),
        staged_files,
        last_commit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellRef;
    use crate::ops::commit::commit;
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

    #[test]
    fn test_status_fresh_repo() {
        let (_dir, repo, _store) = setup();

        let s = status(&repo).unwrap();
        assert_eq!(s.staged, 0);
        assert!(s.clean);
        assert!(s.staged_files.is_empty());
        assert!(s.last_commit.is_none());
    }

    #[test]
    fn test_status_with_staged_changes() {
        let (_dir, repo, store) = setup();
        store.write_cell("wb1", 1, "A", 1, "Hello").unwrap();
        stage(&repo, &store, &CellRef::new("wb1", 1, "A", 1).unwrap()).unwrap();

        let s = status(&repo).unwrap();
        assert_eq!(s.staged, 1);
        assert!(!s.clean);
        assert_eq!(s.staged_files[0].address(), "A1");
    }

    #[test]
    fn test_status_after_commit() {
        let (_dir, repo, store) = setup();
        store.write_cell("wb1", 1, "A", 1, "Hello").unwrap();
        stage(&repo, &store, &CellRef::new("wb1", 1, "A", 1).unwrap()).unwrap();
        let outcome = commit(&repo, "init", "Alice", "alice@x").unwrap();

        let s = status(&repo).unwrap();
        assert!(s.clean);
        let last = s.last_commit.unwrap();
        assert_eq!(last.hash, outcome.commit_hash);
        assert_eq!(last.message, "init");
    }
}
