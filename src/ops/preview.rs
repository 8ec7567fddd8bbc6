use std::str::FromStr;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::CommitInfo;
use crate::ops::rollback::{require_commit, union_paths};
use crate::repo::Repo;

/// the rollback operations a preview can describe
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollbackKind {
    HardReset,
    SoftReset,
    Revert,
    CherryPick,
}

impl RollbackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RollbackKind::HardReset => "hard_reset",
            RollbackKind::SoftReset => "soft_reset",
            RollbackKind::Revert => "revert",
            RollbackKind::CherryPick => "cherry_pick",
        }
    }

    /// whether the operation rewrites visible state
    pub fn is_destructive(self) -> bool {
        matches!(self, RollbackKind::HardReset | RollbackKind::Revert)
    }
}

impl FromStr for RollbackKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hard_reset" => Ok(RollbackKind::HardReset),
            "soft_reset" => Ok(RollbackKind::SoftReset),
            "revert" => Ok(RollbackKind::Revert),
            "cherry_pick" => Ok(RollbackKind::CherryPick),
            other => Err(Error::InvalidRollbackKind(other.to_string())),
        }
    }
}

/// what a rollback operation would touch
#[derive(Clone, Debug)]
pub struct RollbackPreview {
    pub kind: RollbackKind,
    pub current: Option<CommitInfo>,
    pub target: CommitInfo,
    /// union of paths present in either commit's tree
    pub affected_paths: Vec<String>,
    pub destructive: bool,
}

/// describe a rollback without performing it
pub fn preview_rollback(repo: &Repo, target: &Hash, kind: RollbackKind) -> Result<RollbackPreview> {
    let target_commit = require_commit(repo, target)?;
    let current_hash = repo.read_head()?;
    let current = match current_hash {
        Some(hash) => Some(CommitInfo::new(hash, require_commit(repo, &hash)?)),
        None => None,
    };
    let affected_paths = union_paths(repo, current_hash.as_ref(), target)?;

    Ok(RollbackPreview {
        kind,
        current,
        target: CommitInfo::new(*target, target_commit),
        affected_paths,
        destructive: kind.is_destructive(),
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
    fn test_kind_parsing() {
        assert_eq!(
            "hard_reset".parse::<RollbackKind>().unwrap(),
            RollbackKind::HardReset
        );
        assert_eq!(
            "cherry_pick".parse::<RollbackKind>().unwrap(),
            RollbackKind::CherryPick
        );
        assert!(matches!(
            "squash".parse::<RollbackKind>(),
            Err(Error::InvalidRollbackKind(_))
        ));
    }

    #[test]
    fn test_destructive_flag() {
        assert!(RollbackKind::HardReset.is_destructive());
        assert!(RollbackKind::Revert.is_destructive());
        assert!(!RollbackKind::SoftReset.is_destructive());
        assert!(!RollbackKind::CherryPick.is_destructive());
    }

    #[test]
    fn test_preview_includes_both_commits_and_paths() {
        let (_dir, repo, store) = setup();

        store.write_cell("wb1", 1, "A", 1, "Hello").unwrap();
        stage(&repo, &store, &CellRef::new("wb1", 1, "A", 1).unwrap()).unwrap();
        let first = commit(&repo, "init", "Alice", "alice@x").unwrap();

        store.write_cell("wb1", 1, "B", 2, "World").unwrap();
        stage(&repo, &store, &CellRef::new("wb1", 1, "B", 2).unwrap()).unwrap();
        let second = commit(&repo, "add B", "Alice", "alice@x").unwrap();

        let preview =
            preview_rollback(&repo, &first.commit_hash, RollbackKind::HardReset).unwrap();

        assert_eq!(preview.target.hash, first.commit_hash);
        assert_eq!(preview.current.unwrap().hash, second.commit_hash);
        assert!(preview.destructive);
        // union of both trees' paths
        assert_eq!(
            preview.affected_paths,
            vec!["wb1/1/A1".to_string(), "wb1/1/B2".to_string()]
        );
    }

    #[test]
    fn test_preview_missing_target() {
        let (_dir, repo, _store) = setup();
        let fake = Hash::from_hex("0000000000000000000000000000000000000000").unwrap();
        assert!(matches!(
            preview_rollback(&repo, &fake, RollbackKind::SoftReset),
            Err(Error::ObjectNotFound(_))
        ));
    }
}
