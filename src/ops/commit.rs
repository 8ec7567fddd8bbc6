use tracing::info;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::index::epoch_seconds;
use crate::object::{self, commit as commit_object, tree, ObjectKind};
use crate::repo::Repo;

/// result of a successful commit
#[derive(Clone, Debug)]
pub struct CommitOutcome {
    pub commit_hash: Hash,
    pub tree_hash: Hash,
    pub parent: Option<Hash>,
    /// branch the ref advance went through; None when HEAD is detached
    pub branch: Option<String>,
    pub staged_files: usize,
    pub timestamp: i64,
}

/// record the staged changes as a new commit on the current branch
///
/// object writes happen before the ref advance, which happens before the
/// index clear; a crash in between leaves unreachable objects, never a
/// corrupt repository
pub fn commit(repo: &Repo, message: &str, author: &str, email: &str) -> Result<CommitOutcome> {
    validate(message, author, email)?;

    let entries = repo.index().entries();
    if entries.is_empty() {
        return Err(Error::Empty("commit"));
    }

    let leaves: Vec<(String, Hash)> = entries
        .iter()
        .map(|e| (e.tree_path(), e.blob_hash))
        .collect();
    let tree_hash = tree::write_hierarchy(repo, &leaves)?;

    let parent = repo.read_head()?;
    let timestamp = epoch_seconds();
    let payload = commit_object::build_payload(
        &tree_hash,
        parent.as_ref(),
        author,
        email,
        message,
        timestamp,
    );
    let commit_hash = object::put(repo, ObjectKind::Commit, payload.as_bytes())?.hash;

    let branch = repo.current_branch()?;
    repo.advance_head(&commit_hash)?;

    repo.index().clear()?;

    info!(commit = %commit_hash, tree = %tree_hash, staged = entries.len(), "created commit");

    Ok(CommitOutcome {
        commit_hash,
        tree_hash,
        parent,
        branch,
        staged_files: entries.len(),
        timestamp,
    })
}

fn validate(message: &str, author: &str, email: &str) -> Result<()> {
    if message.trim().is_empty() {
        return Err(Error::InvalidInput(
            "commit message cannot be empty".to_string(),
        ));
    }
    if author.trim().is_empty() {
        return Err(Error::InvalidInput(
            "author name cannot be empty".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(Error::InvalidInput(format!("invalid author email: {}", email)));
    }
    Ok(())
}
