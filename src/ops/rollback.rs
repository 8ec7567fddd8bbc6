//! shared plumbing for the history-rewriting operations

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::cell::CellRef;
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::{self, read_commit, tree, Commit};
use crate::repo::Repo;

/// look up a commit by hash, mapping a missing object to NotFound
pub(crate) fn require_commit(repo: &Repo, hash: &Hash) -> Result<Commit> {
    if !object::exists(repo, hash) {
        return Err(Error::ObjectNotFound(*hash));
    }
    read_commit(repo, hash)
}

/// leaf map of a tree: path -> blob hash
pub(crate) fn leaf_map(repo: &Repo, tree_hash: &Hash) -> Result<BTreeMap<String, Hash>> {
    Ok(tree::walk(repo, tree_hash)?.into_iter().collect())
}

/// stage a cell reconstructed from a tree leaf, pulling sizes from the store
///
/// a malformed path is skipped with a warning rather than failing the
/// whole operation
pub(crate) fn stage_leaf(repo: &Repo, path: &str, blob_hash: &Hash) -> Result<bool> {
    let cell = match CellRef::from_tree_path(path) {
        Ok(cell) => cell,
        Err(e) => {
            warn!(path = %path, error = %e, "skipping malformed cell path in tree");
            return Ok(false);
        }
    };
    let (original_size, compressed_size) = object::sizes(repo, blob_hash)?;
    repo.index()
        .upsert(&cell, *blob_hash, original_size, compressed_size)?;
    Ok(true)
}

/// paths whose blob differs between two commits' trees, including paths
/// present on only one side
pub(crate) fn changed_paths(repo: &Repo, from: Option<&Hash>, to: &Hash) -> Result<Vec<String>> {
    let to_commit = require_commit(repo, to)?;
    let to_leaves = leaf_map(repo, &to_commit.tree)?;
    let from_leaves = match from {
        Some(from) => leaf_map(repo, &require_commit(repo, from)?.tree)?,
        None => BTreeMap::new(),
    };

    let mut paths: Vec<String> = Vec::new();
    for (path, hash) in &to_leaves {
        if from_leaves.get(path) != Some(hash) {
            paths.push(path.clone());
        }
    }
    for path in from_leaves.keys() {
        if !to_leaves.contains_key(path) {
            paths.push(path.clone());
        }
    }
    paths.sort();
    Ok(paths)
}

/// union of all paths present in either commit's tree
pub(crate) fn union_paths(repo: &Repo, a: Option<&Hash>, b: &Hash) -> Result<Vec<String>> {
    let mut paths: BTreeSet<String> = BTreeSet::new();
    if let Some(a) = a {
        paths.extend(leaf_map(repo, &require_commit(repo, a)?.tree)?.into_keys());
    }
    paths.extend(leaf_map(repo, &require_commit(repo, b)?.tree)?.into_keys());
    Ok(paths.into_iter().collect())
}
