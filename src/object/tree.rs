use std::collections::BTreeMap;

use tracing::warn;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::store::{self, ObjectKind};
use crate::repo::Repo;

/// mode token for a subtree entry
pub const MODE_TREE: &str = "40000";
/// mode token for a blob entry
pub const MODE_BLOB: &str = "100644";

/// a parsed child of a tree object
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: String,
    pub name: String,
    pub hash: Hash,
}

/// build and write the tree hierarchy for a set of blob leaves
///
/// each leaf is `("<workbook>/<sheet>/<cell>", blob_hash)`; subtrees are
/// written bottom-up and the root tree hash is returned
pub fn write_hierarchy(repo: &Repo, leaves: &[(String, Hash)]) -> Result<Hash> {
    let mut root = Node::default();
    for (path, hash) in leaves {
        root.insert(path, *hash);
    }
    write_node(repo, &root)
}

#[derive(Default)]
struct Node {
    children: BTreeMap<String, Node>,
    leaf: Option<Hash>,
}

impl Node {
    fn insert(&mut self, path: &str, hash: Hash) {
        match path.split_once('/') {
            Some((head, rest)) => self
                .children
                .entry(head.to_string())
                .or_default()
                .insert(rest, hash),
            None => {
                self.children.entry(path.to_string()).or_default().leaf = Some(hash);
            }
        }
    }
}

fn write_node(repo: &Repo, node: &Node) -> Result<Hash> {
    // resolve children first so subtree hashes are available
    let mut entries: Vec<(&'static str, &str, Hash)> = Vec::new();
    for (name, child) in &node.children {
        match child.leaf {
            Some(hash) => entries.push((MODE_BLOB, name.as_str(), hash)),
            None => {
                let hash = write_node(repo, child)?;
                entries.push((MODE_TREE, name.as_str(), hash));
            }
        }
    }

    // directories before files, ties broken by name
    entries.sort_by(|a, b| {
        let a_dir = a.0 == MODE_TREE;
        let b_dir = b.0 == MODE_TREE;
        b_dir.cmp(&a_dir).then_with(|| a.1.cmp(b.1))
    });

    Ok(store::put(repo, ObjectKind::Tree, &serialize(&entries))?.hash)
}

/// serialize tree children as `"<mode> <name>\0"` + raw 20-byte hash each,
/// concatenated with no trailing separator
fn serialize(entries: &[(&str, &str, Hash)]) -> Vec<u8> {
    let mut payload = Vec::new();
    for (mode, name, hash) in entries {
        payload.extend_from_slice(mode.as_bytes());
        payload.push(b' ');
        payload.extend_from_slice(name.as_bytes());
        payload.push(0);
        payload.extend_from_slice(hash.as_bytes());
    }
    payload
}

/// parse a binary tree payload into its entries
pub fn parse(payload: &[u8], tree_hash: &Hash) -> Result<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    let mut i = 0;
    while i < payload.len() {
        let nul = payload[i..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::CorruptObject(*tree_hash))?;
        let header = std::str::from_utf8(&payload[i..i + nul])
            .map_err(|_| Error::CorruptObject(*tree_hash))?;
        let (mode, name) = header
            .split_once(' ')
            .ok_or(Error::CorruptObject(*tree_hash))?;

        let hash_start = i + nul + 1;
        let hash_end = hash_start + 20;
        if hash_end > payload.len() {
            return Err(Error::CorruptObject(*tree_hash));
        }
        let mut raw = [0u8; 20];
        raw.copy_from_slice(&payload[hash_start..hash_end]);

        entries.push(TreeEntry {
            mode: mode.to_string(),
            name: name.to_string(),
            hash: Hash::from_bytes(raw),
        });
        i = hash_end;
    }
    Ok(entries)
}

/// read a tree object by hash
pub fn read_tree(repo: &Repo, hash: &Hash) -> Result<Vec<TreeEntry>> {
    let (kind, payload) = store::get(repo, hash)?;
    if kind != ObjectKind::Tree {
        return Err(Error::CorruptObjectMessage(format!(
            "expected tree object at {}, found {}",
            hash,
            kind.as_str()
        )));
    }
    parse(&payload, hash)
}

/// recursively enumerate every blob leaf under a tree as (path, blob hash)
///
/// entries with unknown modes are skipped with a warning
pub fn walk(repo: &Repo, tree_hash: &Hash) -> Result<Vec<(String, Hash)>> {
    let mut leaves = Vec::new();
    collect(repo, tree_hash, "", &mut leaves)?;
    Ok(leaves)
}

fn collect(
    repo: &Repo,
    tree_hash: &Hash,
    prefix: &str,
    leaves: &mut Vec<(String, Hash)>,
) -> Result<()> {
    for entry in read_tree(repo, tree_hash)? {
        let path = if prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{}/{}", prefix, entry.name)
        };
        match entry.mode.as_str() {
            MODE_TREE => collect(repo, &entry.hash, &path, leaves)?,
            MODE_BLOB => leaves.push((path, entry.hash)),
            other => warn!(mode = other, path = %path, "skipping tree entry with unknown mode"),
        }
    }
    Ok(())
}
