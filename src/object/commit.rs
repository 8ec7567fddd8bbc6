use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::store::{self, ObjectKind};
use crate::repo::Repo;

/// a parsed commit object
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub tree: Hash,
    pub parent: Option<Hash>,
    /// full identity line, e.g. "Alice <alice@example.com> 1700000000 +0000"
    pub author: String,
    pub committer: String,
    pub message: String,
}

impl Commit {
    /// unix timestamp parsed from the author line, 0 when absent
    pub fn timestamp(&self) -> i64 {
        parse_identity_timestamp(&self.author).unwrap_or(0)
    }

    /// is this an initial commit (no parent)
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// commit with its hash, as returned by history walks and previews
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitInfo {
    pub hash: Hash,
    pub tree: Hash,
    pub parent: Option<Hash>,
    pub author: String,
    pub committer: String,
    pub message: String,
    pub timestamp: i64,
}

impl CommitInfo {
    pub(crate) fn new(hash: Hash, commit: Commit) -> Self {
        let timestamp = commit.timestamp();
        Self {
            hash,
            tree: commit.tree,
            parent: commit.parent,
            author: commit.author,
            committer: commit.committer,
            message: commit.message,
            timestamp,
        }
    }
}

/// build the textual commit payload
pub fn build_payload(
    tree: &Hash,
    parent: Option<&Hash>,
    author: &str,
    email: &str,
    message: &str,
    timestamp: i64,
) -> String {
    let mut content = String::new();
    content.push_str(&format!("tree {}\n", tree.to_hex()));
    if let Some(parent) = parent {
        content.push_str(&format!("parent {}\n", parent.to_hex()));
    }
    let identity = format!("{} <{}> {} +0000", author, email, timestamp);
    content.push_str(&format!("author {}\n", identity));
    content.push_str(&format!("committer {}\n", identity));
    content.push('\n');
    content.push_str(message);
    content.push('\n');
    content
}

/// parse a commit payload
///
/// strict line parsing up to the first blank line, then the message;
/// a missing tree line falls back to a regex rescue before failing
pub fn parse(payload: &[u8], hash: &Hash) -> Result<Commit> {
    let content = String::from_utf8_lossy(payload);

    let mut tree = None;
    let mut parent = None;
    let mut author = String::new();
    let mut committer = String::new();
    let mut message_lines: Vec<&str> = Vec::new();
    let mut in_message = false;

    for line in content.lines() {
        if in_message {
            message_lines.push(line);
        } else if let Some(rest) = line.strip_prefix("tree ") {
            tree = Hash::from_hex(rest.trim()).ok();
        } else if let Some(rest) = line.strip_prefix("parent ") {
            parent = Hash::from_hex(rest.trim()).ok();
        } else if let Some(rest) = line.strip_prefix("author ") {
            author = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("committer ") {
            committer = rest.trim().to_string();
        } else if line.is_empty() {
            in_message = true;
        }
    }

    let tree = match tree {
        Some(tree) => tree,
        None => rescue_tree_hash(&content).ok_or(Error::CorruptCommit(*hash))?,
    };

    Ok(Commit {
        tree,
        parent,
        author,
        committer,
        message: message_lines.join("\n").trim().to_string(),
    })
}

/// last-resort extraction of the tree hash from a malformed payload
fn rescue_tree_hash(content: &str) -> Option<Hash> {
    static TREE_RE: OnceLock<Regex> = OnceLock::new();
    let re = TREE_RE.get_or_init(|| Regex::new(r"tree ([0-9a-f]{40})").expect("static regex"));
    re.captures(content).and_then(|c| Hash::from_hex(&c[1]).ok())
}

// identity lines end with "<secs> +0000"
fn parse_identity_timestamp(identity: &str) -> Option<i64> {
    let mut tokens = identity.split_whitespace().rev();
    let _zone = tokens.next()?;
    tokens.next()?.parse().ok()
}

/// read and parse a commit object by hash
pub fn read_commit(repo: &Repo, hash: &Hash) -> Result<Commit> {
    let (kind, payload) = store::get(repo, hash)?;
    if kind != ObjectKind::Commit {
        return Err(Error::CorruptObjectMessage(format!(
            "expected commit object at {}, found {}",
            hash,
            kind.as_str()
        )));
    }
    parse(&payload, hash)
}
